//! Shared small types used across the solver.

/// Retrieval-order key for a block. Smaller is retrieved earlier. Dense,
/// `0..=max_priority` after [`crate::problem::Problem`] construction.
pub type Priority = u32;

/// Index of a block in a [`crate::problem::Problem`]'s flat block list.
pub type BlockId = usize;

/// Index of a stack, `0..n_stack`.
pub type StackId = usize;

/// A single top-of-stack relocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    pub src: StackId,
    pub dst: StackId,
    pub block: BlockId,
    pub priority: Priority,
}

/// Outcome of a depth-bounded search call. Mirrors the source's tri-state
/// `{False, True, TimeLimit}` return from `bb`/`bb_sub`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// No solution at or below the current ceiling; the ceiling should be
    /// raised and the search retried (iterative deepening).
    Exhausted,
    /// A solution at or below the current ceiling was found and recorded.
    Found,
    /// The search was cut off before completing a full accounting of the
    /// remaining subtree.
    TimeLimit,
}
