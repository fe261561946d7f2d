//! C1 — immutable problem model. Grounded on `pmp-1.01/problem.c` and
//! `pmp-1.01/define.h`: dimensions plus the initial block layout, fixed at
//! construction and never mutated by the engine.

use crate::common::Priority;

/// The largest solution length the driver will ever entertain. Mirrors
/// `define.h`'s `MAX_N_RELOCATION`.
pub const MAX_RELOCATIONS: usize = 200;

/// An immutable container-premarshalling instance.
///
/// `blocks[i]` lists stack `i`'s contents bottom to top, already remapped
/// to dense priorities in `0..=max_priority`.
#[derive(Debug, Clone)]
pub struct Problem {
    n_stack: usize,
    s_height: usize,
    max_priority: Priority,
    duplicate: bool,
    blocks: Vec<Vec<Priority>>,
}

impl Problem {
    /// Builds a problem from per-stack bottom-to-top priority lists that
    /// are already densely remapped (see [`crate::parser`]).
    ///
    /// # Panics
    /// Panics if any stack exceeds `s_height`, mirroring the invariant the
    /// parser is responsible for upholding before construction.
    pub fn new(s_height: usize, max_priority: Priority, duplicate: bool, blocks: Vec<Vec<Priority>>) -> Self {
        for stack in &blocks {
            assert!(stack.len() <= s_height, "stack exceeds configured height");
        }
        Problem {
            n_stack: blocks.len(),
            s_height,
            max_priority,
            duplicate,
            blocks,
        }
    }

    pub fn n_stack(&self) -> usize {
        self.n_stack
    }

    pub fn s_height(&self) -> usize {
        self.s_height
    }

    pub fn max_priority(&self) -> Priority {
        self.max_priority
    }

    /// True when fewer distinct priorities than blocks were found at
    /// load time; enables the duplicate-priority dominance rules.
    pub fn duplicate(&self) -> bool {
        self.duplicate
    }

    pub fn n_block(&self) -> usize {
        self.blocks.iter().map(Vec::len).sum()
    }

    /// Stack `i`'s initial contents, bottom to top.
    pub fn stack(&self, i: usize) -> &[Priority] {
        &self.blocks[i]
    }

    pub fn stacks(&self) -> impl Iterator<Item = &[Priority]> {
        self.blocks.iter().map(Vec::as_slice)
    }
}
