//! Error taxonomy. Mirrors `ddo/examples/knapsack/main.rs`'s `Error` enum:
//! a small `thiserror`-derived set of variants, one per external failure
//! surface, rather than a single stringly-typed catch-all.

use std::num::ParseIntError;

/// Failures while reading a textual instance (Format A or Format B).
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("i/o error reading instance: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed integer on line {line}: {source}")]
    Int {
        line: usize,
        #[source]
        source: ParseIntError,
    },

    #[error("line {line}: expected {expected} priorities, found {found}")]
    TierCountMismatch {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("declared {declared} containers but parsed {parsed}")]
    ContainerCountMismatch { declared: usize, parsed: usize },

    #[error("no stack data found in input")]
    Empty,

    #[error("stack height {height} exceeds the configured maximum")]
    HeightExceeded { height: usize },
}

/// Invariant violations raised only by the debug/test verifier
/// ([`crate::state::State::verify`]); never produced by a normal run.
#[derive(Debug, thiserror::Error)]
pub enum SolveError {
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}
