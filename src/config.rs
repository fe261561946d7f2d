//! Solver configuration. Exposes the source's compile-time feature
//! toggles (`IMPROVED_BF_LOWER_BOUND1/2/3`, `TYPE1`) as a single
//! construction-time value instead of build-time `#define`s.

/// Which lower-bound refinement to apply on top of the base `lbBX + lbGX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundConfig {
    /// `lbBX + lbGX` only, no delta refinement and no minimum-misoverlay-height term.
    Basic,
    /// Adds the minimum-misoverlay-height term to `lbBX` when there is no slack.
    ImprovedBf1,
    /// `ImprovedBf1` plus the four-case delta refinement. The source's
    /// shipped default (`IMPROVED_BF_LOWER_BOUND1` + `_BOUND2`).
    #[default]
    ImprovedBf12,
}

/// Which dominance-rule family filters candidate sources at each node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DominanceConfig {
    /// `dominance_check[level] = max(dominance_check[level+1], src_level)`
    /// sweep. The source's shipped default (non-`TYPE1`).
    #[default]
    IndexSweep,
    /// The alternative index-sweep variant: the same reversal check as
    /// `IndexSweep`, but only looking back over the 3 most recent moves
    /// rather than the full trail.
    Type1,
    /// No pruning at all. Not a source configuration — a baseline for
    /// auditing that the reversal rule never discards an optimal branch.
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolverConfig {
    pub bound: BoundConfig,
    pub dominance: DominanceConfig,
    /// Iterative deepening (the default) vs. a single pure branch-and-bound pass.
    pub deepening: bool,
    /// Invoke the greedy heuristic at interior nodes to tighten the
    /// incumbent upper bound mid-search, in addition to the initial call.
    pub heuristic_at_nodes: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            bound: BoundConfig::default(),
            dominance: DominanceConfig::default(),
            deepening: true,
            heuristic_at_nodes: true,
        }
    }
}
