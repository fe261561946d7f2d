//! C3/C4 — bound state and the Bortfeldt–Förster lower-bound family.
//! Grounded on `pmp-1.01/solution.c` (`initialize_lb_state`,
//! `update_state_src`/`update_state_dst`'s bound-side effects) and
//! `pmp-1.01-fix/solve.c`'s `lower_bound`.

use crate::common::Priority;
use crate::config::BoundConfig;
use crate::problem::Problem;
use crate::state::{DstOutcome, SrcOutcome, State};

/// Demand/supply accounting kept in lockstep with [`State`]: everything
/// the lower-bound engine needs that cannot be derived from `State`
/// alone in less than linear time.
#[derive(Debug, Clone)]
pub struct BoundState {
    s_height: usize,
    demand: Vec<i64>,
    supply: Vec<i64>,
    removal_for_supply: Vec<Vec<i32>>,
    n_dirty_stack: usize,
    n_full_clean_stack: usize,
    pub lb_bx: i64,
    pub lb_gx: i64,
    pub lb: i64,
}

impl BoundState {
    pub fn new(problem: &Problem, state: &State) -> Self {
        let p = problem.max_priority() as usize;
        let s_height = problem.s_height();
        let n_stack = problem.n_stack();
        let mut demand = vec![0i64; p + 1];
        let mut supply = vec![0i64; p + 1];
        let mut removal_for_supply = vec![vec![0i32; p + 1]; n_stack];
        let mut n_dirty_stack = 0usize;
        let mut n_full_clean_stack = 0usize;

        for i in 0..n_stack {
            let stats = state.stack_stats(i);
            if stats.is_dirty() {
                n_dirty_stack += 1;
            } else if stats.n_tier == s_height {
                n_full_clean_stack += 1;
            }
            supply[stats.clean_priority as usize] += (s_height - stats.n_clean) as i64;

            // `base` pops clear any misoverlay; beyond that, walk the
            // clean prefix top-down (priorities only increase, weakly,
            // going toward the bottom) to find the minimal extra pops
            // needed to reach a clean top of priority >= p, for every p.
            let base = (stats.n_tier - stats.n_clean) as i32;
            for q in 0..=(stats.clean_priority as usize).min(p) {
                removal_for_supply[i][q] = base;
            }
            let mut extra = 0usize;
            let mut val = stats.clean_priority;
            for q in (stats.clean_priority as usize + 1)..=p {
                while (val as usize) < q && extra < stats.n_clean {
                    extra += 1;
                    val = if extra < stats.n_clean {
                        state.block_at(i, stats.n_clean - 1 - extra)
                    } else {
                        problem.max_priority()
                    };
                }
                removal_for_supply[i][q] = base + extra as i32;
            }
        }

        let mut b = BoundState {
            s_height,
            demand,
            supply,
            removal_for_supply,
            n_dirty_stack,
            n_full_clean_stack,
            lb_bx: 0,
            lb_gx: 0,
            lb: 0,
        };
        b.init_demand(problem, state);
        b
    }

    /// Demand is counted per misoverlaid *block*, so every stack's
    /// misoverlay region is scanned once at construction; thereafter
    /// `on_src`/`on_dst` keep it current in O(1) per move.
    fn init_demand(&mut self, problem: &Problem, state: &State) {
        self.demand.iter_mut().for_each(|d| *d = 0);
        for i in 0..problem.n_stack() {
            let stats = state.stack_stats(i);
            for t in stats.n_clean..stats.n_tier {
                self.demand[state.block_at(i, t) as usize] += 1;
            }
        }
    }

    pub fn n_dirty_stack(&self) -> usize {
        self.n_dirty_stack
    }

    pub fn n_full_clean_stack(&self) -> usize {
        self.n_full_clean_stack
    }

    /// Applies the bound-state side effects of a source-side pop.
    pub fn on_src(&mut self, outcome: &SrcOutcome, src: usize) {
        if outcome.is_bx {
            self.demand[outcome.priority as usize] -= 1;
            if outcome.after.n_clean == outcome.after.n_tier {
                self.n_dirty_stack -= 1;
            }
        } else {
            let old_cp = outcome.before.clean_priority as usize;
            let new_cp = outcome.after.clean_priority as usize;
            self.supply[old_cp] -= (self.s_height - outcome.before.n_clean) as i64;
            self.supply[new_cp] += (self.s_height - outcome.after.n_clean) as i64;
            for q in (old_cp + 1)..self.removal_for_supply[src].len() {
                self.removal_for_supply[src][q] -= 1;
            }
            if outcome.before.n_tier == self.s_height {
                self.n_full_clean_stack -= 1;
            }
        }
    }

    pub fn undo_src(&mut self, outcome: &SrcOutcome, src: usize) {
        if outcome.is_bx {
            self.demand[outcome.priority as usize] += 1;
            if outcome.after.n_clean == outcome.after.n_tier {
                self.n_dirty_stack += 1;
            }
        } else {
            let old_cp = outcome.before.clean_priority as usize;
            let new_cp = outcome.after.clean_priority as usize;
            self.supply[new_cp] -= (self.s_height - outcome.after.n_clean) as i64;
            self.supply[old_cp] += (self.s_height - outcome.before.n_clean) as i64;
            for q in (old_cp + 1)..self.removal_for_supply[src].len() {
                self.removal_for_supply[src][q] += 1;
            }
            if outcome.before.n_tier == self.s_height {
                self.n_full_clean_stack += 1;
            }
        }
    }

    /// Applies the bound-state side effects of a destination-side push.
    pub fn on_dst(&mut self, outcome: &DstOutcome, dst: usize, priority: Priority) {
        if outcome.is_xb {
            self.demand[priority as usize] += 1;
            if outcome.before.n_clean == outcome.before.n_tier {
                self.n_dirty_stack += 1;
            }
        } else {
            let old_cp = outcome.before.clean_priority as usize;
            let new_cp = outcome.after.clean_priority as usize;
            self.supply[old_cp] -= (self.s_height - outcome.before.n_clean) as i64;
            self.supply[new_cp] += (self.s_height - outcome.after.n_clean) as i64;
            for q in (new_cp + 1)..self.removal_for_supply[dst].len() {
                self.removal_for_supply[dst][q] += 1;
            }
            if outcome.after.n_tier == self.s_height {
                self.n_full_clean_stack += 1;
            }
        }
    }

    pub fn undo_dst(&mut self, outcome: &DstOutcome, dst: usize, priority: Priority) {
        if outcome.is_xb {
            self.demand[priority as usize] -= 1;
            if outcome.before.n_clean == outcome.before.n_tier {
                self.n_dirty_stack -= 1;
            }
        } else {
            let old_cp = outcome.before.clean_priority as usize;
            let new_cp = outcome.after.clean_priority as usize;
            self.supply[new_cp] -= (self.s_height - outcome.after.n_clean) as i64;
            self.supply[old_cp] += (self.s_height - outcome.before.n_clean) as i64;
            for q in (new_cp + 1)..self.removal_for_supply[dst].len() {
                self.removal_for_supply[dst][q] -= 1;
            }
            if outcome.after.n_tier == self.s_height {
                self.n_full_clean_stack -= 1;
            }
        }
    }
}

/// Computes `lb = lbBX + lbGX + delta` against `upper_bound`, reusing the
/// cached `lbGX` when `recompute_gx` is false (mirrors the source's
/// `lb_flag_src && lb_flag_dst` hint after a GX/XG-preserving move).
/// `config` selects how much of the refinement beyond plain `lbBX + lbGX`
/// to apply — see [`BoundConfig`].
pub fn lower_bound(
    problem: &Problem,
    state: &State,
    bound: &mut BoundState,
    upper_bound: i64,
    recompute_gx: bool,
    config: BoundConfig,
) -> i64 {
    let n_stack = problem.n_stack();
    let s_height = problem.s_height();

    let mut lb_bx = state.n_misoverlay() as i64;
    let no_slack = bound.n_dirty_stack + bound.n_full_clean_stack == n_stack;
    if no_slack && config != BoundConfig::Basic {
        let min_h = (0..n_stack)
            .filter_map(|i| {
                let s = state.stack_stats(i);
                s.is_dirty().then(|| (s.n_tier - s.n_clean) as i64)
            })
            .min()
            .unwrap_or(0);
        lb_bx += min_h;
    }
    bound.lb_bx = lb_bx;

    if lb_bx > upper_bound {
        bound.lb = lb_bx;
        return lb_bx;
    }

    if recompute_gx {
        let max_priority = problem.max_priority() as usize;
        let mut surplus = 0i64;
        let mut max_surplus = 0i64;
        let mut best_p = 0usize;
        for p in (0..=max_priority).rev() {
            surplus += bound.demand[p] - bound.supply[p];
            if surplus > max_surplus {
                max_surplus = surplus;
                best_p = p;
            }
        }
        let mut lb_gx = 0i64;
        if max_surplus > 0 {
            let n = ((max_surplus + s_height as i64 - 1) / s_height as i64) as i64;
            let mut bucket = vec![0i64; s_height + 1];
            for i in 0..n_stack {
                let stats = state.stack_stats(i);
                if (stats.clean_priority as usize) < best_p {
                    let cost = bound.removal_for_supply[i][best_p].max(0) as usize;
                    if cost < bucket.len() {
                        bucket[cost] += 1;
                    }
                }
            }
            let mut remaining = n;
            let mut k = 1usize;
            while remaining > 0 && k < s_height {
                let take = remaining.min(bucket[k]);
                lb_gx += (k as i64) * take;
                remaining -= take;
                k += 1;
            }
        }
        bound.lb_gx = lb_gx;
    }

    let mut lb = lb_bx + bound.lb_gx;
    if lb > upper_bound {
        bound.lb = lb;
        return lb;
    }

    if config == BoundConfig::ImprovedBf12 {
        lb += delta_refinement(problem, state, bound);
    }
    bound.lb = lb;
    lb
}

/// The four "nearly stuck" configurations from `solve.c`'s
/// `IMPROVED_BF_LOWER_BOUND2`, each contributing at most 1.
fn delta_refinement(problem: &Problem, state: &State, bound: &BoundState) -> i64 {
    let n_stack = problem.n_stack();
    let s_height = problem.s_height();

    let upside_down_satisfied = |target: Priority| -> bool {
        (0..n_stack).any(|i| {
            let s = state.stack_stats(i);
            s.is_dirty() && s.upside_down && s.misoverlay_priority <= target
        })
    };
    let slack_satisfied = |target: Priority| -> bool {
        (0..n_stack).any(|i| {
            let s = state.stack_stats(i);
            !s.is_dirty() && s.n_tier < s_height && s.misoverlay_priority <= target
        })
    };
    let any_dirty_misoverlay_at_most = |target: Priority| -> bool {
        (0..n_stack).any(|i| {
            let s = state.stack_stats(i);
            s.is_dirty() && s.misoverlay_priority <= target
        })
    };
    // Maximum `clean_priority` among stacks whose misoverlay height equals
    // `height` — these are the stacks one block away from shrinking
    // further, so the largest such priority is the tightest ceiling a
    // clean stack could offer them.
    let max_clean_priority_at_height = |height: usize| -> Priority {
        (0..n_stack)
            .filter(|&i| {
                let s = state.stack_stats(i);
                s.n_tier - s.n_clean == height
            })
            .map(|i| state.stack_stats(i).clean_priority)
            .max()
            .unwrap_or(0)
    };
    let min_dirty_misoverlay_height = || -> usize {
        (0..n_stack)
            .filter_map(|i| {
                let s = state.stack_stats(i);
                s.is_dirty().then(|| s.n_tier - s.n_clean)
            })
            .min()
            .unwrap_or(0)
    };

    if bound.n_dirty_stack == n_stack {
        // case (a): no slack clean stack at all.
        let max_clean_priority = max_clean_priority_at_height(min_dirty_misoverlay_height());
        return if upside_down_satisfied(max_clean_priority) { 0 } else { 1 };
    }

    if bound.n_dirty_stack == n_stack.saturating_sub(1) {
        // case (b): exactly one clean stack `s`.
        let clean = (0..n_stack).find(|&i| !state.stack_stats(i).is_dirty());
        if let Some(s_idx) = clean {
            let s_stats = state.stack_stats(s_idx);
            if s_stats.n_tier == s_height {
                // `s` is full: see whether another stack can still make
                // room for it before looking at `s`'s own buried blocks.
                let max_clean_priority = max_clean_priority_at_height(min_dirty_misoverlay_height());
                if max_clean_priority < s_stats.clean_priority {
                    return if upside_down_satisfied(max_clean_priority) { 0 } else { 1 };
                }

                // `s` itself might expose a lower priority once its run of
                // top-priority blocks is popped off.
                let top_priority = s_stats.clean_priority;
                let mut idx = s_stats.n_tier.checked_sub(2);
                let mut buried = None;
                while let Some(i) = idx {
                    if state.block_at(s_idx, i) != top_priority {
                        buried = Some(i);
                        break;
                    }
                    idx = i.checked_sub(1);
                }
                return match buried {
                    None => 0,
                    Some(i) => {
                        let adjusted = max_clean_priority.max(state.block_at(s_idx, i));
                        if adjusted < problem.max_priority() {
                            if any_dirty_misoverlay_at_most(adjusted) {
                                0
                            } else {
                                1
                            }
                        } else {
                            0
                        }
                    }
                };
            }
            let target = s_stats.clean_priority;
            let satisfied = upside_down_satisfied(target) || slack_satisfied(target);
            return if satisfied { 0 } else { 1 };
        }
    }

    if bound.lb_gx == 0 && bound.n_dirty_stack + bound.n_full_clean_stack == n_stack.saturating_sub(1) {
        // case (c): exactly one slack (non-full) clean stack.
        let target = (0..n_stack)
            .find(|&i| {
                let s = state.stack_stats(i);
                !s.is_dirty() && s.n_tier < s_height
            })
            .map(|i| state.stack_stats(i).clean_priority)
            .unwrap_or(problem.max_priority());
        return if upside_down_satisfied(target) { 0 } else { 1 };
    }

    if bound.n_dirty_stack == n_stack.saturating_sub(2) && bound.n_full_clean_stack < 2 {
        // case (d): exactly two clean stacks.
        let clean: Vec<usize> = (0..n_stack).filter(|&i| !state.stack_stats(i).is_dirty()).collect();
        if clean.len() == 2 {
            let a = state.stack_stats(clean[0]);
            let b = state.stack_stats(clean[1]);
            let target = a.clean_priority.min(b.clean_priority);
            let either_full = a.n_tier == s_height || b.n_tier == s_height;
            let satisfied = if either_full {
                upside_down_satisfied(target)
            } else {
                upside_down_satisfied(target) || slack_satisfied(target)
            };
            return if satisfied { 0 } else { 1 };
        }
    }

    0
}
