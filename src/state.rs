//! C2 — mutable tower configuration. Grounded on `pmp-1.01/solution.c`'s
//! `initialize_state`/`update_state_src`/`update_state_dst`: a single
//! owned [`State`] mutated in place via paired apply/undo calls rather
//! than copy-on-write, so the branch-and-bound hot path stays O(1) per
//! move plus O(1) cache bookkeeping.

use crate::common::{BlockId, Priority};
use crate::problem::Problem;

/// Per-stack statistics snapshot, cheap to copy for backup/restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackStats {
    pub n_tier: usize,
    pub n_clean: usize,
    pub clean_priority: Priority,
    pub misoverlay_priority: Priority,
    pub upside_down: bool,
}

impl StackStats {
    pub fn is_dirty(&self) -> bool {
        self.n_clean < self.n_tier
    }
}

#[derive(Debug, Clone)]
struct StackState {
    blocks: Vec<BlockId>,
    n_clean: usize,
    clean_priority: Priority,
    misoverlay_priority: Priority,
    upside_down: bool,
    last_change: i32,
    /// `cache[t]` holds `(misoverlay_priority, upside_down)` for the
    /// prefix of length `t + 1`, written whenever a dirty push extends
    /// the stack to that height. Only ever read at indices below the
    /// current occupancy, where the underlying blocks have not changed
    /// since the cache entry was written — see module docs.
    cache: Vec<(Priority, bool)>,
}

impl StackState {
    fn stats(&self) -> StackStats {
        StackStats {
            n_tier: self.blocks.len(),
            n_clean: self.n_clean,
            clean_priority: self.clean_priority,
            misoverlay_priority: self.misoverlay_priority,
            upside_down: self.upside_down,
        }
    }
}

/// Everything produced by popping the top of a source stack, sufficient
/// both to roll the move back and to drive the matching [`crate::bound`]
/// update.
#[derive(Debug, Clone, Copy)]
pub struct SrcOutcome {
    pub block: BlockId,
    pub priority: Priority,
    pub is_bx: bool,
    pub before: StackStats,
    pub after: StackStats,
    prev_last_relocation: u32,
    prev_last_change: i32,
}

/// Everything produced by pushing a block onto a destination stack.
#[derive(Debug, Clone, Copy)]
pub struct DstOutcome {
    pub is_xb: bool,
    pub before: StackStats,
    pub after: StackStats,
    prev_last_change: i32,
}

/// Owns the current tower configuration: per-stack contents and derived
/// statistics, the global misoverlay count, and the per-block relocation
/// history used by the reversal dominance rule.
#[derive(Debug, Clone)]
pub struct State {
    s_height: usize,
    max_priority: Priority,
    block_priority: Vec<Priority>,
    last_relocation: Vec<u32>,
    stacks: Vec<StackState>,
    n_misoverlay: usize,
}

impl State {
    pub fn new(problem: &Problem) -> Self {
        let s_height = problem.s_height();
        let max_priority = problem.max_priority();
        let mut block_priority = Vec::with_capacity(problem.n_block());
        let mut stacks = Vec::with_capacity(problem.n_stack());
        let mut n_misoverlay = 0usize;

        for raw in problem.stacks() {
            let mut blocks = Vec::with_capacity(s_height);
            let mut cache = vec![(0, false); s_height];
            let mut n_clean = 0usize;
            let mut clean_priority = max_priority;
            let mut misoverlay_priority = 0;
            let mut upside_down = false;

            for (t, &priority) in raw.iter().enumerate() {
                let id = block_priority.len();
                block_priority.push(priority);
                blocks.push(id);

                let fully_clean_so_far = n_clean == t;
                if fully_clean_so_far && priority <= clean_priority {
                    n_clean = t + 1;
                    clean_priority = priority;
                } else if fully_clean_so_far {
                    // first misoverlaid block
                    misoverlay_priority = priority;
                    upside_down = true;
                    n_misoverlay += 1;
                    cache[t] = (misoverlay_priority, upside_down);
                } else {
                    upside_down = upside_down && priority <= misoverlay_priority;
                    misoverlay_priority = misoverlay_priority.max(priority);
                    n_misoverlay += 1;
                    cache[t] = (misoverlay_priority, upside_down);
                }
            }

            stacks.push(StackState {
                blocks,
                n_clean,
                clean_priority,
                misoverlay_priority,
                upside_down,
                last_change: 0,
                cache,
            });
        }

        let last_relocation = vec![0; block_priority.len()];
        State {
            s_height,
            max_priority,
            block_priority,
            last_relocation,
            stacks,
            n_misoverlay,
        }
    }

    pub fn n_stack(&self) -> usize {
        self.stacks.len()
    }

    pub fn s_height(&self) -> usize {
        self.s_height
    }

    pub fn n_misoverlay(&self) -> usize {
        self.n_misoverlay
    }

    pub fn is_solved(&self) -> bool {
        self.n_misoverlay == 0
    }

    pub fn stack_stats(&self, i: usize) -> StackStats {
        self.stacks[i].stats()
    }

    pub fn is_full(&self, i: usize) -> bool {
        self.stacks[i].blocks.len() == self.s_height
    }

    pub fn top(&self, i: usize) -> Option<(BlockId, Priority)> {
        self.stacks[i].blocks.last().map(|&b| (b, self.block_priority[b]))
    }

    /// Priority of the block currently at tier `t` of stack `i` (0-based
    /// from the bottom). Used to walk a clean prefix top-down when
    /// (re)computing `removal_for_supply` from scratch.
    pub fn block_at(&self, i: usize, t: usize) -> Priority {
        self.block_priority[self.stacks[i].blocks[t]]
    }

    pub fn block_priority(&self, block: BlockId) -> Priority {
        self.block_priority[block]
    }

    pub fn last_relocation(&self, block: BlockId) -> u32 {
        self.last_relocation[block]
    }

    pub fn last_change(&self, i: usize) -> i32 {
        self.stacks[i].last_change
    }

    /// Pops the top of stack `i`, recording `level` as the move index.
    /// Returns `None` if the stack is empty.
    pub fn pop_src(&mut self, i: usize, level: i32) -> Option<SrcOutcome> {
        let before = self.stacks[i].stats();
        if before.n_tier == 0 {
            return None;
        }
        let is_bx = before.n_clean < before.n_tier;
        let stack = &mut self.stacks[i];
        let block = stack.blocks.pop().unwrap();
        let priority = self.block_priority[block];
        let prev_last_relocation = self.last_relocation[block];
        self.last_relocation[block] = level as u32;
        let prev_last_change = stack.last_change;
        stack.last_change = -level;

        let new_n_tier = before.n_tier - 1;
        if is_bx {
            if new_n_tier == before.n_clean {
                // misoverlay fully cleared: stack becomes clean (BG)
                stack.n_clean = new_n_tier;
                stack.clean_priority = if new_n_tier > 0 {
                    self.block_priority[stack.blocks[new_n_tier - 1]]
                } else {
                    self.max_priority
                };
                stack.misoverlay_priority = 0;
                stack.upside_down = false;
            } else {
                // still dirty (BB): read the cached prefix stats
                let (mp, ud) = stack.cache[new_n_tier - 1];
                stack.misoverlay_priority = mp;
                stack.upside_down = ud;
            }
            self.n_misoverlay -= 1;
        } else {
            // clean stack shrinks (GX): new top is still within the
            // clean prefix, read directly.
            stack.n_clean = new_n_tier;
            stack.clean_priority = if new_n_tier > 0 {
                self.block_priority[stack.blocks[new_n_tier - 1]]
            } else {
                self.max_priority
            };
        }

        let after = self.stacks[i].stats();
        Some(SrcOutcome {
            block,
            priority,
            is_bx,
            before,
            after,
            prev_last_relocation,
            prev_last_change,
        })
    }

    pub fn undo_src(&mut self, i: usize, outcome: &SrcOutcome) {
        let stack = &mut self.stacks[i];
        stack.blocks.push(outcome.block);
        stack.n_clean = outcome.before.n_clean;
        stack.clean_priority = outcome.before.clean_priority;
        stack.misoverlay_priority = outcome.before.misoverlay_priority;
        stack.upside_down = outcome.before.upside_down;
        stack.last_change = outcome.prev_last_change;
        self.last_relocation[outcome.block] = outcome.prev_last_relocation;
        if outcome.is_bx {
            self.n_misoverlay += 1;
        }
    }

    /// Pushes `block` (of `priority`) onto stack `j`, recording `level`.
    pub fn push_dst(&mut self, j: usize, block: BlockId, priority: Priority, level: i32) -> DstOutcome {
        let before = self.stacks[j].stats();
        let stays_clean = before.n_clean == before.n_tier && priority <= before.clean_priority;
        let stack = &mut self.stacks[j];
        let t = stack.blocks.len();
        stack.blocks.push(block);
        let prev_last_change = stack.last_change;
        stack.last_change = level;

        if stays_clean {
            stack.n_clean = t + 1;
            stack.clean_priority = priority;
        } else if before.n_clean == before.n_tier {
            // first misoverlay on top of a clean stack (GB)
            stack.misoverlay_priority = priority;
            stack.upside_down = true;
            stack.cache[t] = (priority, true);
        } else {
            // extends an existing misoverlay (BB)
            let (prev_mp, prev_ud) = stack.cache[t - 1];
            let new_mp = prev_mp.max(priority);
            let new_ud = prev_ud && priority <= prev_mp;
            stack.misoverlay_priority = new_mp;
            stack.upside_down = new_ud;
            stack.cache[t] = (new_mp, new_ud);
        }

        if !stays_clean {
            self.n_misoverlay += 1;
        }

        let after = self.stacks[j].stats();
        DstOutcome {
            is_xb: !stays_clean,
            before,
            after,
            prev_last_change,
        }
    }

    pub fn undo_dst(&mut self, j: usize, outcome: &DstOutcome) {
        let stack = &mut self.stacks[j];
        stack.blocks.pop();
        stack.n_clean = outcome.before.n_clean;
        stack.clean_priority = outcome.before.clean_priority;
        stack.misoverlay_priority = outcome.before.misoverlay_priority;
        stack.upside_down = outcome.before.upside_down;
        stack.last_change = outcome.prev_last_change;
        if outcome.is_xb {
            self.n_misoverlay -= 1;
        }
    }

    /// Re-derives every invariant from scratch and compares against the
    /// incrementally maintained fields; used only by tests.
    #[cfg(any(test, debug_assertions))]
    pub fn verify(&self) -> Result<(), crate::error::SolveError> {
        use crate::error::SolveError;
        let mut total_misoverlay = 0usize;
        for (i, stack) in self.stacks.iter().enumerate() {
            let mut n_clean = 0usize;
            let mut prev = self.max_priority + 1;
            for (t, &b) in stack.blocks.iter().enumerate() {
                let p = self.block_priority[b];
                if n_clean == t && p <= prev {
                    n_clean = t + 1;
                }
                prev = p;
            }
            if n_clean != stack.n_clean {
                return Err(SolveError::InvariantViolation(format!(
                    "stack {i}: n_clean mismatch: cached {} vs recomputed {}",
                    stack.n_clean, n_clean
                )));
            }
            let expected_clean_priority = if n_clean > 0 {
                self.block_priority[stack.blocks[n_clean - 1]]
            } else {
                self.max_priority
            };
            if expected_clean_priority != stack.clean_priority {
                return Err(SolveError::InvariantViolation(format!(
                    "stack {i}: clean_priority mismatch"
                )));
            }
            let mis: Vec<Priority> = stack.blocks[n_clean..].iter().map(|&b| self.block_priority[b]).collect();
            let expected_mp = mis.iter().copied().max().unwrap_or(0);
            if expected_mp != stack.misoverlay_priority {
                return Err(SolveError::InvariantViolation(format!(
                    "stack {i}: misoverlay_priority mismatch"
                )));
            }
            let expected_ud = mis.first().map(|&p| p == expected_mp).unwrap_or(false);
            if expected_ud != stack.upside_down {
                return Err(SolveError::InvariantViolation(format!("stack {i}: upside_down mismatch")));
            }
            if !(stack.n_clean <= stack.blocks.len() && stack.blocks.len() <= self.s_height) {
                return Err(SolveError::InvariantViolation(format!("stack {i}: bounds violated")));
            }
            total_misoverlay += mis.len();
        }
        if total_misoverlay != self.n_misoverlay {
            return Err(SolveError::InvariantViolation("n_misoverlay mismatch".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::Problem;

    fn problem() -> Problem {
        // stack 0 clean (bottom to top: 1, 0), stack 1 two-block
        // upside-down misoverlay on a clean prefix, stack 2 empty.
        Problem::new(4, 3, false, vec![vec![1, 0], vec![2, 0, 3, 1], vec![]])
    }

    #[test]
    fn initial_stats_match_verify() {
        let state = State::new(&problem());
        assert!(state.verify().is_ok());
        assert_eq!(state.n_misoverlay(), 2);
        let s0 = state.stack_stats(0);
        assert!(!s0.is_dirty());
        let s1 = state.stack_stats(1);
        assert!(s1.is_dirty());
        assert!(s1.upside_down);
        assert_eq!(s1.misoverlay_priority, 3);
    }

    #[test]
    fn pop_push_round_trips_through_undo() {
        let mut state = State::new(&problem());
        let before = state.clone();

        let src_outcome = state.pop_src(1, 1).unwrap();
        let dst_outcome = state.push_dst(0, src_outcome.block, src_outcome.priority, 1);
        assert!(state.verify().is_ok());

        state.undo_dst(0, &dst_outcome);
        state.undo_src(1, &src_outcome);

        assert_eq!(state.n_misoverlay(), before.n_misoverlay());
        assert_eq!(state.stack_stats(0), before.stack_stats(0));
        assert_eq!(state.stack_stats(1), before.stack_stats(1));
    }

    #[test]
    fn clearing_a_misoverlay_reaches_solved() {
        let mut state = State::new(&Problem::new(2, 1, false, vec![vec![0, 1], vec![]]));
        assert!(!state.is_solved());
        let src_outcome = state.pop_src(0, 1).unwrap();
        state.push_dst(1, src_outcome.block, src_outcome.priority, 1);
        assert!(state.is_solved());
        assert!(state.verify().is_ok());
    }
}

