//! C5 — greedy constructive heuristic. Grounded on
//! `pmp-1.01-fix/heuristics.c`: prefer BG relocations, fall back to GG,
//! fail when neither is available or the move count reaches the budget.

use crate::common::Move;
use crate::problem::Problem;
use crate::state::State;

pub enum HeuristicOutcome {
    /// A complete, valid move sequence shorter than the upper bound.
    Success(Vec<Move>),
    /// No BG/GG candidate existed, or the move count reached `upper_bound`.
    Failure,
}

/// Runs the heuristic against a private clone of `state`; never mutates
/// the caller's search state.
pub fn run(problem: &Problem, state: &State, upper_bound: usize) -> HeuristicOutcome {
    let mut state = state.clone();
    let mut moves = Vec::new();
    let s_height = problem.s_height();
    let n_stack = problem.n_stack();

    let mut clean_stack: Vec<(usize, u32)> = Vec::new();
    let mut dirty_stack: Vec<usize> = Vec::new();
    for i in 0..n_stack {
        let s = state.stack_stats(i);
        if s.is_dirty() {
            dirty_stack.push(i);
        } else if s.n_tier < s_height {
            clean_stack.push((i, s.clean_priority));
        }
    }
    clean_stack.sort_by(|a, b| b.1.cmp(&a.1));

    let mut last_dst: Option<usize> = None;
    let mut level: i32 = 0;

    while !state.is_solved() {
        if moves.len() >= upper_bound {
            return HeuristicOutcome::Failure;
        }
        level += 1;

        // Step 1: prefer BG.
        let mut best_bg: Option<(usize, usize, i64, u32, usize)> = None; // (src, dst, decrease, src_cp, src_mis)
        for &src in &dirty_stack {
            let (_, p) = state.top(src).unwrap();
            if let Some(&(dst, cp)) = clean_stack.iter().rev().find(|&&(_, cp)| cp >= p) {
                let decrease = cp as i64 - p as i64;
                let src_stats = state.stack_stats(src);
                let src_cp = src_stats.clean_priority;
                let src_mis = src_stats.n_tier - src_stats.n_clean;
                let candidate = (src, dst, decrease, src_cp, src_mis);
                best_bg = Some(match best_bg {
                    None => candidate,
                    Some(cur) => {
                        if decrease < cur.2
                            || (decrease == cur.2 && src_cp > cur.3)
                            || (decrease == cur.2 && src_cp == cur.3 && src_mis > cur.4)
                        {
                            candidate
                        } else {
                            cur
                        }
                    }
                });
            }
        }

        let (src, dst, is_bg) = if let Some((src, dst, _, _, _)) = best_bg {
            (src, dst, true)
        } else {
            // Step 2: fall back to GG.
            let mut best_gg: Option<(usize, usize, i64, u32, usize)> = None; // (src, dst, increase, exposed, src_tier)
            for &(i, cp) in &clean_stack {
                if Some(i) == last_dst {
                    continue;
                }
                let stats = state.stack_stats(i);
                if stats.n_tier == 0 {
                    continue;
                }
                let exposed = if stats.n_clean >= 2 {
                    state.block_at(i, stats.n_clean - 2)
                } else {
                    problem.max_priority()
                };
                if exposed <= cp {
                    continue;
                }
                if let Some(&(dst, dst_cp)) = clean_stack.iter().rev().find(|&&(j, cp_j)| j != i && cp_j >= cp) {
                    let increase = exposed as i64 - cp as i64;
                    let candidate = (i, dst, increase, exposed, stats.n_tier);
                    let _ = dst_cp;
                    best_gg = Some(match best_gg {
                        None => candidate,
                        Some(cur) => {
                            if increase > cur.2
                                || (increase == cur.2 && exposed > cur.3)
                                || (increase == cur.2 && exposed == cur.3 && stats.n_tier < cur.4)
                            {
                                candidate
                            } else {
                                cur
                            }
                        }
                    });
                }
            }
            match best_gg {
                Some((src, dst, _, _, _)) => (src, dst, false),
                None => return HeuristicOutcome::Failure,
            }
        };

        let (block, priority) = state.top(src).unwrap();
        let src_outcome = state.pop_src(src, level).unwrap();
        let dst_outcome = state.push_dst(dst, block, priority, level);
        moves.push(Move {
            src,
            dst,
            block,
            priority,
        });

        // Update clean_stack / dirty_stack bookkeeping.
        remove_clean(&mut clean_stack, dst);
        let dst_after = dst_outcome.after;
        if dst_after.n_tier < s_height {
            insert_clean(&mut clean_stack, dst, dst_after.clean_priority);
        }

        if is_bg {
            dirty_stack.retain(|&x| x != src);
            let src_after = src_outcome.after;
            if src_after.n_clean == src_after.n_tier && src_after.n_tier < s_height {
                insert_clean(&mut clean_stack, src, src_after.clean_priority);
            }
        } else {
            remove_clean(&mut clean_stack, src);
            let src_after = src_outcome.after;
            insert_clean(&mut clean_stack, src, src_after.clean_priority);
        }

        last_dst = Some(dst);

        if clean_stack.is_empty() && !state.is_solved() {
            return HeuristicOutcome::Failure;
        }
    }

    if moves.len() < upper_bound {
        HeuristicOutcome::Success(moves)
    } else {
        HeuristicOutcome::Failure
    }
}

fn remove_clean(clean_stack: &mut Vec<(usize, u32)>, stack: usize) {
    clean_stack.retain(|&(i, _)| i != stack);
}

fn insert_clean(clean_stack: &mut Vec<(usize, u32)>, stack: usize, priority: u32) {
    let pos = clean_stack.partition_point(|&(_, cp)| cp > priority);
    clean_stack.insert(pos, (stack, priority));
}
