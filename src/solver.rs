//! C6 — iterative-deepening branch-and-bound driver. Grounded on
//! `pmp-1.01-fix/solve.c`'s `bb`/`bb_sub`: an outer loop over a rising
//! move-count ceiling (`cub`), each round a depth-bounded recursive
//! search that ranks children by trial lower bound before committing to
//! any of them.

use crate::bound::{lower_bound, BoundState};
use crate::common::{Completion, Move, Priority};
use crate::config::SolverConfig;
use crate::cutoff::Cutoff;
use crate::dominance::DominanceScratch;
use crate::heuristic::{self, HeuristicOutcome};
use crate::problem::{Problem, MAX_RELOCATIONS};
use crate::state::State;

/// Result of a full `solve()` call.
#[derive(Debug, Clone)]
pub struct SolveOutcome {
    /// The best relocation sequence found. Empty iff the instance was
    /// already solved, or none was found before a cutoff.
    pub moves: Vec<Move>,
    /// `Found` means `moves` is proven optimal. `TimeLimit` means `moves`
    /// is the best incumbent seen (possibly empty), with no optimality
    /// guarantee. `Exhausted` means every ceiling up to the heuristic's
    /// incumbent (or `MAX_RELOCATIONS` if the heuristic never succeeded)
    /// was searched to completion with no solution at all — the instance
    /// is infeasible within that budget, and `moves` is empty.
    pub completion: Completion,
    pub nodes_visited: u64,
}

struct Incumbent {
    best_len: usize,
    best_moves: Option<Vec<Move>>,
}

/// Runs the branch-and-bound search to completion, a proven cutoff, or a
/// wall-clock budget.
pub fn solve(problem: &Problem, config: SolverConfig, cutoff: &impl Cutoff) -> SolveOutcome {
    let state = State::new(problem);
    let mut nodes = 0u64;

    if state.is_solved() {
        return SolveOutcome {
            moves: Vec::new(),
            completion: Completion::Found,
            nodes_visited: 0,
        };
    }

    let mut bound0 = BoundState::new(problem, &state);
    let initial_lb = lower_bound(problem, &state, &mut bound0, i64::MAX, true, config.bound);

    let mut incumbent = Incumbent {
        best_len: MAX_RELOCATIONS,
        best_moves: None,
    };
    if let HeuristicOutcome::Success(moves) = heuristic::run(problem, &state, MAX_RELOCATIONS) {
        incumbent.best_len = moves.len();
        incumbent.best_moves = Some(moves);
    }

    let mut cub = initial_lb.max(1);
    let mut last_completion = Completion::Exhausted;

    loop {
        if cub as usize >= incumbent.best_len {
            // every ceiling up to the incumbent has been exhausted with
            // nothing shorter found, which proves the incumbent optimal —
            // unless there never was one, in which case the instance is
            // infeasible within `MAX_RELOCATIONS`.
            if incumbent.best_moves.is_some() {
                last_completion = Completion::Found;
            }
            break;
        }
        if cutoff.must_stop() {
            last_completion = Completion::TimeLimit;
            break;
        }

        let mut state_trial = state.clone();
        let mut bound_trial = bound0.clone();
        let dominance = DominanceScratch::new(config.dominance);
        let mut trail = Vec::new();

        let completion = bb(
            problem,
            &mut state_trial,
            &mut bound_trial,
            cub,
            0,
            &config,
            &dominance,
            cutoff,
            &mut trail,
            &mut nodes,
            &mut incumbent,
        );

        match completion {
            Completion::Found => {
                incumbent.best_len = trail.len();
                incumbent.best_moves = Some(trail);
                last_completion = Completion::Found;
                break;
            }
            Completion::TimeLimit => {
                last_completion = Completion::TimeLimit;
                break;
            }
            Completion::Exhausted => {
                last_completion = Completion::Exhausted;
                if !config.deepening {
                    break;
                }
                cub += 1;
            }
        }
    }

    SolveOutcome {
        moves: incumbent.best_moves.unwrap_or_default(),
        completion: last_completion,
        nodes_visited: nodes,
    }
}

struct Candidate {
    src: usize,
    dst: usize,
    block: usize,
    priority: Priority,
    lb: i64,
    misoverlay_after: usize,
    relocation_cost: i64,
}

#[allow(clippy::too_many_arguments)]
fn bb(
    problem: &Problem,
    state: &mut State,
    bound: &mut BoundState,
    cub: i64,
    level: i32,
    config: &SolverConfig,
    dominance: &DominanceScratch,
    cutoff: &impl Cutoff,
    trail: &mut Vec<Move>,
    nodes: &mut u64,
    incumbent: &mut Incumbent,
) -> Completion {
    *nodes += 1;
    if *nodes % 200_000 == 0 && cutoff.must_stop() {
        return Completion::TimeLimit;
    }

    if state.is_solved() {
        return Completion::Found;
    }
    if level as i64 >= cub {
        return Completion::Exhausted;
    }

    if config.heuristic_at_nodes && *nodes % 50_000 == 0 {
        probe_heuristic(problem, state, trail, incumbent);
    }

    let n_stack = problem.n_stack();
    let suffix_max_src = dominance.suffix_max_src(trail);
    let mut candidates = Vec::new();
    for src in 0..n_stack {
        let Some((block, priority)) = state.top(src) else {
            continue;
        };
        if dominance.skip_source(state, trail, src) {
            continue;
        }
        for dst in 0..n_stack {
            if dst == src || state.is_full(dst) {
                continue;
            }
            if dominance.skip_pair(state, &suffix_max_src, src, dst) {
                continue;
            }
            let src_outcome = state.pop_src(src, level + 1).unwrap();
            let dst_outcome = state.push_dst(dst, block, priority, level + 1);
            bound.on_src(&src_outcome, src);
            bound.on_dst(&dst_outcome, dst, priority);

            let lb = lower_bound(problem, state, bound, cub - 1, true, config.bound);
            let misoverlay_after = state.n_misoverlay();
            let relocation_cost = if !dst_outcome.before.is_dirty() {
                dst_outcome.before.clean_priority as i64 - priority as i64
            } else {
                0
            };

            bound.undo_dst(&dst_outcome, dst, priority);
            bound.undo_src(&src_outcome, src);
            state.undo_dst(dst, &dst_outcome);
            state.undo_src(src, &src_outcome);

            if lb < cub {
                candidates.push(Candidate {
                    src,
                    dst,
                    block,
                    priority,
                    lb,
                    misoverlay_after,
                    relocation_cost,
                });
            }
        }
    }

    // Best-first: smaller lb, fewer misoverlays, larger moved priority,
    // smaller relocation_cost, then a deterministic tiebreak on stack
    // indices.
    candidates.sort_by(|a, b| {
        a.lb.cmp(&b.lb)
            .then(a.misoverlay_after.cmp(&b.misoverlay_after))
            .then(b.priority.cmp(&a.priority))
            .then(a.relocation_cost.cmp(&b.relocation_cost))
            .then(a.src.cmp(&b.src))
            .then(a.dst.cmp(&b.dst))
    });

    for c in &candidates {
        let src_outcome = state.pop_src(c.src, level + 1).unwrap();
        let dst_outcome = state.push_dst(c.dst, c.block, c.priority, level + 1);
        bound.on_src(&src_outcome, c.src);
        bound.on_dst(&dst_outcome, c.dst, c.priority);
        trail.push(Move {
            src: c.src,
            dst: c.dst,
            block: c.block,
            priority: c.priority,
        });

        let outcome = bb(
            problem, state, bound, cub, level + 1, config, dominance, cutoff, trail, nodes, incumbent,
        );

        if outcome == Completion::Found {
            return Completion::Found;
        }

        trail.pop();
        bound.undo_dst(&dst_outcome, c.dst, c.priority);
        bound.undo_src(&src_outcome, c.src);
        state.undo_dst(c.dst, &dst_outcome);
        state.undo_src(c.src, &src_outcome);

        if outcome == Completion::TimeLimit {
            return Completion::TimeLimit;
        }
    }

    Completion::Exhausted
}

/// Interior-node probe: try completing the current partial solution with
/// the greedy heuristic; record it as the new incumbent if it beats the
/// best known length. Never commits any move to `state` — it works
/// against the heuristic's own private clone.
fn probe_heuristic(problem: &Problem, state: &State, trail: &[Move], incumbent: &mut Incumbent) {
    let remaining_budget = incumbent.best_len.saturating_sub(trail.len());
    if remaining_budget == 0 {
        return;
    }
    if let HeuristicOutcome::Success(suffix) = heuristic::run(problem, state, remaining_budget) {
        let total = trail.len() + suffix.len();
        if total < incumbent.best_len {
            let mut moves = trail.to_vec();
            moves.extend(suffix);
            incumbent.best_len = total;
            incumbent.best_moves = Some(moves);
        }
    }
}
