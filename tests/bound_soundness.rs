//! The lower bound must never exceed the true shortest solution length.
//! Checked against an independent brute-force BFS over tiny instances,
//! deliberately not built on top of `cpmp::solver` itself.

use std::collections::{HashSet, VecDeque};

use cpmp::bound::{lower_bound, BoundState};
use cpmp::config::BoundConfig;
use cpmp::state::State;
use cpmp::{Priority, Problem};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const MAX_DEPTH: usize = 16;

fn snapshot(state: &State, n_stack: usize) -> Vec<Vec<Priority>> {
    (0..n_stack)
        .map(|i| {
            let n_tier = state.stack_stats(i).n_tier;
            (0..n_tier).map(|t| state.block_at(i, t)).collect()
        })
        .collect()
}

/// Shortest relocation count reaching a clean state, found by breadth-first
/// search over raw stack configurations (priorities only — block identity
/// doesn't affect solvability).
fn true_optimal(problem: &Problem) -> usize {
    let n_stack = problem.n_stack();
    let start = State::new(problem);
    if start.is_solved() {
        return 0;
    }

    let mut seen = HashSet::new();
    seen.insert(snapshot(&start, n_stack));
    let mut frontier = VecDeque::new();
    frontier.push_back((start, 0usize));

    while let Some((state, depth)) = frontier.pop_front() {
        if depth >= MAX_DEPTH {
            continue;
        }
        for src in 0..n_stack {
            if state.top(src).is_none() {
                continue;
            }
            for dst in 0..n_stack {
                if dst == src || state.is_full(dst) {
                    continue;
                }
                let mut next = state.clone();
                let (block, priority) = next.top(src).unwrap();
                next.pop_src(src, (depth + 1) as i32).unwrap();
                next.push_dst(dst, block, priority, (depth + 1) as i32);
                if next.is_solved() {
                    return depth + 1;
                }
                if seen.insert(snapshot(&next, n_stack)) {
                    frontier.push_back((next, depth + 1));
                }
            }
        }
    }
    panic!("brute force exhausted depth bound {MAX_DEPTH} without reaching a clean state");
}

fn check_bound_soundness(problem: &Problem) {
    let state = State::new(problem);
    if state.is_solved() {
        return;
    }
    let mut bound = BoundState::new(problem, &state);
    let lb = lower_bound(problem, &state, &mut bound, i64::MAX, true, BoundConfig::ImprovedBf12);
    let optimal = true_optimal(problem) as i64;
    assert!(
        lb <= optimal,
        "lower bound {lb} exceeds the true optimal {optimal} for stacks {:?}",
        problem.stacks().collect::<Vec<_>>()
    );
}

#[test]
fn bound_never_exceeds_true_optimal_on_handcrafted_instances() {
    let instances = [
        Problem::new(2, 1, false, vec![vec![0, 1], vec![]]),
        Problem::new(3, 2, false, vec![vec![0, 1, 2], vec![], vec![]]),
        Problem::new(3, 2, false, vec![vec![2, 0, 1], vec![1, 0], vec![]]),
        Problem::new(4, 3, false, vec![vec![1, 0, 3, 1], vec![2, 0], vec![]]),
    ];
    for problem in &instances {
        check_bound_soundness(problem);
    }
}

#[test]
fn bound_never_exceeds_true_optimal_on_random_small_instances() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..25 {
        let n_stack = rng.gen_range(2..=3);
        let s_height = rng.gen_range(2..=3);
        let max_priority = rng.gen_range(0..=2) as Priority;

        // the last stack is always left empty, so every generated
        // instance is guaranteed solvable.
        let fillable = n_stack - 1;
        let mut blocks = vec![Vec::new(); n_stack];
        let total = rng.gen_range(1..=(fillable * s_height));
        for _ in 0..total {
            let candidates: Vec<usize> = (0..fillable).filter(|&i| blocks[i].len() < s_height).collect();
            if candidates.is_empty() {
                break;
            }
            let i = candidates[rng.gen_range(0..candidates.len())];
            let p = rng.gen_range(0..=max_priority);
            blocks[i].push(p);
        }

        let problem = Problem::new(s_height, max_priority, true, blocks);
        check_bound_soundness(&problem);
    }
}
