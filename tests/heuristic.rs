//! Admissibility of the greedy constructive heuristic: whenever it
//! reports success, the returned move sequence is a real solution and
//! does not exceed the upper bound it was given.

use cpmp::heuristic::{run, HeuristicOutcome};
use cpmp::state::State;
use cpmp::Problem;

fn replay_is_clean(problem: &Problem, moves: &[cpmp::Move]) -> bool {
    let mut state = State::new(problem);
    for (k, mv) in moves.iter().enumerate() {
        let Some((block, priority)) = state.top(mv.src) else {
            return false;
        };
        if block != mv.block || priority != mv.priority || state.is_full(mv.dst) {
            return false;
        }
        state.pop_src(mv.src, k as i32 + 1).unwrap();
        state.push_dst(mv.dst, block, priority, k as i32 + 1);
    }
    state.verify().is_ok() && state.is_solved()
}

#[test]
fn success_sequence_actually_cleans_every_stack() {
    let instances = [
        Problem::new(4, 3, false, vec![vec![1, 0, 3, 1], vec![2, 0], vec![]]),
        Problem::new(3, 2, false, vec![vec![2, 0, 1], vec![1, 0], vec![]]),
        Problem::new(2, 1, false, vec![vec![0, 1], vec![]]),
    ];
    for problem in &instances {
        let state = State::new(problem);
        match run(problem, &state, 200) {
            HeuristicOutcome::Success(moves) => {
                assert!(moves.len() < 200);
                assert!(replay_is_clean(problem, &moves));
            }
            HeuristicOutcome::Failure => panic!("heuristic should have found a BG/GG solution"),
        }
    }
}

#[test]
fn success_length_never_reaches_the_upper_bound() {
    let problem = Problem::new(4, 3, false, vec![vec![1, 0, 3, 1], vec![2, 0], vec![]]);
    let state = State::new(&problem);
    match run(&problem, &state, 3) {
        HeuristicOutcome::Success(moves) => assert!(moves.len() < 3),
        HeuristicOutcome::Failure => {}
    }
}
