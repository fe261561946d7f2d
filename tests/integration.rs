//! End-to-end scenarios: parse an instance, solve it, and check the
//! returned relocation sequence actually cleans every stack.

use cpmp::config::{DominanceConfig, SolverConfig};
use cpmp::cutoff::NoCutoff;
use cpmp::parser::{parse, ParseOverrides};
use cpmp::solver::solve;
use cpmp::state::State;
use cpmp::{Completion, Problem};

fn replay_is_clean(problem: &Problem, moves: &[cpmp::Move]) -> bool {
    let mut state = State::new(problem);
    for (k, mv) in moves.iter().enumerate() {
        let Some((block, priority)) = state.top(mv.src) else {
            return false;
        };
        if block != mv.block || priority != mv.priority || state.is_full(mv.dst) {
            return false;
        }
        let src_outcome = state.pop_src(mv.src, k as i32 + 1).unwrap();
        state.push_dst(mv.dst, block, priority, k as i32 + 1);
        let _ = src_outcome;
    }
    state.verify().is_ok() && state.is_solved()
}

#[test]
fn already_clean_instance_needs_no_moves() {
    let problem = Problem::new(3, 2, false, vec![vec![1, 0], vec![0], vec![]]);
    let outcome = solve(&problem, SolverConfig::default(), &NoCutoff);
    assert_eq!(outcome.completion, Completion::Found);
    assert!(outcome.moves.is_empty());
}

#[test]
fn single_misoverlay_is_resolved_optimally() {
    // one block out of place; one relocation suffices and is optimal.
    let problem = Problem::new(2, 1, false, vec![vec![0, 1], vec![]]);
    let outcome = solve(&problem, SolverConfig::default(), &NoCutoff);
    assert_eq!(outcome.completion, Completion::Found);
    assert_eq!(outcome.moves.len(), 1);
    assert!(replay_is_clean(&problem, &outcome.moves));
}

#[test]
fn three_stack_instance_solves_and_verifies() {
    let problem = Problem::new(4, 3, false, vec![vec![1, 0, 3, 1], vec![2, 0], vec![]]);
    let outcome = solve(&problem, SolverConfig::default(), &NoCutoff);
    assert_eq!(outcome.completion, Completion::Found);
    assert!(replay_is_clean(&problem, &outcome.moves));
}

#[test]
fn format_b_instance_round_trips_through_parser_and_solver() {
    let text = "Tiers: 3\nStack 0: 1 0 2\nStack 1:\n";
    let parsed = parse(text, ParseOverrides::default()).unwrap();
    let problem = parsed.into_problem();
    let outcome = solve(&problem, SolverConfig::default(), &NoCutoff);
    assert_eq!(outcome.completion, Completion::Found);
    assert!(replay_is_clean(&problem, &outcome.moves));
}

#[test]
fn solver_is_deterministic_across_runs() {
    let problem = Problem::new(3, 3, false, vec![vec![1, 0, 2], vec![0, 1], vec![]]);
    let a = solve(&problem, SolverConfig::default(), &NoCutoff);
    let b = solve(&problem, SolverConfig::default(), &NoCutoff);
    assert_eq!(a.moves, b.moves);
}

#[test]
fn dominance_pruning_never_changes_the_optimum() {
    let instances = [
        Problem::new(2, 1, false, vec![vec![0, 1], vec![]]),
        Problem::new(3, 2, false, vec![vec![0, 1, 2], vec![], vec![]]),
        Problem::new(3, 2, false, vec![vec![2, 0, 1], vec![1, 0], vec![]]),
        Problem::new(4, 3, false, vec![vec![1, 0, 3, 1], vec![2, 0], vec![]]),
    ];
    for problem in &instances {
        let pruned = solve(
            problem,
            SolverConfig { dominance: DominanceConfig::IndexSweep, ..SolverConfig::default() },
            &NoCutoff,
        );
        let unpruned = solve(
            problem,
            SolverConfig { dominance: DominanceConfig::None, ..SolverConfig::default() },
            &NoCutoff,
        );
        assert_eq!(pruned.completion, Completion::Found);
        assert_eq!(unpruned.completion, Completion::Found);
        assert_eq!(pruned.moves.len(), unpruned.moves.len());
    }
}
