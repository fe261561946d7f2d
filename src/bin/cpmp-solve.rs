//! Command-line front end. Grounded on `pmp-1.01/main.c`'s argument
//! handling (`-v|-s`, `-S`, `-T`, `-E`, `-t`, optional input file) and
//! `ddo/examples/knapsack/main.rs`'s `clap`-derive/`Args` shape.

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Parser;
use cpmp::config::SolverConfig;
use cpmp::cutoff::{NoCutoff, TimeBudget};
use cpmp::parser::{parse, ParseOverrides};
use cpmp::pretty::{format_moves, format_problem};
use cpmp::solver::solve;
use cpmp::Completion;

#[derive(Parser, Debug)]
#[command(author, version, about = "Branch-and-bound solver for the container premarshalling problem.")]
struct Args {
    /// Instance file; reads stdin when omitted.
    input: Option<PathBuf>,

    /// Verbose: print the parsed instance before solving.
    #[arg(short = 'v', long, conflicts_with = "silent")]
    verbose: bool,

    /// Silent (the default): suppress the instance dump.
    #[arg(short = 's', long)]
    silent: bool,

    /// Number of stacks, overriding (by widening) any header value.
    #[arg(short = 'S', long = "stacks")]
    n_stack: Option<usize>,

    /// Stack height, overriding any header value.
    #[arg(short = 'T', long = "height")]
    s_height: Option<usize>,

    /// Additional empty tiers added on top of a `Tiers:`/`Height:` header value.
    #[arg(short = 'E', long = "empty-tiers")]
    n_empty_tier: Option<usize>,

    /// Wall-clock time limit in seconds; runs to completion when omitted.
    #[arg(short = 't', long = "time-limit")]
    time_limit: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let text = match &args.input {
        Some(path) => fs::read_to_string(path)?,
        None => std::io::read_to_string(std::io::stdin())?,
    };

    let overrides = ParseOverrides {
        n_stack: args.n_stack,
        s_height: args.s_height,
        n_empty_tier: args.n_empty_tier,
    };
    let parsed = parse(&text, overrides)?;
    let problem = parsed.into_problem();

    if args.verbose {
        eprint!("{}", format_problem(&problem));
    }

    let config = SolverConfig::default();
    let started = Instant::now();

    let outcome = match args.time_limit {
        Some(secs) => {
            let cutoff = TimeBudget::new(Duration::from_secs(secs));
            solve(&problem, config, &cutoff)
        }
        None => solve(&problem, config, &NoCutoff),
    };

    tracing::info!(elapsed_ms = started.elapsed().as_millis() as u64, nodes = outcome.nodes_visited, "search finished");

    match outcome.completion {
        Completion::Found => {
            eprintln!("opt={}", outcome.moves.len());
            eprint!("{}", format_moves(&outcome.moves));
        }
        Completion::TimeLimit if !outcome.moves.is_empty() => {
            eprintln!("best={}", outcome.moves.len());
            eprint!("{}", format_moves(&outcome.moves));
        }
        _ => {
            eprintln!("No feasible solution found.");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::Args;
    use clap::Parser;

    #[test]
    fn flags_and_file_argument_parse() {
        let args = Args::try_parse_from(["cpmp-solve", "-v", "-S", "5", "-T", "4", "in.txt"]).unwrap();
        assert!(args.verbose);
        assert!(!args.silent);
        assert_eq!(args.n_stack, Some(5));
        assert_eq!(args.s_height, Some(4));
        assert_eq!(args.input.unwrap().to_str().unwrap(), "in.txt");
    }

    #[test]
    fn verbose_and_silent_are_mutually_exclusive() {
        assert!(Args::try_parse_from(["cpmp-solve", "-v", "-s"]).is_err());
    }

    #[test]
    fn input_and_time_limit_are_optional() {
        let args = Args::try_parse_from(["cpmp-solve"]).unwrap();
        assert!(args.input.is_none());
        assert!(args.time_limit.is_none());
    }
}
