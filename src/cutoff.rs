//! Cooperative cancellation. Mirrors `ddo`'s
//! `implementation/heuristics/cutoff.rs`: a small trait plus a
//! never-stop implementation and a background-thread wall-clock budget.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Polled cooperatively by the branch-and-bound driver at node-entry
/// boundaries — never mid-enumeration, so worst-case overshoot is one
/// node's processing cost.
pub trait Cutoff {
    fn must_stop(&self) -> bool;
}

/// Runs to proven optimality (or exhaustion) with no time limit.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCutoff;

impl Cutoff for NoCutoff {
    fn must_stop(&self) -> bool {
        false
    }
}

/// Flips an `Arc<AtomicBool>` from a background thread once `budget`
/// elapses. Wall-clock, not CPU time — see `DESIGN.md`'s Open Question 1
/// for why that is a deliberate simplification of the source's
/// `getrusage`-based timer rather than a silent behavior change.
pub struct TimeBudget {
    stop: Arc<AtomicBool>,
}

impl TimeBudget {
    pub fn new(budget: Duration) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_thread = stop.clone();
        thread::spawn(move || {
            thread::sleep(budget);
            stop_thread.store(true, Ordering::Relaxed);
        });
        TimeBudget { stop }
    }
}

impl Cutoff for TimeBudget {
    fn must_stop(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_cutoff_never_stops() {
        assert!(!NoCutoff.must_stop());
    }

    #[test]
    fn time_budget_eventually_stops() {
        let cutoff = TimeBudget::new(Duration::from_millis(10));
        assert!(!cutoff.must_stop());
        thread::sleep(Duration::from_millis(100));
        assert!(cutoff.must_stop());
    }
}
