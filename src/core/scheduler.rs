//! Thread schedule and invocation planning
//!
//! Worker counts start at 1 and double while they stay within the bound,
//! then a single terminal count is appended. The plan crosses that
//! schedule with the input sizes, sizes outermost.

use crate::config::SweepConfig;
use crate::error::{Result, SweepGenError};
use serde::Serialize;
use tracing::debug;

/// Worker counts for one size block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadSchedule {
    /// Doubling stops once the count exceeds this bound
    pub max_doubling: usize,
    /// Count emitted after the doubling part
    pub terminal: Option<usize>,
}

impl Default for ThreadSchedule {
    fn default() -> Self {
        Self {
            max_doubling: crate::config::DEFAULT_MAX_THREADS,
            terminal: Some(crate::config::DEFAULT_TERMINAL_THREADS),
        }
    }
}

impl ThreadSchedule {
    /// Create a schedule
    pub fn new(max_doubling: usize, terminal: Option<usize>) -> Self {
        Self {
            max_doubling,
            terminal,
        }
    }

    /// Schedule described by a config
    pub fn from_config(config: &SweepConfig) -> Self {
        Self::new(config.max_threads, config.terminal_threads)
    }

    /// Worker counts of the doubling part
    pub fn doubling(&self) -> impl Iterator<Item = usize> {
        let max = self.max_doubling;
        std::iter::successors(Some(1usize), |&t| t.checked_mul(2)).take_while(move |&t| t <= max)
    }

    /// Iterate over worker counts in emission order
    pub fn iter(&self) -> impl Iterator<Item = usize> {
        self.doubling().chain(self.terminal)
    }

    /// Worker counts paired with their run mode, in emission order.
    /// The terminal count always runs in parallel mode, whatever its value.
    pub fn steps(&self) -> impl Iterator<Item = (usize, RunMode)> {
        self.doubling()
            .map(|t| (t, RunMode::for_threads(t)))
            .chain(self.terminal.map(|t| (t, RunMode::Parallel)))
    }

    /// Worker counts in emission order
    pub fn counts(&self) -> Vec<usize> {
        self.iter().collect()
    }

    /// Number of worker counts per size
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// True if the schedule has no worker counts
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Largest scheduled worker count
    pub fn peak(&self) -> Option<usize> {
        self.iter().max()
    }
}

/// How a scheduled run is launched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Single worker, sequential repetitions, no launcher
    Sequential,
    /// Parallel repetitions under the launcher
    Parallel,
}

impl RunMode {
    /// Mode of a doubling step
    pub fn for_threads(threads: usize) -> Self {
        if threads > 1 {
            Self::Parallel
        } else {
            Self::Sequential
        }
    }
}

/// One planned benchmark run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invocation {
    /// Input size passed as the first argument
    pub size: u64,
    /// Worker count exported before the run
    pub threads: usize,
    /// Rounds passed as the second argument
    pub repetitions: u32,
    /// Sequential or parallel run
    pub mode: RunMode,
    /// Run under the interleaving launcher
    pub interleave: bool,
}

impl Invocation {
    /// Build an invocation, taking repetitions and launcher from the mode
    pub fn new(size: u64, threads: usize, mode: RunMode, config: &SweepConfig) -> Self {
        let parallel = mode == RunMode::Parallel;
        Self {
            size,
            threads,
            repetitions: if parallel {
                config.parallel_reps
            } else {
                config.sequential_reps
            },
            mode,
            interleave: parallel && config.launcher().is_some(),
        }
    }

    /// True for parallel-mode runs
    pub fn is_parallel(&self) -> bool {
        self.mode == RunMode::Parallel
    }
}

/// Build the ordered list of invocations for a config
pub fn plan(config: &SweepConfig) -> Result<Vec<Invocation>> {
    let schedule = ThreadSchedule::from_config(config);
    let steps: Vec<(usize, RunMode)> = schedule.steps().collect();

    if steps.is_empty() {
        return Err(SweepGenError::InvalidSchedule(format!(
            "max threads {} with no terminal count yields no worker counts",
            config.max_threads
        )));
    }

    let mut invocations = Vec::with_capacity(config.sizes.len() * steps.len());
    for &size in &config.sizes {
        for &(threads, mode) in &steps {
            let invocation = Invocation::new(size, threads, mode, config);
            debug!(
                size,
                threads,
                repetitions = invocation.repetitions,
                interleave = invocation.interleave,
                "planned invocation"
            );
            invocations.push(invocation);
        }
    }

    Ok(invocations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_default_schedule() {
        let schedule = ThreadSchedule::default();
        assert_eq!(
            schedule.counts(),
            vec![1, 2, 4, 8, 16, 32, 64, 128, 144]
        );
        assert_eq!(schedule.len(), 9);
        assert_eq!(schedule.peak(), Some(144));
    }

    #[test]
    fn test_bound_is_inclusive() {
        assert_eq!(ThreadSchedule::new(127, None).counts(), vec![1, 2, 4, 8, 16, 32, 64]);
        assert_eq!(ThreadSchedule::new(1, None).counts(), vec![1]);
        assert_eq!(ThreadSchedule::new(0, Some(4)).counts(), vec![4]);
        assert!(ThreadSchedule::new(0, None).is_empty());
    }

    #[test]
    fn test_terminal_kept_verbatim() {
        // A terminal count below the last doubling value is still emitted
        assert_eq!(ThreadSchedule::new(8, Some(6)).counts(), vec![1, 2, 4, 8, 6]);
        assert_eq!(ThreadSchedule::new(8, Some(8)).counts(), vec![1, 2, 4, 8, 8]);
    }

    #[test]
    fn test_huge_bound_does_not_overflow() {
        let schedule = ThreadSchedule::new(usize::MAX, None);
        assert_eq!(schedule.len(), usize::BITS as usize);
    }

    #[test]
    fn test_plan_default() {
        let config = SweepConfig::default();
        let invocations = plan(&config).unwrap();
        assert_eq!(invocations.len(), 4 * 9);

        let first = &invocations[0];
        assert_eq!(first.size, 100_000);
        assert_eq!(first.threads, 1);
        assert_eq!(first.repetitions, 5);
        assert!(!first.interleave);

        let second = &invocations[1];
        assert_eq!(second.threads, 2);
        assert_eq!(second.repetitions, 10);
        assert!(second.interleave);

        // Sizes are the outer loop
        assert!(invocations[..9].iter().all(|i| i.size == 100_000));
        assert_eq!(invocations[9].size, 1_000_000);
        assert_eq!(invocations[9].threads, 1);
        assert_eq!(invocations.last().unwrap().threads, 144);
    }

    #[test]
    fn test_plan_without_launcher() {
        let config = SweepConfig {
            launcher: String::new(),
            ..Default::default()
        };
        let invocations = plan(&config).unwrap();
        assert!(invocations.iter().all(|i| !i.interleave));
        assert!(invocations.iter().filter(|i| i.is_parallel()).all(|i| i.repetitions == 10));
    }

    #[test]
    fn test_terminal_always_parallel() {
        let config = SweepConfig {
            sizes: vec![100],
            max_threads: 4,
            terminal_threads: Some(1),
            ..Default::default()
        };
        let invocations = plan(&config).unwrap();
        assert_eq!(invocations.len(), 4);

        assert_eq!(invocations[0].mode, RunMode::Sequential);
        assert_eq!(invocations[0].repetitions, 5);

        let terminal = invocations.last().unwrap();
        assert_eq!(terminal.threads, 1);
        assert_eq!(terminal.mode, RunMode::Parallel);
        assert_eq!(terminal.repetitions, 10);
        assert!(terminal.interleave);
    }

    #[test]
    fn test_steps_modes() {
        let steps: Vec<_> = ThreadSchedule::new(2, Some(3)).steps().collect();
        assert_eq!(
            steps,
            vec![
                (1, RunMode::Sequential),
                (2, RunMode::Parallel),
                (3, RunMode::Parallel),
            ]
        );
    }

    #[test]
    fn test_plan_empty_schedule() {
        let config = SweepConfig {
            max_threads: 0,
            terminal_threads: None,
            ..Default::default()
        };
        assert!(matches!(plan(&config), Err(SweepGenError::InvalidSchedule(_))));
    }

    proptest! {
        #[test]
        fn doubling_part_is_strictly_increasing(max in 0usize..100_000, terminal in proptest::option::of(1usize..1_000)) {
            let schedule = ThreadSchedule::new(max, terminal);
            let counts = schedule.counts();
            let doubling = if terminal.is_some() && !counts.is_empty() {
                &counts[..counts.len() - 1]
            } else {
                &counts[..]
            };

            for pair in doubling.windows(2) {
                prop_assert_eq!(pair[1], pair[0] * 2);
            }
            prop_assert!(doubling.iter().all(|&t| t <= max && t.is_power_of_two()));
            prop_assert!(terminal.is_none() || counts.last().copied() == terminal);
        }

        #[test]
        fn plan_size_is_product(sizes in proptest::collection::vec(1u64..1_000_000, 1..8), max in 1usize..512) {
            let config = SweepConfig { sizes: sizes.clone(), max_threads: max, ..Default::default() };
            let schedule = ThreadSchedule::from_config(&config);
            let invocations = plan(&config).unwrap();
            prop_assert_eq!(invocations.len(), sizes.len() * schedule.len());
        }
    }
}
