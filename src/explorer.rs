//! Configuration Sweep
//!
//! Runs the same workload under a family of memory configurations to show
//! how page size and total memory trade off against turnaround time.
//! Configurations are evaluated in parallel; each simulation itself stays
//! single-threaded, so every sweep point is deterministic and the output
//! order follows the enumeration order.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::SimConfig;
use crate::simulation::{Outcome, SimulationEngine};
use crate::workloads::Workload;

/// Parameter ranges to sweep
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepSpace {
    pub memory_sizes: Vec<u64>,
    pub page_sizes: Vec<u64>,
}

impl Default for SweepSpace {
    fn default() -> Self {
        SweepSpace {
            memory_sizes: vec![2000],
            page_sizes: vec![100, 200, 400],
        }
    }
}

impl SweepSpace {
    /// Enumerate valid configurations; combinations where the memory is
    /// not a multiple of the page are skipped.
    pub fn enumerate(&self, max_ticks: u64) -> Vec<SimConfig> {
        let mut configs = Vec::new();
        for &memory_size in &self.memory_sizes {
            for &page_size in &self.page_sizes {
                let config = SimConfig { memory_size, page_size, max_ticks };
                if config.is_valid() {
                    configs.push(config);
                }
            }
        }
        configs
    }
}

/// Result of one swept configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepPoint {
    pub config: SimConfig,
    pub outcome: Outcome,
    pub total_ticks: u64,
    pub average_turnaround: Option<f64>,
}

/// Sweep engine: one simulation per configuration
pub struct ConfigExplorer {
    pub space: SweepSpace,
    pub workload: Workload,
    pub max_ticks: u64,
}

impl ConfigExplorer {
    pub fn new(space: SweepSpace, workload: Workload, max_ticks: u64) -> Self {
        ConfigExplorer { space, workload, max_ticks }
    }

    /// Evaluate every configuration in the space (parallel)
    pub fn explore(&self) -> Vec<SweepPoint> {
        let configs = self.space.enumerate(self.max_ticks);

        configs
            .par_iter()
            .map(|config| self.evaluate(config.clone()))
            .collect()
    }

    fn evaluate(&self, config: SimConfig) -> SweepPoint {
        let mut sim = SimulationEngine::new(config.clone(), self.workload.processes());
        let outcome = sim.run();
        let report = sim.report();

        SweepPoint {
            config,
            outcome,
            total_ticks: report.total_ticks,
            average_turnaround: report.average_turnaround,
        }
    }

    /// Completed point with the lowest average turnaround, ties broken by
    /// fewer total ticks
    pub fn find_best<'a>(&self, points: &'a [SweepPoint]) -> Option<&'a SweepPoint> {
        points
            .iter()
            .filter(|p| p.outcome == Outcome::Completed)
            .min_by(|a, b| {
                let avg_a = a.average_turnaround.unwrap_or(f64::INFINITY);
                let avg_b = b.average_turnaround.unwrap_or(f64::INFINITY);
                avg_a
                    .partial_cmp(&avg_b)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.total_ticks.cmp(&b.total_ticks))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workload() -> Workload {
        Workload::parse("2\n1 0 10 1 300\n2 0 5 1 200\n").unwrap()
    }

    #[test]
    fn test_sweep_space_skips_invalid_combinations() {
        let space = SweepSpace {
            memory_sizes: vec![400],
            page_sizes: vec![100, 300],
        };
        let configs = space.enumerate(1000);

        // 400 is not a multiple of 300
        assert_eq!(configs.len(), 1);
        assert_eq!(configs[0].page_size, 100);
    }

    #[test]
    fn test_explore_covers_every_configuration() {
        let space = SweepSpace {
            memory_sizes: vec![400, 800],
            page_sizes: vec![100, 200],
        };
        let explorer = ConfigExplorer::new(space, workload(), 1000);
        let points = explorer.explore();

        assert_eq!(points.len(), 4);
        assert!(points.iter().all(|p| p.outcome == Outcome::Completed));

        let best = explorer.find_best(&points).unwrap();
        // With 800 bytes of memory both processes run at once.
        assert_eq!(best.config.memory_size, 800);
        assert_eq!(best.average_turnaround, Some(7.5));
    }

    #[test]
    fn test_explore_output_order_is_deterministic() {
        let space = SweepSpace::default();
        let explorer = ConfigExplorer::new(space.clone(), workload(), 1000);

        let first = explorer.explore();
        let second = explorer.explore();

        let configs: Vec<_> = first.iter().map(|p| p.config.clone()).collect();
        assert_eq!(configs, space.enumerate(1000));
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.total_ticks, b.total_ticks);
            assert_eq!(a.average_turnaround, b.average_turnaround);
        }
    }

    #[test]
    fn test_deadlocked_points_never_best() {
        let space = SweepSpace {
            memory_sizes: vec![200, 400],
            page_sizes: vec![100],
        };
        let explorer = ConfigExplorer::new(space, workload(), 500);
        let points = explorer.explore();

        assert_eq!(points[0].outcome, Outcome::Deadlocked);
        assert_eq!(points[1].outcome, Outcome::Completed);
        let best = explorer.find_best(&points).unwrap();
        assert_eq!(best.config.memory_size, 400);
    }
}
