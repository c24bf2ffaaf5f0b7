//! Process records and the registry that owns them.
//!
//! The registry keeps processes in input order; that order is the
//! tie-break for every phase of the simulation and is independent of the
//! pids the workload happens to use. All other components refer to
//! processes by registry index or pid and never hold process state.

use serde::{Deserialize, Serialize};

/// A single process in the workload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Process {
    pub pid: u32,
    /// Tick at which the process enters the wait queue
    pub arrival_time: u64,
    /// Ticks of residency required once admitted
    pub lifetime: u64,
    /// Total memory demand in bytes (sum of the declared segments)
    pub memory_demand: u64,
    /// Tick at which the process was moved into memory
    pub admission_time: Option<u64>,
    /// Tick at which the process completed
    pub finish_time: Option<u64>,
    /// True while the process is resident in memory
    pub active: bool,
}

impl Process {
    pub fn new(pid: u32, arrival_time: u64, lifetime: u64, memory_demand: u64) -> Self {
        Process {
            pid,
            arrival_time,
            lifetime,
            memory_demand,
            admission_time: None,
            finish_time: None,
            active: false,
        }
    }

    /// Turnaround time once finished: finish - arrival
    pub fn turnaround(&self) -> Option<u64> {
        self.finish_time.map(|finish| finish - self.arrival_time)
    }
}

/// Ordered, fixed collection of process records
#[derive(Debug, Clone, Default)]
pub struct ProcessRegistry {
    processes: Vec<Process>,
}

impl ProcessRegistry {
    pub fn new(processes: Vec<Process>) -> Self {
        ProcessRegistry { processes }
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    pub fn get(&self, index: usize) -> &Process {
        &self.processes[index]
    }

    pub fn get_mut(&mut self, index: usize) -> &mut Process {
        &mut self.processes[index]
    }

    /// Registry index of the process with the given pid
    pub fn index_of_pid(&self, pid: u32) -> Option<usize> {
        self.processes.iter().position(|p| p.pid == pid)
    }

    /// Processes in registry (input) order
    pub fn iter(&self) -> impl Iterator<Item = &Process> {
        self.processes.iter()
    }

    /// True once every process has a finish time
    pub fn all_finished(&self) -> bool {
        self.processes.iter().all(|p| p.finish_time.is_some())
    }

    /// Mean turnaround over the processes that finished
    pub fn average_turnaround(&self) -> Option<f64> {
        let finished: Vec<u64> = self.processes.iter().filter_map(|p| p.turnaround()).collect();
        if finished.is_empty() {
            None
        } else {
            Some(finished.iter().sum::<u64>() as f64 / finished.len() as f64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turnaround() {
        let mut p = Process::new(5, 10, 20, 300);
        assert_eq!(p.turnaround(), None);

        p.admission_time = Some(12);
        p.finish_time = Some(32);
        assert_eq!(p.turnaround(), Some(22));
    }

    #[test]
    fn test_registry_order_independent_of_pid() {
        let registry = ProcessRegistry::new(vec![
            Process::new(3, 0, 5, 100),
            Process::new(1, 0, 5, 100),
            Process::new(2, 0, 5, 100),
        ]);

        assert_eq!(registry.get(0).pid, 3);
        assert_eq!(registry.index_of_pid(1), Some(1));
        assert_eq!(registry.index_of_pid(9), None);
    }

    #[test]
    fn test_average_turnaround() {
        let mut registry = ProcessRegistry::new(vec![
            Process::new(1, 0, 10, 300),
            Process::new(2, 0, 5, 200),
        ]);
        assert_eq!(registry.average_turnaround(), None);

        registry.get_mut(0).finish_time = Some(10);
        registry.get_mut(1).finish_time = Some(15);
        assert!(registry.all_finished());
        assert_eq!(registry.average_turnaround(), Some(12.5));
    }
}
