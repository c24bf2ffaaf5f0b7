//! Discrete-Time Simulation Engine
//!
//! Advances an integer clock from 0 upward; each tick runs three phases in
//! a fixed order against the registry, wait queue, and frame table:
//!
//! 1. Arrival: processes whose arrival time equals the clock enter the
//!    wait queue, in registry order.
//! 2. Termination: active processes whose lifetime has elapsed release
//!    their frames, in registry order.
//! 3. Admission: the queue is scanned front to back over the elements
//!    present at the start of the phase; any process whose demand fits the
//!    free frames is moved into memory. A later, smaller process may be
//!    admitted ahead of a larger one stuck at the front.
//!
//! Termination runs before admission so memory freed by an expiring
//! process can be reused in the same tick. The run ends when the whole
//! workload has been serviced, or when the clock passes the configured
//! ceiling (an unsatisfiable configuration, reported as a deadlock).
//!
//! The simulation is single-threaded and fully deterministic: identical
//! input produces a bit-identical event trace and statistics.

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::config::SimConfig;
use crate::frames::FrameTable;
use crate::process::{Process, ProcessRegistry};
use crate::queue::WaitQueue;

/// Global simulation clock
#[derive(Debug, Clone, Copy, Default)]
pub struct Clock {
    pub tick: u64,
}

/// What happened to a process at a given tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// The process entered the wait queue
    Arrived,
    /// The process was moved into memory
    Admitted,
    /// The process finished and released its frames
    Completed,
}

/// One entry of the chronological event trace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub tick: u64,
    pub pid: u32,
    pub kind: EventKind,
}

/// Terminal state of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// Every process arrived, ran, and finished before the tick ceiling
    Completed,
    /// The clock passed the ceiling with work still outstanding
    Deadlocked,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Completed => write!(f, "Completed"),
            Outcome::Deadlocked => write!(f, "Deadlocked"),
        }
    }
}

/// Aggregate counters collected over a run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulationStats {
    pub total_ticks: u64,
    pub arrivals: u64,
    pub admissions: u64,
    pub completions: u64,
    pub peak_queue_depth: usize,
    pub peak_frames_in_use: usize,
}

/// The main simulation engine
pub struct SimulationEngine {
    pub config: SimConfig,
    pub clock: Clock,

    pub registry: ProcessRegistry,
    pub frames: FrameTable,
    pub queue: WaitQueue,

    pub stats: SimulationStats,

    trace: Vec<Event>,
    dispatched: usize,
    outcome: Option<Outcome>,
}

impl SimulationEngine {
    pub fn new(config: SimConfig, processes: Vec<Process>) -> Self {
        let frames = FrameTable::new(config.num_frames(), config.page_size);
        let queue = WaitQueue::with_capacity(processes.len());

        SimulationEngine {
            config,
            clock: Clock::default(),
            registry: ProcessRegistry::new(processes),
            frames,
            queue,
            stats: SimulationStats::default(),
            trace: Vec::new(),
            dispatched: 0,
            outcome: None,
        }
    }

    /// Terminal outcome, once the run has finished
    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    /// Full chronological event trace so far
    pub fn trace(&self) -> &[Event] {
        &self.trace
    }

    /// Execute one tick and return its events. A no-op once the run has
    /// reached a terminal state.
    pub fn step(&mut self) -> Vec<Event> {
        if self.outcome.is_some() {
            return Vec::new();
        }
        let start = self.trace.len();

        self.arrival_phase();
        self.termination_phase();
        self.admission_phase();

        self.clock.tick += 1;
        self.check_terminal();

        self.trace[start..].to_vec()
    }

    /// Run to a terminal state
    pub fn run(&mut self) -> Outcome {
        while self.outcome.is_none() {
            self.step();
        }
        self.stats.total_ticks = self.clock.tick;
        self.outcome.unwrap_or(Outcome::Deadlocked)
    }

    fn emit(&mut self, pid: u32, kind: EventKind) {
        self.trace.push(Event { tick: self.clock.tick, pid, kind });
        match kind {
            EventKind::Arrived => self.stats.arrivals += 1,
            EventKind::Admitted => self.stats.admissions += 1,
            EventKind::Completed => self.stats.completions += 1,
        }
    }

    /// Enqueue every process arriving at the current tick, in registry
    /// order (the stable tie-break for simultaneous arrivals).
    fn arrival_phase(&mut self) {
        trace!("tick {}: arrival phase", self.clock.tick);
        for index in 0..self.registry.len() {
            let process = self.registry.get(index);
            if process.arrival_time == self.clock.tick {
                let pid = process.pid;
                self.queue.enqueue(index);
                self.dispatched += 1;
                self.emit(pid, EventKind::Arrived);
            }
        }
        self.stats.peak_queue_depth = self.stats.peak_queue_depth.max(self.queue.len());
    }

    /// Retire every active process whose lifetime has elapsed, releasing
    /// its frames. Registry order for simultaneous terminations.
    fn termination_phase(&mut self) {
        trace!("tick {}: termination phase", self.clock.tick);
        for index in 0..self.registry.len() {
            let process = self.registry.get(index);
            let admitted_at = match (process.active, process.admission_time) {
                (true, Some(tick)) => tick,
                _ => continue,
            };
            if self.clock.tick - admitted_at >= process.lifetime {
                let pid = process.pid;
                let released = self.frames.release(pid);
                debug!(
                    "tick {}: process {} completes, releasing {} frame(s)",
                    self.clock.tick, pid, released
                );

                let process = self.registry.get_mut(index);
                process.active = false;
                process.finish_time = Some(self.clock.tick);
                self.emit(pid, EventKind::Completed);
            }
        }
    }

    /// Scan the queue front to back over the elements present at the start
    /// of the phase, admitting every process whose demand fits. Removing
    /// an element shifts the positions behind it, so the position only
    /// advances when the current element stays queued.
    fn admission_phase(&mut self) {
        trace!("tick {}: admission phase", self.clock.tick);
        let snapshot = self.queue.len();
        let mut position = 0;

        for _ in 0..snapshot {
            let index = self.queue.peek_at(position);
            let demand = self.registry.get(index).memory_demand;

            if self.frames.can_admit(demand) {
                let pid = self.registry.get(index).pid;
                let assigned = self.frames.admit(pid, demand);
                debug!(
                    "tick {}: process {} admitted into {} frame(s)",
                    self.clock.tick, pid, assigned
                );

                let process = self.registry.get_mut(index);
                process.active = true;
                process.admission_time = Some(self.clock.tick);

                self.queue.remove_at(position);
                self.emit(pid, EventKind::Admitted);
            } else {
                position += 1;
            }
        }

        let in_use = self.frames.num_frames() - self.frames.free_frames();
        self.stats.peak_frames_in_use = self.stats.peak_frames_in_use.max(in_use);
    }

    fn check_terminal(&mut self) {
        if self.clock.tick > self.config.max_ticks {
            self.outcome = Some(Outcome::Deadlocked);
        } else if self.dispatched == self.registry.len()
            && self.queue.is_empty()
            && self.frames.is_entirely_free()
        {
            self.outcome = Some(Outcome::Completed);
        }
        if self.outcome.is_some() {
            self.stats.total_ticks = self.clock.tick;
        }
    }

    /// Summary report of a finished run
    pub fn report(&self) -> SimulationReport {
        let outcome = match self.outcome {
            Some(outcome) => outcome,
            None => panic!("report() requires a finished run"),
        };

        let processes: Vec<ProcessOutcome> = self
            .registry
            .iter()
            .map(|p| ProcessOutcome {
                pid: p.pid,
                arrival_time: p.arrival_time,
                admission_time: p.admission_time,
                finish_time: p.finish_time,
                turnaround: p.turnaround(),
            })
            .collect();

        SimulationReport {
            outcome,
            total_ticks: self.stats.total_ticks,
            average_turnaround: self.registry.average_turnaround(),
            processes,
        }
    }
}

/// Per-process slice of the final report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessOutcome {
    pub pid: u32,
    pub arrival_time: u64,
    pub admission_time: Option<u64>,
    pub finish_time: Option<u64>,
    pub turnaround: Option<u64>,
}

/// Summary report from a finished simulation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    pub outcome: Outcome,
    pub total_ticks: u64,
    /// Mean turnaround over the processes that finished
    pub average_turnaround: Option<f64>,
    pub processes: Vec<ProcessOutcome>,
}

impl std::fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "╔══════════════════════════════════════════════════════╗")?;
        writeln!(f, "║        Fixed-Partition Memory Simulation             ║")?;
        writeln!(f, "╚══════════════════════════════════════════════════════╝")?;
        writeln!(f, "Outcome: {} after {} tick(s)", self.outcome, self.total_ticks)?;
        writeln!(f)?;
        writeln!(f, "  PID │ Arrival │ Admitted │ Finished │ Turnaround")?;
        writeln!(f, " ─────┼─────────┼──────────┼──────────┼───────────")?;
        for p in &self.processes {
            writeln!(
                f,
                " {:>4} │ {:>7} │ {:>8} │ {:>8} │ {:>10}",
                p.pid,
                p.arrival_time,
                fmt_opt(p.admission_time),
                fmt_opt(p.finish_time),
                fmt_opt(p.turnaround),
            )?;
        }
        writeln!(f)?;
        match self.average_turnaround {
            Some(avg) => writeln!(f, "Average Turnaround Time: {:.2}", avg)?,
            None => writeln!(f, "Average Turnaround Time: n/a")?,
        }
        Ok(())
    }
}

fn fmt_opt(value: Option<u64>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames_for_demand;

    fn engine(config: SimConfig, processes: Vec<Process>) -> SimulationEngine {
        SimulationEngine::new(config, processes)
    }

    #[test]
    fn test_single_process_run() {
        // memory 400 / page 100 (4 frames); one process, demand 250,
        // lifetime 5, arriving at tick 0.
        let mut sim = engine(SimConfig::small(), vec![Process::new(1, 0, 5, 250)]);
        let outcome = sim.run();

        assert_eq!(outcome, Outcome::Completed);
        assert_eq!(
            sim.trace(),
            &[
                Event { tick: 0, pid: 1, kind: EventKind::Arrived },
                Event { tick: 0, pid: 1, kind: EventKind::Admitted },
                Event { tick: 5, pid: 1, kind: EventKind::Completed },
            ]
        );

        let report = sim.report();
        assert_eq!(report.total_ticks, 6);
        assert_eq!(report.processes[0].turnaround, Some(5));
        assert_eq!(report.average_turnaround, Some(5.0));
        assert_eq!(sim.stats.peak_frames_in_use, 3);
    }

    #[test]
    fn test_queued_process_admitted_when_memory_frees() {
        // P1 takes 3 of 4 frames for 10 ticks; P2 needs 2 frames and must
        // wait for P1's termination, reusing the memory in the same tick.
        let mut sim = engine(
            SimConfig::small(),
            vec![Process::new(1, 0, 10, 300), Process::new(2, 0, 5, 200)],
        );
        let outcome = sim.run();

        assert_eq!(outcome, Outcome::Completed);
        assert_eq!(
            sim.trace(),
            &[
                Event { tick: 0, pid: 1, kind: EventKind::Arrived },
                Event { tick: 0, pid: 2, kind: EventKind::Arrived },
                Event { tick: 0, pid: 1, kind: EventKind::Admitted },
                Event { tick: 10, pid: 1, kind: EventKind::Completed },
                Event { tick: 10, pid: 2, kind: EventKind::Admitted },
                Event { tick: 15, pid: 2, kind: EventKind::Completed },
            ]
        );

        let report = sim.report();
        assert_eq!(report.average_turnaround, Some(12.5));
    }

    #[test]
    fn test_unsatisfiable_demand_deadlocks() {
        let config = SimConfig { max_ticks: 200, ..SimConfig::small() };
        let mut sim = engine(config, vec![Process::new(1, 0, 5, 500)]);
        let outcome = sim.run();

        assert_eq!(outcome, Outcome::Deadlocked);
        assert_eq!(sim.queue.len(), 1);
        assert_eq!(sim.stats.total_ticks, 201);
        assert_eq!(sim.report().processes[0].finish_time, None);
    }

    #[test]
    fn test_out_of_order_admission() {
        // P1 never fits while P2 holds memory, but P3 (queued behind P1)
        // does; the scan admits P3 past the blocked head.
        let mut sim = engine(
            SimConfig { max_ticks: 200, ..SimConfig::small() },
            vec![
                Process::new(2, 0, 50, 300),
                Process::new(1, 1, 5, 200),
                Process::new(3, 1, 5, 100),
            ],
        );
        sim.step();
        sim.step();

        assert!(sim.trace().contains(&Event { tick: 1, pid: 3, kind: EventKind::Admitted }));
        assert!(!sim.trace().iter().any(|e| e.pid == 1 && e.kind == EventKind::Admitted));
        assert_eq!(sim.queue.iter().count(), 1);
    }

    #[test]
    fn test_fifo_fairness_for_equal_demand() {
        // Two equal processes, capacity for one: the earlier-queued wins.
        let mut sim = engine(
            SimConfig { memory_size: 300, page_size: 100, max_ticks: 200 },
            vec![Process::new(1, 0, 5, 300), Process::new(2, 0, 5, 300)],
        );
        let outcome = sim.run();

        assert_eq!(outcome, Outcome::Completed);
        let report = sim.report();
        assert_eq!(report.processes[0].admission_time, Some(0));
        assert_eq!(report.processes[1].admission_time, Some(5));
    }

    #[test]
    fn test_termination_exactly_at_lifetime() {
        let mut sim = engine(SimConfig::small(), vec![Process::new(1, 3, 7, 100)]);
        sim.run();

        let report = sim.report();
        assert_eq!(report.processes[0].admission_time, Some(3));
        assert_eq!(report.processes[0].finish_time, Some(10));
    }

    #[test]
    fn test_idle_gap_before_first_arrival() {
        // Nothing happens until tick 4; the run must not conclude early.
        let mut sim = engine(SimConfig::small(), vec![Process::new(1, 4, 2, 100)]);
        let outcome = sim.run();

        assert_eq!(outcome, Outcome::Completed);
        assert_eq!(sim.report().processes[0].finish_time, Some(6));
    }

    #[test]
    fn test_frame_conservation_while_active() {
        let config = SimConfig::small();
        let processes = vec![Process::new(1, 0, 10, 300), Process::new(2, 0, 5, 200)];
        let mut sim = engine(config.clone(), processes);

        while sim.outcome().is_none() {
            sim.step();
            for p in sim.registry.iter() {
                let expected = if p.active {
                    frames_for_demand(p.memory_demand, config.page_size)
                } else {
                    0
                };
                assert_eq!(sim.frames.frames_owned_by(p.pid), expected);
            }
            let owned: usize = sim.registry.iter().map(|p| sim.frames.frames_owned_by(p.pid)).sum();
            assert_eq!(owned, sim.frames.num_frames() - sim.frames.free_frames());
        }
    }

    #[test]
    fn test_deterministic_trace() {
        let processes = || {
            vec![
                Process::new(1, 0, 10, 300),
                Process::new(2, 0, 5, 200),
                Process::new(3, 2, 4, 400),
            ]
        };
        let mut a = engine(SimConfig::small(), processes());
        let mut b = engine(SimConfig::small(), processes());
        a.run();
        b.run();

        assert_eq!(a.trace(), b.trace());
        assert_eq!(a.stats.total_ticks, b.stats.total_ticks);
    }

    #[test]
    fn test_empty_workload_completes_immediately() {
        let mut sim = engine(SimConfig::small(), Vec::new());
        assert_eq!(sim.run(), Outcome::Completed);
        assert_eq!(sim.report().average_turnaround, None);
    }
}
