//! Workload Ingestion
//!
//! Parses the classic workload text format: the first token is the process
//! count, then for each process `pid arrival lifetime nseg seg1 .. segn`.
//! Tokens are separated by arbitrary whitespace, so records may span or
//! share lines. Segment granularity only matters here; the simulator sees
//! each process's demand as the segment sum.
//!
//! Validation lives in this layer: the core assumes well-formed records.

use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::process::Process;

/// One process as declared in the workload file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessSpec {
    pub pid: u32,
    pub arrival_time: u64,
    pub lifetime: u64,
    /// Declared memory segments; the simulator uses only their sum
    pub segments: Vec<u64>,
}

impl ProcessSpec {
    pub fn memory_demand(&self) -> u64 {
        self.segments.iter().sum()
    }
}

/// An ordered workload description
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Workload {
    pub processes: Vec<ProcessSpec>,
}

impl Workload {
    /// Read and parse a workload file
    pub fn from_path<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Parse the whitespace-separated token stream
    pub fn parse(input: &str) -> io::Result<Self> {
        let mut tokens = input.split_whitespace();
        let count = next_number(&mut tokens, "process count")? as usize;

        let mut processes = Vec::with_capacity(count);
        for record in 0..count {
            let pid = next_number(&mut tokens, "pid")? as u32;
            let arrival_time = next_number(&mut tokens, "arrival time")?;
            let lifetime = next_number(&mut tokens, "lifetime")?;
            let num_segments = next_number(&mut tokens, "segment count")? as usize;

            if num_segments == 0 {
                return Err(invalid(format!(
                    "process record {}: segment count must be positive",
                    record + 1
                )));
            }

            let mut segments = Vec::with_capacity(num_segments);
            for _ in 0..num_segments {
                segments.push(next_number(&mut tokens, "segment size")?);
            }

            let spec = ProcessSpec { pid, arrival_time, lifetime, segments };
            if spec.memory_demand() == 0 {
                return Err(invalid(format!(
                    "process record {}: memory demand must be positive",
                    record + 1
                )));
            }
            processes.push(spec);
        }

        Ok(Workload { processes })
    }

    /// Materialize process records for the simulator, in input order
    pub fn processes(&self) -> Vec<Process> {
        self.processes
            .iter()
            .map(|s| Process::new(s.pid, s.arrival_time, s.lifetime, s.memory_demand()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    /// Sum of every process's demand
    pub fn total_demand(&self) -> u64 {
        self.processes.iter().map(|s| s.memory_demand()).sum()
    }

    /// Largest single demand; the run deadlocks if this exceeds capacity
    pub fn max_demand(&self) -> u64 {
        self.processes.iter().map(|s| s.memory_demand()).max().unwrap_or(0)
    }
}

fn next_number<'a, I>(tokens: &mut I, what: &str) -> io::Result<u64>
where
    I: Iterator<Item = &'a str>,
{
    let token = tokens
        .next()
        .ok_or_else(|| invalid(format!("unexpected end of input, expected {}", what)))?;
    token
        .parse::<u64>()
        .map_err(|_| invalid(format!("expected {} but found `{}`", what, token)))
}

fn invalid(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message)
}
