//! Simulation Configuration Module
//!
//! Defines the memory geometry and run limits for the simulator.
//! The tick ceiling is part of the configuration rather than a hard-wired
//! constant so unsatisfiable workloads can be diagnosed quickly in tests.

use serde::{Deserialize, Serialize};

/// Default tick ceiling before a run is declared deadlocked.
pub const DEFAULT_MAX_TICKS: u64 = 100_000;

/// Complete simulation configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Total physical memory size, in bytes
    pub memory_size: u64,
    /// Frame/page size, in bytes; `memory_size` must be a multiple of this
    pub page_size: u64,
    /// Tick ceiling; a run that passes it ends as `Outcome::Deadlocked`
    pub max_ticks: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            memory_size: 2000,
            page_size: 100,
            max_ticks: DEFAULT_MAX_TICKS,
        }
    }
}

impl SimConfig {
    /// Number of fixed-size frames the memory is partitioned into
    pub fn num_frames(&self) -> usize {
        (self.memory_size / self.page_size) as usize
    }

    /// Total capacity in bytes (alias for the configured memory size)
    pub fn total_capacity(&self) -> u64 {
        self.memory_size
    }

    /// Both sizes positive and the memory an exact multiple of the page
    pub fn is_valid(&self) -> bool {
        self.memory_size > 0 && self.page_size > 0 && self.memory_size % self.page_size == 0
    }

    /// Create small configuration for testing (4 frames)
    pub fn small() -> Self {
        SimConfig {
            memory_size: 400,
            page_size: 100,
            ..Default::default()
        }
    }

    /// Configuration matching the classic assignment setup (20 frames)
    pub fn classroom() -> Self {
        SimConfig::default()
    }

    /// Save configuration to TOML file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let toml_str = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(path, toml_str)
    }

    /// Load configuration from TOML file
    pub fn load(path: &str) -> std::io::Result<Self> {
        let toml_str = std::fs::read_to_string(path)?;
        toml::from_str(&toml_str)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }
}
