//! Toggle History Miner
//!
//! Drives the `toggle-core` extraction pipeline over real repositories:
//! runs `git log` for each tracked file, writes the resulting events to CSV
//! tables, and collects release metadata for joining against them.

pub mod commands;
pub mod config;
pub mod error;
pub mod git_mining;
pub mod releases;
pub mod sink;

pub use config::{ConfigError, MinerConfig, TrackedSpec};
pub use error::{MinerError, MinerResult};
pub use git_mining::{GitMiningError, MiningResult, ToggleMiner, TrackedFile};
pub use releases::{Release, ReleaseError, ReleaseFeed};
pub use sink::{CsvWriter, ToggleTable, WriteMode};
