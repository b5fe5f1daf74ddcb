//! Git history mining for toggle lifecycle events.
//!
//! This module provides functionality to:
//! - Run `git log -p --follow` for each tracked file
//! - Discover tracked files and their earlier names
//! - Feed the patch stream through the toggle-core extraction pipeline
//! - Summarize per-commit change sizes from `--numstat`

pub mod efforts;
mod error;
mod executor;
mod miner;

pub use efforts::{parse_numstat, CommitEffort};
pub use error::GitMiningError;
pub use executor::GitExecutor;
pub use miner::{mine_log, MiningResult, ToggleMiner, TrackedFile};
