//! `profiles`: print the profile table as JSON.

use crate::config::MinerConfig;
use crate::error::MinerResult;
use std::io::Write;

pub fn run<W: Write>(config: &MinerConfig, out: &mut W) -> MinerResult<()> {
    serde_json::to_writer_pretty(&mut *out, &config.profile_specs())?;
    writeln!(out)?;
    Ok(())
}
