//! `efforts`: files and lines changed per commit.

use crate::config::EffortConfig;
use crate::error::{MinerError, MinerResult};
use crate::git_mining::{parse_numstat, CommitEffort, GitExecutor};
use crate::sink::CsvWriter;
use std::path::Path;

pub const EFFORT_COLUMNS: [&str; 4] = ["commit", "files_changed", "lines_added", "lines_removed"];

/// Write one row per commit of `repo`. Returns the number of rows.
pub fn run(repo: &Path, config: &EffortConfig, output_dir: &Path) -> MinerResult<usize> {
    let executor = GitExecutor::new(repo)?;
    let efforts = parse_numstat(&executor.numstat(&config.paths)?);
    tracing::info!("Collected change sizes of {} commits", efforts.len());

    let path = output_dir.join(&config.output);
    let rows = write_efforts(&path, &efforts, config)
        .map_err(|source| MinerError::Output {
            path: path.clone(),
            source,
        })?;
    tracing::info!("Wrote {} rows to {}", rows, path.display());
    Ok(rows)
}

fn write_efforts(
    path: &Path,
    efforts: &[CommitEffort],
    config: &EffortConfig,
) -> std::io::Result<usize> {
    let mut writer = CsvWriter::create(path, &EFFORT_COLUMNS, config.mode)?;
    for effort in efforts {
        writer.write_row(&effort.cells())?;
    }
    writer.finish()
}
