//! `toggles`: mine every tracked file into its output table.

use crate::config::{context_lines, ConfigError, MinerConfig, TrackedSpec};
use crate::error::{MinerError, MinerResult};
use crate::git_mining::{MiningResult, ToggleMiner, TrackedFile};
use crate::sink::{ToggleTable, WriteMode};
use std::path::PathBuf;

/// Command-line overrides for the tracked set.
#[derive(Debug, Clone, Default)]
pub struct ToggleOptions {
    pub repo: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub overwrite: bool,
    pub lookback: Option<usize>,
    pub context_lines: Option<usize>,
    /// Mine only this file; requires `profile`.
    pub file: Option<String>,
    /// Profile for `file`, or a filter on the configured entries.
    pub profile: Option<String>,
    pub output: Option<PathBuf>,
}

impl ToggleOptions {
    /// Fold the overrides into `config`.
    pub fn apply(&self, config: &mut MinerConfig) -> Result<(), ConfigError> {
        if let Some(repo) = &self.repo {
            config.repo = repo.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if self.overwrite {
            config.mode = WriteMode::Overwrite;
        }

        match (&self.file, &self.profile) {
            (Some(file), Some(profile)) => {
                config.tracked = vec![TrackedSpec {
                    path: Some(file.clone()),
                    glob: None,
                    profile: profile.clone(),
                    output: self.output.clone(),
                    lookback: None,
                    context_lines: None,
                }];
            }
            (Some(_), None) => {
                return Err(ConfigError::Invalid(
                    "--file needs --profile".to_string(),
                ));
            }
            (None, Some(profile)) => {
                config.tracked.retain(|t| &t.profile == profile);
                if config.tracked.is_empty() {
                    return Err(ConfigError::Invalid(format!(
                        "no tracked entry uses profile '{}'",
                        profile
                    )));
                }
            }
            (None, None) => {}
        }

        for tracked in &mut config.tracked {
            if self.lookback.is_some() {
                tracked.lookback = self.lookback;
            }
            if self.context_lines.is_some() {
                tracked.context_lines = self.context_lines;
            }
        }

        config.validate()
    }
}

struct OpenTable {
    path: PathBuf,
    profile: String,
    table: ToggleTable,
}

/// Mine every tracked entry of `config`.
///
/// Entries sharing an output path write into one table; the table is opened
/// once, so only the first opener's write mode applies.
pub fn run(config: &MinerConfig) -> MinerResult<MiningResult> {
    let miner = ToggleMiner::new(&config.repo, config.header_format())?;
    let mut tables: Vec<OpenTable> = Vec::new();
    let mut total = MiningResult::default();

    for tracked in &config.tracked {
        let profile = config.tracked_profile(tracked)?;
        let output = tracked.output_path(&config.output_dir);

        let index = match tables.iter().position(|t| t.path == output) {
            Some(index) => {
                let open = &tables[index];
                if open.table.columns() != profile.columns().as_slice() {
                    return Err(MinerError::ColumnMismatch {
                        path: output,
                        first: open.profile.clone(),
                        second: profile.name.clone(),
                    });
                }
                index
            }
            None => {
                let table = ToggleTable::create(&output, profile.columns(), config.mode)
                    .map_err(|source| MinerError::Output {
                        path: output.clone(),
                        source,
                    })?;
                tables.push(OpenTable {
                    path: output.clone(),
                    profile: profile.name.clone(),
                    table,
                });
                tables.len() - 1
            }
        };

        let paths = match (&tracked.path, &tracked.glob) {
            (Some(path), _) => vec![PathBuf::from(path)],
            (None, Some(glob)) => match miner.discover(glob) {
                Ok(paths) => paths,
                Err(e) if e.is_per_file() => {
                    skip(&mut total, format!("Skipping glob {}: {}", glob, e));
                    continue;
                }
                Err(e) => return Err(e.into()),
            },
            (None, None) => Vec::new(),
        };

        let context = context_lines(tracked, &profile);
        for path in paths {
            let file = TrackedFile {
                path,
                profile: profile.clone(),
                context_lines: context,
            };
            match miner.mine_file(&file, &mut tables[index].table) {
                Ok(result) => total.merge(result),
                Err(e) if e.is_per_file() => {
                    skip(&mut total, format!("Skipping {}: {}", file.path.display(), e));
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    for open in tables {
        let rows = open.table.finish().map_err(|source| MinerError::Output {
            path: open.path.clone(),
            source,
        })?;
        tracing::info!("Wrote {} rows to {}", rows, open.path.display());
    }

    tracing::info!(
        "Done: {} commits, {} events, {} warnings",
        total.commits_processed,
        total.events_emitted,
        total.warnings.len()
    );

    Ok(total)
}

fn skip(total: &mut MiningResult, warning: String) {
    tracing::warn!("{}", warning);
    total.warnings.push(warning);
}
