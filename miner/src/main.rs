//! Toggle miner entry point.
//!
//! Subcommands:
//! - `toggles`: mine toggle lifecycle events from git history into CSV
//! - `releases`: collect release dates per milestone into CSV
//! - `efforts`: files and lines changed per commit into CSV
//! - `profiles`: print the available file-format profiles as JSON

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use toggle_miner::commands::{self, ReleaseOptions, ToggleOptions};
use toggle_miner::{MinerConfig, MinerResult};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "toggle-miner")]
#[command(about = "Mine feature toggle history from git repositories")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Mine toggle events from the tracked files
    Toggles {
        /// Repository to mine
        #[arg(long, short)]
        repo: Option<PathBuf>,

        /// Directory for output tables
        #[arg(long, short)]
        output_dir: Option<PathBuf>,

        /// Truncate output tables instead of appending
        #[arg(long)]
        overwrite: bool,

        /// Lookback window for name resolution
        #[arg(long)]
        lookback: Option<usize>,

        /// Diff context lines passed to git (-U<n>)
        #[arg(long)]
        context_lines: Option<usize>,

        /// Mine a single file (requires --profile)
        #[arg(long)]
        file: Option<String>,

        /// Profile for --file, or only mine entries using this profile
        #[arg(long, short)]
        profile: Option<String>,

        /// Output table for --file
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Collect release metadata for a milestone range
    Releases {
        #[arg(long)]
        start: Option<u32>,

        #[arg(long)]
        end: Option<u32>,

        /// Release channel, e.g. Stable or Beta
        #[arg(long)]
        channel: Option<String>,

        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Count files and lines changed per commit
    Efforts {
        /// Repository to read
        #[arg(long, short)]
        repo: Option<PathBuf>,

        /// Only count commits touching these paths
        #[arg(long = "path")]
        paths: Vec<String>,

        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Print the available profiles as JSON
    Profiles,
}

fn main() {
    let args = Args::parse();

    let log_filter = if args.verbose {
        "toggle_miner=debug,toggle_core=debug"
    } else {
        "toggle_miner=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> MinerResult<()> {
    let mut config = MinerConfig::load_or_default(args.config.as_deref())?;

    match args.command {
        Command::Toggles {
            repo,
            output_dir,
            overwrite,
            lookback,
            context_lines,
            file,
            profile,
            output,
        } => {
            let options = ToggleOptions {
                repo,
                output_dir,
                overwrite,
                lookback,
                context_lines,
                file,
                profile,
                output,
            };
            options.apply(&mut config)?;

            tracing::info!("Mining {}", config.repo.display());
            let result = commands::toggles::run(&config)?;
            if result.unresolved_names > 0 {
                tracing::info!("{} events have no resolved name", result.unresolved_names);
            }
        }
        Command::Releases {
            start,
            end,
            channel,
            output,
        } => {
            let options = ReleaseOptions {
                start,
                end,
                channel,
                output,
            };
            options.apply(&mut config.releases);
            config.validate()?;
            commands::releases::run(&config.releases, &config.output_dir)?;
        }
        Command::Efforts {
            repo,
            paths,
            output,
        } => {
            if let Some(repo) = repo {
                config.repo = repo;
            }
            if !paths.is_empty() {
                config.efforts.paths = paths;
            }
            if let Some(output) = output {
                config.efforts.output = output;
            }
            commands::efforts::run(&config.repo, &config.efforts, &config.output_dir)?;
        }
        Command::Profiles => {
            let stdout = std::io::stdout();
            commands::profiles::run(&config, &mut stdout.lock())?;
        }
    }

    Ok(())
}
