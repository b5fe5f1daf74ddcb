//! Git command execution wrapper.

use super::GitMiningError;
use std::path::Path;
use std::process::Command;

/// Wrapper for executing git commands.
pub struct GitExecutor {
    repo_path: std::path::PathBuf,
}

impl GitExecutor {
    /// Create a new git executor for the given repository path.
    pub fn new(repo_path: &Path) -> Result<Self, GitMiningError> {
        // Verify git is available
        let output = Command::new("git")
            .arg("--version")
            .output()
            .map_err(|_| GitMiningError::GitNotAvailable)?;

        if !output.status.success() {
            return Err(GitMiningError::GitNotAvailable);
        }

        // Verify path is a git repository
        let output = Command::new("git")
            .current_dir(repo_path)
            .args(["rev-parse", "--git-dir"])
            .output()?;

        if !output.status.success() {
            return Err(GitMiningError::NotARepository(repo_path.to_path_buf()));
        }

        Ok(Self {
            repo_path: repo_path.to_path_buf(),
        })
    }

    /// Get the rename-following patch history of one file.
    ///
    /// `format` is passed to `--format=`; `context_lines` widens each hunk
    /// (`-U<n>`) so that enclosing name fields show up in the diff.
    pub fn log_patch(
        &self,
        path: &Path,
        format: &str,
        context_lines: Option<usize>,
    ) -> Result<String, GitMiningError> {
        let mut cmd = Command::new("git");
        cmd.current_dir(&self.repo_path);
        cmd.args(["log", "--no-color", "--follow", "--full-history", "-p"]);

        if let Some(n) = context_lines {
            cmd.arg(format!("-U{}", n));
        }

        cmd.arg(format!("--format={}", format));
        cmd.arg("--");
        cmd.arg(path);

        run(cmd)
    }

    /// Earlier names of a file, newest first, from `--follow --name-status`.
    pub fn renamed_paths(&self, path: &Path) -> Result<Vec<String>, GitMiningError> {
        let mut cmd = Command::new("git");
        cmd.current_dir(&self.repo_path);
        cmd.args(["log", "--no-color", "--follow", "--name-status", "--format="]);
        cmd.arg("--");
        cmd.arg(path);

        Ok(parse_renames(&run(cmd)?))
    }

    /// Tracked files matching a pathspec glob, e.g. `*switches*.cc`.
    pub fn ls_files(&self, pattern: &str) -> Result<Vec<String>, GitMiningError> {
        let mut cmd = Command::new("git");
        cmd.current_dir(&self.repo_path);
        cmd.args(["ls-files", "--", pattern]);

        let stdout = run(cmd)?;
        Ok(stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect())
    }

    /// Per-commit `--numstat` listing, optionally limited to `paths`.
    pub fn numstat(&self, paths: &[String]) -> Result<String, GitMiningError> {
        let mut cmd = Command::new("git");
        cmd.current_dir(&self.repo_path);
        cmd.args(["log", "--no-color", "--numstat", "--format=%H"]);

        if !paths.is_empty() {
            cmd.arg("--");
            cmd.args(paths);
        }

        run(cmd)
    }

    /// Get repository root path.
    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }
}

fn run(mut cmd: Command) -> Result<String, GitMiningError> {
    let output = cmd.output()?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(GitMiningError::CommandFailed(stderr.trim().to_string()));
    }

    // Old patches are not always UTF-8; undecodable bytes become U+FFFD.
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Previous paths from `R<score>\t<old>\t<new>` name-status lines.
fn parse_renames(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| {
            let parts: Vec<&str> = line.split('\t').collect();
            match parts.as_slice() {
                [status, old, _new] if status.starts_with('R') => Some(old.to_string()),
                _ => None,
            }
        })
        .collect()
}
