use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::split_command;

/// Describes one external tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
    pub work_dir: PathBuf,
    /// When set, the tool's stdout is written to this file (relative paths
    /// resolve against `work_dir`) instead of being relayed to the log.
    pub stdout_path: Option<PathBuf>,
}

impl ToolCommand {
    /// Build a command from a shell-style command line.
    pub fn from_line(line: &str, work_dir: &Path) -> Result<Self, ToolError> {
        let mut words = split_command(line)
            .map_err(|e| ToolError::InvalidCommand {
                line: line.to_string(),
                reason: e.to_string(),
            })?
            .into_iter();
        // split_command guarantees at least one word.
        let program = words.next().unwrap_or_default();
        Ok(Self {
            program,
            args: words.collect(),
            work_dir: work_dir.to_path_buf(),
            stdout_path: None,
        })
    }

    pub fn with_stdout_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.stdout_path = Some(path.into());
        self
    }

    /// Absolute location of the stdout capture file, if any.
    pub fn stdout_file(&self) -> Option<PathBuf> {
        self.stdout_path.as_ref().map(|p| self.work_dir.join(p))
    }
}

/// Ways a tool invocation can fail.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("invalid command line `{line}`: {reason}")]
    InvalidCommand { line: String, reason: String },

    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program}` exited with status {code}")]
    Failed { program: String, code: i32 },

    #[error("`{program}` was terminated by a signal")]
    Terminated { program: String },

    #[error("I/O error while running `{program}`: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
}
