use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

/// Command lines for the external tools each stage runs.
///
/// Every field is a shell-style command line (split with `shell-words`, never
/// passed to a shell). Missing fields in a config file keep their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub dependency_check: String,
    pub lint: String,
    pub security_scan: String,
    pub secret_scan: String,
    /// File the secret scanner's stdout is written to.
    pub secret_scan_output: PathBuf,
    pub tests: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            dependency_check: "pip check".to_string(),
            lint: "flake8 .".to_string(),
            security_scan: "bandit -r .".to_string(),
            secret_scan: "trufflehog filesystem . --json".to_string(),
            secret_scan_output: PathBuf::from("sensitive_data.json"),
            tests: "pytest --cov=validate_file_service --cov-report=html".to_string(),
        }
    }
}

impl ToolsConfig {
    /// Check that every command line splits cleanly and names a program.
    pub fn validate(&self) -> Result<()> {
        for (field, line) in self.command_lines() {
            split_command(line).with_context(|| format!("invalid `{field}` command"))?;
        }
        if self.secret_scan_output.as_os_str().is_empty() {
            bail!("`secret_scan_output` must not be empty");
        }
        Ok(())
    }

    fn command_lines(&self) -> [(&'static str, &str); 5] {
        [
            ("dependency_check", self.dependency_check.as_str()),
            ("lint", self.lint.as_str()),
            ("security_scan", self.security_scan.as_str()),
            ("secret_scan", self.secret_scan.as_str()),
            ("tests", self.tests.as_str()),
        ]
    }
}

/// Split a command line into program and arguments.
pub fn split_command(line: &str) -> Result<Vec<String>> {
    let words = shell_words::split(line).context("unbalanced quotes")?;
    if words.is_empty() {
        bail!("command line is empty");
    }
    Ok(words)
}
