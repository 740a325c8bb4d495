//! The four stage checks and the default stage list.
//!
//! Each check prints a running message, invokes its tool(s), and turns any
//! tool error into `false` plus a printed failure message. No error leaves
//! a check.

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::config::ToolsConfig;
use crate::console::Console;
use crate::pipeline::Stage;
use crate::process::{self, ToolCommand, ToolError};

pub const DEPENDENCY_STAGE: &str = "Dependency Checking";
pub const STATIC_ANALYSIS_STAGE: &str = "Static Code Analysis";
pub const SENSITIVE_DATA_STAGE: &str = "Sensitive Data Checking";
pub const TESTS_STAGE: &str = "Run Tests and Coverage Verification";

/// Build the pipeline's stages in their fixed order.
pub fn default_stages(cfg: &ToolsConfig, work_dir: &Path, console: &Console) -> Vec<Stage> {
    let ctx = CheckContext {
        tools: cfg.clone(),
        work_dir: work_dir.to_path_buf(),
        console: console.clone(),
    };

    let stages: [(&str, fn(&ToolsConfig, &Path, &Console) -> bool); 4] = [
        (DEPENDENCY_STAGE, check_dependencies),
        (STATIC_ANALYSIS_STAGE, static_code_analysis),
        (SENSITIVE_DATA_STAGE, sensitive_data_check),
        (TESTS_STAGE, run_tests_and_coverage),
    ];

    stages
        .into_iter()
        .map(|(name, check)| {
            let ctx = ctx.clone();
            Stage::new(name, move || check(&ctx.tools, &ctx.work_dir, &ctx.console))
        })
        .collect()
}

#[derive(Clone)]
struct CheckContext {
    tools: ToolsConfig,
    work_dir: PathBuf,
    console: Console,
}

pub fn check_dependencies(cfg: &ToolsConfig, work_dir: &Path, console: &Console) -> bool {
    console.line("Running dependency check...");
    match run_line(&cfg.dependency_check, work_dir) {
        Ok(()) => {
            console.line("Dependency check passed.");
            true
        }
        Err(e) => {
            warn!(stage = DEPENDENCY_STAGE, error = %e, "check failed");
            console.line("Dependency check failed. Please ensure all dependencies are installed.");
            false
        }
    }
}

/// Lint first; the security scanner only runs on a clean lint.
pub fn static_code_analysis(cfg: &ToolsConfig, work_dir: &Path, console: &Console) -> bool {
    console.line("Running static code analysis...");
    let result =
        run_line(&cfg.lint, work_dir).and_then(|_| run_line(&cfg.security_scan, work_dir));
    match result {
        Ok(()) => {
            console.line("Static code analysis passed.");
            true
        }
        Err(e) => {
            warn!(stage = STATIC_ANALYSIS_STAGE, error = %e, "check failed");
            console.line("Static code analysis failed. Please fix the reported issues.");
            false
        }
    }
}

/// Scan for secrets; the scanner's findings land in `secret_scan_output`.
pub fn sensitive_data_check(cfg: &ToolsConfig, work_dir: &Path, console: &Console) -> bool {
    console.line("Scanning for sensitive data...");
    let result = ToolCommand::from_line(&cfg.secret_scan, work_dir)
        .map(|cmd| cmd.with_stdout_file(&cfg.secret_scan_output))
        .and_then(|cmd| process::run(&cmd));
    match result {
        Ok(()) => {
            console.line("Sensitive data check passed.");
            true
        }
        Err(e) => {
            warn!(stage = SENSITIVE_DATA_STAGE, error = %e, "check failed");
            console.line(format_args!("Sensitive data check failed: {e}"));
            false
        }
    }
}

pub fn run_tests_and_coverage(cfg: &ToolsConfig, work_dir: &Path, console: &Console) -> bool {
    console.line("Running tests and generating coverage report...");
    match run_line(&cfg.tests, work_dir) {
        Ok(()) => {
            console.line("Tests passed and coverage report generated.");
            true
        }
        Err(e) => {
            warn!(stage = TESTS_STAGE, error = %e, "check failed");
            console.line("Tests failed or coverage verification failed.");
            false
        }
    }
}

fn run_line(line: &str, work_dir: &Path) -> Result<(), ToolError> {
    let cmd = ToolCommand::from_line(line, work_dir)?;
    process::run(&cmd)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    /// Config where every tool is `true`.
    fn passing() -> ToolsConfig {
        ToolsConfig {
            dependency_check: "true".into(),
            lint: "true".into(),
            security_scan: "true".into(),
            secret_scan: "true".into(),
            tests: "true".into(),
            ..ToolsConfig::default()
        }
    }

    #[test]
    fn default_stage_names_and_order() {
        let dir = tempfile::tempdir().unwrap();
        let (console, _buf) = Console::buffer();
        let stages = default_stages(&passing(), dir.path(), &console);
        let names: Vec<&str> = stages.iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            vec![
                "Dependency Checking",
                "Static Code Analysis",
                "Sensitive Data Checking",
                "Run Tests and Coverage Verification",
            ]
        );
    }

    #[test]
    fn dependency_check_passes() {
        let dir = tempfile::tempdir().unwrap();
        let (console, buf) = Console::buffer();
        assert!(check_dependencies(&passing(), dir.path(), &console));
        assert_eq!(
            buf.lines(),
            vec!["Running dependency check...", "Dependency check passed."]
        );
    }

    #[test]
    fn dependency_check_fails_on_non_zero_exit() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = ToolsConfig {
            dependency_check: "false".into(),
            ..passing()
        };
        let (console, buf) = Console::buffer();
        assert!(!check_dependencies(&cfg, dir.path(), &console));
        assert!(buf.contents().contains(
            "Dependency check failed. Please ensure all dependencies are installed."
        ));
    }

    #[test]
    fn dependency_check_fails_on_missing_program() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = ToolsConfig {
            dependency_check: "gatecheck-missing-pip-xyz check".into(),
            ..passing()
        };
        let (console, _buf) = Console::buffer();
        assert!(!check_dependencies(&cfg, dir.path(), &console));
    }

    #[test]
    fn static_analysis_skips_security_scan_after_lint_failure() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = ToolsConfig {
            lint: "false".into(),
            security_scan: "touch scanned".into(),
            ..passing()
        };
        let (console, buf) = Console::buffer();
        assert!(!static_code_analysis(&cfg, dir.path(), &console));
        assert!(!dir.path().join("scanned").exists());
        assert!(
            buf.contents()
                .contains("Static code analysis failed. Please fix the reported issues.")
        );
    }

    #[test]
    fn static_analysis_fails_when_security_scan_fails() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = ToolsConfig {
            security_scan: "false".into(),
            ..passing()
        };
        let (console, _buf) = Console::buffer();
        assert!(!static_code_analysis(&cfg, dir.path(), &console));
    }

    #[test]
    fn static_analysis_runs_both_tools() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = ToolsConfig {
            lint: "touch linted".into(),
            security_scan: "touch scanned".into(),
            ..passing()
        };
        let (console, buf) = Console::buffer();
        assert!(static_code_analysis(&cfg, dir.path(), &console));
        assert!(dir.path().join("linted").exists());
        assert!(dir.path().join("scanned").exists());
        assert!(buf.contents().contains("Static code analysis passed."));
    }

    #[test]
    fn sensitive_data_check_writes_results_file() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = ToolsConfig {
            secret_scan: r#"sh -c "echo '{\"results\": []}'""#.into(),
            ..passing()
        };
        let (console, buf) = Console::buffer();
        assert!(sensitive_data_check(&cfg, dir.path(), &console));

        let written = std::fs::read_to_string(dir.path().join("sensitive_data.json")).unwrap();
        assert_eq!(written.trim(), r#"{"results": []}"#);
        assert!(buf.contents().contains("Sensitive data check passed."));
    }

    #[test]
    fn sensitive_data_check_reports_error_text() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = ToolsConfig {
            secret_scan: "gatecheck-missing-trufflehog-xyz filesystem .".into(),
            ..passing()
        };
        let (console, buf) = Console::buffer();
        assert!(!sensitive_data_check(&cfg, dir.path(), &console));

        let last = buf.lines().pop().unwrap();
        assert!(last.starts_with("Sensitive data check failed: "));
        assert!(last.contains("gatecheck-missing-trufflehog-xyz"));
    }

    #[test]
    fn sensitive_data_check_fails_on_invalid_command_line() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = ToolsConfig {
            secret_scan: "trufflehog 'unbalanced".into(),
            ..passing()
        };
        let (console, buf) = Console::buffer();
        assert!(!sensitive_data_check(&cfg, dir.path(), &console));
        assert!(buf.contents().contains("invalid command line"));
    }

    #[test]
    fn tests_stage_fails_on_non_zero_exit() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = ToolsConfig {
            tests: "sh -c 'exit 2'".into(),
            ..passing()
        };
        let (console, buf) = Console::buffer();
        assert!(!run_tests_and_coverage(&cfg, dir.path(), &console));
        assert!(
            buf.contents()
                .contains("Tests failed or coverage verification failed.")
        );
    }

    #[test]
    fn tests_stage_passes() {
        let dir = tempfile::tempdir().unwrap();
        let (console, buf) = Console::buffer();
        assert!(run_tests_and_coverage(&passing(), dir.path(), &console));
        assert_eq!(
            buf.lines(),
            vec![
                "Running tests and generating coverage report...",
                "Tests passed and coverage report generated.",
            ]
        );
    }
}
