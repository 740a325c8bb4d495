use std::path::Path;

use anyhow::{Context, Result};

use super::types::ToolsConfig;

/// Name of the optional config file looked up in the working directory.
pub const CONFIG_FILE: &str = ".gatecheck.yaml";

/// Load `.gatecheck.yaml` from `dir`, falling back to defaults when absent.
pub fn load(dir: &Path) -> Result<ToolsConfig> {
    let path = dir.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(ToolsConfig::default());
    }
    load_file(&path)
}

/// Load and validate an explicit config file.
pub fn load_file(path: &Path) -> Result<ToolsConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    // An empty file deserializes to unit, not a mapping.
    let cfg: ToolsConfig = if contents.trim().is_empty() {
        ToolsConfig::default()
    } else {
        serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse {}", path.display()))?
    };
    cfg.validate()
        .with_context(|| format!("invalid config in {}", path.display()))?;
    Ok(cfg)
}
