use std::path::Path;

use crate::settings::types::{CaptureConfig, ConfigError};

/// Load a capture config from a JSON file, returning defaults on a
/// missing file. The result is validated.
pub fn load_config(path: &Path) -> Result<CaptureConfig, ConfigError> {
    if !path.exists() {
        tracing::debug!("no config at {}, using defaults", path.display());
        return Ok(CaptureConfig::default());
    }
    let contents = std::fs::read_to_string(path)?;
    let config: CaptureConfig = serde_json::from_str(&contents)?;
    config.validate()?;
    Ok(config)
}
