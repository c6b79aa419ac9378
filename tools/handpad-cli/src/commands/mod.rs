pub mod config;
pub mod replay;
pub mod simulate;

use std::path::{Path, PathBuf};

use handpad_common::config::AppConfig;
use handpad_gesture_core::SessionConfig;

/// Core tuning from `explicit`, else the app config's `tuning_path`, else
/// the defaults.
pub fn load_tuning(app: &AppConfig, explicit: Option<&Path>) -> anyhow::Result<SessionConfig> {
    let path: Option<PathBuf> = explicit
        .map(Path::to_path_buf)
        .or_else(|| app.tuning_path.clone());

    let Some(path) = path else {
        return Ok(SessionConfig::default());
    };

    let json = std::fs::read_to_string(&path)
        .map_err(|e| anyhow::anyhow!("Failed to read tuning {}: {e}", path.display()))?;
    let config = SessionConfig::from_json_str(&json)
        .map_err(|e| anyhow::anyhow!("Invalid tuning {}: {e}", path.display()))?;
    tracing::info!(path = %path.display(), "Loaded core tuning");
    Ok(config)
}
