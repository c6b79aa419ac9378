//! Show the effective configuration.

use handpad_common::config::{config_file_path, AppConfig};
use handpad_gesture_core::SessionConfig;

use super::load_tuning;

pub fn run(app: &AppConfig, write: bool) -> anyhow::Result<()> {
    println!("Config file: {}", config_file_path().display());
    println!();

    println!("App config:");
    println!("{}", serde_json::to_string_pretty(app)?);
    println!();

    let tuning = match load_tuning(app, None) {
        Ok(tuning) => tuning,
        Err(e) => {
            println!("[WARN] {e}; showing defaults");
            SessionConfig::default()
        }
    };
    println!("Core tuning:");
    println!("{}", serde_json::to_string_pretty(&tuning)?);

    if write {
        let path = app
            .save()
            .map_err(|e| anyhow::anyhow!("Failed to save config: {e}"))?;
        println!();
        println!("Saved app config to {}", path.display());
    }

    Ok(())
}
