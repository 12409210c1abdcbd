use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use glance_config::Config;
use serde::{Deserialize, Serialize};

const PROFILE_NAME: &str = "main";

/// `<config_dir>/glance/settings.json`
pub fn default_settings_path() -> anyhow::Result<PathBuf> {
    let base = dirs::config_dir().context("No user config directory on this platform")?;
    Ok(base.join("glance").join("settings.json"))
}

/// Settings file contents
#[derive(Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub value: Config,
}

/// Load the profile at `path`, writing defaults on first run.
///
/// A file that no longer parses is moved aside to `*.json.corrupt` and
/// replaced by defaults.
pub fn load_or_init(path: &Path) -> anyhow::Result<Config> {
    let mut config = if path.exists() {
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        match serde_json::from_str::<Profile>(&data) {
            Ok(profile) => profile.value,
            Err(e) => {
                tracing::warn!("Settings file {} is invalid, using defaults: {}", path.display(), e);
                let backup = path.with_extension("json.corrupt");
                if let Err(e) = fs::rename(path, &backup) {
                    tracing::warn!("Could not back up {}: {}", path.display(), e);
                }
                let config = Config::default();
                save(path, &config)?;
                config
            }
        }
    } else {
        tracing::info!("Creating settings profile at {}", path.display());
        let config = Config::default();
        save(path, &config)?;
        config
    };

    config.normalize();
    Ok(config)
}

pub fn save(path: &Path, config: &Config) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let profile = Profile {
        name: PROFILE_NAME.into(),
        value: config.clone(),
    };
    fs::write(path, serde_json::to_string_pretty(&profile)?)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    tracing::debug!("Saved settings to {}", path.display());
    Ok(())
}
