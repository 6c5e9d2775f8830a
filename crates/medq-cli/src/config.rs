use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Config schema version written by this build. Files that omit it are read
/// as this version.
const CURRENT_VERSION: u32 = 1;

/// Environment variable that overrides the state file location.
pub const STATE_ENV: &str = "MEDQ_STATE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedqConfig {
    #[serde(default = "current_version")]
    pub config_version: u32,
    /// Where the store is persisted. `None` uses the data directory.
    #[serde(default)]
    pub state_path: Option<PathBuf>,
    /// Name recorded on audit events.
    #[serde(default = "default_actor")]
    pub actor: String,
    /// Log as JSON lines instead of human-readable text.
    #[serde(default)]
    pub json_logs: bool,
}

fn current_version() -> u32 {
    CURRENT_VERSION
}

fn default_actor() -> String {
    "system".to_string()
}

impl Default for MedqConfig {
    fn default() -> Self {
        Self {
            config_version: CURRENT_VERSION,
            state_path: None,
            actor: default_actor(),
            json_logs: false,
        }
    }
}

fn config_dir() -> eyre::Result<PathBuf> {
    let base = dirs::config_dir().ok_or_else(|| eyre::eyre!("no config directory found"))?;
    Ok(base.join("medq"))
}

pub fn config_path() -> eyre::Result<PathBuf> {
    Ok(config_dir()?.join("config.json"))
}

/// Load the config from its default location, or defaults if none was saved.
pub fn load_or_default() -> eyre::Result<MedqConfig> {
    let path = config_path()?;
    if !path.exists() {
        return Ok(MedqConfig::default());
    }
    load_config(&path)
}

pub fn load_config(path: &Path) -> eyre::Result<MedqConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("failed to read config at {}: {e}", path.display()))?;

    let config: MedqConfig = serde_json::from_str(&contents)
        .map_err(|e| eyre::eyre!("invalid config at {}: {e}", path.display()))?;
    check_version(config.config_version)?;
    Ok(config)
}

fn check_version(version: u32) -> eyre::Result<()> {
    if version > CURRENT_VERSION {
        return Err(eyre::eyre!(
            "config_version {version} is newer than this build supports ({CURRENT_VERSION}). \
             Please update medq."
        ));
    }
    Ok(())
}

pub fn save_config(path: &Path, config: &MedqConfig) -> eyre::Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }

    // Always write the current version, regardless of what was loaded.
    let mut stamped = config.clone();
    stamped.config_version = CURRENT_VERSION;

    let json = serde_json::to_string_pretty(&stamped)?;

    // Write to a temp file then rename for atomicity
    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, json.as_bytes())?;

    // Set restrictive permissions on Unix before renaming
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600))?;
    }

    std::fs::rename(&tmp_path, path)?;

    tracing::info!(path = %path.display(), "config saved");
    Ok(())
}

/// State file location: `MEDQ_STATE`, then the config, then the data directory.
pub fn state_path(config: &MedqConfig) -> eyre::Result<PathBuf> {
    if let Some(path) = std::env::var_os(STATE_ENV).filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    if let Some(path) = &config.state_path {
        return Ok(path.clone());
    }
    let base = dirs::data_dir().ok_or_else(|| eyre::eyre!("no data directory found"))?;
    Ok(base.join("medq").join("state.json"))
}
