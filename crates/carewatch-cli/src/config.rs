use std::path::{Path, PathBuf};
use std::time::Duration;

use jiff::tz::TimeZone;
use serde::{Deserialize, Serialize};

/// Current config version. Bump this when adding fields or changing shape.
/// Each bump requires a corresponding entry in [`migrate`].
const CURRENT_VERSION: u32 = 1;

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api/";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const ENV_API_URL: &str = "CAREWATCH_API_URL";
pub const ENV_API_TOKEN: &str = "CAREWATCH_API_TOKEN";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarewatchConfig {
    /// Schema version. Missing or 0 = pre-versioned config.
    #[serde(default)]
    pub config_version: u32,
    pub api_base_url: String,
    /// Request timeout for every remote call. Added in v1.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    /// IANA zone used for day grouping. The system zone when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

impl Default for CarewatchConfig {
    fn default() -> Self {
        Self {
            config_version: CURRENT_VERSION,
            api_base_url: DEFAULT_API_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            api_token: None,
            timezone: None,
        }
    }
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl CarewatchConfig {
    /// Apply `CAREWATCH_API_URL` / `CAREWATCH_API_TOKEN` from `lookup`.
    /// Blank values are ignored.
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_blank = |key: &str| lookup(key).filter(|v: &String| !v.trim().is_empty());
        if let Some(url) = non_blank(ENV_API_URL) {
            self.api_base_url = url;
        }
        if let Some(token) = non_blank(ENV_API_TOKEN) {
            self.api_token = Some(token);
        }
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn time_zone(&self) -> eyre::Result<TimeZone> {
        match &self.timezone {
            Some(name) if name.eq_ignore_ascii_case("utc") => Ok(TimeZone::UTC),
            Some(name) => TimeZone::get(name)
                .map_err(|e| eyre::eyre!("unknown time zone {name:?} in config: {e}")),
            None => Ok(TimeZone::system()),
        }
    }
}

/// Redacted config info safe to print.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigInfo {
    pub path: String,
    pub api_base_url: String,
    pub timeout_secs: u64,
    pub token_hint: Option<String>,
    pub timezone: String,
}

fn config_dir() -> eyre::Result<PathBuf> {
    let base = dirs::config_dir().ok_or_else(|| eyre::eyre!("no config directory found"))?;
    Ok(base.join("carewatch"))
}

pub fn config_path() -> eyre::Result<PathBuf> {
    Ok(config_dir()?.join("config.json"))
}

/// Load the config from the default location, or defaults when there is
/// no config file yet.
pub fn load_config() -> eyre::Result<CarewatchConfig> {
    let path = config_path()?;
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(CarewatchConfig::default());
    }
    load_config_from(&path)
}

pub fn load_config_from(path: &Path) -> eyre::Result<CarewatchConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("failed to read config at {}: {e}", path.display()))?;

    // Parse as raw JSON so we can run migrations before deserializing.
    let json: serde_json::Value = serde_json::from_str(&contents)?;
    let on_disk_version = match json.get("config_version").and_then(|v| v.as_u64()) {
        Some(v) => u32::try_from(v).map_err(|_| {
            eyre::eyre!(
                "config_version {v} is newer than this build supports ({CURRENT_VERSION}). \
                 Please update carewatch."
            )
        })?,
        None => 0,
    };

    let migrated = migrate(json, on_disk_version)?;
    let config: CarewatchConfig = serde_json::from_value(migrated)?;
    Ok(config)
}

/// Run sequential migrations from `from_version` up to [`CURRENT_VERSION`].
///
/// Each migration is a pure transform on the raw JSON value.
pub fn migrate(mut json: serde_json::Value, from_version: u32) -> eyre::Result<serde_json::Value> {
    if from_version > CURRENT_VERSION {
        return Err(eyre::eyre!(
            "config_version {from_version} is newer than this build supports ({CURRENT_VERSION}). \
             Please update carewatch."
        ));
    }

    // v0 -> v1: add timeout_secs
    if from_version < 1 {
        let obj = json
            .as_object_mut()
            .ok_or_else(|| eyre::eyre!("config is not a JSON object"))?;
        obj.entry("timeout_secs")
            .or_insert(serde_json::Value::Number(DEFAULT_TIMEOUT_SECS.into()));
        obj.insert(
            "config_version".to_string(),
            serde_json::Value::Number(1.into()),
        );
        tracing::info!("migrated config v0 -> v1 (added timeout_secs)");
    }

    Ok(json)
}

pub fn save_config(config: &CarewatchConfig) -> eyre::Result<PathBuf> {
    let dir = config_dir()?;
    save_config_in(&dir, config)
}

/// Write `config.json` into `dir`, creating it if needed.
pub fn save_config_in(dir: &Path, config: &CarewatchConfig) -> eyre::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;

    // Always write the current version, regardless of what was loaded.
    let mut stamped = config.clone();
    stamped.config_version = CURRENT_VERSION;

    let path = dir.join("config.json");
    let json = serde_json::to_string_pretty(&stamped)?;

    // Write to a temp file then rename for atomicity
    let tmp_path = dir.join("config.json.tmp");
    std::fs::write(&tmp_path, json.as_bytes())?;

    // The file may hold an API token.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600))?;
    }

    std::fs::rename(&tmp_path, &path)?;

    tracing::info!(path = %path.display(), "config saved");
    Ok(path)
}

pub fn config_info(config: &CarewatchConfig, path: &Path) -> ConfigInfo {
    ConfigInfo {
        path: path.display().to_string(),
        api_base_url: config.api_base_url.clone(),
        timeout_secs: config.timeout_secs,
        token_hint: config.api_token.as_deref().map(redact_token),
        timezone: config
            .timezone
            .clone()
            .unwrap_or_else(|| "system".to_string()),
    }
}

fn redact_token(token: &str) -> String {
    if token.len() <= 8 || !token.is_ascii() {
        return "****".to_string();
    }
    let prefix = &token[..4];
    let suffix = &token[token.len() - 4..];
    format!("{prefix}...{suffix}")
}
