//! Shared configuration for PetWALK tools.
//!
//! TOML profiles (one per door), credential resolution (env + keyring +
//! plaintext), and translation to `petwalk_core::ControllerConfig`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use petwalk_core::{ControllerConfig, Pet};

/// Keyring service name for stored door passwords.
pub const KEYRING_SERVICE: &str = "petwalk";
/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "PETWALK_CONFIG";
/// Environment variable holding the door password.
pub const PASSWORD_ENV: &str = "PETWALK_PASSWORD";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no password configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{name}' not found")]
    ProfileNotFound { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Named door profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Look up `name`, or the default profile when `name` is `None`.
    pub fn profile<'a>(&'a self, name: Option<&'a str>) -> Result<(&'a str, &'a Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or("default");
        self.profiles
            .get(name)
            .map(|p| (name, p))
            .ok_or_else(|| ConfigError::ProfileNotFound { name: name.into() })
    }
}

/// One door.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Profile {
    /// IP address or hostname of the door.
    pub ip_address: String,

    pub username: String,

    /// Password (plaintext; prefer keyring or env var).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Environment variable name containing the password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_env: Option<String>,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Expose per-pet last-event sensors.
    #[serde(default)]
    pub include_all_events: bool,

    /// Periodic refresh cadence in seconds. 0 disables polling.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Deadline for one refresh cycle and for each request.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// How long an entry event keeps a pet home. Unset means forever.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pet_event_ttl_secs: Option<u64>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pets: Vec<Pet>,
}

impl Profile {
    pub fn new(ip_address: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            ip_address: ip_address.into(),
            username: username.into(),
            password: None,
            password_env: None,
            port: default_port(),
            include_all_events: false,
            poll_interval_secs: default_poll_interval(),
            timeout_secs: default_timeout(),
            pet_event_ttl_secs: None,
            pets: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ip_address.trim().is_empty() {
            return Err(invalid("ip_address", "must not be empty"));
        }
        if self.username.trim().is_empty() {
            return Err(invalid("username", "must not be empty"));
        }
        if self.port == 0 {
            return Err(invalid("port", "must be between 1 and 65535"));
        }
        if self.timeout_secs == 0 {
            return Err(invalid("timeout_secs", "must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

fn default_port() -> u16 {
    petwalk_core::config::DEFAULT_PORT
}
fn default_poll_interval() -> u64 {
    petwalk_core::config::DEFAULT_REFRESH_INTERVAL.as_secs()
}
fn default_timeout() -> u64 {
    petwalk_core::config::DEFAULT_REFRESH_TIMEOUT.as_secs()
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path: `PETWALK_CONFIG`, else platform conventions.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    ProjectDirs::from("com", "petwalk", "petwalk").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("petwalk");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config from `path`, layered as defaults < file < `PETWALK_*` env.
///
/// Nested keys use a double underscore, e.g.
/// `PETWALK_PROFILES__HOME__PORT=8081`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("PETWALK_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(&path, cfg)?;
    Ok(path)
}

pub fn save_config_to(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, keyring::Error> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password"))
}

/// Resolve the door password from the credential chain:
/// `password_env` -> `PETWALK_PASSWORD` -> system keyring -> plaintext.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    // 1. Profile's password_env → env var lookup
    if let Some(ref env_name) = profile.password_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. Global env var
    if let Ok(val) = std::env::var(PASSWORD_ENV) {
        return Ok(SecretString::from(val));
    }

    // 3. System keyring
    if let Ok(entry) = keyring_entry(profile_name) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    // 4. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Store a password in the system keyring for `profile_name`.
pub fn store_password(profile_name: &str, password: &str) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?.set_password(password)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

/// Build a `ControllerConfig` from a profile.
pub fn profile_to_controller_config(
    profile: &Profile,
    profile_name: &str,
) -> Result<ControllerConfig, ConfigError> {
    profile.validate()?;
    let password = resolve_password(profile, profile_name)?;
    Ok(build_controller_config(profile, password))
}

/// Same as [`profile_to_controller_config`], with an explicit password.
pub fn build_controller_config(profile: &Profile, password: SecretString) -> ControllerConfig {
    let timeout = Duration::from_secs(profile.timeout_secs);

    let mut config =
        ControllerConfig::new(profile.ip_address.trim(), profile.username.clone(), password);
    config.port = profile.port;
    config.include_all_events = profile.include_all_events;
    config.refresh_interval = Duration::from_secs(profile.poll_interval_secs);
    config.refresh_timeout = timeout;
    config.request_timeout = timeout;
    config.pet_event_ttl = profile.pet_event_ttl_secs.map(Duration::from_secs);
    config.pets.clone_from(&profile.pets);
    config
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn profile_defaults_match_door_defaults() {
        let profile: Profile = toml::from_str(
            r#"
            ip_address = "192.168.1.50"
            username = "admin"
            "#,
        )
        .unwrap();

        assert_eq!(profile, Profile::new("192.168.1.50", "admin"));
        assert_eq!(profile.port, 8080);
        assert_eq!(profile.poll_interval_secs, 5);
        assert_eq!(profile.timeout_secs, 10);
        assert!(!profile.include_all_events);
    }

    #[test]
    fn validation_rejects_empty_address_and_zero_port() {
        let mut profile = Profile::new(" ", "admin");
        assert!(matches!(
            profile.validate(),
            Err(ConfigError::Validation { ref field, .. }) if field == "ip_address"
        ));

        profile.ip_address = "10.0.0.2".into();
        profile.port = 0;
        assert!(matches!(
            profile.validate(),
            Err(ConfigError::Validation { ref field, .. }) if field == "port"
        ));
    }

    #[test]
    fn controller_config_carries_profile_tuning() {
        let mut profile = Profile::new("10.0.0.2", "admin");
        profile.port = 8081;
        profile.poll_interval_secs = 0;
        profile.pet_event_ttl_secs = Some(600);

        let config = build_controller_config(&profile, SecretString::from("pw".to_string()));

        assert_eq!(config.host, "10.0.0.2");
        assert_eq!(config.port, 8081);
        assert_eq!(config.refresh_interval, Duration::ZERO);
        assert_eq!(config.refresh_timeout, Duration::from_secs(10));
        assert_eq!(config.pet_event_ttl, Some(Duration::from_secs(600)));
        assert_eq!(config.password.expose_secret(), "pw");
    }

    #[test]
    fn default_profile_lookup() {
        let mut cfg = Config::default();
        cfg.profiles
            .insert("default".into(), Profile::new("10.0.0.2", "admin"));

        let (name, profile) = cfg.profile(None).unwrap();
        assert_eq!(name, "default");
        assert_eq!(profile.ip_address, "10.0.0.2");

        assert!(matches!(
            cfg.profile(Some("garage")),
            Err(ConfigError::ProfileNotFound { .. })
        ));
    }
}
