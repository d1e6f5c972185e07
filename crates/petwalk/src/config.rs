//! Bridges `petwalk-config` profiles and `GlobalOpts` flag overrides into a
//! core `ControllerConfig`.
//!
//! Core never sees these types -- it receives a pre-built `ControllerConfig`.

use std::time::Duration;

use secrecy::SecretString;

use petwalk_config::{Config, Profile};
use petwalk_core::ControllerConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use petwalk_config::{config_path, load_config_or_default, save_config};

/// Profile selected by `--profile`, else the config's default.
pub fn active_profile_name(global: &GlobalOpts, cfg: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| cfg.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Apply CLI flag overrides on top of a stored profile.
fn apply_overrides(profile: &Profile, global: &GlobalOpts) -> Profile {
    let mut profile = profile.clone();
    if let Some(ref host) = global.host {
        profile.ip_address.clone_from(host);
    }
    if let Some(port) = global.port {
        profile.port = port;
    }
    if let Some(ref username) = global.username {
        profile.username.clone_from(username);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout_secs = timeout;
    }
    profile
}

/// Build a `ControllerConfig` from the config file, profile, and CLI overrides.
pub fn build_controller_config(global: &GlobalOpts) -> Result<ControllerConfig, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    let profile = match cfg.profiles.get(&profile_name) {
        Some(stored) => apply_overrides(stored, global),
        None if global.profile.is_some() => {
            return Err(petwalk_config::ConfigError::ProfileNotFound { name: profile_name }.into());
        }
        // No profile -- build from CLI flags / env vars alone
        None => {
            let host = global.host.clone().ok_or_else(|| CliError::NoConfig {
                path: config_path().display().to_string(),
            })?;
            let username = global.username.clone().ok_or_else(|| CliError::Validation {
                field: "username".into(),
                reason: "--username is required without a profile".into(),
            })?;
            apply_overrides(&Profile::new(host, username), global)
        }
    };

    profile.validate()?;

    // An explicit --password wins over the profile's credential chain.
    let config = match global.password {
        Some(ref pw) => {
            petwalk_config::build_controller_config(&profile, SecretString::from(pw.clone()))
        }
        None => petwalk_config::profile_to_controller_config(&profile, &profile_name)?,
    };
    Ok(config)
}

/// Override the polling cadence (used by `watch --interval`).
pub fn with_interval(mut config: ControllerConfig, secs: Option<u64>) -> ControllerConfig {
    if let Some(secs) = secs {
        config.refresh_interval = Duration::from_secs(secs);
    }
    config
}
