// ── Runtime connection configuration ──
//
// These types describe *how* to talk to one door. They carry credential
// data and polling tuning, but never touch disk: the CLI (via
// petwalk-config) builds a `ControllerConfig` and hands it in.

use std::time::Duration;

use secrecy::SecretString;

use crate::error::CoreError;
use crate::model::Pet;

/// Port the door's REST server listens on.
pub const DEFAULT_PORT: u16 = petwalk_api::DEFAULT_PORT;
/// Device polling cadence.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(5);
/// Cadence reserved for a future pet-status endpoint. Not polled today.
pub const PET_REFRESH_INTERVAL: Duration = Duration::from_secs(120);
/// Overall deadline for one fetch cycle (modes + states).
pub const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for a single door.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// IP address or hostname of the door.
    pub host: String,
    /// REST port (8080 unless overridden).
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    /// Expose per-pet last-event timestamp sensors.
    pub include_all_events: bool,
    /// Periodic refresh cadence. `Duration::ZERO` disables the timer;
    /// refreshes then only happen on request.
    pub refresh_interval: Duration,
    /// Deadline for a whole refresh cycle.
    pub refresh_timeout: Duration,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
    /// How long an "in" event keeps a pet home. `None` means forever.
    pub pet_event_ttl: Option<Duration>,
    /// Known pets, used to build presence entities.
    pub pets: Vec<Pet>,
}

impl ControllerConfig {
    /// Minimal config for `host` with every other field at its default.
    pub fn new(host: impl Into<String>, username: impl Into<String>, password: SecretString) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            username: username.into(),
            password,
            include_all_events: false,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            refresh_timeout: DEFAULT_REFRESH_TIMEOUT,
            request_timeout: DEFAULT_REFRESH_TIMEOUT,
            pet_event_ttl: None,
            pets: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.host.trim().is_empty() {
            return Err(CoreError::Config {
                message: "door address must not be empty".into(),
            });
        }
        if self.port == 0 {
            return Err(CoreError::Config {
                message: "port must be non-zero".into(),
            });
        }
        if self.refresh_timeout.is_zero() {
            return Err(CoreError::Config {
                message: "refresh timeout must be non-zero".into(),
            });
        }
        Ok(())
    }

    pub(crate) fn transport(&self) -> petwalk_api::TransportConfig {
        petwalk_api::TransportConfig::default().with_timeout(self.request_timeout)
    }
}
