//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors
//! with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use petwalk_config::ConfigError;
use petwalk_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to door at {url}")]
    #[diagnostic(
        code(petwalk::connection_failed),
        help(
            "Check that the door is powered and reachable on the local network.\n\
             URL: {url}\n\
             Try: petwalk config test"
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Door did not answer in time: {detail}")]
    #[diagnostic(
        code(petwalk::timeout),
        help("Increase the timeout with --timeout or check the door's Wi-Fi signal.")
    )]
    Timeout { detail: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed")]
    #[diagnostic(
        code(petwalk::auth_failed),
        help(
            "Verify the username and password configured in the PetWALK app.\n\
             Run: petwalk config set-password --profile {profile}"
        )
    )]
    AuthFailed { profile: String },

    #[error("No password configured for profile '{profile}'")]
    #[diagnostic(
        code(petwalk::no_credentials),
        help(
            "Configure credentials with: petwalk config init\n\
             Or set the PETWALK_PASSWORD environment variable."
        )
    )]
    NoCredentials { profile: String },

    // ── Door responses ───────────────────────────────────────────────
    #[error("Door rejected the request (HTTP {status}): {message}")]
    #[diagnostic(code(petwalk::rejected))]
    Rejected { status: u16, message: String },

    #[error("Door sent an unexpected response: {message}")]
    #[diagnostic(
        code(petwalk::malformed),
        help("The door firmware may be newer than this tool supports.")
    )]
    MalformedResponse { message: String },

    #[error("Unknown command '{key}'")]
    #[diagnostic(
        code(petwalk::invalid_command),
        help("Valid state keys are 'door' and 'system'.")
    )]
    InvalidCommand { key: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(petwalk::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(petwalk::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: petwalk config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No door configured")]
    #[diagnostic(
        code(petwalk::no_config),
        help(
            "Create a profile with: petwalk config init\n\
             Or pass --host and --username.\n\
             Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(petwalk::config))]
    Config(ConfigError),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Operation '{action}' requires confirmation")]
    #[diagnostic(
        code(petwalk::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Internal ─────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(petwalk::internal))]
    Internal { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. }
            | Self::InvalidCommand { .. }
            | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        Self::from(&err)
    }
}

impl From<&CoreError> for CliError {
    fn from(err: &CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed {
                url: url.clone(),
                source: reason.clone().into(),
            },

            CoreError::AuthenticationFailed { message: _ } => CliError::AuthFailed {
                profile: "current".into(),
            },

            CoreError::RequestTimeout | CoreError::CycleTimeout { .. } => CliError::Timeout {
                detail: err.to_string(),
            },

            CoreError::Rejected { status, message } => CliError::Rejected {
                status: *status,
                message: message.clone(),
            },

            CoreError::MalformedPayload { message } => CliError::MalformedResponse {
                message: message.clone(),
            },

            // Startup and refresh failures surface as their underlying cause.
            CoreError::NotReady { cause } | CoreError::RefreshFailed { cause } => {
                CliError::from(cause.as_ref())
            }

            CoreError::InvalidCommand { key } => CliError::InvalidCommand { key: key.clone() },

            CoreError::ValidationFailed { message } => CliError::Validation {
                field: "input".into(),
                reason: message.clone(),
            },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message.clone(),
            },

            CoreError::NotInitialized | CoreError::ShutDown | CoreError::Internal(_) => {
                CliError::Internal {
                    message: err.to_string(),
                }
            }
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::ProfileNotFound { name } => CliError::ProfileNotFound {
                name,
                available: available_profiles(),
            },
            other => CliError::Config(other),
        }
    }
}

fn available_profiles() -> String {
    let cfg = petwalk_config::load_config_or_default();
    if cfg.profiles.is_empty() {
        "(none)".into()
    } else {
        cfg.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}
