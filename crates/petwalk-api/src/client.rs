// PetWALK REST client
//
// Wraps `reqwest::Client` with base URL construction, HTTP basic auth,
// and status/JSON handling for the four endpoints the door exposes.
// No caching and no retries live here; the coordinator in petwalk-core
// owns both.

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::models::{ModesPayload, StatesPayload, StatesUpdate};
use crate::transport::TransportConfig;

/// Raw HTTP client for a single PetWALK door.
///
/// Every request carries the basic-auth credentials supplied at
/// construction. The inner `reqwest::Client` pools connections, so one
/// instance should be shared for the lifetime of the device handle.
#[derive(Debug, Clone)]
pub struct PetwalkClient {
    http: reqwest::Client,
    base_url: Url,
    username: String,
    password: SecretString,
}

impl PetwalkClient {
    /// Create a client for the door at `host:port`.
    ///
    /// `host` is an IP address or hostname; IPv6 literals are bracketed
    /// automatically.
    pub fn new(
        host: &str,
        port: u16,
        username: impl Into<String>,
        password: SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let base_url = base_url(host, port)?;
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url, username, password))
    }

    /// Create a client with a pre-built `reqwest::Client` and base URL.
    ///
    /// Used by tests to point the client at a mock server.
    pub fn with_client(
        http: reqwest::Client,
        base_url: Url,
        username: impl Into<String>,
        password: SecretString,
    ) -> Self {
        Self {
            http,
            base_url,
            username: username.into(),
            password,
        }
    }

    /// The door's base URL (e.g. `http://192.168.1.50:8080/`).
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The configured basic-auth username.
    pub fn username(&self) -> &str {
        &self.username
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// Fetch the current mode flags.
    ///
    /// `GET /modes`
    pub async fn get_modes(&self) -> Result<ModesPayload, Error> {
        debug!("fetching modes");
        self.get("modes").await
    }

    /// Fetch the current door and system state.
    ///
    /// `GET /states`
    pub async fn get_states(&self) -> Result<StatesPayload, Error> {
        debug!("fetching states");
        self.get("states").await
    }

    /// Change one or more modes. Only the listed keys are touched server-side.
    ///
    /// `PUT /modes`
    pub async fn set_modes(&self, changes: &ModesPayload) -> Result<(), Error> {
        debug!(?changes, "updating modes");
        self.put("modes", changes).await
    }

    /// Change door and/or system state.
    ///
    /// `PUT /states`. Rejected locally with [`Error::EmptyUpdate`] when
    /// neither field is set, so no request reaches the door.
    pub async fn set_states(&self, update: &StatesUpdate) -> Result<(), Error> {
        if update.is_empty() {
            return Err(Error::EmptyUpdate);
        }
        debug!(door = ?update.door, system = ?update.system, "updating states");
        self.put("states", update).await
    }

    // ── Request helpers ──────────────────────────────────────────────

    fn endpoint(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.endpoint(path)?;
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .basic_auth(&self.username, Some(self.password.expose_secret()))
            .send()
            .await
            .map_err(Error::Transport)?;

        let body = check_status(resp).await?;
        trace!(%body, "response body");
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }

    async fn put(&self, path: &str, body: &impl Serialize) -> Result<(), Error> {
        let url = self.endpoint(path)?;
        debug!("PUT {}", url);

        let resp = self
            .http
            .put(url)
            .basic_auth(&self.username, Some(self.password.expose_secret()))
            .json(body)
            .send()
            .await
            .map_err(Error::Transport)?;

        check_status(resp).await?;
        Ok(())
    }
}

/// Build `http://{host}:{port}/`.
fn base_url(host: &str, port: u16) -> Result<Url, Error> {
    let host = host.trim();
    let full = if host.contains(':') && !host.starts_with('[') {
        format!("http://[{host}]:{port}/")
    } else {
        format!("http://{host}:{port}/")
    };
    Ok(Url::parse(&full)?)
}

/// Read the body, mapping auth rejections and other non-2xx statuses to errors.
async fn check_status(resp: reqwest::Response) -> Result<String, Error> {
    let status = resp.status();

    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(Error::Authentication {
            message: format!("door rejected credentials (HTTP {})", status.as_u16()),
        });
    }

    let body = resp.text().await.map_err(Error::Transport)?;

    if !status.is_success() {
        return Err(Error::Status {
            status: status.as_u16(),
            body,
        });
    }

    Ok(body)
}
