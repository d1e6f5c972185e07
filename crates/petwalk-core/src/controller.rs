// ── Controller abstraction ──
//
// Full lifecycle management for one PetWALK door: eager first refresh,
// a single background refresh worker, request coalescing, and command
// dispatch with follow-up reconciliation.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use petwalk_api::{PetwalkClient, StatesUpdate};

use crate::command::{Command, CommandResult};
use crate::config::ControllerConfig;
use crate::convert::{door_wire, system_wire};
use crate::error::CoreError;
use crate::model::{DeviceInfo, DoorState, ModeSet, PetStatus, Snapshot, StateSet, SystemState};
use crate::store::{RefreshData, SnapshotStore};
use crate::stream::SnapshotStream;

const EVENT_CHANNEL_SIZE: usize = 64;

// ── Observable state ─────────────────────────────────────────────

/// Lifecycle of the controller as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// Constructed; no snapshot has been committed yet.
    Uninitialized,
    /// First refresh succeeded and the background worker is running.
    Ready,
    /// `shutdown()` was called. Terminal.
    ShutDown,
}

/// Phase of the refresh cycle currently executing (if any).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    Fetching,
    Merging,
}

/// Outcome of one refresh cycle, broadcast to every `events()` subscriber.
#[derive(Debug, Clone)]
pub enum RefreshEvent {
    Refreshed {
        at: DateTime<Utc>,
    },
    /// The cycle failed and the snapshot was left unchanged.
    Failed {
        cause: Arc<CoreError>,
        at: DateTime<Utc>,
    },
}

type CycleResult = Result<Arc<Snapshot>, Arc<CoreError>>;

/// A queued refresh request with its reply channel.
struct RefreshRequest {
    reply: oneshot::Sender<CycleResult>,
}

// ── Controller ───────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<ControllerInner>`. One controller per door;
/// every clone shares the same store, worker, and HTTP connection pool.
#[derive(Clone)]
pub struct Controller {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    config: ControllerConfig,
    client: PetwalkClient,
    store: Arc<SnapshotStore>,
    state: watch::Sender<ControllerState>,
    cycle_state: watch::Sender<CycleState>,
    event_tx: broadcast::Sender<RefreshEvent>,
    /// Unbounded so a caller never waits to enqueue while a cycle runs.
    refresh_tx: mpsc::UnboundedSender<RefreshRequest>,
    /// Taken by the worker on first successful `initialize()`. The lock also
    /// serializes concurrent `initialize()` calls.
    refresh_rx: Mutex<Option<mpsc::UnboundedReceiver<RefreshRequest>>>,
    cancel: CancellationToken,
    task_handle: Mutex<Option<JoinHandle<()>>>,
}

impl Controller {
    /// Create a controller from configuration. Does NOT contact the door --
    /// call [`initialize()`](Self::initialize) to perform the first refresh
    /// and start the background worker.
    pub fn new(config: ControllerConfig) -> Result<Self, CoreError> {
        config.validate()?;
        let client = build_client(&config)?;

        let (state, _) = watch::channel(ControllerState::Uninitialized);
        let (cycle_state, _) = watch::channel(CycleState::Idle);
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        let (refresh_tx, refresh_rx) = mpsc::unbounded_channel();

        Ok(Self {
            inner: Arc::new(ControllerInner {
                config,
                client,
                store: Arc::new(SnapshotStore::new()),
                state,
                cycle_state,
                event_tx,
                refresh_tx,
                refresh_rx: Mutex::new(Some(refresh_rx)),
                cancel: CancellationToken::new(),
                task_handle: Mutex::new(None),
            }),
        })
    }

    /// Access the controller configuration.
    pub fn config(&self) -> &ControllerConfig {
        &self.inner.config
    }

    /// Access the underlying SnapshotStore.
    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.inner.store
    }

    /// Identity of the door shared by all entities built from it.
    pub fn device_info(&self) -> DeviceInfo {
        DeviceInfo::for_host(&self.inner.config.host)
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Perform the first refresh and start the background worker.
    ///
    /// Fails with [`CoreError::NotReady`] if the first cycle fails; nothing
    /// is committed and the call may be retried. Calling it again after
    /// success is a no-op that returns the current snapshot.
    pub async fn initialize(&self) -> Result<Arc<Snapshot>, CoreError> {
        let mut rx_slot = self.inner.refresh_rx.lock().await;

        let state = *self.inner.state.borrow();
        match state {
            ControllerState::ShutDown => return Err(CoreError::ShutDown),
            ControllerState::Ready => return self.read().ok_or(CoreError::NotInitialized),
            ControllerState::Uninitialized => {}
        }

        // A shutdown racing the first cycle abandons it.
        let result = tokio::select! {
            biased;
            () = self.inner.cancel.cancelled() => {
                self.inner.cycle_state.send_replace(CycleState::Idle);
                return Err(CoreError::ShutDown);
            }
            result = self.run_cycle() => result,
        };
        let snapshot = result.map_err(|cause| CoreError::NotReady { cause })?;

        let Some(rx) = rx_slot.take() else {
            return Err(CoreError::Internal("refresh channel already taken".into()));
        };
        let handle = tokio::spawn(refresh_worker(
            self.clone(),
            rx,
            self.inner.cancel.clone(),
        ));
        *self.inner.task_handle.lock().await = Some(handle);

        // Never overwrite ShutDown: a worker spawned after cancellation
        // exits on its own.
        let promoted = self.inner.state.send_if_modified(|state| {
            if *state == ControllerState::Uninitialized && !self.inner.cancel.is_cancelled() {
                *state = ControllerState::Ready;
                true
            } else {
                false
            }
        });
        if !promoted {
            return Err(CoreError::ShutDown);
        }
        info!(
            host = %self.inner.config.host,
            interval = ?self.inner.config.refresh_interval,
            "door initialized"
        );
        Ok(snapshot)
    }

    /// Stop the background worker and wait for it to exit.
    ///
    /// Any cycle in flight is abandoned without committing. Pending
    /// `request_refresh()` callers receive [`CoreError::ShutDown`].
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        if let Some(handle) = self.inner.task_handle.lock().await.take() {
            if let Err(e) = handle.await {
                warn!(error = %e, "refresh worker panicked");
            }
        }
        self.inner.state.send_replace(ControllerState::ShutDown);
        debug!("controller shut down");
    }

    /// One-shot: initialize, run closure, shut down.
    ///
    /// Optimized for CLI use: periodic refresh is disabled since only a
    /// single request-response cycle is needed.
    pub async fn oneshot<F, Fut, T>(config: ControllerConfig, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(Controller) -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        let mut cfg = config;
        cfg.refresh_interval = Duration::ZERO;

        let controller = Controller::new(cfg)?;
        controller.initialize().await?;
        let result = f(controller.clone()).await;
        controller.shutdown().await;
        result
    }

    /// Check that the door is reachable with the given credentials.
    ///
    /// Fetches modes and states once without starting a controller.
    /// Authentication failures are reported as such; every other failure
    /// becomes [`CoreError::ConnectionFailed`].
    pub async fn probe(config: &ControllerConfig) -> Result<Snapshot, CoreError> {
        config.validate()?;
        let client = build_client(config)?;

        let result = fetch(&client, config.refresh_timeout).await;
        match result {
            Ok(RefreshData { modes, states }) => Ok(Snapshot {
                modes,
                states,
                pets: PetStatus::new(),
            }),
            Err(err @ CoreError::AuthenticationFailed { .. }) => Err(err),
            Err(err) => Err(CoreError::ConnectionFailed {
                url: client.base_url().to_string(),
                reason: err.to_string(),
            }),
        }
    }

    // ── Reads ────────────────────────────────────────────────────

    /// The last-known-good snapshot, or `None` before initialization.
    pub fn read(&self) -> Option<Arc<Snapshot>> {
        self.inner.store.read()
    }

    /// Subscribe to committed snapshots.
    pub fn subscribe(&self) -> SnapshotStream {
        self.inner.store.subscribe()
    }

    /// Subscribe to refresh outcomes (successes and failures).
    pub fn events(&self) -> broadcast::Receiver<RefreshEvent> {
        self.inner.event_tx.subscribe()
    }

    /// Observe the current refresh cycle phase.
    pub fn cycle_state(&self) -> watch::Receiver<CycleState> {
        self.inner.cycle_state.subscribe()
    }

    /// Observe the controller lifecycle.
    pub fn state(&self) -> watch::Receiver<ControllerState> {
        self.inner.state.subscribe()
    }

    // ── Refresh ──────────────────────────────────────────────────

    /// Request an immediate refresh cycle and wait for its result.
    ///
    /// Requests that arrive while a cycle is in flight are folded into a
    /// single follow-up cycle; every caller receives that cycle's outcome.
    pub async fn request_refresh(&self) -> Result<Arc<Snapshot>, CoreError> {
        self.ensure_ready()?;

        let (reply, rx) = oneshot::channel();
        self.inner
            .refresh_tx
            .send(RefreshRequest { reply })
            .map_err(|_| CoreError::ShutDown)?;

        rx.await
            .map_err(|_| CoreError::ShutDown)?
            .map_err(|cause| CoreError::RefreshFailed { cause })
    }

    /// Replace the pet status map.
    ///
    /// Entry point for a pet-status producer. Modes and states are kept;
    /// subsequent refresh cycles carry the new map forward unchanged.
    pub fn apply_pet_status(&self, pets: PetStatus) -> Result<Arc<Snapshot>, CoreError> {
        let count = pets.len();
        let snapshot = self
            .inner
            .store
            .apply_pet_status(pets)
            .ok_or_else(|| CoreError::NotReady {
                cause: Arc::new(CoreError::NotInitialized),
            })?;
        debug!(pets = count, "pet status applied");
        Ok(snapshot)
    }

    // ── Commands ─────────────────────────────────────────────────

    /// Enable or disable a single mode.
    pub async fn set_mode(
        &self,
        name: impl Into<String>,
        enabled: bool,
    ) -> Result<CommandResult, CoreError> {
        self.execute(Command::SetMode {
            name: name.into(),
            enabled,
        })
        .await
    }

    /// Open (`true`) or close (`false`) the door.
    pub async fn set_door_state(&self, open: bool) -> Result<CommandResult, CoreError> {
        self.execute(Command::SetDoorState {
            state: DoorState::from_open(open),
        })
        .await
    }

    /// Turn the access system on (`true`) or off (`false`).
    pub async fn set_system_state(&self, on: bool) -> Result<CommandResult, CoreError> {
        self.execute(Command::SetSystemState {
            state: SystemState::from_on(on),
        })
        .await
    }

    /// Keyed form used by adapters: `door` or `system`.
    pub async fn set_state(&self, key: &str, value: bool) -> Result<CommandResult, CoreError> {
        let command = Command::from_state_key(key, value).inspect_err(|_| {
            warn!(key, "rejecting unknown state key");
        })?;
        self.execute(command).await
    }

    /// Execute a command against the door.
    ///
    /// On a remote failure the error is returned, no refresh is requested
    /// and the snapshot is untouched. On success an immediate refresh
    /// follows; if that refresh fails the command still succeeds with
    /// [`CommandResult::Pending`].
    pub async fn execute(&self, command: Command) -> Result<CommandResult, CoreError> {
        self.ensure_ready()?;
        command.validate()?;

        let client = &self.inner.client;
        match &command {
            Command::SetMode { name, enabled } => {
                let mut changes = ModeSet::new();
                changes.insert(name.clone(), *enabled);
                client.set_modes(&changes).await?;
            }
            Command::SetDoorState { state } => {
                client.set_states(&StatesUpdate::door(door_wire(*state))).await?;
            }
            Command::SetSystemState { state } => {
                client
                    .set_states(&StatesUpdate::system(system_wire(*state)))
                    .await?;
            }
        }
        info!(%command, "command accepted by door");

        match self.request_refresh().await {
            Ok(snapshot) => Ok(CommandResult::Reconciled(snapshot)),
            Err(e) => {
                debug!(error = %e, "follow-up refresh failed; change will appear on next cycle");
                Ok(CommandResult::Pending)
            }
        }
    }

    // ── Internals ────────────────────────────────────────────────

    fn ensure_ready(&self) -> Result<(), CoreError> {
        let state = *self.inner.state.borrow();
        match state {
            ControllerState::Ready => Ok(()),
            ControllerState::Uninitialized => Err(CoreError::NotInitialized),
            ControllerState::ShutDown => Err(CoreError::ShutDown),
        }
    }

    /// One fetch-merge-commit execution.
    ///
    /// Only the worker (or `initialize()` before the worker exists) calls
    /// this, so cycles never overlap.
    async fn run_cycle(&self) -> CycleResult {
        let inner = &self.inner;
        inner.cycle_state.send_replace(CycleState::Fetching);

        let result = match fetch(&inner.client, inner.config.refresh_timeout).await {
            Ok(data) => {
                inner.cycle_state.send_replace(CycleState::Merging);
                Ok(inner.store.apply_refresh(data))
            }
            Err(e) => Err(Arc::new(e)),
        };
        inner.cycle_state.send_replace(CycleState::Idle);

        let at = Utc::now();
        let event = match &result {
            Ok(_) => {
                debug!("refresh cycle committed");
                RefreshEvent::Refreshed { at }
            }
            Err(cause) => {
                warn!(error = %cause, "refresh cycle failed; keeping previous snapshot");
                RefreshEvent::Failed {
                    cause: Arc::clone(cause),
                    at,
                }
            }
        };
        let _ = inner.event_tx.send(event);

        result
    }
}

// ── Fetching ─────────────────────────────────────────────────────

fn build_client(config: &ControllerConfig) -> Result<PetwalkClient, CoreError> {
    Ok(PetwalkClient::new(
        &config.host,
        config.port,
        config.username.clone(),
        config.password.clone(),
        &config.transport(),
    )?)
}

/// Fetch modes and states concurrently under one overall deadline.
///
/// Both fetches must succeed; a partial result is never returned.
async fn fetch(client: &PetwalkClient, deadline: Duration) -> Result<RefreshData, CoreError> {
    let both = async {
        let (modes, states) = tokio::try_join!(client.get_modes(), client.get_states())?;
        Ok::<_, CoreError>(RefreshData {
            modes,
            states: StateSet::try_from(states)?,
        })
    };

    tokio::time::timeout(deadline, both)
        .await
        .map_err(|_| CoreError::CycleTimeout {
            timeout_ms: u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX),
        })?
}

// ── Background worker ────────────────────────────────────────────

/// Owns every refresh cycle after initialization.
///
/// Waits for either a periodic tick or a refresh request, drains all
/// requests queued by then, runs exactly one cycle, and replies to every
/// drained request with its result.
async fn refresh_worker(
    controller: Controller,
    mut rx: mpsc::UnboundedReceiver<RefreshRequest>,
    cancel: CancellationToken,
) {
    let period = controller.inner.config.refresh_interval;
    let mut ticker = periodic(period);

    loop {
        let mut waiters = Vec::new();

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            request = rx.recv() => {
                let Some(request) = request else { break };
                waiters.push(request.reply);
            }
            () = next_tick(ticker.as_mut()) => {}
        }

        while let Ok(request) = rx.try_recv() {
            waiters.push(request.reply);
        }
        if !waiters.is_empty() {
            debug!(waiters = waiters.len(), "running requested refresh");
        }

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = controller.run_cycle() => result,
        };

        if let Some(ticker) = ticker.as_mut() {
            ticker.reset();
        }
        for reply in waiters {
            let _ = reply.send(result.clone());
        }
    }

    controller.inner.cycle_state.send_replace(CycleState::Idle);
    debug!("refresh worker stopped");
}

/// Periodic ticker, or `None` when periodic refresh is disabled.
fn periodic(period: Duration) -> Option<Interval> {
    if period.is_zero() {
        return None;
    }
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    Some(interval)
}

async fn next_tick(ticker: Option<&mut Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn config() -> ControllerConfig {
        ControllerConfig::new("127.0.0.1", "admin", SecretString::from("pw".to_string()))
    }

    #[tokio::test]
    async fn commands_before_initialize_are_rejected() {
        let controller = Controller::new(config()).unwrap();

        let err = controller.set_door_state(true).await.unwrap_err();
        assert!(matches!(err, CoreError::NotInitialized));

        let err = controller.request_refresh().await.unwrap_err();
        assert!(matches!(err, CoreError::NotInitialized));
    }

    #[tokio::test]
    async fn pet_status_before_initialize_is_not_ready() {
        let controller = Controller::new(config()).unwrap();
        let err = controller.apply_pet_status(PetStatus::new()).unwrap_err();
        assert!(matches!(err, CoreError::NotReady { .. }));
    }

    #[tokio::test]
    async fn initialize_after_shutdown_fails() {
        let controller = Controller::new(config()).unwrap();
        controller.shutdown().await;
        assert!(matches!(
            controller.initialize().await,
            Err(CoreError::ShutDown)
        ));
        assert_eq!(*controller.state().borrow(), ControllerState::ShutDown);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut cfg = config();
        cfg.host = String::new();
        assert!(matches!(
            Controller::new(cfg),
            Err(CoreError::Config { .. })
        ));
    }

    #[test]
    fn device_info_uses_host() {
        let controller = Controller::new(config()).unwrap();
        assert_eq!(controller.device_info().name, "PetWALK 127.0.0.1");
    }

    #[tokio::test]
    async fn zero_period_disables_ticker() {
        assert!(periodic(Duration::ZERO).is_none());
        assert!(periodic(Duration::from_secs(5)).is_some());
    }
}
