//! Polling coordinator between `petwalk-api` and consumers (CLI / host adapters).
//!
//! This crate owns the domain model and the caching layer for a single
//! PetWALK door:
//!
//! - **[`Controller`]**: Central facade. [`initialize()`](Controller::initialize)
//!   performs the first refresh eagerly and then spawns the background
//!   refresh worker. All fetches run on that one worker, so at most one
//!   refresh cycle is ever in flight; concurrent
//!   [`request_refresh()`](Controller::request_refresh) calls coalesce onto
//!   a single follow-up cycle.
//!
//! - **[`SnapshotStore`]**: Last-known-good [`Snapshot`] of modes, states,
//!   and pet status, replaced atomically through `arc-swap`. Readers never
//!   block and never see a torn snapshot.
//!
//! - **[`SnapshotStream`]**: Subscription handle vended by the store.
//!   Exposes `current()` / `latest()` / `changed()` and a `Stream` adapter.
//!
//! - **[`Command`]**: Typed write requests (set mode, open/close door,
//!   system on/off). Each successful write is followed by an immediate
//!   refresh so the snapshot reflects it.
//!
//! - **[`entity`]**: Read-only adapters (pet trackers, timestamp sensors,
//!   switches, door cover) derived from a snapshot for host integrations.

pub mod command;
pub mod config;
pub mod controller;
pub mod convert;
pub mod entity;
pub mod error;
pub mod model;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::{Command, CommandResult};
pub use config::ControllerConfig;
pub use controller::{Controller, ControllerState, CycleState, RefreshEvent};
pub use error::CoreError;
pub use store::SnapshotStore;
pub use stream::SnapshotStream;

pub use model::{
    DeviceInfo, Direction, DoorState, ModeSet, Pet, PetEvent, PetStatus, Snapshot, Species,
    StateSet, SystemState,
};
