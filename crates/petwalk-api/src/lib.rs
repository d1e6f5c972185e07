// petwalk-api: Async Rust client for the PetWALK local REST API

pub mod client;
pub mod error;
pub mod models;
pub mod transport;

pub use client::PetwalkClient;
pub use error::Error;
pub use models::{ModesPayload, StatesPayload, StatesUpdate};
pub use transport::TransportConfig;

/// Port the door's REST server listens on unless configured otherwise.
pub const DEFAULT_PORT: u16 = 8080;
