pub mod client;
pub mod models;

pub use client::{DynmapClient, REQUEST_TIMEOUT};
pub use models::{Player, ServerConfig, WorldInfo, WorldUpdate, HIDDEN_WORLD};
