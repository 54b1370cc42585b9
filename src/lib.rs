//! cubby - signed HTTP client for the Cubby object store

pub mod api;
pub mod cli;
pub mod config;

pub use api::{Result, StoreClient, StoreError};
pub use config::Config;
