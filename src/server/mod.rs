//! HTTP server for bloodline

pub mod http;

pub use http::{run, AppState, StorageBackend};
