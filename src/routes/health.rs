//! Liveness and build information
//!
//! - GET / - plain liveness text
//! - GET /health - JSON health with storage backend and uptime
//! - GET /version - crate version and git commit from the build script

use hyper::{Response, StatusCode};
use serde::Serialize;

use super::response::{json_response, text_response, FullBody};
use crate::server::AppState;

/// Health response
#[derive(Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub version: &'static str,
    /// Uptime in seconds
    pub uptime: u64,
    /// `mongodb` or `memory`
    pub storage: &'static str,
    #[serde(rename = "devMode")]
    pub dev_mode: bool,
    #[serde(rename = "paymentsEnabled")]
    pub payments_enabled: bool,
    pub timestamp: String,
}

/// Version information
#[derive(Serialize)]
pub struct VersionResponse {
    pub version: &'static str,
    pub commit: &'static str,
    pub commit_full: &'static str,
    pub build_time: &'static str,
    pub service: &'static str,
}

/// Handle GET /
pub fn root() -> Response<FullBody> {
    text_response(StatusCode::OK, "App is running!")
}

/// Handle GET /health
pub fn health_check(state: &AppState) -> Response<FullBody> {
    let response = HealthResponse {
        healthy: true,
        version: env!("CARGO_PKG_VERSION"),
        uptime: state.started_at.elapsed().as_secs(),
        storage: state.storage.as_str(),
        dev_mode: state.args.dev_mode,
        payments_enabled: state.payments.is_some(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    };

    json_response(StatusCode::OK, &response)
}

/// Handle GET /version
pub fn version_info() -> Response<FullBody> {
    let response = VersionResponse {
        version: env!("CARGO_PKG_VERSION"),
        commit: option_env!("GIT_COMMIT_SHORT").unwrap_or("unknown"),
        commit_full: option_env!("GIT_COMMIT_FULL").unwrap_or("unknown"),
        build_time: option_env!("BUILD_TIMESTAMP").unwrap_or("unknown"),
        service: "bloodline",
    };

    json_response(StatusCode::OK, &response)
}
