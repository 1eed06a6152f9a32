//! Bloodline - session, role and admin gateway for a blood donation platform
//!
//! Bloodline issues cookie-borne session credentials, resolves each caller's
//! role live from the user store, and gates the user, role and admin routes
//! of the platform's HTTP API.
//!
//! ## Services
//!
//! - **Auth**: credential issuing/verification, role resolution, access gate
//! - **Roles**: registration, donator toggle, admin role overwrite
//! - **Admin**: live user/donor counts and payment totals
//! - **Directory**: donor, review and payment records
//! - **Mail and payments**: outgoing mail and card payment intents

pub mod auth;
pub mod config;
pub mod db;
pub mod routes;
pub mod server;
pub mod services;
pub mod store;
pub mod types;

pub use config::Args;
pub use server::{run, AppState, StorageBackend};
pub use types::{AppError, Result};
