//! Shared types for bloodline

pub mod error;

pub use error::{AppError, Result};
