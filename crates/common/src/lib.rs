//! Shared configuration, error types and handle identifiers for DFE crates.
//!
//! Architecture role:
//! - defines session configuration passed from callers into the engine
//! - provides the common [`DfeError`] / [`Result`] contracts and the stable
//!   [`ErrorCode`] classification used at the C boundary
//! - hands out process-unique identifiers for session and result handles
//!
//! Key modules:
//! - [`config`]
//! - [`error`]
//! - [`ids`]

pub mod config;
pub mod error;
pub mod ids;

pub use config::EngineConfig;
pub use error::{DfeError, ErrorCode, ErrorPhase, Result};
pub use ids::*;
