use std::ffi::CStr;

use arrow_schema::ArrowError;
use datafusion::common::DataFusionError;
use thiserror::Error;

/// Canonical DFE error taxonomy.
///
/// Classification guidance:
/// - [`DfeError::Allocation`]: a session or its runtime could not be constructed
/// - [`DfeError::Engine`]: anything the query engine reported, either while
///   planning a statement or while executing it; see [`DfeError::code`]
/// - [`DfeError::InvalidConfig`]: configuration values that fail validation
/// - [`DfeError::InvalidArgument`]: caller contract violations detected at the
///   boundary (null pointers, non UTF-8 text)
#[derive(Debug, Error)]
pub enum DfeError {
    /// Invalid or inconsistent configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Argument rejected before reaching the engine.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Resource acquisition failed (runtime threads, session state).
    #[error("allocation failed: {0}")]
    Allocation(String),

    /// Error raised by the query engine.
    #[error(transparent)]
    Engine(#[from] DataFusionError),

    /// Error raised by Arrow outside of the engine (export, pretty printing).
    #[error("arrow error: {0}")]
    Arrow(#[from] ArrowError),

    /// Transparent std IO failures.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Broken internal invariant, including panics caught at the C boundary.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DfeError {
    /// Stable classification of this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            DfeError::InvalidConfig(_) => ErrorCode::InvalidConfig,
            DfeError::InvalidArgument(_) => ErrorCode::InvalidArgument,
            DfeError::Allocation(_) => ErrorCode::Allocation,
            DfeError::Engine(e) => classify_engine_error(e),
            DfeError::Arrow(_) => ErrorCode::Arrow,
            DfeError::Io(_) => ErrorCode::Io,
            DfeError::Internal(_) => ErrorCode::Internal,
        }
    }
}

/// Standard DFE result alias.
pub type Result<T> = std::result::Result<T, DfeError>;

/// Error category exposed through the C ABI.
///
/// Discriminants are part of the ABI and must not be renumbered.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    Arrow = 0,
    Parquet = 1,
    ObjectStore = 2,
    Io = 3,
    Sql = 4,
    NotImplemented = 5,
    Internal = 6,
    Plan = 7,
    Configuration = 8,
    Schema = 9,
    Execution = 10,
    ResourcesExhausted = 11,
    External = 12,
    InvalidArgument = 13,
    InvalidConfig = 14,
    Allocation = 15,
}

/// Which side of the submit/materialize split an error code belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPhase {
    /// Raised while turning SQL text into a plan.
    Planning,
    /// Raised while data flows through a plan.
    Execution,
    /// Raised by the façade itself, before the engine is involved.
    Facade,
}

impl ErrorCode {
    /// Symbolic name, also exported as a static C string.
    pub fn c_name(self) -> &'static CStr {
        match self {
            ErrorCode::Arrow => c"ARROW",
            ErrorCode::Parquet => c"PARQUET",
            ErrorCode::ObjectStore => c"OBJECT_STORE",
            ErrorCode::Io => c"IO",
            ErrorCode::Sql => c"SQL",
            ErrorCode::NotImplemented => c"NOT_IMPLEMENTED",
            ErrorCode::Internal => c"INTERNAL",
            ErrorCode::Plan => c"PLAN",
            ErrorCode::Configuration => c"CONFIGURATION",
            ErrorCode::Schema => c"SCHEMA",
            ErrorCode::Execution => c"EXECUTION",
            ErrorCode::ResourcesExhausted => c"RESOURCES_EXHAUSTED",
            ErrorCode::External => c"EXTERNAL",
            ErrorCode::InvalidArgument => c"INVALID_ARGUMENT",
            ErrorCode::InvalidConfig => c"INVALID_CONFIG",
            ErrorCode::Allocation => c"ALLOCATION",
        }
    }

    pub fn name(self) -> &'static str {
        // All names are ASCII.
        self.c_name().to_str().unwrap_or_default()
    }

    /// Best-effort phase of a code. `Io`, `Arrow` and friends can in principle
    /// appear while planning (schema inference reads files), but they are
    /// overwhelmingly execution-time failures.
    pub fn phase(self) -> ErrorPhase {
        match self {
            ErrorCode::Sql
            | ErrorCode::Plan
            | ErrorCode::Schema
            | ErrorCode::NotImplemented
            | ErrorCode::Configuration => ErrorPhase::Planning,
            ErrorCode::InvalidArgument | ErrorCode::InvalidConfig | ErrorCode::Allocation => {
                ErrorPhase::Facade
            }
            _ => ErrorPhase::Execution,
        }
    }
}

/// Engine errors are classified by their root cause so that context wrappers
/// added along the way do not hide the original category.
fn classify_engine_error(err: &DataFusionError) -> ErrorCode {
    match err.find_root() {
        DataFusionError::ArrowError(..) => ErrorCode::Arrow,
        DataFusionError::ParquetError(..) => ErrorCode::Parquet,
        DataFusionError::ObjectStore(..) => ErrorCode::ObjectStore,
        DataFusionError::IoError(..) => ErrorCode::Io,
        DataFusionError::SQL(..) => ErrorCode::Sql,
        DataFusionError::NotImplemented(..) => ErrorCode::NotImplemented,
        DataFusionError::Internal(..) => ErrorCode::Internal,
        DataFusionError::Plan(..) => ErrorCode::Plan,
        DataFusionError::Configuration(..) => ErrorCode::Configuration,
        DataFusionError::SchemaError(..) => ErrorCode::Schema,
        DataFusionError::Execution(..) => ErrorCode::Execution,
        DataFusionError::ResourcesExhausted(..) => ErrorCode::ResourcesExhausted,
        DataFusionError::External(..) => ErrorCode::External,
        _ => ErrorCode::Internal,
    }
}
