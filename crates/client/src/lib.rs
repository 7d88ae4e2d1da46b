//! Embeddable SQL session façade.
//!
//! An [`Engine`] is a query session; [`Engine::sql`] plans a statement into a
//! [`DataFrame`], which executes only when collected or shown. Both are
//! exclusively owned handles released on drop. Failures are returned as
//! [`dfe_common::DfeError`]; callers that prefer out-of-band reporting can use
//! the slot-style variants taking an [`ErrorSlot`].
//!
//! With the `ffi` feature (on by default) the same contract is exported as a
//! C ABI, see `include/dfe.h`.

mod session;

pub mod dataframe;
pub mod engine;
pub mod error_slot;
#[cfg(feature = "ffi")]
pub mod ffi;
pub mod options;
pub mod repl;

pub use dataframe::DataFrame;
pub use engine::Engine;
pub use error_slot::{ErrorSlot, ReportedError};
pub use options::{CsvOptions, ParquetOptions};
