//! Out-of-band error reporting for callers that prefer a slot over `Result`.
//!
//! An [`ErrorSlot`] is owned by the caller and passed by `&mut` into fallible
//! slot-style operations ([`crate::Engine::submit_sql`],
//! [`crate::DataFrame::materialize_and_show`]). It moves
//! `EMPTY -> SET` when an operation fails and back to `EMPTY` on
//! [`ErrorSlot::clear`] / [`ErrorSlot::take`]. Successful operations never
//! touch it.
//!
//! The slot is single-assignment: if a failure is reported while the slot is
//! already set, the first error is kept and the later one is logged and
//! dropped. Clearing an empty slot is a no-op.

use std::ffi::{CStr, CString};
use std::fmt;

use dfe_common::{DfeError, ErrorCode};
use tracing::warn;

/// A failure captured from a fallible operation: category plus message.
///
/// This is also the payload behind the C `DFError` handle, so the message is
/// kept NUL-terminated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportedError {
    code: ErrorCode,
    message: CString,
}

impl ReportedError {
    pub fn new(code: ErrorCode, message: &str) -> Self {
        // Interior NULs would truncate the message on the C side.
        let message = CString::new(message.replace('\0', "\\0")).unwrap_or_default();
        Self { code, message }
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        self.message.to_str().unwrap_or_default()
    }

    pub fn message_cstr(&self) -> &CStr {
        &self.message
    }
}

impl From<&DfeError> for ReportedError {
    fn from(err: &DfeError) -> Self {
        Self::new(err.code(), &err.to_string())
    }
}

impl From<DfeError> for ReportedError {
    fn from(err: DfeError) -> Self {
        Self::from(&err)
    }
}

impl fmt::Display for ReportedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message(), self.code.name())
    }
}

impl std::error::Error for ReportedError {}

#[derive(Debug, Default)]
pub struct ErrorSlot {
    error: Option<ReportedError>,
}

impl ErrorSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the last fallible call reported a failure. Check this before
    /// touching any other output of that call.
    pub fn is_set(&self) -> bool {
        self.error.is_some()
    }

    /// Message of the stored failure, `None` while empty.
    pub fn message(&self) -> Option<&str> {
        self.error.as_ref().map(ReportedError::message)
    }

    pub fn code(&self) -> Option<ErrorCode> {
        self.error.as_ref().map(ReportedError::code)
    }

    pub fn error(&self) -> Option<&ReportedError> {
        self.error.as_ref()
    }

    /// Drops the stored failure, if any.
    pub fn clear(&mut self) {
        self.error = None;
    }

    /// Moves the stored failure out, leaving the slot empty.
    pub fn take(&mut self) -> Option<ReportedError> {
        self.error.take()
    }

    pub fn set(&mut self, error: ReportedError) {
        match &self.error {
            Some(existing) => warn!(
                kept = %existing,
                dropped = %error,
                "error slot already set; keeping first error"
            ),
            None => self.error = Some(error),
        }
    }

    /// Unwraps `result`, recording the error in the slot on failure.
    pub fn capture<T>(&mut self, result: dfe_common::Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.set(ReportedError::from(&err));
                None
            }
        }
    }
}
