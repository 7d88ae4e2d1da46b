//! Typed identifiers for session and result handles.
//!
//! Identifiers come from process-wide monotonic counters and are never
//! reused, so a released handle's identity cannot be observed on a new one.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_FRAME_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(
    /// Raw numeric id value.
    pub u64,
);

impl SessionId {
    pub fn next() -> Self {
        Self(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Identity of one result handle (data frame).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(
    /// Raw numeric id value.
    pub u64,
);

impl FrameId {
    pub fn next() -> Self {
        Self(NEXT_FRAME_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frame-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_strictly_increasing() {
        let a = FrameId::next();
        let b = FrameId::next();
        assert!(b > a);
        let s1 = SessionId::next();
        let s2 = SessionId::next();
        assert_ne!(s1, s2);
        assert_eq!(format!("{}", FrameId(7)), "frame-7");
    }
}
