//! Caller-supplied cancellation signal (spec §5).
//!
//! Checked at operation entry, before each layer traversal, and between
//! batch items. `()` is the always-false default for callers that never
//! cancel.

use crate::error::{Error, Result};

/// A cooperative cancellation signal polled by long-running operations.
pub trait Cancellation {
    /// `true` once the caller wants the in-flight operation abandoned.
    fn is_cancelled(&self) -> bool;
}

impl Cancellation for () {
    fn is_cancelled(&self) -> bool {
        false
    }
}

impl Cancellation for std::sync::atomic::AtomicBool {
    fn is_cancelled(&self) -> bool {
        self.load(std::sync::atomic::Ordering::Relaxed)
    }
}

impl<T: Cancellation + ?Sized> Cancellation for &T {
    fn is_cancelled(&self) -> bool {
        (**self).is_cancelled()
    }
}

/// Returns [`Error::Cancelled`] if `cancel` has fired.
pub(crate) fn check(cancel: &impl Cancellation) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }
    Ok(())
}
