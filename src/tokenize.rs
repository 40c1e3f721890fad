//! Submission control.
//!
//! `submit` is the only write path into the SDK's tokenize operation. Two
//! guards make it safe to wire directly to a button: no published instance
//! means no-op, and a compare-and-swap on the submission flag means a second
//! activation while one is in flight is ignored rather than queued.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::FieldError;
use crate::lifecycle::FieldLifecycleCoordinator;
use crate::sdk::TokenResult;

/// External callback receiving the tokenization result.
pub type TokenCallback = Arc<dyn Fn(TokenResult) + Send + Sync>;

/// Drives the submit action against the current field instance.
#[derive(Clone)]
pub struct TokenizationController {
    coordinator: FieldLifecycleCoordinator,
    submitting: Arc<AtomicBool>,
    on_token: TokenCallback,
}

impl TokenizationController {
    pub fn new(coordinator: FieldLifecycleCoordinator, on_token: TokenCallback) -> Self {
        Self {
            coordinator,
            submitting: Arc::new(AtomicBool::new(false)),
            on_token,
        }
    }

    /// True while a tokenization is in flight.
    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::SeqCst)
    }

    /// Tokenizes the entered payment details and forwards the result to the
    /// external callback.
    ///
    /// Returns whether the callback was invoked. A guarded call (no
    /// published instance, or a submission already in flight) is a silent
    /// no-op: expected transient UI state, not an error, so it is not even
    /// logged. A rejected tokenize is logged and absorbed; the callback is
    /// never invoked with a failed result.
    pub async fn submit(&self) -> bool {
        let Some(handle) = self.coordinator.field() else {
            return false;
        };

        if self
            .submitting
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return false;
        }

        // Reset the flag on every exit path, including the error one.
        let submitting = Arc::clone(&self.submitting);
        let _reset = scopeguard::guard(submitting, |flag| {
            flag.store(false, Ordering::SeqCst);
        });

        match handle.field().tokenize().await {
            Ok(result) => {
                (self.on_token)(result);
                true
            }
            Err(err) => {
                let err = FieldError::Tokenization(err);
                tracing::warn!(instance = %handle.instance_id(), error = %err, "tokenization failed");
                false
            }
        }
    }
}
