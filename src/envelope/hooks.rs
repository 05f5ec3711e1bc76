//! Post-processing hook chain.
//!
//! # Responsibilities
//! - Run ordered callbacks between the handler and the transfer
//! - Let each hook replace the envelope (wrap a stream in a full
//!   response, or vice versa)
//! - Short-circuit to error handling when a hook fails
//!
//! # Design Decisions
//! - Hooks operate on the tagged envelope union, no dynamic payload
//!   inspection
//! - Once the transfer has begun no substitution is possible; the
//!   consumed flag on the source enforces that, not this module

use crate::envelope::ResponseEnvelope;

/// Error raised by a hook, short-circuiting the rest of the chain.
#[derive(Debug, thiserror::Error)]
#[error("send hook failed: {reason}")]
pub struct HookError {
    reason: String,
}

impl HookError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// A post-processing step over the response envelope.
///
/// Receives the current envelope and returns either the envelope to
/// continue with (possibly a brand-new one) or an error that aborts the
/// chain.
pub trait SendHook: Send + Sync {
    fn on_send(&self, envelope: ResponseEnvelope) -> Result<ResponseEnvelope, HookError>;
}

impl<F> SendHook for F
where
    F: Fn(ResponseEnvelope) -> Result<ResponseEnvelope, HookError> + Send + Sync,
{
    fn on_send(&self, envelope: ResponseEnvelope) -> Result<ResponseEnvelope, HookError> {
        self(envelope)
    }
}

/// Ordered chain of send hooks.
#[derive(Default)]
pub struct HookChain {
    hooks: Vec<Box<dyn SendHook>>,
}

impl HookChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a hook; hooks run in registration order.
    pub fn add(&mut self, hook: impl SendHook + 'static) -> &mut Self {
        self.hooks.push(Box::new(hook));
        self
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Run every hook in order. The first error short-circuits and is
    /// routed to the caller's error handling.
    pub fn run(&self, mut envelope: ResponseEnvelope) -> Result<ResponseEnvelope, HookError> {
        for (index, hook) in self.hooks.iter().enumerate() {
            let before = envelope.kind();
            envelope = hook.on_send(envelope).map_err(|e| {
                tracing::debug!(hook = index, error = %e, "Send hook failed");
                e
            })?;
            if before != envelope.kind() {
                tracing::trace!(hook = index, from = before, to = envelope.kind(), "Hook replaced payload");
            }
        }
        Ok(envelope)
    }
}

impl std::fmt::Debug for HookChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookChain")
            .field("hooks", &self.hooks.len())
            .finish()
    }
}
