//! Response envelopes.
//!
//! # Responsibilities
//! - Represent what a handler or hook returned before finalization
//! - Infer a content type for raw payloads
//! - Enforce the consume-once rule on wrapped response bodies
//!
//! # Design Decisions
//! - Tagged union instead of dynamic payload inspection; hooks match on
//!   the variant directly
//! - The consumed flag lives on the underlying [`ByteSource`]; a second
//!   drain attempt is an error, not a re-read

use bytes::Bytes;
use http::{HeaderMap, StatusCode};

use crate::stream::{ByteSource, SourceError};

pub mod hooks;

pub use hooks::{HookChain, HookError, SendHook};

/// Error raised while materializing an envelope body.
#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    /// The body was already drained by a previous reader.
    #[error("response body already consumed")]
    BodyAlreadyConsumed,

    /// Reading the body failed.
    #[error("body read failed: {0}")]
    Source(#[from] SourceError),

    /// The materialized body was not valid UTF-8.
    #[error("body is not valid UTF-8")]
    NotUtf8,
}

/// An eagerly available payload.
#[derive(Debug, Clone)]
pub enum RawPayload {
    /// Plain text; finalized as `text/plain; charset=utf-8`.
    Text(String),
    /// Opaque bytes; finalized as `application/octet-stream`.
    Bytes(Bytes),
    /// Structured value; finalized as `application/json; charset=utf-8`.
    Json(serde_json::Value),
}

impl RawPayload {
    /// Content type the finalization stage infers for this payload kind.
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Text(_) => "text/plain; charset=utf-8",
            Self::Bytes(_) => "application/octet-stream",
            Self::Json(_) => "application/json; charset=utf-8",
        }
    }

    /// Serialize the payload into body bytes.
    pub fn into_bytes(self) -> Bytes {
        match self {
            Self::Text(s) => Bytes::from(s),
            Self::Bytes(b) => b,
            // Serialization of a Value only fails for non-string map keys,
            // which Value cannot hold.
            Self::Json(v) => Bytes::from(v.to_string()),
        }
    }
}

/// A full response produced by a handler or hook: status and headers are
/// already decided, the body is still a stream.
#[derive(Debug)]
pub struct WrappedResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: ByteSource,
}

impl WrappedResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: ByteSource) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Whether the body has already been drained.
    pub fn is_consumed(&self) -> bool {
        self.body.is_consumed()
    }

    /// Materialize the body as text, marking it consumed.
    ///
    /// # Errors
    ///
    /// [`EnvelopeError::BodyAlreadyConsumed`] on a second call; re-entry
    /// into drain logic is a programming error, not a re-read.
    pub async fn text(&mut self) -> Result<String, EnvelopeError> {
        if self.body.is_consumed() {
            return Err(EnvelopeError::BodyAlreadyConsumed);
        }
        let bytes = self.body.collect().await?;
        String::from_utf8(bytes.to_vec()).map_err(|_| EnvelopeError::NotUtf8)
    }

    /// Split into parts, handing the body stream to the transfer stage.
    pub fn into_parts(self) -> (StatusCode, HeaderMap, ByteSource) {
        (self.status, self.headers, self.body)
    }
}

/// What a handler or post-processing hook produced, before finalization.
#[derive(Debug)]
pub enum ResponseEnvelope {
    /// Eager payload (text, bytes, or JSON).
    Raw(RawPayload),
    /// Lazy byte stream, finalized with default status and headers.
    Stream(ByteSource),
    /// Full response object wrapping its own stream body.
    Wrapped(WrappedResponse),
}

impl ResponseEnvelope {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Raw(RawPayload::Text(s.into()))
    }

    pub fn bytes(b: impl Into<Bytes>) -> Self {
        Self::Raw(RawPayload::Bytes(b.into()))
    }

    pub fn json(v: serde_json::Value) -> Self {
        Self::Raw(RawPayload::Json(v))
    }

    pub fn stream(source: ByteSource) -> Self {
        Self::Stream(source)
    }

    /// Variant name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Raw(_) => "raw",
            Self::Stream(_) => "stream",
            Self::Wrapped(_) => "wrapped",
        }
    }
}
