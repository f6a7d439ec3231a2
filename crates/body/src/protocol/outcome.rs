use bytes::Bytes;
use http::{HeaderMap, StatusCode};

use crate::protocol::BodyError;

/// Response metadata delivered by the transport when the response line and
/// headers have been received, before any body bytes.
#[derive(Debug, Clone)]
pub struct ResponseHead {
    status: StatusCode,
    headers: HeaderMap,
}

impl ResponseHead {
    pub fn new(status: StatusCode, headers: HeaderMap) -> Self {
        Self { status, headers }
    }

    #[inline]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

/// The terminal result of one request/response exchange.
///
/// Exactly one of these is produced per request, by the reader, on the
/// transport's terminal callback. Failure and Cancelled keep whatever body
/// bytes had been written before the terminal event; tests rely on being
/// able to inspect that partial body.
#[derive(Debug)]
pub enum ResponseOutcome {
    Success {
        head: ResponseHead,
        body: Bytes,
        /// Number of discrete delivery events observed, see
        /// [`ChunkedBodyReader`](crate::reader::ChunkedBodyReader) for how
        /// boundaries are inferred.
        chunk_count: u64,
    },

    Failure {
        status: Option<StatusCode>,
        error: BodyError,
        partial_body: Bytes,
    },

    Cancelled {
        status: Option<StatusCode>,
        partial_body: Bytes,
    },
}

impl ResponseOutcome {
    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, ResponseOutcome::Success { .. })
    }

    #[inline]
    pub fn is_failure(&self) -> bool {
        matches!(self, ResponseOutcome::Failure { .. })
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ResponseOutcome::Cancelled { .. })
    }

    /// Status code of the response, if the response line arrived before the
    /// terminal event.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ResponseOutcome::Success { head, .. } => Some(head.status()),
            ResponseOutcome::Failure { status, .. } => *status,
            ResponseOutcome::Cancelled { status, .. } => *status,
        }
    }

    /// The assembled body on success, or the partial body written before a
    /// failure or cancellation.
    pub fn body_bytes(&self) -> &Bytes {
        match self {
            ResponseOutcome::Success { body, .. } => body,
            ResponseOutcome::Failure { partial_body, .. } => partial_body,
            ResponseOutcome::Cancelled { partial_body, .. } => partial_body,
        }
    }

    /// The body interpreted as utf-8, lossily. Convenience for tests and
    /// diagnostics only.
    pub fn body_as_string(&self) -> String {
        String::from_utf8_lossy(self.body_bytes()).into_owned()
    }

    /// Number of delivery events observed; zero for outcomes that never saw
    /// body bytes.
    pub fn chunk_count(&self) -> u64 {
        match self {
            ResponseOutcome::Success { chunk_count, .. } => *chunk_count,
            _ => 0,
        }
    }

    /// The error behind a `Failure`, `None` otherwise.
    pub fn error(&self) -> Option<&BodyError> {
        match self {
            ResponseOutcome::Failure { error, .. } => Some(error),
            _ => None,
        }
    }
}
