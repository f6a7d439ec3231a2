use http::StatusCode;
use thiserror::Error;

/// Errors that terminate a body collection with a `Failure` outcome.
///
/// Everything here travels through the outcome channel; broken internal
/// invariants (a delivered lease that was never issued, a double publish)
/// are panics instead, since they indicate a programming error rather than
/// a recoverable runtime condition.
#[derive(Error, Debug)]
pub enum BodyError {
    #[error("caller configuration error: {reason}")]
    CallerConfiguration { reason: String },

    #[error("response body exceeded the declared buffer capacity of {declared} bytes")]
    CapacityExceeded { declared: usize },

    #[error("unsupported operation: {operation}")]
    Unsupported { operation: String },

    #[error("transport error: {source}")]
    Transport {
        #[from]
        source: TransportError,
    },
}

impl BodyError {
    pub fn caller_configuration<S: ToString>(str: S) -> Self {
        Self::CallerConfiguration { reason: str.to_string() }
    }

    pub fn capacity_exceeded(declared: usize) -> Self {
        Self::CapacityExceeded { declared }
    }

    pub fn unsupported<S: ToString>(str: S) -> Self {
        Self::Unsupported { operation: str.to_string() }
    }

    /// Returns true if this failure was caused by an undersized buffer pool.
    #[inline]
    pub fn is_capacity_exceeded(&self) -> bool {
        matches!(self, BodyError::CapacityExceeded { .. })
    }

    /// Returns true if this failure was caused by request configuration.
    #[inline]
    pub fn is_caller_configuration(&self) -> bool {
        matches!(self, BodyError::CallerConfiguration { .. })
    }

    /// Returns true if the transport asked for something this core refuses to do.
    #[inline]
    pub fn is_unsupported(&self) -> bool {
        matches!(self, BodyError::Unsupported { .. })
    }

    /// Returns true if the transport itself reported the failure.
    #[inline]
    pub fn is_transport(&self) -> bool {
        matches!(self, BodyError::Transport { .. })
    }
}

/// A failure reported by the transport itself, passed through verbatim.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct TransportError {
    message: String,
    status: Option<StatusCode>,
}

impl TransportError {
    pub fn new<S: ToString>(message: S, status: Option<StatusCode>) -> Self {
        Self { message: message.to_string(), status }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Status code of the response, when the failure happened after the
    /// response line was received.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }
}
