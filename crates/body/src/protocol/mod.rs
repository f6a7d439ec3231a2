//! Core protocol types for buffer-pooled body collection.
//!
//! This module holds the data model shared by the reader, the latch and the
//! transport contract:
//!
//! - **Outcome types** ([`outcome`]): the terminal result of an exchange
//!   - [`ResponseOutcome`]: success, failure or cancellation plus metadata
//!   - [`ResponseHead`]: status line and headers of the response
//!
//! - **Error types** ([`error`]): the failure taxonomy
//!   - [`BodyError`]: every error that surfaces through the outcome channel
//!   - [`TransportError`]: a failure reported by the transport, passed
//!     through verbatim
//!
//! Broken internal invariants (lease mismatch, double publish) deliberately
//! have no representation here: they abort instead of becoming outcomes.

mod outcome;
pub use outcome::ResponseHead;
pub use outcome::ResponseOutcome;

mod error;
pub use error::BodyError;
pub use error::TransportError;
