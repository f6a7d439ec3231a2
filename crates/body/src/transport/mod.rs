//! The callback contract between this crate and an external transport.
//!
//! This crate consumes, but does not define, an asynchronous networking
//! engine. The engine performs the actual exchange and drives the callbacks
//! of a [`ResponseHandler`] on its own worker thread(s); the handler issues
//! [`ReadDriver::read`] instructions to request the next piece of body data
//! into a specific buffer.
//!
//! # Contract assumed from the transport
//!
//! - Callbacks for one in-flight request never run concurrently: at most
//!   one callback per request is active at any time. Handlers rely on this
//!   and keep their state lock-free.
//! - Every `read(lease)` instruction is answered by exactly one later
//!   `on_read_completed` carrying that same lease, unless the exchange ends
//!   first, in which case the lease comes back attached to the terminal
//!   callback as `trailing`.
//! - After a terminal callback the transport stops calling the handler.
//!   A terminal event that races a locally synthesized outcome is tolerated
//!   and ignored; a data callback after terminal is not, since the handler
//!   issues no reads once terminal.

use crate::pool::BufferLease;
use crate::protocol::{ResponseHead, TransportError};

/// The instruction surface the transport exposes to a handler: request the
/// next piece of body data to be written into the loaned buffer.
#[cfg_attr(test, mockall::automock)]
pub trait ReadDriver {
    /// Asks the transport to write forthcoming body bytes into `lease` and
    /// report back with `on_read_completed`. Never issued with a full
    /// buffer.
    fn read(&mut self, lease: BufferLease);
}

/// The callback contract a body consumer implements and registers with the
/// transport.
///
/// Delivered with the single-active-callback guarantee described in the
/// module docs. `trailing` on the terminal callbacks returns the buffer of
/// an outstanding read so its written prefix is not lost.
pub trait ResponseHandler {
    /// The response line and headers arrived; body bytes may follow.
    fn on_response_started(&mut self, driver: &mut dyn ReadDriver, head: ResponseHead);

    /// The transport wrote into the lease it was handed (possibly zero
    /// bytes) and is returning it.
    fn on_read_completed(&mut self, driver: &mut dyn ReadDriver, lease: BufferLease);

    /// The exchange completed cleanly; no more data will arrive.
    fn on_succeeded(&mut self, trailing: Option<BufferLease>);

    /// The transport failed the exchange.
    fn on_failed(&mut self, error: TransportError, trailing: Option<BufferLease>);

    /// The exchange was cancelled by the transport.
    fn on_cancelled(&mut self, trailing: Option<BufferLease>);

    /// The server answered with a redirect to `location`.
    fn on_redirect_received(&mut self, location: &str);
}
