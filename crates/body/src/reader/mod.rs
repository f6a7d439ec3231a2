//! The callback-driven read loop, re-expressed as an explicit state machine.
//!
//! # Design Goals
//!
//! 1. Feed the transport one caller-declared buffer at a time, advancing
//!    when a buffer fills and surfacing pool exhaustion as a distinguishable
//!    failure
//! 2. Count delivery events ("chunks") for diagnostics without any help
//!    from protocol framing
//! 3. Publish exactly one terminal outcome into an [`OutcomeLatch`] that a
//!    separate thread blocks on
//!
//! # Architecture
//!
//! [`ChunkedBodyReader`] implements the transport's [`ResponseHandler`]
//! contract and owns the [`BufferPool`] exclusively for the whole read
//! phase. The transport guarantees a single active callback per request, so
//! the reader keeps its state lock-free; the only synchronization is the
//! latch publication at the end.
//!
//! The reader is a three-state machine: `AwaitingStart` until the response
//! line arrives, `Reading` while body bytes flow, `Terminal` once an
//! outcome has been published. Nothing touches the pool after `Terminal`,
//! which is what lets the consumer read the assembled body without a lock.
//!
//! # Example Flow
//!
//! 1. Caller builds a reader/waiter pair with [`collector_channel`]
//! 2. The reader is registered with the transport, the caller blocks on
//!    [`OutcomeWaiter::wait`]
//! 3. The transport fills leased buffers on its own thread and reports each
//!    delivery; the reader refills, advances, and counts chunks
//! 4. A terminal callback assembles the body and unblocks the caller

use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::latch::OutcomeLatch;
use crate::pool::{BufferLease, BufferPool, PoolExhausted};
use crate::protocol::{BodyError, ResponseHead, ResponseOutcome, TransportError};
use crate::transport::{ReadDriver, ResponseHandler};

/// Creates a reader/waiter pair for one request attempt.
///
/// `capacities` is the ordered sequence of fixed buffer capacities the
/// response body must fit into. The returned [`ChunkedBodyReader`] is handed
/// to the transport as its callback handler; the [`OutcomeWaiter`] stays
/// with the caller, whose thread blocks on it until the exchange reaches a
/// terminal outcome.
pub fn collector_channel<I>(capacities: I) -> (ChunkedBodyReader, OutcomeWaiter)
where
    I: IntoIterator<Item = usize>,
{
    let latch = Arc::new(OutcomeLatch::new());
    let reader = ChunkedBodyReader::new(BufferPool::new(capacities), Arc::clone(&latch));

    (reader, OutcomeWaiter { latch })
}

/// Consumer side of a [`collector_channel`] pair: blocks the calling thread
/// until the reader publishes the terminal outcome.
#[derive(Debug)]
pub struct OutcomeWaiter {
    latch: Arc<OutcomeLatch>,
}

impl OutcomeWaiter {
    /// Blocks until the exchange completes, then returns its outcome.
    /// Repeated calls return the same outcome.
    pub fn wait(&self) -> Arc<ResponseOutcome> {
        self.latch.wait()
    }

    /// Blocks for at most `timeout`; `None` means the exchange is still in
    /// flight.
    pub fn wait_timeout(&self, timeout: std::time::Duration) -> Option<Arc<ResponseOutcome>> {
        self.latch.wait_timeout(timeout)
    }

    /// Non-blocking read of the outcome, if it exists yet.
    pub fn try_get(&self) -> Option<Arc<ResponseOutcome>> {
        self.latch.try_get()
    }
}

/// Read-loop state. The pool is the only other mutable state of the read
/// phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadState {
    AwaitingStart,
    Reading,
    Terminal,
}

/// Consumes a response body arriving in arbitrarily-sized deliveries into a
/// finite pool of fixed-capacity buffers.
///
/// Implements [`ResponseHandler`]; see the module docs for the overall
/// flow. Chunk counting is an approximation by design: a delivery is
/// counted whenever the observed remaining space shrank since the previous
/// observation, not from any transport-provided framing. It is a
/// diagnostic signal, not something callers may base correctness on.
///
/// When the pool runs out before the exchange completes, the reader does
/// not hand the transport a doomed zero-capacity buffer to provoke a
/// transport-side error; it detects exhaustion itself, stops issuing reads,
/// and synthesizes the capacity failure locally. One consequence inherited
/// from the reference behavior is kept: end of body is only observable
/// through a read with spare capacity, so a pool sized exactly to the body
/// still fails with `CapacityExceeded`.
#[derive(Debug)]
pub struct ChunkedBodyReader {
    pool: BufferPool,
    state: ReadState,
    chunk_count: u64,
    // remaining space observed at the end of the previous callback; a
    // delivery is inferred whenever the current observation is smaller
    last_remaining: usize,
    head: Option<ResponseHead>,
    latch: Arc<OutcomeLatch>,
}

impl ChunkedBodyReader {
    pub fn new(pool: BufferPool, latch: Arc<OutcomeLatch>) -> Self {
        Self { pool, state: ReadState::AwaitingStart, chunk_count: 0, last_remaining: 0, head: None, latch }
    }

    /// Delivery events observed so far.
    pub fn chunk_count(&self) -> u64 {
        self.chunk_count
    }

    fn status(&self) -> Option<http::StatusCode> {
        self.head.as_ref().map(ResponseHead::status)
    }

    fn publish_failure(&mut self, status: Option<http::StatusCode>, error: BodyError) {
        self.state = ReadState::Terminal;
        self.latch.publish(ResponseOutcome::Failure { status, error, partial_body: self.pool.assemble() });
    }

    /// Returns a trailing lease to the pool. Losing the lease on success
    /// would silently drop body bytes, so that is fatal; on failure and
    /// cancellation the partial body is diagnostic and a dropped lease is
    /// only worth a warning.
    fn settle_trailing(&mut self, trailing: Option<BufferLease>, lease_required: bool) {
        match trailing {
            Some(lease) => self.pool.restore(lease),
            None => {
                if let Some(seq) = self.pool.outstanding_seq() {
                    if lease_required {
                        error!(seq, "transport completed without returning the outstanding buffer");
                        panic!("succeeded without returning outstanding lease {seq}");
                    }
                    warn!(seq, "outstanding buffer not returned; its bytes are missing from the partial body");
                }
            }
        }
    }

    /// One last boundary check for the trailing partial delivery: data may
    /// have been written since the previous observation without a
    /// completed-read callback in between.
    fn count_trailing_chunk(&mut self) {
        if let Some(remaining) = self.pool.remaining_in_current()
            && remaining < self.last_remaining
        {
            self.chunk_count += 1;
        }
    }

    /// Leases the current buffer and issues the next read, or synthesizes
    /// the capacity failure when every declared buffer is already full.
    fn issue_read(&mut self, driver: &mut dyn ReadDriver) {
        match self.pool.lend_current() {
            Ok(lease) => {
                self.last_remaining = lease.remaining();
                driver.read(lease);
            }
            Err(PoolExhausted) => {
                let declared = self.pool.total_capacity();
                warn!(declared, "buffer pool exhausted before the exchange completed");
                self.publish_failure(self.status(), BodyError::capacity_exceeded(declared));
            }
        }
    }
}

impl ResponseHandler for ChunkedBodyReader {
    fn on_response_started(&mut self, driver: &mut dyn ReadDriver, head: ResponseHead) {
        match self.state {
            ReadState::AwaitingStart => {}
            ReadState::Reading => {
                error!("response started twice for the same request");
                panic!("on_response_started while already reading");
            }
            ReadState::Terminal => {
                debug!("ignoring response_started after terminal outcome");
                return;
            }
        }

        debug!(status = %head.status(), "response started");
        self.head = Some(head);

        // leading zero-capacity buffers are legal and skipped up front
        self.pool.advance_if_full();
        if self.pool.is_exhausted() {
            let reason = if self.pool.is_empty() {
                "no response buffers declared"
            } else {
                "declared response buffers have no usable capacity"
            };
            warn!(buffers = self.pool.len(), reason, "cannot start reading");
            self.publish_failure(self.status(), BodyError::caller_configuration(reason));
            return;
        }

        self.state = ReadState::Reading;
        self.issue_read(driver);
    }

    fn on_read_completed(&mut self, driver: &mut dyn ReadDriver, lease: BufferLease) {
        match self.state {
            ReadState::Reading => {}
            ReadState::AwaitingStart => {
                error!("read completed before the response started");
                panic!("on_read_completed before on_response_started");
            }
            ReadState::Terminal => {
                error!("read completed after the terminal outcome; no read was outstanding");
                panic!("on_read_completed after terminal outcome");
            }
        }

        if lease.remaining() < self.last_remaining {
            self.chunk_count += 1;
        }

        // panics if the delivered lease is not the one most recently issued
        self.pool.restore(lease);
        self.pool.advance_if_full();
        self.issue_read(driver);
    }

    fn on_succeeded(&mut self, trailing: Option<BufferLease>) {
        if self.state == ReadState::Terminal {
            debug!("ignoring succeeded after terminal outcome");
            return;
        }

        self.settle_trailing(trailing, true);
        self.count_trailing_chunk();

        let Some(head) = self.head.take() else {
            error!("transport reported success before the response started");
            panic!("on_succeeded before on_response_started");
        };

        let body = self.pool.assemble();
        debug!(status = %head.status(), bytes = body.len(), chunks = self.chunk_count, "exchange succeeded");

        self.state = ReadState::Terminal;
        self.latch.publish(ResponseOutcome::Success { head, body, chunk_count: self.chunk_count });
    }

    fn on_failed(&mut self, error: TransportError, trailing: Option<BufferLease>) {
        if self.state == ReadState::Terminal {
            debug!("ignoring failed after terminal outcome");
            return;
        }

        self.settle_trailing(trailing, false);

        let status = error.status().or_else(|| self.status());
        warn!(%error, "transport reported failure");
        self.publish_failure(status, error.into());
    }

    fn on_cancelled(&mut self, trailing: Option<BufferLease>) {
        if self.state == ReadState::Terminal {
            debug!("ignoring cancelled after terminal outcome");
            return;
        }

        self.settle_trailing(trailing, false);

        let status = self.status();
        debug!(?status, "transport reported cancellation");
        self.state = ReadState::Terminal;
        self.latch.publish(ResponseOutcome::Cancelled { status, partial_body: self.pool.assemble() });
    }

    fn on_redirect_received(&mut self, location: &str) {
        if self.state == ReadState::Terminal {
            debug!("ignoring redirect after terminal outcome");
            return;
        }

        warn!(location, "redirect received; following redirects is not supported");
        self.publish_failure(self.status(), BodyError::unsupported(format!("redirect to {location}")));
    }
}
