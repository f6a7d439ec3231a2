//! One-shot, cross-thread handoff of the terminal outcome.
//!
//! The callback side publishes exactly once; any number of consumer threads
//! block until the value exists and then read the same `Arc`. This is the
//! single synchronization boundary of the crate: a mutex-guarded optional
//! plus a condvar, not a queue, because at-most-one value is a hard
//! invariant.

use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use tracing::{debug, error};

use crate::protocol::ResponseOutcome;

/// A single-assignment slot for the terminal [`ResponseOutcome`] of one
/// request, with blocking waiters.
///
/// Each request gets its own latch; there is no global state. `publish`
/// happens-before the corresponding `wait` return, which is what makes the
/// assembled body safely readable from the consumer thread.
#[derive(Debug, Default)]
pub struct OutcomeLatch {
    slot: Mutex<Option<Arc<ResponseOutcome>>>,
    published: Condvar,
}

impl OutcomeLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the outcome and wakes every waiter.
    ///
    /// # Panics
    ///
    /// Panics if an outcome was already published. At-most-once publication
    /// is a hard invariant; overwriting silently would hide a broken reader
    /// state machine.
    pub fn publish(&self, outcome: ResponseOutcome) {
        let mut slot = self.slot.lock().unwrap();
        if let Some(existing) = slot.as_ref() {
            error!(?existing, ?outcome, "second outcome published for the same request");
            panic!("outcome already published for this request");
        }
        debug!(success = outcome.is_success(), "publishing terminal outcome");
        *slot = Some(Arc::new(outcome));
        drop(slot);
        self.published.notify_all();
    }

    /// Blocks until an outcome has been published, then returns it. Repeated
    /// calls return the same outcome.
    pub fn wait(&self) -> Arc<ResponseOutcome> {
        let slot = self.slot.lock().unwrap();
        let slot = self.published.wait_while(slot, |slot| slot.is_none()).unwrap();
        Arc::clone(slot.as_ref().expect("condvar woke with an empty slot"))
    }

    /// Like [`wait`](Self::wait) but gives up after `timeout`, returning
    /// `None` if no outcome was published in time. Defensive addition so a
    /// misbehaving transport cannot block a caller forever.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Arc<ResponseOutcome>> {
        let slot = self.slot.lock().unwrap();
        let (slot, _result) = self.published.wait_timeout_while(slot, timeout, |slot| slot.is_none()).unwrap();
        slot.as_ref().map(Arc::clone)
    }

    /// Returns the outcome if one has been published, without blocking.
    pub fn try_get(&self) -> Option<Arc<ResponseOutcome>> {
        self.slot.lock().unwrap().as_ref().map(Arc::clone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    use bytes::Bytes;
    use http::StatusCode;

    use crate::protocol::BodyError;

    fn success() -> ResponseOutcome {
        ResponseOutcome::Success {
            head: crate::protocol::ResponseHead::new(StatusCode::OK, http::HeaderMap::new()),
            body: Bytes::from_static(b"hello"),
            chunk_count: 1,
        }
    }

    #[test]
    fn wait_returns_the_published_outcome() {
        let latch = OutcomeLatch::new();
        latch.publish(success());

        let outcome = latch.wait();
        assert!(outcome.is_success());
        assert_eq!(outcome.body_as_string(), "hello");
    }

    #[test]
    fn wait_blocks_until_a_publish_from_another_thread() {
        let latch = Arc::new(OutcomeLatch::new());

        let publisher = {
            let latch = Arc::clone(&latch);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                latch.publish(success());
            })
        };

        let outcome = latch.wait();
        assert!(outcome.is_success());
        publisher.join().unwrap();
    }

    #[test]
    fn repeated_waits_return_the_same_outcome() {
        let latch = OutcomeLatch::new();
        latch.publish(ResponseOutcome::Failure {
            status: None,
            error: BodyError::caller_configuration("no response buffers declared"),
            partial_body: Bytes::new(),
        });

        let first = latch.wait();
        let second = latch.wait();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn wait_timeout_gives_up_when_nothing_is_published() {
        let latch = OutcomeLatch::new();
        assert!(latch.wait_timeout(Duration::from_millis(10)).is_none());
        assert!(latch.try_get().is_none());

        latch.publish(success());
        assert!(latch.wait_timeout(Duration::from_millis(10)).is_some());
        assert!(latch.try_get().is_some());
    }

    #[test]
    #[should_panic(expected = "outcome already published")]
    fn double_publish_panics() {
        let latch = OutcomeLatch::new();
        latch.publish(success());
        latch.publish(success());
    }
}
