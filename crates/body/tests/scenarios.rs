//! End-to-end scenarios: a scripted transport drives the reader callbacks
//! on its own thread while the test thread blocks on the waiter, mirroring
//! how a real networking engine would use this crate.

use std::thread;
use std::time::Duration;

use http::{HeaderMap, StatusCode};
use micro_body::pool::BufferLease;
use micro_body::protocol::{BodyError, ResponseHead, TransportError};
use micro_body::reader::{ChunkedBodyReader, OutcomeWaiter, collector_channel};
use micro_body::transport::{ReadDriver, ResponseHandler};

/// Routes the reader's tracing output through the test harness so failing
/// scenarios show the callback sequence. First caller wins, later calls
/// are no-ops.
fn init_logging() {
    let _ = tracing_subscriber::fmt().with_test_writer().with_max_level(tracing::Level::DEBUG).try_init();
}

fn head_ok() -> ResponseHead {
    ResponseHead::new(StatusCode::OK, HeaderMap::new())
}

/// Parks the lease of the most recent read instruction until the scripted
/// transport is ready to fill it.
#[derive(Default)]
struct PendingRead(Option<BufferLease>);

impl ReadDriver for PendingRead {
    fn read(&mut self, lease: BufferLease) {
        assert!(self.0.is_none(), "transport received a second read while one was pending");
        self.0 = Some(lease);
    }
}

/// How the scripted exchange ends after all deliveries.
enum Ending {
    Succeed,
    Fail(&'static str),
    Cancel,
}

/// Plays one delivery event into the reader. A delivery larger than the
/// pending buffer spans several completed reads, exactly like a transport
/// draining its receive queue into too-small targets. Returns `false` once
/// the reader stops issuing reads (it went terminal on its own).
fn deliver(reader: &mut ChunkedBodyReader, pending: &mut PendingRead, delivery: &[u8]) -> bool {
    let mut bytes = delivery;
    while !bytes.is_empty() {
        let Some(mut lease) = pending.0.take() else {
            return false;
        };
        let written = lease.write(bytes);
        bytes = &bytes[written..];
        reader.on_read_completed(pending, lease);
    }
    true
}

/// Runs a whole scripted exchange on a dedicated transport thread and
/// returns the waiter for the test thread to block on.
fn run_scenario(
    capacities: impl IntoIterator<Item = usize>,
    deliveries: Vec<&'static [u8]>,
    ending: Ending,
) -> OutcomeWaiter {
    init_logging();
    let (mut reader, waiter) = collector_channel(capacities);

    thread::spawn(move || {
        let mut pending = PendingRead::default();
        reader.on_response_started(&mut pending, head_ok());

        for delivery in deliveries {
            if !deliver(&mut reader, &mut pending, delivery) {
                return;
            }
        }

        match ending {
            Ending::Succeed => reader.on_succeeded(pending.0.take()),
            Ending::Fail(message) => reader.on_failed(TransportError::new(message, None), pending.0.take()),
            Ending::Cancel => reader.on_cancelled(pending.0.take()),
        }
    });

    waiter
}

#[test]
fn single_buffer_collects_the_whole_body() {
    let waiter = run_scenario([13], vec![b"hello, world"], Ending::Succeed);

    let outcome = waiter.wait();
    assert!(outcome.is_success());
    assert_eq!(outcome.status(), Some(StatusCode::OK));
    assert_eq!(outcome.body_as_string(), "hello, world");
    assert_eq!(outcome.chunk_count(), 1);
}

#[test]
fn small_buffers_collect_the_whole_body() {
    let waiter = run_scenario([4, 3, 5, 1], vec![b"hello, world"], Ending::Succeed);

    let outcome = waiter.wait();
    assert!(outcome.is_success());
    assert_eq!(outcome.body_as_string(), "hello, world");
    assert!(outcome.chunk_count() >= 1);
}

#[test]
fn chunk_count_is_stable_across_identical_runs() {
    let first = run_scenario([4, 3, 5, 1], vec![b"hello, world"], Ending::Succeed).wait();
    let second = run_scenario([4, 3, 5, 1], vec![b"hello, world"], Ending::Succeed).wait();

    assert_eq!(first.chunk_count(), second.chunk_count());
}

#[test]
fn undersized_pool_fails_instead_of_hanging() {
    let waiter = run_scenario([11], vec![b"hello, world"], Ending::Succeed);

    let outcome = waiter
        .wait_timeout(Duration::from_secs(5))
        .expect("an undersized pool must produce an outcome, not a hang");
    assert!(!outcome.is_success());
    assert!(outcome.error().is_some_and(BodyError::is_capacity_exceeded));
    assert_eq!(outcome.body_as_string(), "hello, worl");
}

#[test]
fn empty_body_succeeds_with_one_spare_buffer() {
    let waiter = run_scenario([1], vec![], Ending::Succeed);

    let outcome = waiter.wait();
    assert!(outcome.is_success());
    assert_eq!(outcome.status(), Some(StatusCode::OK));
    assert_eq!(outcome.body_as_string(), "");
    assert_eq!(outcome.chunk_count(), 0);
    assert!(outcome.error().is_none());
}

#[test]
fn redirect_is_surfaced_as_unsupported() {
    init_logging();
    let (mut reader, waiter) = collector_channel([13]);

    thread::spawn(move || {
        reader.on_redirect_received("http://example.com/moved");
    });

    let outcome = waiter.wait();
    assert!(outcome.error().is_some_and(BodyError::is_unsupported));
}

#[test]
fn throttled_delivery_counts_every_chunk() {
    // 5 bytes, 5 bytes and 2 bytes trickling into one roomy buffer
    let waiter = run_scenario([13], vec![b"hello", b", wor", b"ld"], Ending::Succeed);

    let outcome = waiter.wait();
    assert!(outcome.is_success());
    assert_eq!(outcome.body_as_string(), "hello, world");
    assert_eq!(outcome.chunk_count(), 3);
}

#[test]
fn transport_failure_keeps_the_partial_body() {
    let waiter = run_scenario([16], vec![b"hello"], Ending::Fail("connection reset"));

    let outcome = waiter.wait();
    assert!(outcome.error().is_some_and(BodyError::is_transport));
    assert_eq!(outcome.body_as_string(), "hello");
}

#[test]
fn cancellation_keeps_the_partial_body() {
    let waiter = run_scenario([16], vec![b"hello"], Ending::Cancel);

    let outcome = waiter.wait();
    assert!(outcome.is_cancelled());
    assert_eq!(outcome.body_as_string(), "hello");
    assert_eq!(outcome.status(), Some(StatusCode::OK));
}

#[test]
fn zero_declared_buffers_fail_before_any_read() {
    let waiter = run_scenario([], vec![], Ending::Succeed);

    let outcome = waiter.wait();
    assert!(outcome.error().is_some_and(BodyError::is_caller_configuration));
}

#[test]
fn waiting_repeatedly_returns_the_same_outcome() {
    let waiter = run_scenario([13], vec![b"hello, world"], Ending::Succeed);

    let first = waiter.wait();
    let second = waiter.wait();
    assert!(std::sync::Arc::ptr_eq(&first, &second));
    assert_eq!(first.body_as_string(), second.body_as_string());
}

#[test]
fn wait_timeout_expires_while_the_exchange_is_in_flight() {
    init_logging();
    let (mut reader, waiter) = collector_channel([13]);

    let transport = thread::spawn(move || {
        let mut pending = PendingRead::default();
        reader.on_response_started(&mut pending, head_ok());
        thread::sleep(Duration::from_millis(100));
        deliver(&mut reader, &mut pending, b"late");
        reader.on_succeeded(pending.0.take());
    });

    assert!(waiter.wait_timeout(Duration::from_millis(5)).is_none());
    assert!(waiter.try_get().is_none());

    let outcome = waiter.wait();
    assert_eq!(outcome.body_as_string(), "late");
    transport.join().unwrap();
}

#[test]
fn any_layout_with_spare_capacity_round_trips_the_body() {
    let body: &'static [u8] = b"hello, world";
    let layouts: [&[usize]; 5] = [&[13], &[4, 3, 5, 1], &[1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1], &[12, 1], &[6, 7]];

    for layout in layouts {
        let waiter = run_scenario(layout.iter().copied(), vec![body], Ending::Succeed);
        let outcome = waiter.wait();
        assert!(outcome.is_success(), "layout {layout:?} should succeed");
        assert_eq!(outcome.body_as_string(), "hello, world", "layout {layout:?} should round-trip");
    }
}
