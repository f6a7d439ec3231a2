//! Buffer-pooled response body collection for callback-driven HTTP transports
//!
//! This crate consumes an HTTP response body that arrives asynchronously, in
//! arbitrarily-sized deliveries, into a finite, caller-supplied sequence of
//! fixed-capacity buffers, while a separate thread blocks until the exchange
//! reaches exactly one terminal outcome (success, failure or cancellation).
//!
//! # Features
//!
//! - Caller-declared buffer pool with explicit exhaustion reporting
//! - Delivery-event ("chunk") counting for diagnostics and tests
//! - Contiguous body assembly from however many buffers were filled
//! - One-shot, cross-thread outcome handoff with an optional wait timeout
//! - A narrow callback contract towards the transport, with fail-fast
//!   checks on broken contract assumptions
//!
//! The actual networking (TLS, DNS, redirects, retries, engine
//! configuration) belongs to the external transport; this crate only
//! implements its callback contract.
//!
//! # Example
//!
//! ```
//! use std::thread;
//!
//! use bytes::Bytes;
//! use http::{HeaderMap, StatusCode};
//! use micro_body::protocol::ResponseHead;
//! use micro_body::reader::collector_channel;
//! use micro_body::transport::{ReadDriver, ResponseHandler};
//! # use micro_body::pool::BufferLease;
//!
//! // a trivial in-process stand-in for the transport
//! #[derive(Default)]
//! struct Pending(Option<BufferLease>);
//!
//! impl ReadDriver for Pending {
//!     fn read(&mut self, lease: BufferLease) {
//!         self.0 = Some(lease);
//!     }
//! }
//!
//! let (mut reader, waiter) = collector_channel([4, 3, 5, 1]);
//!
//! let transport = thread::spawn(move || {
//!     let mut pending = Pending::default();
//!     reader.on_response_started(&mut pending, ResponseHead::new(StatusCode::OK, HeaderMap::new()));
//!
//!     let mut body = &b"hello, world"[..];
//!     while !body.is_empty() {
//!         let mut lease = pending.0.take().expect("reader keeps reading");
//!         let written = lease.write(body);
//!         body = &body[written..];
//!         reader.on_read_completed(&mut pending, lease);
//!     }
//!     reader.on_succeeded(pending.0.take());
//! });
//!
//! let outcome = waiter.wait();
//! transport.join().unwrap();
//!
//! assert!(outcome.is_success());
//! assert_eq!(outcome.body_bytes(), &Bytes::from_static(b"hello, world"));
//! ```
//!
//! # Architecture
//!
//! The crate is organized into several key modules:
//!
//! - [`pool`]: the caller-declared [`BufferPool`](pool::BufferPool) of
//!   fixed-capacity buffers and the [`BufferLease`](pool::BufferLease)
//!   loaned to the transport for each read
//! - [`reader`]: the [`ChunkedBodyReader`](reader::ChunkedBodyReader)
//!   state machine driving refills, chunk counting and body assembly
//! - [`latch`]: the one-shot [`OutcomeLatch`](latch::OutcomeLatch)
//!   bridging the callback world to the blocking consumer thread
//! - [`protocol`]: outcome and error types
//! - [`transport`]: the callback contract this crate implements and the
//!   read-instruction surface it consumes
//!
//! # Concurrency
//!
//! The transport drives callbacks on its own thread(s) with at most one
//! active callback per request, so the reader holds no locks; the latch is
//! the single synchronization boundary. The pool is never written after
//! the terminal outcome is published, which makes the assembled body
//! safely readable from the consumer thread.
//!
//! # Error Handling
//!
//! Recoverable conditions (undersized pool, transport failures, redirects)
//! surface as a `Failure` outcome carrying a
//! [`BodyError`](protocol::BodyError). Broken programming contracts (a
//! delivered buffer that was never requested, a second outcome publication)
//! abort loudly instead; see [`protocol::error`](protocol) for the
//! taxonomy. Nothing in this crate retries.

pub mod latch;
pub mod pool;
pub mod protocol;
pub mod reader;
pub mod transport;
