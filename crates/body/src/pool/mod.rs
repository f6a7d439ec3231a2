//! A finite, caller-declared pool of fixed-capacity buffers.
//!
//! The pool is the only mutable state of the read phase. The reader moves
//! buffers out of it one at a time as [`BufferLease`]s for the transport to
//! fill, puts them back on delivery, and finally concatenates the written
//! prefixes into the response body. Running past the last buffer is an
//! explicit [`PoolExhausted`] signal, never an implicit empty buffer.

use std::mem;

use bytes::{BufMut, Bytes, BytesMut};
use thiserror::Error;
use tracing::error;

mod fixed_buffer;
pub use fixed_buffer::BufferLease;
pub use fixed_buffer::FixedBuffer;

/// Signal that every declared buffer is full and no further writes are
/// possible.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("buffer pool exhausted")]
pub struct PoolExhausted;

/// An ordered, finite sequence of [`FixedBuffer`]s with a cursor pointing at
/// the buffer currently accepting writes.
///
/// At most one buffer may be on loan at a time; lending twice, or returning
/// a lease the pool never issued, aborts. The pool is written only during
/// the read phase and becomes read-only once the terminal outcome exists.
#[derive(Debug, Default)]
pub struct BufferPool {
    slots: Vec<FixedBuffer>,
    cursor: usize,
    // seq of the lease currently out, if any; the slot it came from holds a
    // zero-capacity placeholder until it is restored
    loaned: Option<u64>,
    next_seq: u64,
}

impl BufferPool {
    /// Creates a pool from an ordered sequence of buffer capacities. Zero
    /// capacities and an empty sequence are both legal; an empty sequence
    /// yields a pool that is exhausted from birth.
    pub fn new<I>(capacities: I) -> Self
    where
        I: IntoIterator<Item = usize>,
    {
        let slots = capacities.into_iter().map(FixedBuffer::with_capacity).collect();
        Self { slots, cursor: 0, loaned: None, next_seq: 0 }
    }

    /// Number of declared buffers.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Sum of all declared capacities.
    pub fn total_capacity(&self) -> usize {
        self.slots.iter().map(FixedBuffer::capacity).sum()
    }

    /// True once the cursor has moved past the last buffer.
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.slots.len()
    }

    /// Space left in the current buffer, or `None` when exhausted.
    pub fn remaining_in_current(&self) -> Option<usize> {
        self.slots.get(self.cursor).map(FixedBuffer::remaining)
    }

    /// Moves the cursor past every leading full buffer. A zero-capacity
    /// buffer is full from birth, so this loops rather than stepping once.
    pub fn advance_if_full(&mut self) {
        assert!(self.loaned.is_none(), "advance_if_full called with a lease outstanding");
        while let Some(buffer) = self.slots.get(self.cursor) {
            if !buffer.is_full() {
                break;
            }
            self.cursor += 1;
        }
    }

    /// Lends the current buffer out as a [`BufferLease`] for the transport
    /// to write into, or reports exhaustion.
    ///
    /// # Panics
    ///
    /// Panics if a lease is already outstanding; the transport contract
    /// allows a single in-flight read per request.
    pub fn lend_current(&mut self) -> Result<BufferLease, PoolExhausted> {
        assert!(self.loaned.is_none(), "lend_current called with a lease already outstanding");

        let slot = self.slots.get_mut(self.cursor).ok_or(PoolExhausted)?;
        let buffer = mem::take(slot);

        let seq = self.next_seq;
        self.next_seq += 1;
        self.loaned = Some(seq);

        Ok(BufferLease::new(seq, buffer))
    }

    /// Seq of the lease currently on loan, if any.
    #[inline]
    pub fn outstanding_seq(&self) -> Option<u64> {
        self.loaned
    }

    /// Returns a loaned buffer to its slot.
    ///
    /// # Panics
    ///
    /// Panics if the lease is not the one most recently lent out; that means
    /// the transport broke the single-active-read contract, which is not a
    /// recoverable condition.
    pub fn restore(&mut self, lease: BufferLease) {
        match self.loaned {
            Some(seq) if seq == lease.seq() => {}
            outstanding => {
                error!(delivered = lease.seq(), ?outstanding, "transport delivered a buffer that was not the one requested");
                panic!("transport delivered lease {} but lease {:?} is outstanding", lease.seq(), outstanding);
            }
        }

        self.loaned = None;
        self.slots[self.cursor] = lease.into_buffer();
    }

    /// Concatenates the written prefix of every buffer, in pool order, into
    /// one contiguous body.
    ///
    /// Idempotent: borrows the pool and copies, so it may be called any
    /// number of times. A slot whose buffer is still on loan contributes
    /// nothing; terminal callbacks hand the outstanding lease back before
    /// assembly, so in practice nothing is lost.
    pub fn assemble(&self) -> Bytes {
        let total = self.slots.iter().map(FixedBuffer::len).sum();
        let mut body = BytesMut::with_capacity(total);
        for buffer in &self.slots {
            body.put_slice(buffer.written());
        }
        body.freeze()
    }
}
