use std::cmp;

use bytes::{BufMut, BytesMut};

/// A byte buffer whose capacity is fixed at construction.
///
/// The write cursor is the current length: it only grows, and never past the
/// declared capacity. `BytesMut` may over-allocate internally, so the
/// capacity is tracked explicitly rather than derived from the allocation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FixedBuffer {
    capacity: usize,
    bytes: BytesMut,
}

impl FixedBuffer {
    /// Creates an empty buffer of the given capacity. A capacity of zero is
    /// legal and produces a buffer that is full from birth.
    pub fn with_capacity(capacity: usize) -> Self {
        Self { capacity, bytes: BytesMut::with_capacity(capacity) }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of bytes written so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Space left before the buffer is full.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.capacity - self.bytes.len()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.remaining() == 0
    }

    /// Appends as much of `src` as fits and returns the number of bytes
    /// written. Writing into a full buffer is a no-op returning zero.
    pub fn write(&mut self, src: &[u8]) -> usize {
        let len = cmp::min(self.remaining(), src.len());
        self.bytes.put_slice(&src[..len]);
        len
    }

    /// The written prefix of the buffer. Unwritten capacity is not visible.
    #[inline]
    pub fn written(&self) -> &[u8] {
        &self.bytes
    }
}

/// An owned loan of the pool's current buffer, handed to the transport with
/// a `read` instruction.
///
/// `seq` identifies the read instruction the lease answers; the reader
/// checks it on delivery to detect a transport handing back a buffer it was
/// never given. The transport writes through [`BufferLease::write`] and
/// returns the lease in `on_read_completed` (or attached to a terminal
/// callback when the exchange ends while a read is outstanding).
#[derive(Debug)]
pub struct BufferLease {
    seq: u64,
    buffer: FixedBuffer,
}

impl BufferLease {
    pub(crate) fn new(seq: u64, buffer: FixedBuffer) -> Self {
        Self { seq, buffer }
    }

    /// Sequence number of the read instruction this lease belongs to.
    #[inline]
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Space left in the loaned buffer.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.buffer.remaining()
    }

    /// Appends as much of `src` as fits, returning the number of bytes
    /// written.
    pub fn write(&mut self, src: &[u8]) -> usize {
        self.buffer.write(src)
    }

    pub(crate) fn into_buffer(self) -> FixedBuffer {
        self.buffer
    }
}
