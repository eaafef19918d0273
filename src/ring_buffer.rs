use alloc::boxed::Box;
use alloc::vec::Vec;
use core::{fmt, marker::PhantomData, num::NonZeroU16};

use spin::relax::{RelaxStrategy, Spin};

use crate::cursor::Cursor;
use crate::sync::{AtomicU8, Ordering};
use crate::RingBufferError;

/// Fixed-capacity byte ring with independently advanced read and write cursors
///
/// # Generic Parameters
/// - `R`: what a context does after losing a cursor race (defaults to [`Spin`])
///
/// # Implementation Details
/// - Each cursor is claimed through a compare-and-swap loop, never a lock
/// - Storage is an owned slice of atomic bytes, so a lapping writer and a
///   trailing reader race logically but never at the memory level
/// - No occupancy is tracked: [`put`](Self::put) may overwrite unread bytes
///   and [`get`](Self::get) may return stale ones. Use [`ByteQueue`] for a
///   checked queue.
///
/// [`ByteQueue`]: crate::ByteQueue
pub struct RingBuffer<R = Spin> {
    storage: Box<[AtomicU8]>,
    capacity: NonZeroU16,
    write: Cursor,
    read: Cursor,
    relax: PhantomData<R>,
}

impl RingBuffer {
    /// Allocates a zeroed buffer of `size` bytes with both cursors at zero
    ///
    /// # Errors
    /// Returns `RingBufferError::ZeroCapacity` when `size` is zero
    ///
    /// # Examples
    /// ```
    /// use casring::{RingBuffer, RingBufferError};
    ///
    /// let buf = RingBuffer::new(64).unwrap();
    /// assert_eq!(buf.capacity(), 64);
    /// assert_eq!(RingBuffer::new(0).unwrap_err(), RingBufferError::ZeroCapacity);
    /// ```
    pub fn new(size: u16) -> Result<Self, RingBufferError> {
        Self::with_relax(size)
    }
}

impl<R: RelaxStrategy> RingBuffer<R> {
    /// Like [`RingBuffer::new`], with an explicit relax strategy
    ///
    /// ```
    /// use casring::RingBuffer;
    /// use spin::relax::Loop;
    ///
    /// let buf = RingBuffer::<Loop>::with_relax(8).unwrap();
    /// buf.put(7);
    /// assert_eq!(buf.get(), 7);
    /// ```
    pub fn with_relax(size: u16) -> Result<Self, RingBufferError> {
        NonZeroU16::new(size)
            .map(Self::with_capacity)
            .ok_or(RingBufferError::ZeroCapacity)
    }

    /// Infallible constructor for a capacity already known to be non-zero
    pub fn with_capacity(capacity: NonZeroU16) -> Self {
        let storage: Vec<AtomicU8> = (0..capacity.get()).map(|_| AtomicU8::new(0)).collect();
        log_debug!(capacity = capacity.get(), "ring buffer allocated");

        Self {
            storage: storage.into_boxed_slice(),
            capacity,
            write: Cursor::new(),
            read: Cursor::new(),
            relax: PhantomData,
        }
    }

    /// Buffer size in bytes, fixed for the buffer's lifetime
    #[inline]
    pub fn capacity(&self) -> u16 {
        self.capacity.get()
    }

    /// Claims the next write slot and returns its index
    ///
    /// The write cursor moves one slot forward, wrapping at capacity. The
    /// read cursor is neither read nor changed.
    ///
    /// ```
    /// use casring::RingBuffer;
    ///
    /// let buf = RingBuffer::new(4).unwrap();
    /// let claimed: Vec<u16> = (0..5).map(|_| buf.advance_write()).collect();
    /// assert_eq!(claimed, [0, 1, 2, 3, 0]);
    /// assert_eq!(buf.write_position(), 1);
    /// ```
    #[inline]
    pub fn advance_write(&self) -> u16 {
        self.write.advance::<R>(self.capacity)
    }

    /// Claims the next read slot and returns its index
    #[inline]
    pub fn advance_read(&self) -> u16 {
        self.read.advance::<R>(self.capacity)
    }

    /// Index the next [`put`](Self::put) will write to
    #[inline]
    pub fn write_position(&self) -> u16 {
        self.write.load()
    }

    /// Index the next [`get`](Self::get) will read from
    #[inline]
    pub fn read_position(&self) -> u16 {
        self.read.load()
    }

    /// Writes one byte at the claimed write slot
    ///
    /// Does not check for unread data in that slot.
    #[inline]
    pub fn put(&self, value: u8) {
        let position = self.advance_write();
        self.storage[usize::from(position)].store(value, Ordering::Relaxed);
    }

    /// Reads one byte from the claimed read slot
    ///
    /// Does not check that the slot was written since the last lap.
    #[inline]
    pub fn get(&self) -> u8 {
        let position = self.advance_read();
        self.storage[usize::from(position)].load(Ordering::Relaxed)
    }

    /// Rewinds both cursors and zeroes the storage
    pub(crate) fn reset(&mut self) {
        self.write.reset();
        self.read.reset();
        self.storage
            .iter()
            .for_each(|slot| slot.store(0, Ordering::Relaxed));
    }
}

impl<R> fmt::Debug for RingBuffer<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RingBuffer[cap={}, read={}, write={}]",
            self.capacity,
            self.read.load(),
            self.write.load()
        )
    }
}
