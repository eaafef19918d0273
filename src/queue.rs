//! Checked single-producer/single-consumer queue on top of [`RingBuffer`].
//!
//! An occupancy counter keeps the producer from lapping the consumer and the
//! consumer from reading slots that were never written. The counter is the
//! only state shared between the two halves: the producer publishes a byte
//! with a `Release` increment, the consumer frees a slot with a `Release`
//! decrement.

use core::{cell::Cell, fmt, marker::PhantomData, num::NonZeroU16};

use spin::relax::{RelaxStrategy, Spin};

use crate::sync::{AtomicBool, AtomicU16, Ordering};
use crate::{RingBuffer, RingBufferError};

/// Byte queue that can be split once into a [`Producer`] and a [`Consumer`]
///
/// # Examples
/// ```
/// use casring::ByteQueue;
///
/// let queue = ByteQueue::new(16).unwrap();
/// let (producer, consumer) = queue.split().unwrap();
///
/// producer.push(b"Hello").unwrap();
///
/// let mut output = [0u8; 5];
/// let read = consumer.pop(&mut output);
/// assert_eq!(&output[..read], b"Hello");
/// ```
pub struct ByteQueue<R = Spin> {
    ring: RingBuffer<R>,
    occupied: AtomicU16,
    split: AtomicBool,
}

impl ByteQueue {
    /// Creates an empty queue holding up to `size` bytes
    ///
    /// # Errors
    /// Returns `RingBufferError::ZeroCapacity` when `size` is zero
    pub fn new(size: u16) -> Result<Self, RingBufferError> {
        Self::with_relax(size)
    }
}

impl<R: RelaxStrategy> ByteQueue<R> {
    /// Like [`ByteQueue::new`], with an explicit relax strategy
    pub fn with_relax(size: u16) -> Result<Self, RingBufferError> {
        NonZeroU16::new(size)
            .map(Self::with_capacity)
            .ok_or(RingBufferError::ZeroCapacity)
    }

    /// Infallible constructor for a capacity already known to be non-zero
    pub fn with_capacity(capacity: NonZeroU16) -> Self {
        Self {
            ring: RingBuffer::with_capacity(capacity),
            occupied: AtomicU16::new(0),
            split: AtomicBool::new(false),
        }
    }

    /// Hands out the producer and consumer halves
    ///
    /// # Errors
    /// Returns `RingBufferError::AlreadySplit` on every call after the first,
    /// until [`clear`](Self::clear) is called
    ///
    /// ```
    /// use casring::{ByteQueue, RingBufferError};
    ///
    /// let queue = ByteQueue::new(4).unwrap();
    /// let _halves = queue.split().unwrap();
    /// assert!(matches!(queue.split(), Err(RingBufferError::AlreadySplit)));
    /// ```
    pub fn split(&self) -> Result<(Producer<'_, R>, Consumer<'_, R>), RingBufferError> {
        if self.split.swap(true, Ordering::AcqRel) {
            return Err(RingBufferError::AlreadySplit);
        }
        Ok((
            Producer {
                queue: self,
                unshared: PhantomData,
            },
            Consumer {
                queue: self,
                unshared: PhantomData,
            },
        ))
    }

    /// Queue size in bytes
    #[inline]
    pub fn capacity(&self) -> usize {
        usize::from(self.ring.capacity())
    }

    /// Number of bytes written and not yet read
    #[inline]
    pub fn len(&self) -> usize {
        usize::from(self.occupied.load(Ordering::Acquire))
    }

    /// Equivalent to `self.len() == 0`
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Equivalent to `self.len() == self.capacity()`
    #[inline]
    pub fn is_full(&self) -> bool {
        self.len() == self.capacity()
    }

    /// Calculated as `capacity() - len()`
    #[inline]
    pub fn available_space(&self) -> usize {
        self.capacity().saturating_sub(self.len())
    }

    /// Empties the queue, zeroes its memory and allows a new [`split`](Self::split)
    ///
    /// Taking `&mut self` guarantees no producer or consumer is alive.
    pub fn clear(&mut self) {
        self.ring.reset();
        self.occupied.store(0, Ordering::Release);
        self.split.store(false, Ordering::Release);
        log_debug!(capacity = self.capacity(), "byte queue cleared");
    }

    fn try_put(&self, value: u8) -> Result<(), RingBufferError> {
        if self.is_full() {
            log_trace!(capacity = self.capacity(), "byte queue full");
            return Err(RingBufferError::BufferOverflow);
        }
        self.ring.put(value);
        self.occupied.fetch_add(1, Ordering::Release);
        Ok(())
    }

    fn push(&self, data: &[u8]) -> Result<(), RingBufferError> {
        // Only the consumer runs concurrently, and it can only free space.
        if data.len() > self.available_space() {
            log_trace!(
                requested = data.len(),
                available = self.available_space(),
                "byte queue push rejected"
            );
            return Err(RingBufferError::BufferOverflow);
        }
        for &byte in data {
            self.ring.put(byte);
        }
        // Fits in u16 because it never exceeds the capacity.
        self.occupied.fetch_add(data.len() as u16, Ordering::Release);
        Ok(())
    }

    fn try_get(&self) -> Option<u8> {
        if self.is_empty() {
            return None;
        }
        let value = self.ring.get();
        self.occupied.fetch_sub(1, Ordering::Release);
        Some(value)
    }

    fn pop(&self, output: &mut [u8]) -> usize {
        let to_read = output.len().min(self.len());
        if to_read == 0 {
            return 0;
        }
        for slot in &mut output[..to_read] {
            *slot = self.ring.get();
        }
        self.occupied.fetch_sub(to_read as u16, Ordering::Release);
        to_read
    }
}

impl<R: RelaxStrategy> fmt::Debug for ByteQueue<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let capacity = self.ring.capacity();
        let used = self.occupied.load(Ordering::Acquire);
        write!(
            f,
            "ByteQueue<{}>[{}B used, {}B free]",
            capacity,
            used,
            capacity.saturating_sub(used)
        )
    }
}

/// Writing half of a [`ByteQueue`]
///
/// The producer can move to another thread but cannot be shared between
/// threads, so exactly one context ever writes:
///
/// ```compile_fail
/// use casring::ByteQueue;
///
/// let queue = ByteQueue::new(4).unwrap();
/// let (producer, _consumer) = queue.split().unwrap();
/// std::thread::scope(|s| {
///     s.spawn(|| producer.try_put(1));
///     s.spawn(|| producer.try_put(2));
/// });
/// ```
pub struct Producer<'a, R = Spin> {
    queue: &'a ByteQueue<R>,
    unshared: PhantomData<Cell<()>>,
}

impl<'a, R: RelaxStrategy> Producer<'a, R> {
    /// Appends one byte
    ///
    /// # Errors
    /// Returns `RingBufferError::BufferOverflow` if the queue is full
    #[inline]
    pub fn try_put(&self, value: u8) -> Result<(), RingBufferError> {
        self.queue.try_put(value)
    }

    /// Appends all of `data` or nothing
    ///
    /// # Errors
    /// Returns `RingBufferError::BufferOverflow` if `data` is longer than the
    /// free space
    ///
    /// ```
    /// use casring::{ByteQueue, RingBufferError};
    ///
    /// let queue = ByteQueue::new(4).unwrap();
    /// let (producer, _consumer) = queue.split().unwrap();
    /// assert_eq!(producer.push(&[1, 2, 3, 4, 5]), Err(RingBufferError::BufferOverflow));
    /// assert!(queue.is_empty());
    /// ```
    pub fn push(&self, data: &[u8]) -> Result<(), RingBufferError> {
        self.queue.push(data)
    }

    /// Same as [`ByteQueue::capacity`]
    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    /// Same as [`ByteQueue::len`]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Same as [`ByteQueue::is_empty`]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Same as [`ByteQueue::is_full`]
    pub fn is_full(&self) -> bool {
        self.queue.is_full()
    }

    /// Same as [`ByteQueue::available_space`]
    pub fn available_space(&self) -> usize {
        self.queue.available_space()
    }
}

/// Reading half of a [`ByteQueue`]
///
/// Like [`Producer`], `Send` but not `Sync`:
///
/// ```compile_fail
/// use casring::ByteQueue;
///
/// let queue = ByteQueue::new(4).unwrap();
/// let (_producer, consumer) = queue.split().unwrap();
/// std::thread::scope(|s| {
///     s.spawn(|| consumer.try_get());
///     s.spawn(|| consumer.try_get());
/// });
/// ```
pub struct Consumer<'a, R = Spin> {
    queue: &'a ByteQueue<R>,
    unshared: PhantomData<Cell<()>>,
}

impl<'a, R: RelaxStrategy> Consumer<'a, R> {
    /// Removes the oldest byte, or returns `None` if nothing is queued
    #[inline]
    pub fn try_get(&self) -> Option<u8> {
        self.queue.try_get()
    }

    /// Moves up to `output.len()` bytes into `output`
    ///
    /// # Returns
    /// Number of bytes actually read
    pub fn pop(&self, output: &mut [u8]) -> usize {
        self.queue.pop(output)
    }

    /// Same as [`ByteQueue::capacity`]
    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    /// Same as [`ByteQueue::len`]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Same as [`ByteQueue::is_empty`]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Same as [`ByteQueue::is_full`]
    pub fn is_full(&self) -> bool {
        self.queue.is_full()
    }

    /// Same as [`ByteQueue::available_space`]
    pub fn available_space(&self) -> usize {
        self.queue.available_space()
    }
}

/// heapless::Vec integration (enabled via "heapless" feature)
#[cfg(feature = "heapless")]
impl<'a, R: RelaxStrategy> Producer<'a, R> {
    /// Pushes data from [`heapless::Vec`], all or nothing
    ///
    /// # Example
    /// ```
    /// # use casring::ByteQueue;
    /// # use heapless::Vec;
    /// let queue = ByteQueue::new(256).unwrap();
    /// let (producer, _consumer) = queue.split().unwrap();
    /// let mut vec = Vec::<u8, 32>::new();
    /// vec.extend_from_slice(b"data").unwrap();
    /// producer.push_heapless(&vec).unwrap();
    /// ```
    pub fn push_heapless<const V: usize>(
        &self,
        data: &heapless::Vec<u8, V>,
    ) -> Result<(), RingBufferError> {
        self.push(data.as_slice())
    }
}

#[cfg(feature = "heapless")]
impl<'a, R: RelaxStrategy> Consumer<'a, R> {
    /// Pops into a new [`heapless::Vec`]
    ///
    /// # Returns
    /// Vec containing up to `min(count, V)` bytes
    pub fn pop_heapless<const V: usize>(&self, count: usize) -> heapless::Vec<u8, V> {
        let mut vec = heapless::Vec::new();
        while vec.len() < count.min(V) {
            match self.try_get() {
                // Cannot fail: the loop stops at capacity V.
                Some(byte) => {
                    let _ = vec.push(byte);
                }
                None => break,
            }
        }
        vec
    }
}

#[cfg(all(test, not(feature = "loom")))]
mod tests {
    use super::*;
    use std::format;

    #[test]
    fn basic_operations() {
        let queue = ByteQueue::new(8).unwrap();
        let (producer, consumer) = queue.split().unwrap();
        assert_eq!(queue.len(), 0);

        assert!(producer.push(&[1, 2, 3]).is_ok());
        assert_eq!(queue.len(), 3);
        assert_eq!(consumer.len(), 3);

        let mut output = [0u8; 3];
        assert_eq!(consumer.pop(&mut output), 3);
        assert_eq!(output, [1, 2, 3]);
        assert!(queue.is_empty());
    }

    #[test]
    fn get_on_empty_queue_is_none() {
        let queue = ByteQueue::new(4).unwrap();
        let (producer, consumer) = queue.split().unwrap();
        assert_eq!(consumer.try_get(), None);

        producer.try_put(0xAB).unwrap();
        assert_eq!(consumer.try_get(), Some(0xAB));
        assert_eq!(consumer.try_get(), None);
    }

    #[test]
    fn producer_cannot_lap_consumer() {
        let queue = ByteQueue::new(3).unwrap();
        let (producer, consumer) = queue.split().unwrap();
        for byte in 1..=3 {
            producer.try_put(byte).unwrap();
        }
        assert!(producer.is_full());
        assert_eq!(producer.try_put(4), Err(RingBufferError::BufferOverflow));

        assert_eq!(consumer.try_get(), Some(1));
        producer.try_put(4).unwrap();
        assert_eq!(consumer.try_get(), Some(2));
        assert_eq!(consumer.try_get(), Some(3));
        assert_eq!(consumer.try_get(), Some(4));
    }

    #[test]
    fn push_is_all_or_nothing() {
        let queue = ByteQueue::new(4).unwrap();
        let (producer, consumer) = queue.split().unwrap();
        producer.push(&[1, 2]).unwrap();

        assert_eq!(
            producer.push(&[3, 4, 5]),
            Err(RingBufferError::BufferOverflow)
        );
        assert_eq!(producer.len(), 2);
        assert_eq!(producer.available_space(), 2);

        let mut output = [0u8; 8];
        assert_eq!(consumer.pop(&mut output), 2);
        assert_eq!(&output[..2], &[1, 2]);
    }

    #[test]
    fn pop_wraps_around_the_end() {
        let queue = ByteQueue::new(4).unwrap();
        let (producer, consumer) = queue.split().unwrap();
        let mut output = [0u8; 4];

        for round in 0..10u8 {
            producer.push(&[round, round + 1, round + 2]).unwrap();
            assert_eq!(consumer.pop(&mut output), 3);
            assert_eq!(&output[..3], &[round, round + 1, round + 2]);
        }
    }

    #[test]
    fn split_only_once_until_cleared() {
        let mut queue = ByteQueue::new(4).unwrap();
        {
            let (producer, _consumer) = queue.split().unwrap();
            producer.push(&[7, 7]).unwrap();
            assert!(matches!(queue.split(), Err(RingBufferError::AlreadySplit)));
        }

        queue.clear();
        assert!(queue.is_empty());

        let (_producer, consumer) = queue.split().unwrap();
        assert_eq!(consumer.try_get(), None);
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert!(matches!(
            ByteQueue::new(0),
            Err(RingBufferError::ZeroCapacity)
        ));
    }

    #[test]
    fn debug_shows_usage() {
        let queue = ByteQueue::new(8).unwrap();
        let (producer, _consumer) = queue.split().unwrap();
        producer.push(b"abc").unwrap();
        assert_eq!(format!("{:?}", queue), "ByteQueue<8>[3B used, 5B free]");
    }

    #[test]
    fn halves_move_between_threads() {
        fn assert_send<T: Send>() {}
        assert_send::<Producer<'static>>();
        assert_send::<Consumer<'static>>();
        assert_send::<&ByteQueue>();
    }

    #[test]
    fn full_queue_reports_no_space() {
        let queue = ByteQueue::new(4).unwrap();
        let (producer, consumer) = queue.split().unwrap();
        producer.push(&[1, 2, 3]).unwrap();
        producer.try_put(4).unwrap();

        assert!(producer.is_full());
        assert_eq!(producer.len(), producer.capacity());
        assert_eq!(producer.available_space(), 0);
        assert_eq!(producer.push(&[5]), Err(RingBufferError::BufferOverflow));
        assert_eq!(format!("{:?}", queue), "ByteQueue<4>[4B used, 0B free]");

        assert_eq!(consumer.try_get(), Some(1));
        assert!(!consumer.is_full());
        assert_eq!(consumer.available_space(), 1);
    }

    #[cfg(feature = "tracing")]
    #[test]
    fn logged_paths_still_behave() {
        let mut queue = ByteQueue::new(2).unwrap();
        {
            let (producer, _consumer) = queue.split().unwrap();
            producer.push(&[1, 2]).unwrap();
            assert_eq!(producer.try_put(3), Err(RingBufferError::BufferOverflow));
            assert_eq!(producer.push(&[3]), Err(RingBufferError::BufferOverflow));
        }
        queue.clear();
        assert!(queue.is_empty());
    }

    #[cfg(feature = "heapless")]
    #[test]
    fn heapless_integration() {
        use heapless::Vec;

        let queue = ByteQueue::new(16).unwrap();
        let (producer, consumer) = queue.split().unwrap();
        let mut vec = Vec::<u8, 4>::new();
        vec.extend_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]).unwrap();

        producer.push_heapless(&vec).unwrap();
        let result = consumer.pop_heapless::<8>(4);
        assert_eq!(result.as_slice(), &[0xDE, 0xAD, 0xBE, 0xEF]);
    }
}
