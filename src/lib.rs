#![no_std]
//! Lock-free byte ring buffer for interrupt/main-loop communication on embedded systems
//!
//! ## Key Features
//! - 🛡️ No `unsafe`, `no_std` with `alloc`
//! - ⚡ Cursors advanced by a compare-and-swap loop, never a lock
//! - 🔁 Pluggable relax strategy for lost races via [`spin::relax`]
//! - 📏 Capacity chosen at construction, up to 65535 bytes
//! - 🔄 Checked single-producer/single-consumer [`ByteQueue`] layered on top
//! - 🧩 Optional [`heapless::Vec`](https://docs.rs/heapless) integration
//!
//! ## Layers
//! - [`RingBuffer`] is the bare primitive: `put` claims the next write slot,
//!   `get` claims the next read slot. It does not keep the writer from
//!   overwriting unread bytes.
//! - [`ByteQueue`] adds an occupancy counter and hands out one [`Producer`]
//!   and one [`Consumer`], so neither side can overrun the other.
//!
//! ## Example
//! ```rust
//! use casring::RingBuffer;
//!
//! let buf = RingBuffer::new(256).unwrap();
//!
//! // Interrupt handler side
//! buf.put(0xAB);
//!
//! // Main loop side
//! assert_eq!(buf.get(), 0xAB);
//! ```
//!
//! ## Cargo features
//! - `std`: implements `std::error::Error` and enables `spin::relax::Yield`
//! - `heapless`: `push_heapless`/`pop_heapless` on the queue halves
//! - `defmt`: `defmt::Format` for [`RingBufferError`]
//! - `tracing`: allocation, contention and overflow events
//! - `loom`: model-checked atomics for `tests/loom.rs`

extern crate alloc;

#[cfg(any(test, feature = "std"))]
extern crate std;

use core::fmt;

#[macro_use]
mod macros;

mod cursor;
mod queue;
mod ring_buffer;
mod sync;

pub use queue::{ByteQueue, Consumer, Producer};
pub use ring_buffer::RingBuffer;

/// Error types for buffer operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RingBufferError {
    /// Occurs when a buffer is constructed with a capacity of zero
    ///
    /// # Example
    /// ```
    /// use casring::{RingBuffer, RingBufferError};
    ///
    /// assert_eq!(RingBuffer::new(0).unwrap_err(), RingBufferError::ZeroCapacity);
    /// ```
    ZeroCapacity,
    /// Occurs when trying to push more data than available space
    BufferOverflow,
    /// Occurs when a [`ByteQueue`] is split a second time
    AlreadySplit,
}

impl fmt::Display for RingBufferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroCapacity => write!(f, "Zero capacity: buffer size must be at least 1 byte"),
            Self::BufferOverflow => write!(
                f,
                "Buffer overflow: attempted to write beyond buffer capacity"
            ),
            Self::AlreadySplit => write!(f, "Queue already split into producer and consumer"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for RingBufferError {}
