//! Modular cursor advanced by a compare-and-swap retry loop.

use core::num::NonZeroU16;

use spin::relax::RelaxStrategy;

use crate::sync::{AtomicU16, Ordering};

/// A position in `[0, capacity)` that can be claimed atomically.
///
/// The cursor never reads any other cursor while advancing; keeping a reader
/// behind a writer is left to the layer above.
pub(crate) struct Cursor {
    position: AtomicU16,
}

impl Cursor {
    pub(crate) fn new() -> Self {
        Self {
            position: AtomicU16::new(0),
        }
    }

    /// Current position without claiming it.
    #[inline]
    pub(crate) fn load(&self) -> u16 {
        self.position.load(Ordering::Acquire)
    }

    /// Claims the current position and moves the cursor one slot forward,
    /// wrapping to zero at `capacity`.
    ///
    /// Returns the claimed position. Concurrent callers on the same cursor
    /// each claim a distinct prior value; losers of the race relax with `R`
    /// and retry against the fresh value.
    #[inline]
    pub(crate) fn advance<R: RelaxStrategy>(&self, capacity: NonZeroU16) -> u16 {
        let mut current = self.position.load(Ordering::Acquire);
        loop {
            let next = match current + 1 {
                n if n >= capacity.get() => 0,
                n => n,
            };

            match self.position.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(claimed) => return claimed,
                Err(observed) => {
                    log_trace!(expected = current, observed, "cursor advance retry");
                    current = observed;
                    R::relax();
                }
            }
        }
    }

    /// Puts the cursor back at zero. Requires exclusive access.
    pub(crate) fn reset(&mut self) {
        self.position.store(0, Ordering::Release);
    }
}
