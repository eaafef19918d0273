//! Atomic primitives, swapped for loom's model-checked versions under the `loom` feature.

#[cfg(feature = "loom")]
pub(crate) use loom::sync::atomic::{AtomicBool, AtomicU16, AtomicU8, Ordering};

#[cfg(not(feature = "loom"))]
pub(crate) use core::sync::atomic::{AtomicBool, AtomicU16, AtomicU8, Ordering};
