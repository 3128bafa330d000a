//! Utilities for working with raw byte units.

use crate::mem::PAGE_SIZE;
use core::fmt;

/// `1 KiB`
pub const KIB: usize = 1 << 10;
/// `1 MiB`
pub const MIB: usize = 1 << 20;
/// `1 GiB`
pub const GIB: usize = 1 << 30;
/// `1 TiB`, which only fits into a `u64`.
pub const TIB: u64 = 1 << 40;

/// Wrapper around a raw number of bytes that pretty-prints
/// it using the [`Display`](core::fmt::Display) implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteUnit(pub usize);

impl fmt::Display for ByteUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.0 as f64;

        if self.0 < KIB {
            write!(f, "{} B", self.0)
        } else if self.0 < MIB {
            write!(f, "{:.2} KiB", count / KIB as f64)
        } else if self.0 < GIB {
            write!(f, "{:.2} MiB", count / MIB as f64)
        } else if (self.0 as u64) < TIB {
            write!(f, "{:.2} GiB", count / GIB as f64)
        } else {
            write!(f, "{:.2} TiB", count / TIB as f64)
        }
    }
}

/// Wrap `count` bytes into a [`ByteUnit`].
pub fn bytes(count: usize) -> ByteUnit {
    ByteUnit(count)
}

/// Wrap the size of `count` pages into a [`ByteUnit`].
pub fn pages(count: usize) -> ByteUnit {
    ByteUnit(count.saturating_mul(PAGE_SIZE))
}
