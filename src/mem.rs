//! Physical memory management using the buddy algorithm.

pub mod block;
pub mod buddy;
pub mod frame;
pub mod free_area;
pub mod locked;
mod split;


pub use buddy::{BuddyAllocator, Dump};
pub use frame::{FrameMap, Frames, IdentityMap, PageFlags, PageState, Pfn, PhysAddr, PhysFrameMap};
pub use free_area::FreeArea;
pub use locked::LockedAllocator;

use crate::unit::{self, KIB};
use core::fmt;
use displaydoc_lite::displaydoc;

/// The size of a single page in memory.
///
/// This is also the size of an order-0 block.
pub const PAGE_SIZE: usize = 4 * KIB;

/// The number of orders a [`BuddyAllocator`] manages by default.
///
/// The largest block therefore spans `2^(MAX_ORDER - 1)` pages,
/// which is 256 MiB with 4 KiB pages.
pub const MAX_ORDER: usize = 17;

/// Result for every memory allocation operation.
pub type Result<T, E = Error> = core::result::Result<T, E>;

displaydoc! {
    /// Any error that can happen while allocating memory.
    ///
    /// Only conditions a caller is expected to handle are reported through
    /// this type. Misuse of the allocator, like freeing a block twice,
    /// is a bug and panics instead.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Error {
        /// tried to allocate an order that exceeded the maximum order.
        OrderTooLarge,
        /// tried to allocate, but there was no free memory left.
        NoMemoryAvailable,
        /// tried to allocate zero pages using `alloc_pages`.
        AllocateZeroPages,
        /// tried to initialize an allocator that already manages memory.
        AlreadyInitialized,
    }
}

/// Statistics for a page allocator.
///
/// All numbers are counted in pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocStats {
    /// The name of the allocator that collected these stats.
    pub name: &'static str,
    /// The total number of pages that this allocator manages.
    pub total: usize,
    /// The number of pages that are left for allocation.
    pub free: usize,
    /// The number of pages that were handed out by an allocation.
    pub allocated: usize,
    /// The number of pages that were pinned by a reservation.
    pub reserved: usize,
}

impl AllocStats {
    /// Create a new [`AllocStats`] instance for the given allocator name.
    pub const fn with_name(name: &'static str) -> Self {
        Self {
            name,
            total: 0,
            free: 0,
            allocated: 0,
            reserved: 0,
        }
    }

    /// The number of pages that are currently not available for allocation.
    pub fn used(&self) -> usize {
        self.allocated + self.reserved
    }
}

impl fmt::Display for AllocStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        self.name.chars().try_for_each(|_| write!(f, "~"))?;
        writeln!(
            f,
            "\nAllocated: {} ({} pages)",
            unit::pages(self.allocated),
            self.allocated
        )?;
        writeln!(
            f,
            "Reserved:  {} ({} pages)",
            unit::pages(self.reserved),
            self.reserved
        )?;
        writeln!(f, "Free:      {} ({} pages)", unit::pages(self.free), self.free)?;
        writeln!(f, "Total:     {} ({} pages)", unit::pages(self.total), self.total)?;
        self.name.chars().try_for_each(|_| write!(f, "~"))?;
        writeln!(f)?;
        Ok(())
    }
}
