//! A [`BuddyAllocator`] behind a lock, so it can be shared.

use super::{AllocStats, BuddyAllocator, FrameMap, Result, MAX_ORDER};
use spin::{Mutex, MutexGuard};

/// A buddy allocator that can be accessed through a shared reference.
///
/// Every operation takes the lock for its whole duration, which makes this
/// type suitable for a `static` that is shared by the whole memory manager:
///
/// ```
/// use pgalloc::mem::{BuddyAllocator, LockedAllocator, PhysFrameMap};
///
/// static PHYS_MEM: LockedAllocator<PhysFrameMap> =
///     LockedAllocator::new(BuddyAllocator::new(PhysFrameMap));
/// ```
pub struct LockedAllocator<M, const ORDERS: usize = MAX_ORDER>(Mutex<BuddyAllocator<M, ORDERS>>);

impl<M: FrameMap, const ORDERS: usize> LockedAllocator<M, ORDERS> {
    /// Put `allocator` behind a lock.
    pub const fn new(allocator: BuddyAllocator<M, ORDERS>) -> Self {
        Self(Mutex::new(allocator))
    }

    /// Lock the allocator, to run multiple operations without
    /// releasing the lock in between.
    pub fn lock(&self) -> MutexGuard<'_, BuddyAllocator<M, ORDERS>> {
        self.0.lock()
    }

    /// See [`BuddyAllocator::init`].
    pub fn init(&self, first: M::Page, count: usize) -> Result<usize> {
        self.0.lock().init(first, count)
    }

    /// Allocate a single page.
    pub fn alloc(&self) -> Result<M::Page> {
        // order 0 is exactly one page
        self.0.lock().alloc(0)
    }

    /// See [`BuddyAllocator::alloc`].
    pub fn alloc_order(&self, order: usize) -> Result<M::Page> {
        self.0.lock().alloc(order)
    }

    /// See [`BuddyAllocator::alloc_pages`].
    pub fn alloc_pages(&self, count: usize) -> Result<M::Page> {
        self.0.lock().alloc_pages(count)
    }

    /// See [`BuddyAllocator::free`].
    pub fn free(&self, page: M::Page, order: usize) {
        self.0.lock().free(page, order)
    }

    /// See [`BuddyAllocator::reserve`].
    pub fn reserve(&self, page: M::Page) -> bool {
        self.0.lock().reserve(page)
    }

    /// Return the statistics for this allocator.
    pub fn stats(&self) -> AllocStats {
        self.0.lock().stats()
    }
}
