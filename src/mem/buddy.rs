//! Implementation of a Buddy Allocator that is responsible for allocating
//! physical page frames in blocks of `2^order` pages.

use super::{
    block::{self, pages_per_block},
    AllocStats, Error, FrameMap, Frames, FreeArea, PageFlags, PageState, Result, MAX_ORDER,
};
use core::fmt;

/// The central structure that is responsible for allocating
/// page frames using the buddy allocation algorithm.
///
/// `ORDERS` is the number of block sizes, so the largest block
/// spans `2^(ORDERS - 1)` pages.
///
/// The allocator doesn't synchronize access on its own. Wrap it into a
/// [`LockedAllocator`](super::LockedAllocator) if it has to be shared.
#[derive(Debug)]
pub struct BuddyAllocator<M, const ORDERS: usize = MAX_ORDER> {
    map: M,
    area: FreeArea<ORDERS>,
    frames: Frames,
    stats: AllocStats,
}

impl<M: FrameMap, const ORDERS: usize> BuddyAllocator<M, ORDERS> {
    /// Create an empty and uninitialized buddy allocator that uses
    /// `map` to translate between pages and frame numbers.
    pub const fn new(map: M) -> Self {
        Self {
            map,
            area: FreeArea::new(),
            frames: Frames::new(),
            stats: AllocStats::with_name("buddy"),
        }
    }

    /// The name of this allocation algorithm.
    pub fn name(&self) -> &'static str {
        self.stats.name
    }

    /// Return the page frame mapping of this allocator.
    pub fn map(&self) -> &M {
        &self.map
    }

    /// Makes the `count` pages starting at `first` available for allocation.
    ///
    /// As many blocks of the highest order as possible are created, and the
    /// remaining pages are split into one block per order, from the highest
    /// order down. For example, a range of two highest order blocks plus
    /// five pages adds one order `2` block and one order `0` block after the
    /// two highest order blocks.
    ///
    /// Returns the number of pages that were added.
    ///
    /// An allocator can only be initialized once. The range must hold at least
    /// one block of the highest order, and `first` must be aligned for it,
    /// otherwise this method panics.
    pub fn init(&mut self, first: M::Page, count: usize) -> Result<usize> {
        if !self.frames.is_empty() || !self.area.is_empty() {
            log::warn!("Refusing to initialize the buddy allocator a second time");
            return Err(Error::AlreadyInitialized);
        }

        let top = ORDERS - 1;
        let top_pages = pages_per_block(top);
        assert!(
            count >= top_pages,
            "{} pages can not hold a single block of order {} ({} pages)",
            count,
            top,
            top_pages
        );

        let base = self.map.pfn_of(first);
        assert!(
            block::is_aligned(base, top),
            "first page {} is not aligned for order {}",
            base,
            top
        );

        log::debug!(
            "Initializing buddy allocator with {} pages starting at {}",
            count,
            base
        );

        self.frames = Frames::with_range(base, count);

        // first, fill the highest order with back-to-back blocks
        let mut next = base;
        for _ in 0..count / top_pages {
            self.area.insert(next, top);
            next = next + top_pages;
        }

        // then add the remaining pages, using one block for every
        // bit that is set in the remainder
        let mut rest = count % top_pages;
        for order in (0..top).rev() {
            let pages = pages_per_block(order);
            if rest >= pages {
                log::debug!("Adding block {} with order {}", next, order);

                self.area.insert(next, order);
                next = next + pages;
                rest -= pages;
            }
        }

        self.stats.total = count;
        self.stats.free = count;
        Ok(count)
    }

    /// Allocates a block of `2^order` pages.
    ///
    /// Returns the first page of the block, which is always aligned for `order`.
    pub fn alloc(&mut self, order: usize) -> Result<M::Page> {
        // check if we exceeded the maximum order
        if order >= ORDERS {
            return Err(Error::OrderTooLarge);
        }

        // find the smallest order, starting at the requested one, that has a
        // free block. if `order` itself has a block we won't split at all.
        let (found, mut block) = (order..ORDERS)
            .find_map(|candidate| {
                self.area
                    .first(candidate)
                    .map(|block| (candidate, block))
            })
            .ok_or_else(|| {
                log::warn!("No free block of order {} or above is left", order);
                Error::NoMemoryAvailable
            })?;

        // walk down the orders, and always continue with the left half
        for split_order in (order + 1..=found).rev() {
            block = self.area.split(block, split_order);
        }

        self.area.remove(block, order);
        if let Some(state) = self.frames.get_mut(block) {
            *state = PageState::allocated(order);
        }

        let pages = pages_per_block(order);
        self.stats.free -= pages;
        self.stats.allocated += pages;

        Ok(self.map.page_of(block))
    }

    /// Allocates the smallest block that holds `count` contiguous pages.
    pub fn alloc_pages(&mut self, count: usize) -> Result<M::Page> {
        if count == 0 {
            return Err(Error::AllocateZeroPages);
        }

        self.alloc(block::order_for_pages(count))
    }

    /// Frees the block of `2^order` pages that starts at `page`, and merges
    /// it with its buddy for as long as possible.
    ///
    /// Panics if `page` is not aligned for `order`, if the block is not managed
    /// by this allocator, if any page of the block is already free, or if the
    /// block is neither a single allocation of `order` nor made of reserved pages.
    ///
    /// Reserved pages may be freed too, which makes them available again.
    pub fn free(&mut self, page: M::Page, order: usize) {
        assert!(
            order < ORDERS,
            "can not free a block of order {}, the highest order is {}",
            order,
            ORDERS - 1
        );

        let block = self.map.pfn_of(page);
        assert!(
            block::is_aligned(block, order),
            "block {} is not aligned for order {}",
            block,
            order
        );
        assert!(
            self.frames.contains_block(block, order),
            "block {} of order {} lies outside the managed memory",
            block,
            order
        );

        if let Some((free, free_order)) = self.area.overlapping(block, order) {
            panic!(
                "double free of block {} with order {}, block {} of order {} is already free",
                block, order, free, free_order
            );
        }

        // the block is either exactly one allocation, or made of reserved pages
        let states = self.frames.block_mut(block, order);
        let head = states[0];
        let allocated = if head.flags.contains(PageFlags::ALLOCATED) {
            assert!(
                usize::from(head.order) == order,
                "block {} was allocated with order {} but freed with order {}",
                block,
                head.order,
                order
            );
            true
        } else {
            assert!(
                states
                    .iter()
                    .all(|state| state.flags.contains(PageFlags::RESERVED)),
                "block {} of order {} does not belong to a single allocation",
                block,
                order
            );
            false
        };
        states.fill(PageState::EMPTY);

        let pages = pages_per_block(order);
        if allocated {
            self.stats.allocated -= pages;
        } else {
            self.stats.reserved -= pages;
        }
        self.stats.free += pages;

        // now we try to merge the block with its buddy as long as it's free
        let mut block = self.area.insert(block, order);
        for current in order..ORDERS - 1 {
            match block::buddy_of(block, current, ORDERS) {
                Some(buddy) if self.area.contains(buddy, current) => {
                    block = self.area.merge(block, current);
                }
                _ => break,
            }
        }
    }

    /// Reserves the single page `page`, so it will never be allocated.
    ///
    /// If the page is part of a larger free block, the block is split
    /// down until the page is a block on its own.
    ///
    /// Returns `false` if the page is not free.
    pub fn reserve(&mut self, page: M::Page) -> bool {
        let pfn = self.map.pfn_of(page);

        // search for the free block that contains the page,
        // starting at the highest order
        let found = (0..ORDERS)
            .rev()
            .find_map(|order| self.area.containing(pfn, order).map(|block| (order, block)));

        let (order, mut block) = match found {
            Some(found) => found,
            None => {
                log::debug!("Page {} can not be reserved because it's not free", pfn);
                return false;
            }
        };

        // split the block until we reach the page,
        // and always continue with the half that contains it
        for split_order in (1..=order).rev() {
            let left = self.area.split(block, split_order);
            let half = split_order - 1;

            block = if block::contains(left, half, pfn) {
                left
            } else {
                left + pages_per_block(half)
            };
        }

        self.area.remove(block, 0);
        if let Some(state) = self.frames.get_mut(block) {
            *state = PageState::reserved();
        }

        self.stats.free -= 1;
        self.stats.reserved += 1;
        true
    }

    /// Reserves every page of the `count` pages starting at `first`.
    ///
    /// Returns the number of pages that were reserved by this call.
    pub fn reserve_range(&mut self, first: M::Page, count: usize) -> usize {
        let base = self.map.pfn_of(first);

        let reserved = (0..count)
            .filter(|&idx| {
                let page = self.map.page_of(base + idx);
                self.reserve(page)
            })
            .count();

        log::debug!(
            "Reserved {} of {} pages starting at {}",
            reserved,
            count,
            base
        );
        reserved
    }

    /// Check if `page` is part of a free block.
    pub fn is_free(&self, page: M::Page) -> bool {
        let pfn = self.map.pfn_of(page);
        (0..ORDERS).any(|order| self.area.containing(pfn, order).is_some())
    }

    /// Iterate over the first page of every free block of `order`,
    /// in ascending order.
    pub fn free_blocks(&self, order: usize) -> impl Iterator<Item = M::Page> + '_ {
        self.area.blocks(order).map(move |pfn| self.map.page_of(pfn))
    }

    /// Return the number of free pages across all orders.
    pub fn free_pages(&self) -> usize {
        self.area.free_pages()
    }

    /// Return a copy of the statistics for this allocator.
    pub fn stats(&self) -> AllocStats {
        self.stats.clone()
    }

    /// Return a view that displays the free lists of this allocator.
    pub fn dump(&self) -> Dump<'_, ORDERS> {
        Dump { area: &self.area }
    }

    /// Log the statistics and free lists of this allocator.
    pub fn log_state(&self) {
        log::info!("{}", self.stats);
        log::debug!("Buddy state:\n{}", self.dump());
    }
}

/// Displays the free blocks of every order of a [`BuddyAllocator`].
///
/// Every order is printed on its own line, as the order in brackets
/// followed by the hexadecimal frame numbers of its free blocks.
pub struct Dump<'a, const ORDERS: usize> {
    area: &'a FreeArea<ORDERS>,
}

impl<const ORDERS: usize> fmt::Display for Dump<'_, ORDERS> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for order in 0..ORDERS {
            write!(f, "[{}]", order)?;
            self.area
                .blocks(order)
                .try_for_each(|pfn| write!(f, " {:x}", pfn))?;
            writeln!(f)?;
        }

        Ok(())
    }
}

impl<const ORDERS: usize> fmt::Debug for Dump<'_, ORDERS> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
