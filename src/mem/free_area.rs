//! The per-order free lists of the buddy allocator.

use super::{block, Pfn};
use alloc::collections::BTreeSet;

const EMPTY_LIST: BTreeSet<Pfn> = BTreeSet::new();

/// One free list for every order in `0..ORDERS`.
///
/// Every list holds the frame numbers of the first page of each free
/// block of that order, sorted by ascending frame number.
#[derive(Debug)]
pub struct FreeArea<const ORDERS: usize> {
    lists: [BTreeSet<Pfn>; ORDERS],
}

impl<const ORDERS: usize> FreeArea<ORDERS> {
    /// Create a table where every free list is empty.
    pub const fn new() -> Self {
        assert!(
            ORDERS > 0 && ORDERS < usize::BITS as usize,
            "the number of orders must fit into the address space"
        );

        Self {
            lists: [EMPTY_LIST; ORDERS],
        }
    }

    /// Insert the block at `pfn` into the free list of `order`.
    ///
    /// Returns the inserted block so callers can keep operating on it.
    /// Panics if the block is misaligned or already part of the list.
    pub fn insert(&mut self, pfn: Pfn, order: usize) -> Pfn {
        assert!(
            block::is_aligned(pfn, order),
            "block {} is not aligned for order {}",
            pfn,
            order
        );

        let inserted = self.lists[order].insert(pfn);
        assert!(
            inserted,
            "block {} is already on the free list of order {}",
            pfn,
            order
        );

        step!("insert block {} into order {}", pfn, order);
        pfn
    }

    /// Remove the block at `pfn` from the free list of `order`.
    ///
    /// The block must be on the list, a missing block means
    /// the free lists are corrupted and this method will panic.
    pub fn remove(&mut self, pfn: Pfn, order: usize) -> Pfn {
        let removed = self.lists[order].remove(&pfn);
        assert!(
            removed,
            "block {} is not on the free list of order {}",
            pfn,
            order
        );

        step!("remove block {} from order {}", pfn, order);
        pfn
    }

    /// Check if the block at `pfn` is on the free list of `order`.
    pub fn contains(&self, pfn: Pfn, order: usize) -> bool {
        self.lists
            .get(order)
            .map_or(false, |list| list.contains(&pfn))
    }

    /// Return the block with the lowest address of the given order.
    pub fn first(&self, order: usize) -> Option<Pfn> {
        self.lists.get(order)?.iter().next().copied()
    }

    /// Return the free block of `order` that contains the page `pfn`.
    pub fn containing(&self, pfn: Pfn, order: usize) -> Option<Pfn> {
        self.lists
            .get(order)?
            .range(..=pfn)
            .next_back()
            .copied()
            .filter(|&start| block::contains(start, order, pfn))
    }

    /// Return any free block, and its order, that shares a page with the
    /// block at `pfn` of the given order.
    pub fn overlapping(&self, pfn: Pfn, order: usize) -> Option<(Pfn, usize)> {
        let end = pfn + block::pages_per_block(order);

        self.lists.iter().enumerate().find_map(|(free_order, list)| {
            // the last free block that starts before `end` is the only
            // candidate, because free blocks of one order never overlap
            list.range(..end)
                .next_back()
                .copied()
                .filter(|&start| start + block::pages_per_block(free_order) > pfn)
                .map(|start| (start, free_order))
        })
    }

    /// Iterate over the free blocks of `order` in ascending order.
    pub fn blocks(&self, order: usize) -> impl Iterator<Item = Pfn> + '_ {
        self.lists.get(order).into_iter().flatten().copied()
    }

    /// Return the number of free blocks of the given order.
    pub fn len(&self, order: usize) -> usize {
        self.lists.get(order).map_or(0, BTreeSet::len)
    }

    /// Check if there is no free block of any order.
    pub fn is_empty(&self) -> bool {
        self.lists.iter().all(BTreeSet::is_empty)
    }

    /// Return the number of pages across all free blocks.
    pub fn free_pages(&self) -> usize {
        self.lists
            .iter()
            .enumerate()
            .map(|(order, list)| list.len() * block::pages_per_block(order))
            .sum()
    }
}

impl<const ORDERS: usize> Default for FreeArea<ORDERS> {
    fn default() -> Self {
        Self::new()
    }
}
