//! Address arithmetic for buddy blocks.
//!
//! A block of order `n` spans `2^n` pages and starts at a frame number
//! that is a multiple of `2^n`. Two blocks of the same order are buddies
//! if together they form a single block of the next order.

use super::Pfn;

/// Calculates the number of pages inside a block of the given order.
pub const fn pages_per_block(order: usize) -> usize {
    1 << order
}

/// Check if `pfn` is a valid start for a block of the given order.
pub const fn is_aligned(pfn: Pfn, order: usize) -> bool {
    pfn.0 % pages_per_block(order) == 0
}

/// Calculates the first order whose blocks can hold `count` pages.
///
/// If no power of two that fits into a `usize` can hold `count` pages,
/// the returned order is `usize::BITS`, which no allocator supports.
pub fn order_for_pages(count: usize) -> usize {
    count
        .checked_next_power_of_two()
        .map_or(usize::BITS as usize, |pages| pages.trailing_zeros() as usize)
}

/// Check if the block at `block` with the given order contains `pfn`.
pub fn contains(block: Pfn, order: usize, pfn: Pfn) -> bool {
    pfn >= block && pfn.0 - block.0 < pages_per_block(order)
}

/// Calculate the frame number of the buddy for the given block.
///
/// Returns `None` if `order` is not below `max_order`, or if `block`
/// is not aligned for `order`.
pub fn buddy_of(block: Pfn, order: usize, max_order: usize) -> Option<Pfn> {
    if order >= max_order || !is_aligned(block, order) {
        return None;
    }

    // if the block starts a block of the next order, it's the left half
    // and the buddy follows it. otherwise it's the right half.
    if is_aligned(block, order + 1) {
        block.0.checked_add(pages_per_block(order)).map(Pfn)
    } else {
        Some(block - pages_per_block(order))
    }
}
