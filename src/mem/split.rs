//! Splitting and merging buddies.

use super::{block, FreeArea, Pfn};

impl<const ORDERS: usize> FreeArea<ORDERS> {
    /// Split the free block at `pfn` of `order` into its two halves.
    ///
    /// Both halves end up in the free list of `order - 1`.
    /// Returns the half with the lower address.
    pub fn split(&mut self, pfn: Pfn, order: usize) -> Pfn {
        assert!(order > 0, "can not split block {} of order 0", pfn);
        assert!(
            block::is_aligned(pfn, order),
            "block {} is not aligned for order {}",
            pfn,
            order
        );

        // if this is how the block looked before the split:
        //
        // +-- `pfn`
        // v
        // +---------------------------------+
        // |             `order`             |
        // +---------------------------------+
        //
        // the left half starts at `pfn` and the right half is its buddy:
        //
        // +---------------------------------+
        // |      left      |     right      |
        // +---------------------------------+
        self.remove(pfn, order);

        let half = order - 1;
        let right = match block::buddy_of(pfn, half, ORDERS) {
            Some(right) => right,
            None => unreachable!("block {} of order {} has no buddy", pfn, half),
        };
        self.insert(right, half);
        let left = self.insert(pfn, half);

        step!("split block {} of order {} at {}", pfn, order, right);
        left
    }

    /// Merge the free block at `pfn` of `order` with its buddy.
    ///
    /// The buddy must be free too. The merged block is put into the free
    /// list of `order + 1` and returned.
    pub fn merge(&mut self, pfn: Pfn, order: usize) -> Pfn {
        assert!(
            order + 1 < ORDERS,
            "can not merge block {} of the highest order {}",
            pfn,
            order
        );

        let buddy = match block::buddy_of(pfn, order, ORDERS) {
            Some(buddy) => buddy,
            None => panic!("block {} is not aligned for order {}", pfn, order),
        };

        self.remove(pfn, order);
        self.remove(buddy, order);

        // the merged block starts at whichever buddy is aligned for the next order
        let merged = if block::is_aligned(pfn, order + 1) {
            pfn
        } else {
            buddy
        };

        step!("merge block {} with buddy {} into order {}", pfn, buddy, order + 1);
        self.insert(merged, order + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    fn blocks<const ORDERS: usize>(area: &FreeArea<ORDERS>, order: usize) -> Vec<usize> {
        area.blocks(order).map(Pfn::get).collect()
    }

    #[test]
    fn split_puts_both_halves_one_order_down() {
        let mut area = FreeArea::<4>::new();
        area.insert(Pfn(8), 3);

        assert_eq!(area.split(Pfn(8), 3), Pfn(8));
        assert_eq!(area.len(3), 0);
        assert_eq!(blocks(&area, 2), [8, 12]);
    }

    #[test]
    fn merge_puts_the_lower_buddy_one_order_up() {
        let mut area = FreeArea::<4>::new();
        area.insert(Pfn(4), 1);
        area.insert(Pfn(6), 1);

        assert_eq!(area.merge(Pfn(6), 1), Pfn(4));
        assert_eq!(area.len(1), 0);
        assert_eq!(blocks(&area, 2), [4]);
    }

    #[test]
    fn merge_reverts_split() {
        let mut area = FreeArea::<4>::new();
        area.insert(Pfn(0), 3);

        let left = area.split(Pfn(0), 3);
        assert_eq!(area.merge(left, 2), Pfn(0));
        assert_eq!(blocks(&area, 3), [0]);
        assert_eq!(area.free_pages(), 8);
    }

    #[test]
    #[should_panic(expected = "order 0")]
    fn splitting_order_zero_panics() {
        let mut area = FreeArea::<4>::new();
        area.insert(Pfn(1), 0);
        area.split(Pfn(1), 0);
    }

    #[test]
    #[should_panic(expected = "highest order")]
    fn merging_the_highest_order_panics() {
        let mut area = FreeArea::<4>::new();
        area.insert(Pfn(0), 3);
        area.insert(Pfn(8), 3);
        area.merge(Pfn(0), 3);
    }

    #[test]
    #[should_panic(expected = "is not on the free list")]
    fn merging_without_a_free_buddy_panics() {
        let mut area = FreeArea::<4>::new();
        area.insert(Pfn(0), 1);
        area.merge(Pfn(0), 1);
    }
}
