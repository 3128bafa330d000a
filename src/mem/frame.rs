//! Page frame numbers, the mapping between pages and frames,
//! and the per-page state the allocator keeps.

use super::{block, PAGE_SIZE};
use alloc::{vec, vec::Vec};
use bitflags::bitflags;
use core::{fmt, ops};

/// The ordinal number of a physical page frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct Pfn(pub usize);

impl Pfn {
    /// Return the raw frame number.
    pub const fn get(self) -> usize {
        self.0
    }

    /// Return the number of pages between `base` and `self`.
    ///
    /// Panics if `self` is below `base`.
    pub fn offset_from(self, base: Pfn) -> usize {
        self.0
            .checked_sub(base.0)
            .unwrap_or_else(|| panic!("frame {} lies below frame {}", self, base))
    }
}

impl ops::Add<usize> for Pfn {
    type Output = Pfn;

    fn add(self, pages: usize) -> Pfn {
        Pfn(self.0 + pages)
    }
}

impl ops::Sub<usize> for Pfn {
    type Output = Pfn;

    fn sub(self, pages: usize) -> Pfn {
        Pfn(self.0 - pages)
    }
}

impl fmt::Display for Pfn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl fmt::LowerHex for Pfn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

/// Translation between the identity of a page and its frame number.
///
/// Both directions must be total and injective, and consecutive frame
/// numbers must describe physically consecutive pages.
pub trait FrameMap {
    /// The type that identifies a single page.
    type Page: Copy + Eq + fmt::Debug;

    /// Return the frame number of `page`.
    fn pfn_of(&self, page: Self::Page) -> Pfn;

    /// Return the page that belongs to the frame number `pfn`.
    fn page_of(&self, pfn: Pfn) -> Self::Page;
}

/// A [`FrameMap`] where a page is identified by its frame number.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityMap;

impl FrameMap for IdentityMap {
    type Page = Pfn;

    fn pfn_of(&self, page: Pfn) -> Pfn {
        page
    }

    fn page_of(&self, pfn: Pfn) -> Pfn {
        pfn
    }
}

/// A physical address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct PhysAddr(pub usize);

impl fmt::Display for PhysAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#X}", self.0)
    }
}

/// A [`FrameMap`] where a page is identified by the physical address
/// of its first byte.
///
/// Frame `n` starts at `n * PAGE_SIZE`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhysFrameMap;

impl FrameMap for PhysFrameMap {
    type Page = PhysAddr;

    fn pfn_of(&self, page: PhysAddr) -> Pfn {
        debug_assert!(
            page.0 % PAGE_SIZE == 0,
            "address {} is not page aligned",
            page
        );
        Pfn(page.0 / PAGE_SIZE)
    }

    fn page_of(&self, pfn: Pfn) -> PhysAddr {
        PhysAddr(pfn.0 * PAGE_SIZE)
    }
}

bitflags! {
    /// State bits of a single page frame that is not free.
    pub struct PageFlags: u8 {
        /// The page is the first page of a block that was handed out by an allocation.
        const ALLOCATED = 1 << 0;
        /// The page was pinned by a reservation.
        const RESERVED = 1 << 1;
    }
}

/// The state of a single page frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageState {
    /// The state bits of this page.
    pub flags: PageFlags,
    /// The order of the allocated block, if this page is the head of one.
    pub order: u8,
}

impl PageState {
    /// The state of a page that is free or part of an allocated block.
    pub const EMPTY: Self = Self {
        flags: PageFlags::empty(),
        order: 0,
    };

    /// The state of the head page of a block allocated with `order`.
    pub const fn allocated(order: usize) -> Self {
        Self {
            flags: PageFlags::ALLOCATED,
            order: order as u8,
        }
    }

    /// The state of a reserved page.
    pub const fn reserved() -> Self {
        Self {
            flags: PageFlags::RESERVED,
            order: 0,
        }
    }
}

/// A page state record for every frame of a contiguous range.
#[derive(Debug, Default)]
pub struct Frames {
    base: Pfn,
    states: Vec<PageState>,
}

impl Frames {
    /// Create an empty table that doesn't cover any frame.
    pub const fn new() -> Self {
        Self {
            base: Pfn(0),
            states: Vec::new(),
        }
    }

    /// Create a table for the `count` frames starting at `base`.
    pub fn with_range(base: Pfn, count: usize) -> Self {
        Self {
            base,
            states: vec![PageState::EMPTY; count],
        }
    }

    /// The first frame of this table.
    pub fn base(&self) -> Pfn {
        self.base
    }

    /// The frame right after the last frame of this table.
    pub fn end(&self) -> Pfn {
        self.base + self.states.len()
    }

    /// Return the number of frames in this table.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Check if this table covers no frame at all.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Check if `pfn` is covered by this table.
    pub fn contains(&self, pfn: Pfn) -> bool {
        pfn >= self.base && pfn < self.end()
    }

    /// Check if every frame of the block at `pfn` with `order` is covered by this table.
    pub fn contains_block(&self, pfn: Pfn, order: usize) -> bool {
        pfn >= self.base
            && pfn
                .0
                .checked_add(block::pages_per_block(order))
                .map_or(false, |end| end <= self.end().0)
    }

    /// Return the state of the frame `pfn`, if it's covered by this table.
    pub fn get(&self, pfn: Pfn) -> Option<&PageState> {
        self.index(pfn).map(|idx| &self.states[idx])
    }

    /// Return a mutable reference to the state of the frame `pfn`.
    pub fn get_mut(&mut self, pfn: Pfn) -> Option<&mut PageState> {
        self.index(pfn).map(move |idx| &mut self.states[idx])
    }

    /// Return the states of every frame of the block at `pfn` with `order`.
    ///
    /// Panics if the block is not entirely covered by this table.
    pub fn block_mut(&mut self, pfn: Pfn, order: usize) -> &mut [PageState] {
        assert!(
            self.contains_block(pfn, order),
            "block {} of order {} lies outside of the frame table",
            pfn,
            order
        );

        let start = pfn.offset_from(self.base);
        &mut self.states[start..start + block::pages_per_block(order)]
    }

    fn index(&self, pfn: Pfn) -> Option<usize> {
        if self.contains(pfn) {
            Some(pfn.offset_from(self.base))
        } else {
            None
        }
    }
}
