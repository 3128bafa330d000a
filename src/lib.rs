//! Buddy allocation of physical page frames.
//!
//! The allocator hands out naturally aligned blocks of `2^order` pages and
//! keeps one ordered free list per order. Freed blocks are merged with their
//! buddy as long as possible, so the free lists always describe the largest
//! blocks that the free memory can form.
//!
//! The allocator only tracks page frame numbers. Translating a page identity
//! (for example a physical address) into a frame number is done by a
//! [`FrameMap`](mem::FrameMap) the caller provides.
#![deny(rust_2018_idioms, rustdoc::broken_intra_doc_links)]
#![cfg_attr(not(test), no_std)]

extern crate alloc;

#[macro_use]
mod macros;

pub mod mem;
pub mod unit;
