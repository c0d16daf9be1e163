//! Slot allocators backing arena-indexed containers.
//!
//! Containers in this workspace never hold raw pointers to their elements.
//! Instead they ask a [`SlotAllocator`] for numbered slots, construct values
//! into those slots and refer to them through [`SlotIndex`] handles. The
//! allocator owns the storage; the container owns the bookkeeping.
//!
//! # Available Allocators
//!
//! ## [`RegionAllocator`](region::RegionAllocator)
//!
//! A bounded bump allocator over one block reserved for exactly `N` slots.
//!
//! - Allocation advances a cursor; there is no free list
//! - Slots must be returned in exactly the reverse order they were handed out
//! - The block is released once every slot has been returned
//!
//! **Performance**: O(1) allocation and deallocation.
//!
//! ## [`HeapAllocator`](heap::HeapAllocator)
//!
//! A growable, vector-backed allocator with no capacity ceiling beyond the
//! address space. Best suited as the default when no bound is required.
//!
//! - Single-slot requests reuse previously freed slots
//! - Slots may be returned in any order
//!
//! **Performance**: amortized O(1) allocation, O(n) deallocation of a trailing
//! run (the freed tail is trimmed).
//!
//! # Usage Example
//!
//! ```rust
//! use region_alloc::{SlotAllocator as _, region::RegionAllocator};
//!
//! let mut alloc = RegionAllocator::<u32, 4>::new()?;
//!
//! let a = alloc.allocate(1)?;
//! alloc.construct(a, 10)?;
//! let b = alloc.allocate(1)?;
//! alloc.construct(b, 20)?;
//! assert_eq!(alloc.get(b), Some(&20));
//!
//! // Return the slots in reverse order of allocation.
//! alloc.destroy(b)?;
//! alloc.deallocate(b, 1)?;
//! alloc.destroy(a)?;
//! alloc.deallocate(a, 1)?;
//! assert_eq!(alloc.in_use(), 0);
//! # Ok::<(), region_alloc::AllocError>(())
//! ```
//!
//! # Thread Safety
//!
//! None of the allocators synchronize. They are meant to be owned by a single
//! container and driven from one thread.

#![cfg_attr(not(test), no_std)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

extern crate alloc;

pub use self::error::AllocError;

mod error;
pub mod heap;
pub mod region;

/// Handle naming one slot inside a [`SlotAllocator`].
///
/// Handles are plain indices. They stay meaningful only for the allocator
/// that produced them.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display,
)]
#[display("#{_0}")]
pub struct SlotIndex(usize);

impl SlotIndex {
    /// Creates a handle from a raw slot number.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the raw slot number.
    #[must_use]
    pub const fn get(self) -> usize {
        self.0
    }

    /// Returns the handle `offset` slots after this one.
    #[must_use]
    pub const fn offset(self, offset: usize) -> Self {
        Self(self.0 + offset)
    }
}

/// The contract a container relies on to store its elements.
///
/// A slot goes through four states: it is handed out by
/// [`allocate`](Self::allocate), filled by [`construct`](Self::construct),
/// emptied by [`destroy`](Self::destroy) and returned by
/// [`deallocate`](Self::deallocate). Implementations report misuse of that
/// cycle as an [`AllocError`] instead of corrupting their storage.
///
/// # Safety
///
/// Containers hold references from [`get_mut`](Self::get_mut) for distinct
/// slots at the same time. Implementors must guarantee that:
///
/// - distinct slots never share storage, so references returned for
///   different slots never overlap
/// - [`get`](Self::get) and [`get_mut`](Self::get_mut) neither move nor drop
///   any constructed value
pub unsafe trait SlotAllocator<T>: Sized {
    /// Creates a fresh allocator that shares nothing with any other instance.
    fn try_new() -> Result<Self, AllocError>;

    /// Reserves `count` contiguous slots and returns the first of them.
    fn allocate(&mut self, count: usize) -> Result<SlotIndex, AllocError>;

    /// Returns `count` slots starting at `slot`.
    ///
    /// Values still constructed in the returned slots are dropped.
    fn deallocate(&mut self, slot: SlotIndex, count: usize) -> Result<(), AllocError>;

    /// Moves `value` into an allocated, vacant slot.
    fn construct(&mut self, slot: SlotIndex, value: T) -> Result<(), AllocError>;

    /// Drops the value held by `slot`, keeping the slot allocated.
    fn destroy(&mut self, slot: SlotIndex) -> Result<(), AllocError>;

    /// Returns the value constructed in `slot`, if any.
    fn get(&self, slot: SlotIndex) -> Option<&T>;

    /// Returns the value constructed in `slot` mutably, if any.
    fn get_mut(&mut self, slot: SlotIndex) -> Option<&mut T>;

    /// Maximum number of slots this allocator can have outstanding at once.
    fn max_size(&self) -> usize;

    /// Number of slots currently allocated.
    fn in_use(&self) -> usize;
}
