//! Bounded region allocator.
//!
//! [`RegionAllocator`] serves slots from a single block reserved for exactly
//! `N` values. Allocation bumps a cursor forward; deallocation moves it back.
//! Because the cursor is the only bookkeeping, slots must be returned in the
//! exact reverse order they were handed out. The allocator checks this and
//! refuses any other order with [`AllocError::OutOfOrderRelease`].
//!
//! # Memory Layout
//!
//! ```text
//!   ┌──────┬──────┬──────┬──────┬──────────────────────────┐
//!   │ #0   │ #1   │ #2   │ #3   │        free              │
//!   └──────┴──────┴──────┴──────┴──────────────────────────┘
//!                               ▲                          ▲
//!                            cursor                        N
//! ```
//!
//! # Block Lifetime
//!
//! The block is reserved when the allocator is created. It is released as
//! soon as the cursor returns to zero, and reserved again by the next
//! allocation, so a fully drained allocator can be reused up to its capacity.
//!
//! # Ownership
//!
//! The allocator is deliberately not `Clone`: exactly one instance owns the
//! block. Use [`SlotAllocator::try_new`] to obtain an independent allocator.

use alloc::{boxed::Box, vec::Vec};
use core::{fmt, iter};

use snafu::{OptionExt as _, ResultExt as _, ensure};
use tracing::{debug, trace};

use crate::{
    SlotAllocator, SlotIndex,
    error::{
        AllocError, OutOfCapacitySnafu, OutOfOrderReleaseSnafu, ReserveBlockSnafu,
        SlotOccupiedSnafu, SlotVacantSnafu, UnallocatedSlotSnafu,
    },
};

type Block<T> = Box<[Option<T>]>;

/// Reserves a block of `capacity` vacant slots.
///
/// The reservation is fallible so that an exhausted system surfaces as
/// [`AllocError::ReserveBlock`] rather than an abort.
fn reserve_block<T>(capacity: usize) -> Result<Block<T>, AllocError> {
    let mut slots = Vec::new();
    slots
        .try_reserve_exact(capacity)
        .context(ReserveBlockSnafu { capacity })?;
    slots.extend(iter::repeat_with(|| None).take(capacity));
    debug!(capacity, "reserved region block");
    Ok(slots.into_boxed_slice())
}

/// A bump allocator over a fixed block of `N` slots of `T`.
///
/// # Examples
///
/// ```
/// use region_alloc::{SlotAllocator as _, region::RegionAllocator};
///
/// let mut alloc = RegionAllocator::<&str, 2>::new()?;
/// let first = alloc.allocate(1)?;
/// let second = alloc.allocate(1)?;
/// assert!(alloc.allocate(1).unwrap_err().is_out_of_capacity());
///
/// // Releasing `first` before `second` would break stack order.
/// assert!(alloc.deallocate(first, 1).unwrap_err().is_out_of_order_release());
/// alloc.deallocate(second, 1)?;
/// alloc.deallocate(first, 1)?;
/// assert!(!alloc.is_reserved());
/// # Ok::<(), region_alloc::AllocError>(())
/// ```
pub struct RegionAllocator<T, const N: usize> {
    /// Backing storage, `None` while the block is released.
    block: Option<Block<T>>,
    /// Offset of the next free slot.
    cursor: usize,
}

impl<T, const N: usize> fmt::Debug for RegionAllocator<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegionAllocator")
            .field("capacity", &N)
            .field("cursor", &self.cursor)
            .field("reserved", &self.is_reserved())
            .finish()
    }
}

impl<T, const N: usize> RegionAllocator<T, N> {
    /// Creates an allocator and reserves its block.
    pub fn new() -> Result<Self, AllocError> {
        Ok(Self {
            block: Some(reserve_block(N)?),
            cursor: 0,
        })
    }

    /// Returns the fixed number of slots, `N`.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Returns the offset of the next free slot.
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Returns the number of slots that can still be allocated.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        N - self.cursor
    }

    /// Returns `true` while the allocator holds a backing block.
    #[must_use]
    pub const fn is_reserved(&self) -> bool {
        self.block.is_some()
    }

    fn slot_mut(&mut self, slot: SlotIndex) -> Result<&mut Option<T>, AllocError> {
        ensure!(slot.get() < self.cursor, UnallocatedSlotSnafu { slot });
        self.block
            .as_mut()
            .and_then(|block| block.get_mut(slot.get()))
            .context(UnallocatedSlotSnafu { slot })
    }
}

// Each slot is its own element of the block, and lookups only borrow it.
unsafe impl<T, const N: usize> SlotAllocator<T> for RegionAllocator<T, N> {
    fn try_new() -> Result<Self, AllocError> {
        Self::new()
    }

    fn allocate(&mut self, count: usize) -> Result<SlotIndex, AllocError> {
        let available = self.remaining();
        ensure!(
            count <= available,
            OutOfCapacitySnafu {
                requested: count,
                available,
                capacity: N,
            }
        );
        if self.block.is_none() {
            self.block = Some(reserve_block(N)?);
        }

        let slot = SlotIndex::new(self.cursor);
        self.cursor += count;
        trace!(%slot, count, cursor = self.cursor, "allocated region slots");
        Ok(slot)
    }

    fn deallocate(&mut self, slot: SlotIndex, count: usize) -> Result<(), AllocError> {
        let cursor = self.cursor;
        ensure!(
            count <= cursor && slot.get() == cursor - count,
            OutOfOrderReleaseSnafu {
                slot,
                count,
                cursor
            }
        );

        if let Some(block) = &mut self.block {
            block[slot.get()..cursor].fill_with(|| None);
        }
        self.cursor -= count;
        trace!(%slot, count, cursor = self.cursor, "released region slots");

        if count > 0 && self.cursor == 0 && self.block.take().is_some() {
            debug!(capacity = N, "released drained region block");
        }
        Ok(())
    }

    fn construct(&mut self, slot: SlotIndex, value: T) -> Result<(), AllocError> {
        let entry = self.slot_mut(slot)?;
        ensure!(entry.is_none(), SlotOccupiedSnafu { slot });
        *entry = Some(value);
        Ok(())
    }

    fn destroy(&mut self, slot: SlotIndex) -> Result<(), AllocError> {
        let value = self
            .slot_mut(slot)?
            .take()
            .context(SlotVacantSnafu { slot })?;
        drop(value);
        Ok(())
    }

    fn get(&self, slot: SlotIndex) -> Option<&T> {
        if slot.get() >= self.cursor {
            return None;
        }
        self.block.as_ref()?.get(slot.get())?.as_ref()
    }

    fn get_mut(&mut self, slot: SlotIndex) -> Option<&mut T> {
        self.slot_mut(slot).ok()?.as_mut()
    }

    fn max_size(&self) -> usize {
        N
    }

    fn in_use(&self) -> usize {
        self.cursor
    }
}

impl<T, const N: usize> Drop for RegionAllocator<T, N> {
    fn drop(&mut self) {
        if self.cursor != 0 {
            debug!(
                outstanding = self.cursor,
                capacity = N,
                "dropping region allocator with outstanding slots"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use proptest::prelude::*;

    use super::*;

    fn exhaust<const N: usize>() {
        let mut alloc = RegionAllocator::<usize, N>::new().unwrap();
        for i in 0..N {
            let slot = alloc.allocate(1).unwrap();
            assert_eq!(slot.get(), i);
        }
        let err = alloc.allocate(1).unwrap_err();
        assert!(err.is_out_of_capacity());
        assert_eq!(alloc.cursor(), N);
    }

    #[test]
    fn test_exactly_capacity_allocations_succeed() {
        exhaust::<1>();
        exhaust::<2>();
        exhaust::<7>();
        exhaust::<10>();
        exhaust::<64>();
    }

    #[test]
    fn test_out_of_capacity_reports_counts() {
        let mut alloc = RegionAllocator::<u8, 4>::new().unwrap();
        alloc.allocate(3).unwrap();
        match alloc.allocate(2).unwrap_err() {
            AllocError::OutOfCapacity {
                requested,
                available,
                capacity,
                ..
            } => {
                assert_eq!((requested, available, capacity), (2, 1, 4));
            }
            err => panic!("unexpected error: {err}"),
        }
        // A failed request leaves the cursor alone.
        assert_eq!(alloc.cursor(), 3);
        alloc.allocate(1).unwrap();
    }

    #[test]
    fn test_reverse_release_drains_block() {
        let mut alloc = RegionAllocator::<u32, 5>::new().unwrap();
        let slots: Vec<_> = (0..5).map(|_| alloc.allocate(1).unwrap()).collect();
        for (value, &slot) in slots.iter().enumerate() {
            alloc.construct(slot, u32::try_from(value).unwrap()).unwrap();
        }

        for &slot in slots.iter().rev() {
            assert!(alloc.is_reserved());
            alloc.destroy(slot).unwrap();
            alloc.deallocate(slot, 1).unwrap();
        }
        assert_eq!(alloc.cursor(), 0);
        assert!(!alloc.is_reserved());
    }

    #[test]
    fn test_reallocation_after_full_drain() {
        let mut alloc = RegionAllocator::<u32, 3>::new().unwrap();
        for round in 0..3 {
            let slots: Vec<_> = (0..3).map(|_| alloc.allocate(1).unwrap()).collect();
            for &slot in &slots {
                alloc.construct(slot, round).unwrap();
            }
            assert!(alloc.allocate(1).unwrap_err().is_out_of_capacity());
            for &slot in slots.iter().rev() {
                assert_eq!(alloc.get(slot), Some(&round));
                alloc.deallocate(slot, 1).unwrap();
            }
            assert!(!alloc.is_reserved());
        }
    }

    #[test]
    fn test_out_of_order_release_is_rejected() {
        let mut alloc = RegionAllocator::<u32, 4>::new().unwrap();
        let a = alloc.allocate(1).unwrap();
        let b = alloc.allocate(1).unwrap();
        alloc.construct(a, 1).unwrap();
        alloc.construct(b, 2).unwrap();

        let err = alloc.deallocate(a, 1).unwrap_err();
        assert!(err.is_out_of_order_release());
        assert_eq!(alloc.cursor(), 2);
        assert_eq!(alloc.get(a), Some(&1));
        assert_eq!(alloc.get(b), Some(&2));

        // Returning more slots than are outstanding is rejected too.
        assert!(alloc.deallocate(a, 3).unwrap_err().is_out_of_order_release());

        alloc.deallocate(b, 1).unwrap();
        alloc.deallocate(a, 1).unwrap();
        assert_eq!(alloc.in_use(), 0);
    }

    #[test]
    fn test_multi_slot_allocation() {
        let mut alloc = RegionAllocator::<char, 8>::new().unwrap();
        let run = alloc.allocate(3).unwrap();
        let next = alloc.allocate(2).unwrap();
        assert_eq!(run.get(), 0);
        assert_eq!(next.get(), 3);
        for (i, c) in ['a', 'b', 'c'].into_iter().enumerate() {
            alloc.construct(run.offset(i), c).unwrap();
        }
        assert_eq!(alloc.get(run.offset(2)), Some(&'c'));

        assert!(alloc.deallocate(run, 3).unwrap_err().is_out_of_order_release());
        alloc.deallocate(next, 2).unwrap();
        alloc.deallocate(run, 3).unwrap();
        assert_eq!(alloc.remaining(), 8);
    }

    #[test]
    fn test_slot_state_errors() {
        let mut alloc = RegionAllocator::<u32, 2>::new().unwrap();
        let unallocated = SlotIndex::new(0);
        assert!(
            alloc
                .construct(unallocated, 1)
                .unwrap_err()
                .is_unallocated_slot()
        );
        assert!(alloc.destroy(unallocated).unwrap_err().is_unallocated_slot());
        assert_eq!(alloc.get(unallocated), None);

        let slot = alloc.allocate(1).unwrap();
        assert!(alloc.destroy(slot).unwrap_err().is_slot_vacant());
        alloc.construct(slot, 5).unwrap();
        assert!(alloc.construct(slot, 6).unwrap_err().is_slot_occupied());
        *alloc.get_mut(slot).unwrap() += 1;
        assert_eq!(alloc.get(slot), Some(&6));
        alloc.destroy(slot).unwrap();
        assert_eq!(alloc.get(slot), None);
    }

    #[test]
    fn test_deallocate_drops_remaining_values() {
        let tracker = Rc::new(());
        let mut alloc = RegionAllocator::<Rc<()>, 2>::new().unwrap();
        let slot = alloc.allocate(2).unwrap();
        alloc.construct(slot, Rc::clone(&tracker)).unwrap();
        alloc.construct(slot.offset(1), Rc::clone(&tracker)).unwrap();
        assert_eq!(Rc::strong_count(&tracker), 3);

        alloc.destroy(slot).unwrap();
        assert_eq!(Rc::strong_count(&tracker), 2);
        alloc.deallocate(slot, 2).unwrap();
        assert_eq!(Rc::strong_count(&tracker), 1);
    }

    #[test]
    fn test_drop_with_outstanding_values() {
        let tracker = Rc::new(());
        {
            let mut alloc = RegionAllocator::<Rc<()>, 3>::new().unwrap();
            let slot = alloc.allocate(1).unwrap();
            alloc.construct(slot, Rc::clone(&tracker)).unwrap();
        }
        assert_eq!(Rc::strong_count(&tracker), 1);
    }

    #[test]
    fn test_zero_capacity() {
        let mut alloc = RegionAllocator::<u32, 0>::new().unwrap();
        assert_eq!(alloc.max_size(), 0);
        assert!(alloc.allocate(1).unwrap_err().is_out_of_capacity());
    }

    #[test]
    fn test_empty_release_keeps_block() {
        let mut alloc = RegionAllocator::<u32, 4>::new().unwrap();
        let slot = alloc.allocate(0).unwrap();
        assert_eq!(slot.get(), 0);
        alloc.deallocate(slot, 0).unwrap();
        assert!(alloc.is_reserved());
        assert_eq!(alloc.cursor(), 0);

        // A real run still releases the block once it drains.
        let run = alloc.allocate(2).unwrap();
        alloc.deallocate(run.offset(2), 0).unwrap();
        assert!(alloc.is_reserved());
        alloc.deallocate(run, 2).unwrap();
        assert!(!alloc.is_reserved());
    }

    proptest! {
        #[test]
        fn prop_cursor_tracks_outstanding_runs(counts in prop::collection::vec(1usize..=8, 0..32)) {
            let mut alloc = RegionAllocator::<u8, 64>::new().unwrap();
            let mut runs = Vec::new();
            for count in counts {
                let before = alloc.cursor();
                match alloc.allocate(count) {
                    Ok(slot) => {
                        prop_assert_eq!(slot.get(), before);
                        runs.push((slot, count));
                    }
                    Err(err) => {
                        prop_assert!(err.is_out_of_capacity());
                        prop_assert!(before + count > 64);
                        prop_assert_eq!(alloc.cursor(), before);
                    }
                }
                prop_assert!(alloc.cursor() <= 64);
            }
            let total: usize = runs.iter().map(|&(_, count)| count).sum();
            prop_assert_eq!(alloc.in_use(), total);

            while let Some((slot, count)) = runs.pop() {
                alloc.deallocate(slot, count).unwrap();
            }
            prop_assert_eq!(alloc.cursor(), 0);
            // Only a drain through `deallocate` releases the block.
            prop_assert_eq!(alloc.is_reserved(), total == 0);
        }
    }
}
