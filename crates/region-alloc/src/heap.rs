//! Growable general-purpose slot allocator.
//!
//! [`HeapAllocator`] is the unbounded default. Slots live in a vector that
//! grows on demand; single-slot requests reuse slots freed earlier, and slots
//! may be returned in any order.

use alloc::vec::Vec;
use core::{fmt, iter, mem};

use snafu::{OptionExt as _, ResultExt as _, ensure};
use tracing::trace;

use crate::{
    SlotAllocator, SlotIndex,
    error::{
        AllocError, OutOfCapacitySnafu, ReserveBlockSnafu, SlotOccupiedSnafu, SlotVacantSnafu,
        UnallocatedSlotSnafu,
    },
};

#[derive(Debug, derive_more::IsVariant)]
enum HeapSlot<T> {
    Free,
    Vacant,
    Occupied(T),
}

/// A vector-backed allocator without a fixed capacity.
///
/// # Examples
///
/// ```
/// use region_alloc::{SlotAllocator as _, heap::HeapAllocator};
///
/// let mut alloc = HeapAllocator::new();
/// let a = alloc.allocate(1)?;
/// let b = alloc.allocate(1)?;
/// alloc.construct(a, "a")?;
/// alloc.construct(b, "b")?;
///
/// // Any release order is accepted, and freed slots are reused.
/// alloc.deallocate(a, 1)?;
/// assert_eq!(alloc.allocate(1)?, a);
/// # Ok::<(), region_alloc::AllocError>(())
/// ```
pub struct HeapAllocator<T> {
    slots: Vec<HeapSlot<T>>,
    /// Indices of free slots below `slots.len()`.
    free: Vec<usize>,
    in_use: usize,
}

impl<T> Default for HeapAllocator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for HeapAllocator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeapAllocator")
            .field("slots", &self.slots.len())
            .field("free", &self.free.len())
            .field("in_use", &self.in_use)
            .finish()
    }
}

impl<T> HeapAllocator<T> {
    /// Creates an empty allocator. No memory is reserved until the first
    /// allocation.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            in_use: 0,
        }
    }

    fn slot_mut(&mut self, slot: SlotIndex) -> Result<&mut HeapSlot<T>, AllocError> {
        self.slots
            .get_mut(slot.get())
            .filter(|entry| !entry.is_free())
            .context(UnallocatedSlotSnafu { slot })
    }

    fn grow(&mut self, count: usize) -> Result<SlotIndex, AllocError> {
        let start = self.slots.len();
        let available = self.max_size() - start;
        ensure!(
            count <= available,
            OutOfCapacitySnafu {
                requested: count,
                available,
                capacity: self.max_size(),
            }
        );
        self.slots
            .try_reserve(count)
            .context(ReserveBlockSnafu { capacity: start + count })?;
        self.slots
            .extend(iter::repeat_with(|| HeapSlot::Vacant).take(count));
        Ok(SlotIndex::new(start))
    }

    /// Drops trailing free slots so the vector does not keep a dead tail.
    fn trim(&mut self) {
        let live = self
            .slots
            .iter()
            .rposition(|entry| !entry.is_free())
            .map_or(0, |last| last + 1);
        if live < self.slots.len() {
            self.slots.truncate(live);
            self.free.retain(|&index| index < live);
        }
    }
}

// Slots are distinct vector elements; lookups never reallocate the vector.
unsafe impl<T> SlotAllocator<T> for HeapAllocator<T> {
    fn try_new() -> Result<Self, AllocError> {
        Ok(Self::new())
    }

    fn allocate(&mut self, count: usize) -> Result<SlotIndex, AllocError> {
        let slot = match (count, self.free.pop()) {
            (1, Some(index)) => {
                self.slots[index] = HeapSlot::Vacant;
                SlotIndex::new(index)
            }
            (_, reusable) => {
                if let Some(index) = reusable {
                    self.free.push(index);
                }
                self.grow(count)?
            }
        };
        self.in_use += count;
        trace!(%slot, count, in_use = self.in_use, "allocated heap slots");
        Ok(slot)
    }

    fn deallocate(&mut self, slot: SlotIndex, count: usize) -> Result<(), AllocError> {
        let range = slot.get()..slot.get().saturating_add(count);
        for index in range.clone() {
            let entry = SlotIndex::new(index);
            ensure!(
                self.slots.get(index).is_some_and(|e| !e.is_free()),
                UnallocatedSlotSnafu { slot: entry }
            );
        }

        for index in range {
            let old = mem::replace(&mut self.slots[index], HeapSlot::Free);
            drop(old);
            self.free.push(index);
        }
        self.in_use -= count;
        self.trim();
        trace!(%slot, count, in_use = self.in_use, "released heap slots");
        Ok(())
    }

    fn construct(&mut self, slot: SlotIndex, value: T) -> Result<(), AllocError> {
        let entry = self.slot_mut(slot)?;
        ensure!(entry.is_vacant(), SlotOccupiedSnafu { slot });
        *entry = HeapSlot::Occupied(value);
        Ok(())
    }

    fn destroy(&mut self, slot: SlotIndex) -> Result<(), AllocError> {
        let entry = self.slot_mut(slot)?;
        ensure!(entry.is_occupied(), SlotVacantSnafu { slot });
        *entry = HeapSlot::Vacant;
        Ok(())
    }

    fn get(&self, slot: SlotIndex) -> Option<&T> {
        match self.slots.get(slot.get())? {
            HeapSlot::Occupied(value) => Some(value),
            HeapSlot::Free | HeapSlot::Vacant => None,
        }
    }

    fn get_mut(&mut self, slot: SlotIndex) -> Option<&mut T> {
        match self.slots.get_mut(slot.get())? {
            HeapSlot::Occupied(value) => Some(value),
            HeapSlot::Free | HeapSlot::Vacant => None,
        }
    }

    fn max_size(&self) -> usize {
        isize::MAX.unsigned_abs() / mem::size_of::<HeapSlot<T>>().max(1)
    }

    fn in_use(&self) -> usize {
        self.in_use
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;

    #[test]
    fn test_grows_without_ceiling() {
        let mut alloc = HeapAllocator::new();
        for value in 0..1000 {
            let slot = alloc.allocate(1).unwrap();
            alloc.construct(slot, value).unwrap();
        }
        assert_eq!(alloc.in_use(), 1000);
        assert_eq!(alloc.get(SlotIndex::new(999)), Some(&999));
    }

    #[test]
    fn test_any_release_order() {
        let mut alloc = HeapAllocator::new();
        let slots: Vec<_> = (0..4).map(|_| alloc.allocate(1).unwrap()).collect();
        for &slot in &slots {
            alloc.construct(slot, slot.get()).unwrap();
        }

        alloc.deallocate(slots[1], 1).unwrap();
        alloc.deallocate(slots[0], 1).unwrap();
        assert_eq!(alloc.get(slots[2]), Some(&2));
        assert_eq!(alloc.in_use(), 2);

        // Freed slots in the middle are handed out again.
        let reused = alloc.allocate(1).unwrap();
        assert!(reused == slots[0] || reused == slots[1]);
        assert_eq!(alloc.get(reused), None);
    }

    #[test]
    fn test_trailing_release_trims() {
        let mut alloc = HeapAllocator::<u8>::new();
        let a = alloc.allocate(1).unwrap();
        let b = alloc.allocate(2).unwrap();
        alloc.deallocate(a, 1).unwrap();
        alloc.deallocate(b, 2).unwrap();
        assert_eq!(alloc.in_use(), 0);
        assert!(alloc.slots.is_empty());
        assert!(alloc.free.is_empty());
    }

    #[test]
    fn test_multi_slot_requests_are_contiguous() {
        let mut alloc = HeapAllocator::new();
        let single = alloc.allocate(1).unwrap();
        let keep = alloc.allocate(1).unwrap();
        alloc.deallocate(single, 1).unwrap();

        let run = alloc.allocate(3).unwrap();
        assert_eq!(run.get(), keep.get() + 1);
        for i in 0..3 {
            alloc.construct(run.offset(i), i).unwrap();
        }
        // The hole left by `single` is still available to a single request.
        assert_eq!(alloc.allocate(1).unwrap(), single);
    }

    #[test]
    fn test_double_release_is_rejected() {
        let mut alloc = HeapAllocator::<u8>::new();
        let a = alloc.allocate(1).unwrap();
        let _b = alloc.allocate(1).unwrap();
        alloc.deallocate(a, 1).unwrap();
        assert!(alloc.deallocate(a, 1).unwrap_err().is_unallocated_slot());
        assert!(
            alloc
                .deallocate(SlotIndex::new(10), 1)
                .unwrap_err()
                .is_unallocated_slot()
        );
        assert_eq!(alloc.in_use(), 1);
    }

    #[test]
    fn test_slot_state_errors() {
        let mut alloc = HeapAllocator::new();
        let slot = alloc.allocate(1).unwrap();
        assert!(alloc.destroy(slot).unwrap_err().is_slot_vacant());
        alloc.construct(slot, 'x').unwrap();
        assert!(alloc.construct(slot, 'y').unwrap_err().is_slot_occupied());
        *alloc.get_mut(slot).unwrap() = 'z';
        assert_eq!(alloc.get(slot), Some(&'z'));
        alloc.destroy(slot).unwrap();
        assert_eq!(alloc.get(slot), None);
        assert!(
            alloc
                .construct(SlotIndex::new(5), 'q')
                .unwrap_err()
                .is_unallocated_slot()
        );
    }

    #[test]
    fn test_deallocate_drops_values() {
        let tracker = Rc::new(());
        let mut alloc = HeapAllocator::new();
        let slot = alloc.allocate(1).unwrap();
        alloc.construct(slot, Rc::clone(&tracker)).unwrap();
        assert_eq!(Rc::strong_count(&tracker), 2);
        alloc.deallocate(slot, 1).unwrap();
        assert_eq!(Rc::strong_count(&tracker), 1);
    }
}
