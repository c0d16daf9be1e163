use alloc::collections::TryReserveError;

use snafu::Snafu;
use snafu_utils::{HasLocation, Location};

use crate::SlotIndex;

/// Errors that can occur while allocating, filling or returning slots.
#[derive(Debug, Snafu, derive_more::IsVariant)]
#[snafu(visibility(pub(crate)))]
pub enum AllocError {
    /// The request does not fit in the remaining capacity.
    #[snafu(display(
        "region exhausted: requested {requested} slot(s), {available} of {capacity} available"
    ))]
    OutOfCapacity {
        requested: usize,
        available: usize,
        capacity: usize,
        #[snafu(implicit)]
        location: Location,
    },
    /// The system could not provide the backing block.
    #[snafu(display("failed to reserve backing block for {capacity} slot(s)"))]
    ReserveBlock {
        capacity: usize,
        #[snafu(source)]
        source: TryReserveError,
        #[snafu(implicit)]
        location: Location,
    },
    /// Slots were returned out of stack order.
    #[snafu(display(
        "out-of-order release of {count} slot(s) at {slot}, cursor is at {cursor}"
    ))]
    OutOfOrderRelease {
        slot: SlotIndex,
        count: usize,
        cursor: usize,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("slot {slot} is not allocated"))]
    UnallocatedSlot {
        slot: SlotIndex,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("slot {slot} already holds a value"))]
    SlotOccupied {
        slot: SlotIndex,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("slot {slot} holds no value"))]
    SlotVacant {
        slot: SlotIndex,
        #[snafu(implicit)]
        location: Location,
    },
}

impl HasLocation for AllocError {
    fn location(&self) -> Location {
        match self {
            Self::OutOfCapacity { location, .. }
            | Self::ReserveBlock { location, .. }
            | Self::OutOfOrderRelease { location, .. }
            | Self::UnallocatedSlot { location, .. }
            | Self::SlotOccupied { location, .. }
            | Self::SlotVacant { location, .. } => *location,
        }
    }
}
