use region_alloc::{AllocError, SlotIndex};
use snafu::Snafu;
use snafu_utils::{HasLocation, Location};

/// Errors returned by [`LinkedSequence`](crate::LinkedSequence) operations.
#[derive(Debug, Snafu, derive_more::IsVariant)]
#[snafu(visibility(pub(crate)))]
pub enum SequenceError {
    #[snafu(display("index {index} out of range for sequence of length {len}"))]
    OutOfRange {
        index: usize,
        len: usize,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("node storage request failed"))]
    Alloc {
        #[snafu(source)]
        source: AllocError,
        #[snafu(implicit)]
        location: Location,
    },
    /// A link names a slot that holds no node.
    #[snafu(display("link to slot {slot} does not reach a node"))]
    DanglingLink {
        slot: SlotIndex,
        #[snafu(implicit)]
        location: Location,
    },
    /// The chain ended before the requested position was reached.
    #[snafu(display("chain ends before position {index} of {len}"))]
    BrokenChain {
        index: usize,
        len: usize,
        #[snafu(implicit)]
        location: Location,
    },
}

impl SequenceError {
    /// Returns `true` if the allocator ran out of slots.
    #[must_use]
    pub fn is_out_of_capacity(&self) -> bool {
        matches!(self, Self::Alloc { source, .. } if source.is_out_of_capacity())
    }

    /// Returns the allocator error behind this one, if any.
    #[must_use]
    pub fn alloc_error(&self) -> Option<&AllocError> {
        match self {
            Self::Alloc { source, .. } => Some(source),
            Self::OutOfRange { .. } | Self::DanglingLink { .. } | Self::BrokenChain { .. } => None,
        }
    }
}

impl HasLocation for SequenceError {
    fn location(&self) -> Location {
        match self {
            Self::OutOfRange { location, .. }
            | Self::Alloc { location, .. }
            | Self::DanglingLink { location, .. }
            | Self::BrokenChain { location, .. } => *location,
        }
    }
}
