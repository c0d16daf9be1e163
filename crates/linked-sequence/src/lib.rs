//! A doubly-linked sequence generic over its slot allocator.
//!
//! [`LinkedSequence`] stores each element in a [`Node`] that lives in a slot
//! handed out by a [`SlotAllocator`](region_alloc::SlotAllocator). Nodes reference each other through
//! [`SlotIndex`](region_alloc::SlotIndex) handles, and the end of the chain is
//! an explicit sentinel position rather than a node address.
//!
//! The sequence only grows at the back and releases its nodes from the back,
//! so it satisfies the stack discipline of a
//! [`RegionAllocator`](region_alloc::region::RegionAllocator).
//!
//! # Examples
//!
//! ```
//! use linked_sequence::RegionSequence;
//!
//! let mut seq = RegionSequence::<u32, 10>::new()?;
//! for i in 0..10 {
//!     seq.append(i)?;
//! }
//! assert_eq!(seq.len(), 10);
//! assert_eq!(seq[5], 5);
//!
//! // The region holds exactly ten nodes.
//! assert!(seq.append(10).unwrap_err().is_out_of_capacity());
//! # Ok::<(), linked_sequence::SequenceError>(())
//! ```
//!
//! # Module Layout
//!
//! ```text
//!   linked-sequence
//!   ├── node      - Node and link types stored in allocator slots
//!   ├── sequence  - LinkedSequence operations
//!   ├── iter      - forward iteration, shared and mutable
//!   └── error     - SequenceError
//! ```

#![cfg_attr(not(test), no_std)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

use region_alloc::{heap::HeapAllocator, region::RegionAllocator};

pub use self::{
    error::SequenceError,
    iter::{Iter, IterMut},
    node::Node,
    sequence::LinkedSequence,
};

mod error;
mod iter;
mod node;
mod sequence;

/// A sequence whose nodes come from a growable heap allocator.
pub type HeapSequence<T> = LinkedSequence<T, HeapAllocator<Node<T>>>;

/// A sequence holding at most `N` elements in a single reserved region.
pub type RegionSequence<T, const N: usize> = LinkedSequence<T, RegionAllocator<Node<T>, N>>;
