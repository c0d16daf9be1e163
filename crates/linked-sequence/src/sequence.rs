//! The [`LinkedSequence`] container.
//!
//! # Structure
//!
//! ```text
//!   begin                                          sentinel
//!     │                                           ┌────────┐
//!     ▼                                           │  End   │
//!   ┌────┐  next   ┌────┐  next   ┌────┐  next   │        │
//!   │ #0 │ ──────► │ #1 │ ──────► │ #2 │ ──────► │        │
//!   │    │ ◄────── │    │ ◄────── │    │ ◄────── │  prev  │
//!   └────┘  prev   └────┘  prev   └────┘         └────────┘
//! ```
//!
//! Every node sits in an allocator slot. The sentinel is part of the sequence
//! itself and is never allocated; its `prev` is the last node.
//!
//! # Release Order
//!
//! Nodes are allocated one at a time by [`append`](LinkedSequence::append)
//! and released from the last node back to the first, which is exactly the
//! reverse of allocation. A region allocator can therefore back the sequence
//! without ever seeing an out-of-order release.

use core::{
    fmt,
    marker::PhantomData,
    mem,
    ops::{Index, IndexMut},
};

use region_alloc::{SlotAllocator, SlotIndex, heap::HeapAllocator};
use snafu::{OptionExt as _, ResultExt as _, ensure};
use tracing::{debug, error, trace};

use crate::{
    error::{AllocSnafu, BrokenChainSnafu, DanglingLinkSnafu, OutOfRangeSnafu, SequenceError},
    iter::{Iter, IterMut},
    node::{Link, Node, Sentinel},
};

/// A doubly-linked sequence whose nodes are stored in slots of `A`.
///
/// The sequence grows only through [`append`](Self::append). Indexed access
/// is supported but linear: [`get`](Self::get) walks from whichever end is
/// closer.
///
/// # Examples
///
/// ```
/// use linked_sequence::HeapSequence;
///
/// let mut seq = HeapSequence::default();
/// seq.append("alpha")?;
/// seq.append("beta")?;
///
/// assert_eq!(seq.get(1)?, &"beta");
/// assert!(seq.get(2).unwrap_err().is_out_of_range());
/// assert_eq!(seq.iter().copied().collect::<Vec<_>>(), ["alpha", "beta"]);
/// # Ok::<(), linked_sequence::SequenceError>(())
/// ```
pub struct LinkedSequence<T, A = HeapAllocator<Node<T>>>
where
    A: SlotAllocator<Node<T>>,
{
    alloc: A,
    begin: Option<SlotIndex>,
    end: Sentinel,
    len: usize,
    _marker: PhantomData<T>,
}

impl<T, A> LinkedSequence<T, A>
where
    A: SlotAllocator<Node<T>>,
{
    /// Creates an empty sequence with a freshly constructed allocator.
    pub fn new() -> Result<Self, SequenceError> {
        let alloc = A::try_new().context(AllocSnafu)?;
        Ok(Self::new_in(alloc))
    }

    /// Creates an empty sequence that stores its nodes in `alloc`.
    pub fn new_in(alloc: A) -> Self {
        Self {
            alloc,
            begin: None,
            end: Sentinel::default(),
            len: 0,
            _marker: PhantomData,
        }
    }

    /// Returns the number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the sequence holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the largest number of elements the allocator could hold.
    #[must_use]
    pub fn max_len(&self) -> usize {
        self.alloc.max_size()
    }

    /// Returns the allocator holding the nodes.
    #[must_use]
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    fn node(&self, slot: SlotIndex) -> Result<&Node<T>, SequenceError> {
        self.alloc.get(slot).context(DanglingLinkSnafu { slot })
    }

    fn node_mut(&mut self, slot: SlotIndex) -> Result<&mut Node<T>, SequenceError> {
        self.alloc.get_mut(slot).context(DanglingLinkSnafu { slot })
    }

    /// Appends `value` after the last element.
    ///
    /// Fails without modifying the sequence when the allocator cannot provide
    /// another slot.
    pub fn append(&mut self, value: T) -> Result<(), SequenceError> {
        let slot = self.alloc.allocate(1).context(AllocSnafu)?;
        let node = Node {
            prev: self.end.prev,
            next: Link::End,
            value,
        };
        if let Err(source) = self.alloc.construct(slot, node) {
            self.alloc.deallocate(slot, 1).context(AllocSnafu)?;
            return Err(source).context(AllocSnafu);
        }

        match self.end.prev {
            Some(last) => self.node_mut(last)?.next = Link::Node(slot),
            None => self.begin = Some(slot),
        }
        self.end.prev = Some(slot);
        self.len += 1;
        trace!(%slot, len = self.len, "appended node");
        Ok(())
    }

    /// Appends every item of `iter`, stopping at the first failure.
    ///
    /// Items appended before the failure stay in the sequence.
    pub fn try_extend<I>(&mut self, iter: I) -> Result<(), SequenceError>
    where
        I: IntoIterator<Item = T>,
    {
        for value in iter {
            self.append(value)?;
        }
        Ok(())
    }

    /// Finds the slot of the element at `index`.
    ///
    /// Walks forward from the first node for the front half and backward from
    /// the sentinel for the back half.
    fn locate(&self, index: usize) -> Result<SlotIndex, SequenceError> {
        let len = self.len;
        ensure!(index < len, OutOfRangeSnafu { index, len });

        if index < len / 2 {
            let mut slot = self.begin.context(BrokenChainSnafu { index: 0_usize, len })?;
            for position in 1..=index {
                slot = match self.node(slot)?.next {
                    Link::Node(next) => next,
                    Link::End => return BrokenChainSnafu { index: position, len }.fail(),
                };
            }
            Ok(slot)
        } else {
            let mut slot = self.end.prev.context(BrokenChainSnafu {
                index: len - 1,
                len,
            })?;
            for position in (index..len - 1).rev() {
                slot = self
                    .node(slot)?
                    .prev
                    .context(BrokenChainSnafu { index: position, len })?;
            }
            Ok(slot)
        }
    }

    /// Returns the element at `index`.
    pub fn get(&self, index: usize) -> Result<&T, SequenceError> {
        let slot = self.locate(index)?;
        Ok(&self.node(slot)?.value)
    }

    /// Returns the element at `index` mutably.
    pub fn get_mut(&mut self, index: usize) -> Result<&mut T, SequenceError> {
        let slot = self.locate(index)?;
        Ok(&mut self.node_mut(slot)?.value)
    }

    /// Returns the first element, if any.
    #[must_use]
    pub fn first(&self) -> Option<&T> {
        let node = self.alloc.get(self.begin?)?;
        Some(&node.value)
    }

    /// Returns the last element, if any.
    #[must_use]
    pub fn last(&self) -> Option<&T> {
        let node = self.alloc.get(self.end.prev?)?;
        Some(&node.value)
    }

    /// Returns an iterator from the first element up to the sentinel.
    pub fn iter(&self) -> Iter<'_, T, A> {
        Iter::new(&self.alloc, Link::from(self.begin), self.len)
    }

    /// Returns an iterator that yields every element mutably, first to last.
    ///
    /// The links themselves stay out of reach, so the chain cannot be
    /// reshaped during the walk.
    pub fn iter_mut(&mut self) -> IterMut<'_, T, A> {
        IterMut::new(&mut self.alloc, Link::from(self.begin), self.len)
    }

    /// Deep-copies the sequence into a fresh allocator.
    pub fn try_clone(&self) -> Result<Self, SequenceError>
    where
        T: Clone,
    {
        let mut copy = Self::new()?;
        copy.try_extend(self.iter().cloned())?;
        Ok(copy)
    }

    /// Replaces the contents with a copy of `source`.
    ///
    /// The replacement is built completely before the current nodes are
    /// released. If building it fails, `self` is left untouched.
    pub fn assign_from<B>(&mut self, source: &LinkedSequence<T, B>) -> Result<(), SequenceError>
    where
        T: Clone,
        B: SlotAllocator<Node<T>>,
    {
        let mut replacement = Self::new()?;
        replacement.try_extend(source.iter().cloned())?;
        *self = replacement;
        Ok(())
    }

    /// Moves the contents out, leaving `self` empty with a fresh allocator.
    ///
    /// No element is copied and no node is released.
    pub fn take(&mut self) -> Result<Self, SequenceError> {
        let empty = Self::new()?;
        Ok(mem::replace(self, empty))
    }

    /// Exchanges contents and allocators with `other`.
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    /// Removes every element, releasing nodes from the last to the first.
    pub fn clear(&mut self) -> Result<(), SequenceError> {
        self.release_nodes()
    }

    fn release_nodes(&mut self) -> Result<(), SequenceError> {
        let released = self.len;
        while let Some(slot) = self.end.prev {
            let prev = self.node(slot)?.prev;
            self.alloc.destroy(slot).context(AllocSnafu)?;
            self.alloc.deallocate(slot, 1).context(AllocSnafu)?;
            self.end.prev = prev;
            self.len = self.len.saturating_sub(1);
        }
        self.begin = None;
        self.len = 0;
        if released > 0 {
            debug!(released, "released sequence nodes");
        }
        Ok(())
    }
}

impl<T> Default for LinkedSequence<T, HeapAllocator<Node<T>>> {
    fn default() -> Self {
        Self::new_in(HeapAllocator::new())
    }
}

impl<T, A> Drop for LinkedSequence<T, A>
where
    A: SlotAllocator<Node<T>>,
{
    fn drop(&mut self) {
        if let Err(err) = self.release_nodes() {
            error!(%err, "failed to release sequence nodes");
        }
    }
}

impl<T, A> Clone for LinkedSequence<T, A>
where
    T: Clone,
    A: SlotAllocator<Node<T>>,
{
    /// # Panics
    ///
    /// Panics if the fresh allocator cannot hold a copy of every element.
    fn clone(&self) -> Self {
        match self.try_clone() {
            Ok(copy) => copy,
            Err(err) => panic!("failed to clone sequence: {err}"),
        }
    }

    /// # Panics
    ///
    /// Panics if the replacement cannot be built; `self` is unchanged then.
    fn clone_from(&mut self, source: &Self) {
        if let Err(err) = self.assign_from(source) {
            panic!("failed to copy sequence: {err}");
        }
    }
}

impl<T, U, A, B> PartialEq<LinkedSequence<U, B>> for LinkedSequence<T, A>
where
    T: PartialEq<U>,
    A: SlotAllocator<Node<T>>,
    B: SlotAllocator<Node<U>>,
{
    fn eq(&self, other: &LinkedSequence<U, B>) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<T, A> Eq for LinkedSequence<T, A>
where
    T: Eq,
    A: SlotAllocator<Node<T>>,
{
}

impl<T, A> fmt::Debug for LinkedSequence<T, A>
where
    T: fmt::Debug,
    A: SlotAllocator<Node<T>>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T, A> Index<usize> for LinkedSequence<T, A>
where
    A: SlotAllocator<Node<T>>,
{
    type Output = T;

    fn index(&self, index: usize) -> &T {
        match self.get(index) {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        }
    }
}

impl<T, A> IndexMut<usize> for LinkedSequence<T, A>
where
    A: SlotAllocator<Node<T>>,
{
    fn index_mut(&mut self, index: usize) -> &mut T {
        match self.get_mut(index) {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        }
    }
}

impl<'a, T, A> IntoIterator for &'a LinkedSequence<T, A>
where
    A: SlotAllocator<Node<T>>,
{
    type Item = &'a T;
    type IntoIter = Iter<'a, T, A>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T, A> IntoIterator for &'a mut LinkedSequence<T, A>
where
    A: SlotAllocator<Node<T>>,
{
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T, A>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}
