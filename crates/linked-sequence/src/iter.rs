use core::{iter::FusedIterator, marker::PhantomData, ptr::NonNull};

use region_alloc::SlotAllocator;

use crate::node::{Link, Node};

/// Forward iterator over the elements of a
/// [`LinkedSequence`](crate::LinkedSequence).
///
/// Starts at the first node and stops on reaching the end sentinel.
pub struct Iter<'a, T, A>
where
    A: SlotAllocator<Node<T>>,
{
    alloc: &'a A,
    cursor: Link,
    remaining: usize,
    _marker: PhantomData<&'a T>,
}

impl<'a, T, A> Iter<'a, T, A>
where
    A: SlotAllocator<Node<T>>,
{
    pub(crate) fn new(alloc: &'a A, begin: Link, len: usize) -> Self {
        Self {
            alloc,
            cursor: begin,
            remaining: len,
            _marker: PhantomData,
        }
    }
}

impl<T, A> Clone for Iter<'_, T, A>
where
    A: SlotAllocator<Node<T>>,
{
    fn clone(&self) -> Self {
        Self {
            alloc: self.alloc,
            cursor: self.cursor,
            remaining: self.remaining,
            _marker: PhantomData,
        }
    }
}

impl<'a, T, A> Iterator for Iter<'a, T, A>
where
    A: SlotAllocator<Node<T>>,
{
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let Link::Node(slot) = self.cursor else {
            return None;
        };
        let node = self.alloc.get(slot)?;
        self.cursor = node.next;
        self.remaining = self.remaining.saturating_sub(1);
        Some(&node.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if matches!(self.cursor, Link::End) {
            return (0, Some(0));
        }
        (self.remaining, Some(self.remaining))
    }
}

impl<T, A> ExactSizeIterator for Iter<'_, T, A> where A: SlotAllocator<Node<T>> {}

impl<T, A> FusedIterator for Iter<'_, T, A> where A: SlotAllocator<Node<T>> {}

/// Forward iterator over mutable references to the elements of a
/// [`LinkedSequence`](crate::LinkedSequence).
///
/// Holds the allocator exclusively for `'a`. Every node is visited once, so
/// the yielded references never overlap.
pub struct IterMut<'a, T, A>
where
    A: SlotAllocator<Node<T>>,
{
    alloc: NonNull<A>,
    cursor: Link,
    remaining: usize,
    _marker: PhantomData<(&'a mut A, &'a mut T)>,
}

impl<'a, T, A> IterMut<'a, T, A>
where
    A: SlotAllocator<Node<T>>,
{
    pub(crate) fn new(alloc: &'a mut A, begin: Link, len: usize) -> Self {
        Self {
            alloc: NonNull::from(alloc),
            cursor: begin,
            remaining: len,
            _marker: PhantomData,
        }
    }
}

impl<'a, T, A> Iterator for IterMut<'a, T, A>
where
    A: SlotAllocator<Node<T>> + 'a,
    T: 'a,
{
    type Item = &'a mut T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let Link::Node(slot) = self.cursor else {
            return None;
        };
        // SAFETY: `alloc` comes from a `&'a mut A` borrowed for the whole
        // lifetime of the iterator. The chain names each slot once and
        // `SlotAllocator` keeps distinct slots disjoint, so the reference
        // returned here never overlaps one returned earlier.
        let node = unsafe { self.alloc.as_mut() }.get_mut(slot)?;
        self.cursor = node.next;
        self.remaining -= 1;
        Some(&mut node.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if matches!(self.cursor, Link::End) {
            return (0, Some(0));
        }
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T, A> ExactSizeIterator for IterMut<'a, T, A>
where
    A: SlotAllocator<Node<T>> + 'a,
    T: 'a,
{
}

impl<'a, T, A> FusedIterator for IterMut<'a, T, A>
where
    A: SlotAllocator<Node<T>> + 'a,
    T: 'a,
{
}
