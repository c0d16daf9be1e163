use region_alloc::SlotIndex;

/// Position following a node: another node, or the end sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Link {
    Node(SlotIndex),
    End,
}

impl From<Option<SlotIndex>> for Link {
    fn from(slot: Option<SlotIndex>) -> Self {
        slot.map_or(Self::End, Self::Node)
    }
}

/// One stored element plus its links, as kept in an allocator slot.
///
/// Nodes are created and linked only by
/// [`LinkedSequence`](crate::LinkedSequence); the type is public so allocator
/// types can name it.
#[derive(Debug)]
pub struct Node<T> {
    pub(crate) prev: Option<SlotIndex>,
    pub(crate) next: Link,
    pub(crate) value: T,
}

/// The past-the-end marker embedded in every sequence.
///
/// It never occupies an allocator slot. `prev` names the last real node.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Sentinel {
    pub(crate) prev: Option<SlotIndex>,
}
