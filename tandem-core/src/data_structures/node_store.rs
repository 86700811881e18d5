use std::mem;

use crate::data_structures::Direction;
use crate::data_structures::error::NodeStoreError;

///
/// Doubly-linked list whose nodes live in an arena of slots addressed by generational indices.
///
// =============================================================================
// LAYOUT
// =============================================================================
//
//  slots:  [ 0: Occupied(7) ][ 1: Vacant ][ 2: Occupied(3) ][ 3: Occupied(9) ]
//                                  │
//  free_head ──────────────────────┘
//
//  head ──► slot 2 (3) ◄──► slot 0 (7) ◄──► slot 3 (9) ◄── tail
//
// A NodeId carries the slot index and the generation the slot had when the
// node was appended. Removing a node bumps the slot generation, so a handle to
// a removed node can never reach the node that later reuses the slot.
//
// INVARIANTS:
// 1. head is None iff tail is None iff len == 0
// 2. n.prev == Some(p) implies p.next == Some(n), symmetric for next
// 3. head.prev == None and tail.next == None
// 4. Every NodeId reachable from head/tail points at an Occupied slot with a
//    matching generation
// 5. Vacant slots form a singly linked free list through next_free
//
// =============================================================================
//
pub struct NodeStore<T> {
    slots: Vec<Slot<T>>,
    free_head: Option<u32>,
    head: Option<NodeId>,
    tail: Option<NodeId>,
    len: usize,
    limit: Option<usize>,
}

/// Stable handle to a node in a [`NodeStore`].
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

#[derive(Debug)]
struct Node<T> {
    value: T,
    prev: Option<NodeId>,
    next: Option<NodeId>,
}

#[derive(Debug)]
enum Slot<T> {
    Occupied { generation: u32, node: Node<T> },
    Vacant { generation: u32, next_free: Option<u32> },
}

impl<T> Default for NodeStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> NodeStore<T> {
    pub fn new() -> Self {
        NodeStore {
            slots: Vec::new(),
            free_head: None,
            head: None,
            tail: None,
            len: 0,
            limit: None,
        }
    }

    /// Creates a store that refuses to hold more than `limit` nodes at once.
    /// Appending past the limit fails with [`NodeStoreError::OutOfMemory`].
    ///
    pub fn with_limit(limit: usize) -> Self {
        NodeStore {
            limit: Some(limit),
            ..Self::new()
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    #[inline]
    pub fn head(&self) -> Option<NodeId> {
        self.head
    }

    #[inline]
    pub fn tail(&self) -> Option<NodeId> {
        self.tail
    }

    // Gets the node at the given end of the list.
    //
    #[inline]
    pub fn end(&self, direction: Direction) -> Option<NodeId> {
        match direction {
            Direction::Head => self.head,
            Direction::Tail => self.tail,
        }
    }

    /// Gets the value of a live node, or `None` if the handle is stale.
    ///
    pub fn get(&self, id: NodeId) -> Option<&T> {
        self.node(id).map(|node| &node.value)
    }

    /// Appends `value` as the new tail.
    ///
    /// On failure the list is left exactly as it was.
    ///
    pub fn append(&mut self, value: T) -> Result<NodeId, NodeStoreError> {
        if self.limit.is_some_and(|limit| self.len >= limit) {
            return Err(NodeStoreError::OutOfMemory { len: self.len });
        }

        let prev = self.tail;
        let id = self.allocate(Node {
            value,
            prev,
            next: None,
        })?;

        // Link behind the current tail, or become the sole node.
        //
        match prev {
            Some(prev) => self.linked_mut(prev).next = Some(id),
            None => self.head = Some(id),
        }

        self.tail = Some(id);
        self.len += 1;

        Ok(id)
    }

    /// Unlinks the node from wherever it sits, frees its slot and returns its value.
    ///
    /// `None` and stale handles are no-ops.
    ///
    pub fn remove(&mut self, id: Option<NodeId>) -> Option<T> {
        let node = self.release(id?)?;

        match node.prev {
            Some(prev) => self.linked_mut(prev).next = node.next,
            None => self.head = node.next,
        }

        match node.next {
            Some(next) => self.linked_mut(next).prev = node.prev,
            None => self.tail = node.prev,
        }

        self.len -= 1;

        Some(node.value)
    }

    // Removes every node, returning how many were freed.
    //
    pub fn clear(&mut self) -> usize {
        let mut freed = 0;
        while self.remove(self.head).is_some() {
            freed += 1;
        }

        freed
    }

    /// Iterates values from head to tail.
    ///
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        let mut cursor = self.head;
        std::iter::from_fn(move || {
            let node = self.node(cursor?)?;
            cursor = node.next;
            Some(&node.value)
        })
    }

    /// Walks the list both ways and checks the link invariants.
    ///
    pub fn is_consistent(&self) -> bool {
        if self.head.is_none() != self.tail.is_none() {
            return false;
        }

        let mut forward = 0;
        let mut prev = None;
        let mut cursor = self.head;
        while let Some(id) = cursor {
            let Some(node) = self.node(id) else {
                return false;
            };
            if node.prev != prev || forward > self.len {
                return false;
            }
            forward += 1;
            prev = Some(id);
            cursor = node.next;
        }

        if prev != self.tail {
            return false;
        }

        let mut backward = 0;
        let mut next = None;
        let mut cursor = self.tail;
        while let Some(id) = cursor {
            let Some(node) = self.node(id) else {
                return false;
            };
            if node.next != next || backward > self.len {
                return false;
            }
            backward += 1;
            next = Some(id);
            cursor = node.prev;
        }

        forward == self.len && backward == self.len && next == self.head
    }

    fn node(&self, id: NodeId) -> Option<&Node<T>> {
        match self.slots.get(id.index as usize)? {
            Slot::Occupied { generation, node } if *generation == id.generation => Some(node),
            _ => None,
        }
    }

    // Linked ids always point at occupied slots (invariant 4).
    //
    fn linked_mut(&mut self, id: NodeId) -> &mut Node<T> {
        match &mut self.slots[id.index as usize] {
            Slot::Occupied { generation, node } if *generation == id.generation => node,
            _ => unreachable!("linked node {id:?} is not live"),
        }
    }

    fn allocate(&mut self, node: Node<T>) -> Result<NodeId, NodeStoreError> {
        // Reuse a vacant slot first.
        //
        if let Some(index) = self.free_head {
            let slot = &mut self.slots[index as usize];
            let (generation, next_free) = match slot {
                Slot::Vacant {
                    generation,
                    next_free,
                } => (*generation, *next_free),
                Slot::Occupied { .. } => unreachable!("free list points at occupied slot {index}"),
            };

            *slot = Slot::Occupied { generation, node };
            self.free_head = next_free;

            return Ok(NodeId { index, generation });
        }

        // Grow the arena. Fallible reservation keeps allocation failure recoverable.
        //
        let out_of_memory = NodeStoreError::OutOfMemory { len: self.len };
        let index = u32::try_from(self.slots.len()).map_err(|_| out_of_memory)?;
        self.slots.try_reserve(1).map_err(|_| out_of_memory)?;
        self.slots.push(Slot::Occupied {
            generation: 0,
            node,
        });

        Ok(NodeId {
            index,
            generation: 0,
        })
    }

    fn release(&mut self, id: NodeId) -> Option<Node<T>> {
        let slot = self.slots.get_mut(id.index as usize)?;
        match slot {
            Slot::Occupied { generation, .. } if *generation == id.generation => {}
            _ => return None,
        }

        let vacant = Slot::Vacant {
            generation: id.generation.wrapping_add(1),
            next_free: self.free_head,
        };
        self.free_head = Some(id.index);

        match mem::replace(slot, vacant) {
            Slot::Occupied { node, .. } => Some(node),
            Slot::Vacant { .. } => None,
        }
    }
}
