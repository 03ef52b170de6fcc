//! Intrusive circular doubly-linked list.
//!
//! The link lives inside the owner record (a [`Link`] field) and the list only
//! rewires links; it never allocates or frees elements. Owners live in an
//! [`Arena`], so neighbours are named by [`ArenaIndex`] rather than by address.
//! The list is bound to one link field of the owner type at construction time
//! through a [`LinkField`] (see [`link_field!`](crate::link_field)), which is
//! how it gets from an element to its link and back in O(1).
//!
//! # Invariants
//!
//! - Every link belongs to exactly one circular list. A detached link is a
//!   list of one: its `next` and `prev` both refer to itself (stored as `None`).
//! - The sentinel ([`Position::Head`]) is part of the circle; an empty list is
//!   a self-looped sentinel.
//! - `push_back` inserts just before the sentinel, so traversal order is
//!   insertion order.

use crate::arena::{Arena, ArenaIndex};

/// A point in the circle: the sentinel or an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Head,
    Entry(ArenaIndex),
}

/// Embedded list link. `None` means "points at myself".
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Link {
    next: Option<Position>,
    prev: Option<Position>,
}

impl Link {
    /// A detached, self-looped link.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next: None,
            prev: None,
        }
    }

    /// True when the link is part of a list with at least one other node.
    #[must_use]
    pub const fn is_linked(&self) -> bool {
        self.next.is_some()
    }

    fn next_from(&self, own: Position) -> Position {
        self.next.unwrap_or(own)
    }

    fn prev_from(&self, own: Position) -> Position {
        self.prev.unwrap_or(own)
    }

    fn set_next(&mut self, own: Position, to: Position) {
        self.next = (to != own).then_some(to);
    }

    fn set_prev(&mut self, own: Position, to: Position) {
        self.prev = (to != own).then_some(to);
    }
}

/// Accessors binding a list to one [`Link`] field of `T`.
pub struct LinkField<T> {
    get: fn(&T) -> &Link,
    get_mut: fn(&mut T) -> &mut Link,
}

impl<T> LinkField<T> {
    #[must_use]
    pub const fn new(get: fn(&T) -> &Link, get_mut: fn(&mut T) -> &mut Link) -> Self {
        Self { get, get_mut }
    }
}

impl<T> Clone for LinkField<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for LinkField<T> {}

impl<T> std::fmt::Debug for LinkField<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("LinkField")
    }
}

/// Builds a [`LinkField`] for `$owner`'s `$field` member.
///
/// ```
/// use yatf::list::{IntrusiveList, Link};
///
/// struct Job {
///     id: u32,
///     link: Link,
/// }
///
/// let list: IntrusiveList<Job> = IntrusiveList::new(yatf::link_field!(Job, link));
/// assert!(list.is_empty());
/// ```
#[macro_export]
macro_rules! link_field {
    ($owner:ty, $field:ident) => {
        $crate::list::LinkField::<$owner>::new(
            |owner| &owner.$field,
            |owner| &mut owner.$field,
        )
    };
}

/// An intrusive list over owners stored in an [`Arena<T>`].
#[derive(Debug)]
pub struct IntrusiveList<T> {
    head: Link,
    field: LinkField<T>,
    len: usize,
}

impl<T> IntrusiveList<T> {
    /// Creates an empty list bound to `field`.
    #[must_use]
    pub const fn new(field: LinkField<T>) -> Self {
        Self {
            head: Link::new(),
            field,
            len: 0,
        }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// O(1): the sentinel's neighbour is itself.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.head.next.is_none()
    }

    fn link<'a>(&'a self, arena: &'a Arena<T>, pos: Position) -> Option<&'a Link> {
        match pos {
            Position::Head => Some(&self.head),
            Position::Entry(idx) => arena.get(idx).map(self.field.get),
        }
    }

    fn link_mut<'a>(
        head: &'a mut Link,
        field: LinkField<T>,
        arena: &'a mut Arena<T>,
        pos: Position,
    ) -> Option<&'a mut Link> {
        match pos {
            Position::Head => Some(head),
            Position::Entry(idx) => arena.get_mut(idx).map(field.get_mut),
        }
    }

    /// Links the owner at `index` in front of the sentinel (the tail).
    ///
    /// The owner must not already be linked into a list. This is a caller
    /// obligation; it is only checked in debug builds. Returns `false` if
    /// `index` does not name a live owner.
    pub fn push_back(&mut self, arena: &mut Arena<T>, index: ArenaIndex) -> bool {
        let node = Position::Entry(index);
        let tail = self.head.prev_from(Position::Head);
        let field = self.field;

        let Some(link) = Self::link_mut(&mut self.head, field, arena, node) else {
            return false;
        };
        debug_assert!(!link.is_linked(), "{index:?} is already linked");
        link.set_prev(node, tail);
        link.set_next(node, Position::Head);

        if let Some(tail_link) = Self::link_mut(&mut self.head, field, arena, tail) {
            tail_link.set_next(tail, node);
        }
        self.head.set_prev(Position::Head, node);
        self.len += 1;
        true
    }

    /// Unlinks the owner at `index`, joins its former neighbours and leaves
    /// its link self-looped. Returns `false` if it was not linked.
    pub fn erase(&mut self, arena: &mut Arena<T>, index: ArenaIndex) -> bool {
        let node = Position::Entry(index);
        let field = self.field;

        let (prev, next) = match Self::link_mut(&mut self.head, field, arena, node) {
            Some(link) if link.is_linked() => {
                let neighbours = (link.prev_from(node), link.next_from(node));
                *link = Link::new();
                neighbours
            }
            _ => return false,
        };

        if let Some(prev_link) = Self::link_mut(&mut self.head, field, arena, prev) {
            prev_link.set_next(prev, next);
        }
        if let Some(next_link) = Self::link_mut(&mut self.head, field, arena, next) {
            next_link.set_prev(next, prev);
        }
        self.len -= 1;
        true
    }

    /// Unlinks the owner and then releases it from the arena.
    pub fn remove(&mut self, arena: &mut Arena<T>, index: ArenaIndex) -> Option<T> {
        self.erase(arena, index);
        arena.remove(index)
    }

    /// Unlinks every element, leaving the owners in the arena.
    pub fn clear(&mut self, arena: &mut Arena<T>) {
        while let Some(first) = self.first() {
            if !self.erase(arena, first) {
                // The owner vanished from the arena behind our back.
                self.head = Link::new();
                self.len = 0;
                break;
            }
        }
    }

    /// Handle of the first element in traversal order.
    #[must_use]
    pub fn first(&self) -> Option<ArenaIndex> {
        match self.head.next_from(Position::Head) {
            Position::Head => None,
            Position::Entry(idx) => Some(idx),
        }
    }

    /// Handle of the element following `index`, or `None` at the end.
    #[must_use]
    pub fn next_after(&self, arena: &Arena<T>, index: ArenaIndex) -> Option<ArenaIndex> {
        let node = Position::Entry(index);
        let link = self.link(arena, node)?;
        match link.next_from(node) {
            Position::Entry(next) if next != index => Some(next),
            _ => None,
        }
    }

    /// Iterates owners in insertion order.
    pub fn iter<'a>(&'a self, arena: &'a Arena<T>) -> Iter<'a, T> {
        Iter {
            list: self,
            arena,
            cursor: self.head.next_from(Position::Head),
        }
    }

    /// Iterates `(handle, owner)` pairs in insertion order.
    pub fn entries<'a>(&'a self, arena: &'a Arena<T>) -> Entries<'a, T> {
        Entries {
            inner: self.iter(arena),
        }
    }
}

/// Forward iterator from the first element up to the sentinel.
pub struct Iter<'a, T> {
    list: &'a IntrusiveList<T>,
    arena: &'a Arena<T>,
    cursor: Position,
}

impl<'a, T> Iter<'a, T> {
    fn advance(&mut self) -> Option<(ArenaIndex, &'a T)> {
        let Position::Entry(idx) = self.cursor else {
            return None;
        };
        let owner = self.arena.get(idx)?;
        let link = (self.list.field.get)(owner);
        self.cursor = link.next_from(self.cursor);
        Some((idx, owner))
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.advance().map(|(_, owner)| owner)
    }
}

pub struct Entries<'a, T> {
    inner: Iter<'a, T>,
}

impl<'a, T> Iterator for Entries<'a, T> {
    type Item = (ArenaIndex, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.advance()
    }
}
