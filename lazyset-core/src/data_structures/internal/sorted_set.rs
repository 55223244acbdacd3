use crate::data_structures::ordered_iterator::OrderedIterator;
use crate::guard::Guard;
use std::marker::PhantomData;

/// A node of a sorted set as seen by the generic API.
pub trait SetNode<T> {
    /// The stored value, `None` for the sentinel head.
    fn value(&self) -> Option<&T>;

    /// Whether the node has been logically deleted.
    fn is_marked(&self) -> bool;

    /// Deallocate this node.
    ///
    /// # Safety
    /// - The pointer must have been allocated with `Box::new` by the set
    /// - Must only be called once, after the node is unreachable
    ///
    unsafe fn dealloc_ptr(ptr: *mut Self)
    where
        Self: Sized,
    {
        // SAFETY: caller guarantees ptr came from Box::new and is unreachable
        unsafe { drop(Box::from_raw(ptr)) };
    }
}

/// A concurrent set that keeps its values in ascending order.
///
/// The required methods are the raw protocol: they hand out node pointers and
/// expect the caller to hold a read guard (`Self::Guard::pin()`) while those
/// pointers are in use. The provided methods are the safe API built on top.
///
/// ```text
/// LazyList<i64, EpochGuard>      - Production: epoch-based reclamation
/// LazyList<i64, DeferredGuard>   - Testing: frees removed nodes on drop
/// ```
///
pub trait SortedSet<T: Ord> {
    type Guard: Guard;
    /// Unlinked nodes are handed to the guard, which may free them on any
    /// thread and after the set itself is dropped.
    type Node: SetNode<T> + Send + 'static;

    /// Insert `value`, optionally starting the search at `hint`.
    ///
    /// Returns the new node, or `None` if the value is already present.
    /// A hint that is marked or not strictly below `value` is ignored.
    ///
    fn insert_from_internal(
        &self,
        value: T,
        hint: Option<*mut Self::Node>,
    ) -> Option<*mut Self::Node>;

    /// Mark and unlink the node holding `value`.
    ///
    /// Returns the unlinked node, which the caller must hand to the guard.
    ///
    fn remove_from_internal(&self, value: &T) -> Option<*mut Self::Node>;

    /// Lock-free lookup of an unmarked node holding `value`.
    ///
    fn find_from_internal(&self, value: &T) -> Option<*mut Self::Node>;

    /// First node after the sentinel.
    ///
    fn first_node_internal(&self) -> Option<*mut Self::Node>;

    /// Successor of `node`.
    ///
    fn next_node_internal(&self, node: *mut Self::Node) -> Option<*mut Self::Node>;

    /// The guard receiving unlinked nodes.
    ///
    fn guard(&self) -> &Self::Guard;

    /// Successful inserts minus successful deletes.
    ///
    /// Exact only once concurrent writers have quiesced.
    ///
    fn len(&self) -> usize;

    // =========================================================================
    // Safe Public API
    // =========================================================================

    /// Insert a value.
    ///
    /// Returns `true` if the value was added, `false` if it was already present.
    ///
    fn insert(&self, value: T) -> bool {
        let _guard = Self::Guard::pin();
        self.insert_from_internal(value, None).is_some()
    }

    /// Delete a value.
    ///
    /// Returns `true` if the value was removed, `false` if it was absent.
    ///
    fn delete(&self, value: &T) -> bool {
        let _guard = Self::Guard::pin();
        match self.remove_from_internal(value) {
            Some(node) => {
                unsafe { self.guard().defer_destroy(node, Self::Node::dealloc_ptr) };
                true
            }
            None => false,
        }
    }

    /// Delete a value and return it.
    ///
    fn remove(&self, value: &T) -> Option<T>
    where
        T: Clone,
    {
        let _guard = Self::Guard::pin();
        let node = self.remove_from_internal(value)?;

        // Clone before the node is handed over for destruction.
        let removed = unsafe { (*node).value().cloned() };

        unsafe { self.guard().defer_destroy(node, Self::Node::dealloc_ptr) };

        removed
    }

    /// Check whether a value is present.
    ///
    fn contains(&self, value: &T) -> bool {
        let _guard = Self::Guard::pin();
        self.find_from_internal(value).is_some()
    }

    /// Apply `f` to the stored value if it is present.
    ///
    fn find_and_apply<F, R>(&self, value: &T, f: F) -> Option<R>
    where
        F: FnOnce(&T) -> R,
    {
        let _guard = Self::Guard::pin();
        let node = self.find_from_internal(value)?;
        unsafe { (*node).value().map(f) }
    }

    /// Visit values in ascending order until `visit` returns `false`.
    ///
    /// Nodes that are marked but not yet unlinked are visited too.
    ///
    fn range<F>(&self, mut visit: F)
    where
        F: FnMut(&T) -> bool,
    {
        let _guard = Self::Guard::pin();
        let mut current = self.first_node_internal();
        while let Some(node) = current {
            let keep_going = match unsafe { (*node).value() } {
                Some(value) => visit(value),
                None => true,
            };
            if !keep_going {
                break;
            }
            current = self.next_node_internal(node);
        }
    }

    /// Check if the set is empty.
    ///
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Collect the values into a Vec.
    ///
    fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        let mut result = Vec::new();
        self.range(|value| {
            result.push(value.clone());
            true
        });
        result
    }

    /// Iterate over cloned values, in the same order as `range`.
    ///
    fn iter(&self) -> SortedSetIter<'_, T, Self>
    where
        Self: Sized,
    {
        SortedSetIter::new(self)
    }

    /// Insert values from an ordered iterator.
    ///
    /// Each insert starts its search at the node inserted just before it,
    /// so ordered input avoids walking the list from the head every time.
    ///
    /// Returns the number of values that were newly inserted.
    ///
    fn insert_batch<I>(&self, iter: I) -> usize
    where
        I: OrderedIterator<Item = T>,
    {
        let _guard = Self::Guard::pin();
        let mut count = 0;
        let mut last_node: Option<*mut Self::Node> = None;

        for value in iter {
            if let Some(node) = self.insert_from_internal(value, last_node) {
                last_node = Some(node);
                count += 1;
            }
        }
        count
    }
}

// ============================================================================
// Iterator Support
// ============================================================================

/// Iterator over a sorted set.
///
/// Holds a read guard for its whole life, so every node it reaches stays
/// allocated until the iterator is dropped.
///
pub struct SortedSetIter<'a, T, C>
where
    C: SortedSet<T>,
    T: Ord,
{
    _guard: <C::Guard as Guard>::ReadGuard,
    set: &'a C,
    current_node: Option<*mut C::Node>,
    _phantom: PhantomData<T>,
}

impl<'a, T, C> SortedSetIter<'a, T, C>
where
    C: SortedSet<T>,
    T: Ord,
{
    pub fn new(set: &'a C) -> Self {
        // Pin before reading the first pointer.
        let guard = C::Guard::pin();
        let first = set.first_node_internal();
        Self {
            _guard: guard,
            set,
            current_node: first,
            _phantom: PhantomData,
        }
    }
}

impl<T, C> Iterator for SortedSetIter<'_, T, C>
where
    C: SortedSet<T>,
    T: Ord + Clone,
{
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let node = self.current_node?;
            self.current_node = self.set.next_node_internal(node);

            if let Some(value) = unsafe { (*node).value() } {
                return Some(value.clone());
            }
        }
    }
}
