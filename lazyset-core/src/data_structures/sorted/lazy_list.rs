use std::fmt;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::lazy_list_node::{LazyListNode, NodePtr};
use crate::config::{ListConfig, RetryState};
use crate::data_structures::{SetNode, SortedSet};
use crate::guard::Guard;

///
/// Concurrent sorted list with optimistic, fine-grained locking and lazy
/// deletion (Heller et al., 'A Lazy Concurrent List-Based Set Algorithm').
///
// =============================================================================
// LIST INVARIANTS
// =============================================================================
//
// ┌──────┐    ┌──────┐    ┌──────┐    ┌──────┐
// │ HEAD │───►│  10  │───►│  20  │───►│  30  │───► null
// │(sent)│    │      │    │      │    │      │
// └──────┘    └──────┘    └──────┘    └──────┘
//
// 1. Values strictly ascend along next pointers; HEAD precedes everything.
// 2. Among unmarked nodes a value appears at most once.
// 3. A node's next pointer changes only under that node's lock.
// 4. marked goes false -> true once, under the node's own lock.
// 5. A marked node is reachable only while its deleter holds both locks.
//
// =============================================================================
// WINDOW SEARCH
// =============================================================================
//
// locate(v) walks without locks and returns (pred, curr):
//
//      pred.value < v <= curr.value      (curr may be null)
//
// The walk may step through marked nodes. Writers re-check the window under
// lock instead:
//
//      pred.next == curr  &&  !pred.marked
//
// On failure they walk again from HEAD.
//
// =============================================================================
// INSERT (one lock)
// =============================================================================
//
//   lock(pred) ─ validate ─ x.next = curr ─ pred.next = x ─ len += 1 ─ unlock
//
//          pred ──────────────► curr
//   after: pred ───► x ───────► curr
//
// =============================================================================
// DELETE (two locks, successor first)
// =============================================================================
//
//   lock(curr) ─ curr.marked? ─ lock(pred) ─ validate
//              ─ curr.marked = true            (logical delete)
//              ─ pred.next = curr.next         (physical unlink)
//              ─ len -= 1 ─ unlock(pred) ─ unlock(curr)
//
// Every deleter takes the lock of a node before the lock of a node with a
// smaller value, and an inserter holds a single lock, so no cycle of waiters
// can form.
//
// The unlinked node keeps its next pointer, so a reader standing on it still
// reaches the rest of the list. It is handed to the guard and freed once no
// pinned reader can hold it.
//
pub struct LazyList<T, G: Guard> {
    head: NonNull<LazyListNode<T>>,
    len: AtomicUsize,
    config: ListConfig,
    /// Receives unlinked nodes.
    guard: G,
}

// Safety: nodes are shared between threads and values are dropped by whichever
// thread frees the node.
unsafe impl<T: Send + Sync, G: Guard> Send for LazyList<T, G> {}
unsafe impl<T: Send + Sync, G: Guard> Sync for LazyList<T, G> {}

#[derive(Debug, Clone, Copy)]
struct Window<T> {
    pred: NodePtr<T>,
    curr: NodePtr<T>,
}

impl<T, G> LazyList<T, G>
where
    T: Ord,
    G: Guard,
{
    pub fn new() -> Self {
        Self::with_config(ListConfig::default())
    }

    pub fn with_config(config: ListConfig) -> Self {
        let head = Box::new(LazyListNode::new_sentinel());
        LazyList {
            head: NonNull::from(Box::leak(head)),
            len: AtomicUsize::new(0),
            config,
            guard: G::default(),
        }
    }

    pub fn config(&self) -> &ListConfig {
        &self.config
    }

    #[inline]
    fn head(&self) -> NodePtr<T> {
        self.head.as_ptr()
    }

    // Lock-free window search starting at `start` (HEAD when None).
    //
    // `start` must precede `value`; the sentinel always does.
    //
    fn locate(&self, value: &T, start: Option<NodePtr<T>>) -> Window<T> {
        let mut pred = start.unwrap_or_else(|| self.head());
        let mut curr = unsafe { (*pred).get_next() };

        while !curr.is_null() && unsafe { (*curr).precedes(value) } {
            pred = curr;
            curr = unsafe { (*curr).get_next() };
        }

        Window { pred, curr }
    }

    // Usable as a search start for `value`: live and strictly before it.
    //
    fn usable_hint(&self, hint: NodePtr<T>, value: &T) -> bool {
        !hint.is_null() && unsafe { !(*hint).is_marked() && (*hint).precedes(value) }
    }
}

impl<T, G> SortedSet<T> for LazyList<T, G>
where
    T: Ord + Send + 'static,
    G: Guard,
{
    type Guard = G;
    type Node = LazyListNode<T>;

    fn guard(&self) -> &G {
        &self.guard
    }

    fn insert_from_internal(&self, value: T, hint: Option<NodePtr<T>>) -> Option<NodePtr<T>> {
        let node = Box::new(LazyListNode::new(value));
        let Some(value) = node.value() else {
            unreachable!("new nodes always carry a value");
        };
        let mut hint = hint;
        let mut retry = RetryState::new("insert", self.config.retry);

        loop {
            let start = hint.filter(|&h| self.usable_hint(h, value));
            let Window { pred, curr } = self.locate(value, start);

            // Advisory only; the lock on pred serializes racing inserts.
            if !curr.is_null() && unsafe { (*curr).holds(value) } {
                return None;
            }

            let pred_ref = unsafe { &*pred };
            let pred_lock = pred_ref.lock();

            if pred_ref.get_next() != curr || pred_ref.is_marked() {
                drop(pred_lock);
                // A hint that failed once is not trusted again.
                hint = None;
                retry.retry();
                continue;
            }

            node.set_next(curr);
            let node = Box::into_raw(node);
            pred_ref.set_next(node);
            self.len.fetch_add(1, Ordering::Release);
            drop(pred_lock);

            if retry.attempts() > 0 {
                tracing::trace!(attempts = retry.attempts(), "insert committed after retries");
            }
            return Some(node);
        }
    }

    fn remove_from_internal(&self, value: &T) -> Option<NodePtr<T>> {
        let mut retry = RetryState::new("delete", self.config.retry);

        loop {
            let Window { pred, curr } = self.locate(value, None);

            if curr.is_null() || unsafe { !(*curr).holds(value) } {
                return None;
            }

            let (pred_ref, curr_ref) = unsafe { (&*pred, &*curr) };

            // Successor first, then predecessor.
            let curr_lock = curr_ref.lock();
            if curr_ref.is_marked() {
                drop(curr_lock);
                retry.retry();
                continue;
            }

            let pred_lock = pred_ref.lock();
            if pred_ref.get_next() != curr || pred_ref.is_marked() {
                drop(pred_lock);
                drop(curr_lock);
                retry.retry();
                continue;
            }

            curr_ref.set_marked();
            pred_ref.set_next(curr_ref.get_next());
            self.len.fetch_sub(1, Ordering::Release);

            drop(pred_lock);
            drop(curr_lock);

            if retry.attempts() > 0 {
                tracing::trace!(attempts = retry.attempts(), "delete committed after retries");
            }
            return Some(curr);
        }
    }

    fn find_from_internal(&self, value: &T) -> Option<NodePtr<T>> {
        let mut curr = unsafe { (*self.head()).get_next() };

        while !curr.is_null() && unsafe { (*curr).precedes(value) } {
            curr = unsafe { (*curr).get_next() };
        }

        if curr.is_null() {
            return None;
        }

        unsafe {
            if (*curr).holds(value) && !(*curr).is_marked() {
                Some(curr)
            } else {
                None
            }
        }
    }

    fn first_node_internal(&self) -> Option<NodePtr<T>> {
        let first = unsafe { (*self.head()).get_next() };
        (!first.is_null()).then_some(first)
    }

    fn next_node_internal(&self, node: NodePtr<T>) -> Option<NodePtr<T>> {
        if node.is_null() {
            return None;
        }

        let next = unsafe { (*node).get_next() };
        (!next.is_null()).then_some(next)
    }

    fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }
}

impl<T, G> Default for LazyList<T, G>
where
    T: Ord,
    G: Guard,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, G> fmt::Debug for LazyList<T, G>
where
    T: Ord + Clone + fmt::Debug + Send + 'static,
    G: Guard,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T, G: Guard> Drop for LazyList<T, G> {
    fn drop(&mut self) {
        // Reachable nodes, sentinel included. Unlinked nodes belong to the guard.
        let mut curr = self.head.as_ptr();
        let mut freed = 0usize;
        debug_assert!(unsafe { (*curr).is_sentinel() });

        while !curr.is_null() {
            unsafe {
                if (*curr).is_marked() {
                    panic!(
                        "INVARIANT VIOLATION: marked node still linked at drop time.\n\
                         Deleted nodes must be unlinked before their locks are released."
                    );
                }

                let next = (*curr).get_next();
                LazyListNode::dealloc_ptr(curr);
                freed += 1;
                curr = next;
            }
        }

        tracing::debug!(nodes = freed, "lazy list dropped");
    }
}

// ============================================================================
// Tests - Unique to LazyList
// ============================================================================
// Note: Common tests are in tests/lazy_list_tests.rs

#[cfg(test)]
mod tests {
    use crate::config::ListConfig;
    use crate::guard::DeferredGuard;

    use super::*;
    use std::sync::{Arc, Barrier};
    use std::thread;

    type TestList = LazyList<i64, DeferredGuard>;

    #[test]
    fn test_locate_window() {
        let list = TestList::new();
        for value in [10, 20, 30] {
            assert!(list.insert(value));
        }

        let window = list.locate(&20, None);
        unsafe {
            assert_eq!((*window.pred).value(), Some(&10));
            assert_eq!((*window.curr).value(), Some(&20));
        }

        let window = list.locate(&25, None);
        unsafe {
            assert_eq!((*window.pred).value(), Some(&20));
            assert_eq!((*window.curr).value(), Some(&30));
        }

        let window = list.locate(&5, None);
        assert_eq!(window.pred, list.head());
        unsafe { assert_eq!((*window.curr).value(), Some(&10)) };

        let window = list.locate(&99, None);
        assert!(window.curr.is_null());
        unsafe { assert_eq!((*window.pred).value(), Some(&30)) };
    }

    #[test]
    fn test_unlinked_node_is_marked_and_keeps_successor() {
        let list = TestList::new();
        for value in [1, 2, 3] {
            list.insert(value);
        }

        let _guard = DeferredGuard::pin();
        let removed = list.remove_from_internal(&2).unwrap();

        unsafe {
            assert!((*removed).is_marked());
            assert_eq!((*(*removed).get_next()).value(), Some(&3));
            list.guard().defer_destroy(removed, LazyListNode::dealloc_ptr);
        }

        assert_eq!(list.to_vec(), vec![1, 3]);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_insert_after_marked_pred_retries() {
        let list = TestList::new();
        for value in [10, 30] {
            list.insert(value);
        }

        let _guard = DeferredGuard::pin();
        let stale = list.find_from_internal(&10).unwrap();
        let removed = list.remove_from_internal(&10).unwrap();
        assert_eq!(stale, removed);

        // A marked hint is skipped and the search restarts from HEAD.
        let inserted = list.insert_from_internal(20, Some(stale));
        assert!(inserted.is_some());
        assert_eq!(list.to_vec(), vec![20, 30]);

        unsafe { list.guard().defer_destroy(removed, LazyListNode::dealloc_ptr) };
    }

    #[test]
    fn test_hint_equal_to_value_is_ignored() {
        let list = TestList::new();
        list.insert(5);

        let _guard = DeferredGuard::pin();
        let five = list.find_from_internal(&5).unwrap();

        assert!(list.insert_from_internal(5, Some(five)).is_none());
        assert!(list.insert_from_internal(4, Some(five)).is_some());
        assert_eq!(list.to_vec(), vec![4, 5]);
    }

    #[test]
    fn test_range_visits_marked_but_linked_node() {
        let list = TestList::new();
        for value in [1, 2, 3] {
            list.insert(value);
        }

        // Reproduce the window in which a deleter holds both locks: the node
        // is marked but still linked.
        let _guard = DeferredGuard::pin();
        let two = list.find_from_internal(&2).unwrap();
        let one = list.find_from_internal(&1).unwrap();
        let (one_ref, two_ref) = unsafe { (&*one, &*two) };

        let two_lock = two_ref.lock();
        let one_lock = one_ref.lock();
        two_ref.set_marked();

        assert!(!list.contains(&2));
        let mut seen = Vec::new();
        list.range(|value| {
            seen.push(*value);
            true
        });
        assert_eq!(seen, vec![1, 2, 3]);

        one_ref.set_next(two_ref.get_next());
        list.len.fetch_sub(1, Ordering::Release);
        drop(one_lock);
        drop(two_lock);
        unsafe { list.guard().defer_destroy(two, LazyListNode::dealloc_ptr) };

        assert_eq!(list.to_vec(), vec![1, 3]);
    }

    #[test]
    fn test_delete_waits_for_successor_lock() {
        let list = Arc::new(TestList::new());
        for value in [1, 2, 3] {
            list.insert(value);
        }

        let barrier = Arc::new(Barrier::new(2));
        let handle = {
            let list = Arc::clone(&list);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let _guard = DeferredGuard::pin();
                let two = list.find_from_internal(&2).unwrap();
                let two_lock = unsafe { (*two).lock() };
                barrier.wait();
                thread::sleep(std::time::Duration::from_millis(50));
                drop(two_lock);
            })
        };

        barrier.wait();
        // Blocks on 2's lock until the other thread releases it.
        assert!(list.delete(&2));
        handle.join().unwrap();

        assert_eq!(list.to_vec(), vec![1, 3]);
    }

    #[test]
    fn test_adjacent_deletes_do_not_deadlock() {
        let list = Arc::new(TestList::with_config(ListConfig::contended()));
        let rounds = 200;

        let handles: Vec<_> = (0..4)
            .map(|thread_id| {
                let list = Arc::clone(&list);
                thread::spawn(move || {
                    for round in 0..rounds {
                        for value in 0..16 {
                            if (value + thread_id + round) % 2 == 0 {
                                list.insert(value);
                            } else {
                                list.delete(&value);
                            }
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let values = list.to_vec();
        assert!(values.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(values.len(), list.len());
    }

    #[test]
    fn test_with_config_is_kept() {
        assert_eq!(TestList::new().config(), &ListConfig::immediate());

        let list = TestList::with_config(ListConfig::contended());
        assert_eq!(list.config().retry, crate::config::RetryStrategy::Backoff);

        // Backoff only changes pacing, not results.
        assert!(list.insert(1));
        assert!(!list.insert(1));
        assert!(list.delete(&1));
        assert!(list.is_empty());
    }

    #[test]
    fn test_counter_tracks_successes() {
        let list = TestList::new();
        assert!(list.is_empty());

        for value in 0..10 {
            list.insert(value);
        }
        list.insert(3);
        list.delete(&4);
        list.delete(&42);

        assert_eq!(list.len(), 9);
        assert!(!list.is_empty());
    }

    #[test]
    fn test_debug_formats_as_set() {
        let list = TestList::new();
        list.insert(2);
        list.insert(1);

        assert_eq!(format!("{:?}", list), "{1, 2}");
    }

    #[test]
    fn test_drop_frees_live_nodes() {
        use std::sync::atomic::AtomicUsize;

        static DROPS: AtomicUsize = AtomicUsize::new(0);

        #[derive(PartialEq, Eq, PartialOrd, Ord)]
        struct Tracked(i64);

        impl Drop for Tracked {
            fn drop(&mut self) {
                DROPS.fetch_add(1, Ordering::Relaxed);
            }
        }

        {
            let list: LazyList<Tracked, DeferredGuard> = LazyList::new();
            for value in 0..5 {
                list.insert(Tracked(value));
            }
            // Rejected duplicate is dropped right away.
            list.insert(Tracked(2));
            assert_eq!(DROPS.load(Ordering::Relaxed), 1);

            list.delete(&Tracked(0));
            // The lookup key passed to delete is dropped here too.
        }

        // 5 inserted + 1 duplicate + 1 delete key.
        assert_eq!(DROPS.load(Ordering::Relaxed), 7);
    }
}
