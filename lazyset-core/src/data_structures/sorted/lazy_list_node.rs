use std::ptr;
use std::sync::atomic::{AtomicBool, AtomicPtr, Ordering};

use parking_lot::{Mutex, MutexGuard};

use crate::data_structures::SetNode;

pub(crate) type NodePtr<T> = *mut LazyListNode<T>;

/// A node of the lazy list.
///
/// `marked` and `next` are atomics because readers load them without taking
/// `lock`. Writers only change `next` (and set `marked`) while holding `lock`.
///
pub struct LazyListNode<T> {
    value: Option<T>,
    marked: AtomicBool,
    next: AtomicPtr<LazyListNode<T>>,
    lock: Mutex<()>,
}

impl<T> LazyListNode<T> {
    pub(crate) fn new(value: T) -> Self {
        LazyListNode {
            value: Some(value),
            marked: AtomicBool::new(false),
            next: AtomicPtr::new(ptr::null_mut()),
            lock: Mutex::new(()),
        }
    }

    pub(crate) fn new_sentinel() -> Self {
        LazyListNode {
            value: None,
            marked: AtomicBool::new(false),
            next: AtomicPtr::new(ptr::null_mut()),
            lock: Mutex::new(()),
        }
    }

    pub(crate) fn is_sentinel(&self) -> bool {
        self.value.is_none()
    }

    // =========================================================================
    // Mark and next pointer accessors
    // =========================================================================

    /// Load the mark (Acquire ordering)
    #[inline]
    pub fn is_marked(&self) -> bool {
        self.marked.load(Ordering::Acquire)
    }

    /// Store the mark (Release ordering). Caller holds `lock`.
    #[inline]
    pub(crate) fn set_marked(&self) {
        self.marked.store(true, Ordering::Release)
    }

    /// Load next pointer (Acquire ordering)
    #[inline]
    pub(crate) fn get_next(&self) -> NodePtr<T> {
        self.next.load(Ordering::Acquire)
    }

    /// Store next pointer (Release ordering). Caller holds `lock`, or owns
    /// the node before it is published.
    #[inline]
    pub(crate) fn set_next(&self, next: NodePtr<T>) {
        self.next.store(next, Ordering::Release)
    }

    #[inline]
    pub(crate) fn lock(&self) -> MutexGuard<'_, ()> {
        self.lock.lock()
    }
}

impl<T: Ord> LazyListNode<T> {
    /// True when this node sorts strictly before `value`. Never true for the
    /// sentinel, which is only ever a predecessor.
    #[inline]
    pub(crate) fn precedes(&self, value: &T) -> bool {
        self.value.as_ref().is_some_and(|own| own < value)
    }

    #[inline]
    pub(crate) fn holds(&self, value: &T) -> bool {
        self.value.as_ref() == Some(value)
    }
}

impl<T> SetNode<T> for LazyListNode<T> {
    fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    fn is_marked(&self) -> bool {
        LazyListNode::is_marked(self)
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for LazyListNode<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyListNode")
            .field("value", &self.value)
            .field("marked", &self.is_marked())
            .field("next", &self.get_next())
            .finish()
    }
}
