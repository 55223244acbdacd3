//! Guard that keeps every unlinked node alive until it is dropped.

use std::collections::HashSet;

use parking_lot::Mutex;

use super::Guard;

/// Defers all node destruction until the guard itself is dropped.
///
/// A collection owning a `DeferredGuard` frees its removed nodes together with
/// its live ones, which makes destruction timing predictable in tests. Memory
/// grows with the number of deletes, so it is not meant for long-running use.
///
pub struct DeferredGuard {
    retired: Mutex<Retired>,
}

#[derive(Default)]
struct Retired {
    nodes: Vec<RetiredNode>,
    addresses: HashSet<usize>,
}

struct RetiredNode {
    ptr: *mut (),
    dealloc: unsafe fn(*mut ()),
}

// Safety: the pointer is only dereferenced by `dealloc` on drop, and all
// access to the list goes through the mutex.
unsafe impl Send for RetiredNode {}

impl DeferredGuard {
    pub fn new() -> Self {
        DeferredGuard {
            retired: Mutex::new(Retired::default()),
        }
    }

    /// Number of nodes waiting for the guard to drop.
    pub fn retired_count(&self) -> usize {
        self.retired.lock().nodes.len()
    }
}

impl Default for DeferredGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for DeferredGuard {
    fn drop(&mut self) {
        let retired = self.retired.get_mut();

        tracing::debug!(nodes = retired.nodes.len(), "releasing retired nodes");

        for node in retired.nodes.drain(..) {
            unsafe {
                (node.dealloc)(node.ptr);
            }
        }
    }
}

impl Guard for DeferredGuard {
    /// Nothing is freed before the owning collection drops, so reads need no
    /// protection of their own.
    type ReadGuard = ();

    fn pin() -> Self::ReadGuard {}

    unsafe fn defer_destroy<N: Send + 'static>(&self, node: *mut N, dealloc: unsafe fn(*mut N)) {
        let mut retired = self.retired.lock();

        // A node retired twice would be freed twice.
        if !retired.addresses.insert(node as usize) {
            panic!("node {:#x} retired twice", node as usize);
        }

        retired.nodes.push(RetiredNode {
            ptr: node as *mut (),
            dealloc: unsafe {
                std::mem::transmute::<unsafe fn(*mut N), unsafe fn(*mut ())>(dealloc)
            },
        });
    }
}
