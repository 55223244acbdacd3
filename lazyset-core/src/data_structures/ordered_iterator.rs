//! Ordered input for `SortedSet::insert_batch`.
//!
//! A batch insert reuses the previously inserted node as the starting point of
//! the next search, which only pays off when values arrive in ascending order.
//! `OrderedIterator` marks iterators that promise this.
//!
//! ```ignore
//! use lazyset_core::data_structures::{Ordered, ordered_from_vec};
//!
//! set.insert_batch(Ordered::new(vec![1, 2, 3].into_iter()));
//! set.insert_batch(ordered_from_vec(vec![9, 7, 8]));
//! ```

use std::iter::FusedIterator;

/// Marker trait for iterators yielding values in non-descending order.
///
/// Breaking the promise does not corrupt a set: a value that does not sort
/// after the previous one simply falls back to a search from the head.
pub trait OrderedIterator: Iterator
where
    Self::Item: Ord,
{
}

/// Wrapper that checks the ascending order at runtime.
///
/// # Panics
///
/// `next` panics when a value is smaller than the one before it.
#[derive(Debug, Clone)]
pub struct Ordered<I: Iterator>
where
    I::Item: Ord + Clone,
{
    inner: I,
    last: Option<I::Item>,
}

impl<I: Iterator> Ordered<I>
where
    I::Item: Ord + Clone,
{
    #[inline]
    pub fn new(iter: I) -> Self {
        Ordered {
            inner: iter,
            last: None,
        }
    }
}

impl<I: Iterator> Iterator for Ordered<I>
where
    I::Item: Ord + Clone,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.inner.next()?;

        if let Some(last) = &self.last {
            assert!(last <= &item, "Ordered input went backwards");
        }

        self.last = Some(item.clone());
        Some(item)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<I: Iterator> OrderedIterator for Ordered<I> where I::Item: Ord + Clone {}

impl<I: FusedIterator> FusedIterator for Ordered<I> where I::Item: Ord + Clone {}

/// Sort a Vec and wrap it as ordered input.
#[inline]
pub fn ordered_from_vec<T: Ord + Clone>(mut values: Vec<T>) -> Ordered<std::vec::IntoIter<T>> {
    values.sort_unstable();
    Ordered::new(values.into_iter())
}
