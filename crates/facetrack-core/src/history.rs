//! Fixed-capacity history buffer used for per-track attribute samples.

use std::collections::VecDeque;
use std::fmt;

/// Fixed-capacity FIFO buffer. Pushing onto a full buffer drops the oldest item.
#[derive(Clone)]
pub struct BoundedHistory<T> {
    deque: VecDeque<T>,
    capacity: usize,
}

impl<T: fmt::Debug> fmt::Debug for BoundedHistory<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedHistory")
            .field("capacity", &self.capacity)
            .field("items", &self.deque)
            .finish()
    }
}

impl<T> BoundedHistory<T> {
    #[inline]
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            deque: VecDeque::with_capacity(cap),
            capacity: cap,
        }
    }

    /// Append `item` as the newest entry, returning the evicted oldest entry if full.
    ///
    /// A zero-capacity buffer retains nothing and hands `item` straight back.
    #[inline]
    pub fn push(&mut self, item: T) -> Option<T> {
        if self.capacity == 0 {
            return Some(item);
        }

        let evicted = if self.is_full() {
            self.deque.pop_front()
        } else {
            None
        };

        self.deque.push_back(item);

        evicted
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.deque.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.deque.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.deque.len() >= self.capacity
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn clear(&mut self) {
        self.deque.clear()
    }

    #[inline]
    pub fn newest(&self) -> Option<&T> {
        self.deque.back()
    }

    #[inline]
    pub fn oldest(&self) -> Option<&T> {
        self.deque.front()
    }

    /// Oldest to newest.
    #[inline]
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &'_ T> + ExactSizeIterator {
        self.deque.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_until_full() {
        let mut h = BoundedHistory::with_capacity(3);
        assert!(h.is_empty());
        assert_eq!(h.push(1), None);
        assert_eq!(h.push(2), None);
        assert!(!h.is_full());
        assert_eq!(h.push(3), None);
        assert!(h.is_full());
        assert_eq!(h.len(), 3);
    }

    #[test]
    fn test_push_evicts_oldest_first() {
        let mut h = BoundedHistory::with_capacity(3);
        for i in 1..=3 {
            h.push(i);
        }
        assert_eq!(h.push(4), Some(1));
        assert_eq!(h.push(5), Some(2));
        assert_eq!(h.iter().copied().collect::<Vec<_>>(), vec![3, 4, 5]);
        assert_eq!(h.oldest(), Some(&3));
        assert_eq!(h.newest(), Some(&5));
    }

    #[test]
    fn test_len_never_exceeds_capacity() {
        let mut h = BoundedHistory::with_capacity(5);
        for i in 0..1000 {
            h.push(i);
            assert!(h.len() <= h.capacity());
        }
        assert_eq!(h.len(), 5);
    }

    #[test]
    fn test_zero_capacity_retains_nothing() {
        let mut h = BoundedHistory::with_capacity(0);
        assert_eq!(h.push(7), Some(7));
        assert!(h.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut h = BoundedHistory::with_capacity(2);
        h.push("a");
        h.push("b");
        h.clear();
        assert!(h.is_empty());
        assert_eq!(h.capacity(), 2);
    }

    #[test]
    fn test_clone_is_independent() {
        let mut h = BoundedHistory::with_capacity(2);
        h.push(1);
        let mut copy = h.clone();
        copy.push(2);
        copy.push(3);
        assert_eq!(h.iter().copied().collect::<Vec<_>>(), vec![1]);
        assert_eq!(copy.iter().copied().collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(copy.capacity(), 2);
    }
}
