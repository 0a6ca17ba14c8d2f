//! Round-robin slot selection.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Shared cursor that spreads requests over the pool.
///
/// Only the increment is atomic. Picking a slot is not serialized with using
/// it, so overlapping requests may land on the same session.
#[derive(Debug)]
pub struct RoundRobin {
    counter: AtomicUsize,
    size: NonZeroUsize,
}

impl RoundRobin {
    pub fn new(size: NonZeroUsize) -> Self {
        Self::starting_at(0, size)
    }

    /// Create a cursor whose counter already holds `start`
    pub fn starting_at(start: usize, size: NonZeroUsize) -> Self {
        Self {
            counter: AtomicUsize::new(start),
            size,
        }
    }

    /// Increment the counter and return the new value reduced modulo the pool size.
    ///
    /// The counter wraps on overflow.
    pub fn next_index(&self) -> usize {
        let value = self.counter.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        value % self.size.get()
    }

    pub fn size(&self) -> usize {
        self.size.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn size(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn test_sixteen_calls_visit_every_slot_once() {
        let cursor = RoundRobin::new(size(16));
        let visited: Vec<usize> = (0..16).map(|_| cursor.next_index()).collect();
        let expected: Vec<usize> = (1..16).chain(std::iter::once(0)).collect();
        assert_eq!(visited, expected);
    }

    #[test]
    fn test_starting_value_is_respected() {
        let cursor = RoundRobin::starting_at(30, size(16));
        assert_eq!(cursor.next_index(), 15);
        assert_eq!(cursor.next_index(), 0);
        assert_eq!(cursor.next_index(), 1);
    }

    #[test]
    fn test_counter_wraps_on_overflow() {
        let cursor = RoundRobin::starting_at(usize::MAX - 1, size(16));
        assert_eq!(cursor.next_index(), usize::MAX % 16);
        assert_eq!(cursor.next_index(), 0);
        assert_eq!(cursor.next_index(), 1);
    }

    #[test]
    fn test_single_slot_always_zero() {
        let cursor = RoundRobin::new(size(1));
        assert!((0..5).all(|_| cursor.next_index() == 0));
    }

    #[test]
    fn test_concurrent_callers_see_consecutive_values() {
        let cursor = Arc::new(RoundRobin::new(size(16)));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cursor = cursor.clone();
                std::thread::spawn(move || (0..64).map(|_| cursor.next_index()).collect::<Vec<_>>())
            })
            .collect();

        let mut hits = [0usize; 16];
        for handle in handles {
            for index in handle.join().unwrap() {
                hits[index] += 1;
            }
        }
        // 512 consecutive counter values cover each slot exactly 32 times
        assert!(hits.iter().all(|&n| n == 32));
    }
}
