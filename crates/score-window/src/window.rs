//! Fixed-capacity drop-oldest score window

use std::collections::VecDeque;

/// Bounded FIFO of scores; pushing at capacity evicts exactly the oldest
#[derive(Debug, Clone)]
pub struct BoundedWindow {
    items: VecDeque<f32>,
    capacity: usize,
}

impl BoundedWindow {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "window capacity must be positive");
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a score, evicting the oldest entry when at capacity
    pub fn push(&mut self, score: f32) {
        if self.items.len() == self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(score);
    }

    /// Sum the window would hold after pushing `score`.
    ///
    /// Exactly equal to `push(score)` followed by `sum()`, without mutating.
    pub fn projected_sum(&self, score: f32) -> f32 {
        let evicted = if self.items.len() == self.capacity {
            self.items.front().copied().unwrap_or(0.0)
        } else {
            0.0
        };
        self.sum() - evicted + score
    }

    /// Sum of current contents, computed fresh each call
    pub fn sum(&self) -> f32 {
        self.items.iter().sum()
    }

    /// Mean of current contents, 0.0 when empty
    pub fn mean(&self) -> f32 {
        if self.items.is_empty() {
            0.0
        } else {
            self.sum() / self.items.len() as f32
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest-to-newest iterator over current contents
    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        self.items.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn push_within_capacity_keeps_all() {
        let mut w = BoundedWindow::new(5);
        for i in 0..5 {
            w.push(i as f32);
        }
        assert_eq!(w.len(), 5);
        assert_eq!(w.sum(), 10.0);
    }

    #[test]
    fn overflow_evicts_exactly_the_oldest() {
        let mut w = BoundedWindow::new(5);
        for i in 0..6 {
            w.push(i as f32);
        }
        assert_eq!(w.len(), 5);
        let items: Vec<f32> = w.iter().collect();
        assert_eq!(items, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn mean_of_empty_window_is_zero() {
        let w = BoundedWindow::new(30);
        assert_eq!(w.mean(), 0.0);
    }

    #[test]
    fn majority_examples() {
        // [1,1,1] -> sum 3, attentive
        let mut w = BoundedWindow::new(5);
        for _ in 0..3 {
            w.push(1.0);
        }
        assert!(w.sum() >= 3.0);

        // [0.5 x4] -> sum 2.0, not attentive
        let mut w = BoundedWindow::new(5);
        for _ in 0..4 {
            w.push(0.5);
        }
        assert!(w.sum() < 3.0);

        // [1,1,0.5,0.5] -> sum 3.0, attentive
        let mut w = BoundedWindow::new(5);
        for s in [1.0, 1.0, 0.5, 0.5] {
            w.push(s);
        }
        assert!(w.sum() >= 3.0);
    }

    proptest! {
        #[test]
        fn never_exceeds_capacity(
            cap in 1usize..40,
            scores in proptest::collection::vec(0.0f32..=1.0, 0..100),
        ) {
            let mut w = BoundedWindow::new(cap);
            for s in scores {
                w.push(s);
                prop_assert!(w.len() <= cap);
            }
        }

        #[test]
        fn projected_sum_matches_push_then_sum(
            scores in proptest::collection::vec(0.0f32..=1.0, 0..30),
            next in 0.0f32..=1.0,
        ) {
            let mut w = BoundedWindow::new(5);
            for s in scores {
                w.push(s);
            }
            let projected = w.projected_sum(next);
            w.push(next);
            prop_assert!((projected - w.sum()).abs() < 1e-5);
        }
    }
}
