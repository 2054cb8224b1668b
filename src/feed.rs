use std::collections::VecDeque;

/// Fixed-capacity feed ordered newest-first. Pushing past capacity evicts
/// the oldest entry.
#[derive(Debug, Clone)]
pub struct RecencyFeed<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> RecencyFeed<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push_front(&mut self, item: T) {
        if self.capacity == 0 {
            return;
        }
        if self.items.len() == self.capacity {
            self.items.pop_back();
        }
        self.items.push_front(item);
    }

    /// Iterate newest to oldest
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    /// The `n` newest entries, newest first
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &T> {
        self.items.iter().take(n)
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
}

impl<T: Clone> RecencyFeed<T> {
    pub fn snapshot(&self, n: usize) -> Vec<T> {
        self.recent(n).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newest_first_and_bounded() {
        let mut feed = RecencyFeed::new(3);
        for i in 1..=5 {
            feed.push_front(i);
        }
        assert_eq!(feed.len(), 3);
        assert_eq!(feed.iter().copied().collect::<Vec<_>>(), vec![5, 4, 3]);
    }

    #[test]
    fn recent_takes_from_the_front() {
        let mut feed = RecencyFeed::new(24);
        for i in 0..30 {
            feed.push_front(i);
        }
        assert_eq!(feed.len(), 24);
        assert_eq!(feed.snapshot(2), vec![29, 28]);
        assert_eq!(feed.recent(100).count(), 24);
    }

    #[test]
    fn zero_capacity_stays_empty() {
        let mut feed = RecencyFeed::new(0);
        feed.push_front("x");
        assert!(feed.is_empty());
    }
}
