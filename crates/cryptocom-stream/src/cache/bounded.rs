/*
[INPUT]:  Records in arrival order and a retention bound
[OUTPUT]: FIFO-evicting append log
[POS]:    Cache layer - building block for trade logs
[UPDATE]: When eviction policy changes
*/

use std::collections::VecDeque;

/// Append-only log that keeps the newest `limit` entries by arrival.
#[derive(Debug, Clone)]
pub struct BoundedLog<T> {
    items: VecDeque<T>,
    limit: usize,
}

impl<T: Clone> BoundedLog<T> {
    pub fn new(limit: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(limit.min(1024)),
            limit: limit.max(1),
        }
    }

    pub fn push(&mut self, item: T) {
        if self.items.len() == self.limit {
            self.items.pop_front();
        }
        self.items.push_back(item);
    }

    /// Overwrite the newest entry, or append when empty
    pub fn replace_last(&mut self, item: T) {
        match self.items.back_mut() {
            Some(last) => *last = item,
            None => self.items.push_back(item),
        }
    }

    pub fn find_mut(&mut self, mut predicate: impl FnMut(&T) -> bool) -> Option<&mut T> {
        self.items.iter_mut().find(|item| predicate(item))
    }

    pub fn extend(&mut self, items: impl IntoIterator<Item = T>) {
        for item in items {
            self.push(item);
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn last(&self) -> Option<&T> {
        self.items.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    /// Oldest-first copy
    pub fn to_vec(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }
}
