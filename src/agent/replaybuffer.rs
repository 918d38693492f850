use super::episode::Episode;

use std::collections::VecDeque;

/// The most recent games, oldest evicted first.
pub struct ReplayBuffer {
    pub buffer: VecDeque<Vec<Episode>>,
    pub capacity: usize
}

impl ReplayBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
            capacity
        }
    }

    pub fn add(&mut self, episodes: Vec<Episode>) {
        if self.capacity == 0 {
            return;
        }
        if self.buffer.len() == self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(episodes);
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vec<Episode>> {
        self.buffer.iter()
    }
}
