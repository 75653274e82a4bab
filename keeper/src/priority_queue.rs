//! Time-ordered queue of scenario actions (min-heap by time)

use priority_queue::PriorityQueue;
use std::cmp::Reverse;
use std::collections::HashMap;

use crate::scenario::Action;

/// Scenario actions ordered by time, ties broken by file order
pub struct ActionQueue {
    /// Priority queue keyed by insertion index (Reverse for min-heap)
    queue: PriorityQueue<usize, Reverse<(u64, usize)>>,
    /// Map for O(1) lookups
    actions: HashMap<usize, Action>,
    next_index: usize,
}

impl ActionQueue {
    pub fn new() -> Self {
        Self {
            queue: PriorityQueue::new(),
            actions: HashMap::new(),
            next_index: 0,
        }
    }

    pub fn push(&mut self, action: Action) {
        let index = self.next_index;
        self.next_index += 1;

        self.queue.push(index, Reverse((action.at, index)));
        self.actions.insert(index, action);
    }

    /// Pop the earliest action if it is due at `now`
    pub fn pop_due(&mut self, now: u64) -> Option<Action> {
        let (_, Reverse((at, _))) = self.queue.peek()?;
        if *at > now {
            return None;
        }
        let (index, _priority) = self.queue.pop()?;
        self.actions.remove(&index)
    }

    /// Time of the earliest queued action
    pub fn next_at(&self) -> Option<u64> {
        self.queue.peek().map(|(_, Reverse((at, _)))| *at)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl Default for ActionQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl FromIterator<Action> for ActionQueue {
    fn from_iter<I: IntoIterator<Item = Action>>(iter: I) -> Self {
        let mut queue = Self::new();
        for action in iter {
            queue.push(action);
        }
        queue
    }
}
