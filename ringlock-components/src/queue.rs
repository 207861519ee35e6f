// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! A bounded FIFO.
//!
//! The [BoundedQueue] holds at most `capacity` objects. A push to a full
//! queue is rejected with [`FlowError::QueueFull`] and the object is handed
//! back to the caller through the error path. It is never dropped by the
//! queue itself.
//!
//! The queue is a plain data structure owned by the model that uses it. Only
//! the owner ever mutates it.
//!
//! ```rust
//! use ringlock_components::queue::BoundedQueue;
//! use ringlock_components::types::FlowError;
//! use ringlock_engine::engine::Engine;
//!
//! let engine = Engine::default();
//! let mut queue = BoundedQueue::new(engine.top(), "queue", 2).unwrap();
//! queue.push(1_usize).unwrap();
//! queue.push(2).unwrap();
//! assert_eq!(queue.push(3), Err(FlowError::QueueFull));
//! assert_eq!(queue.pop(), Some(1));
//! assert_eq!(queue.free_slots(), 1);
//! ```

use std::collections::VecDeque;
use std::rc::Rc;

use ringlock_engine::config_mismatch;
use ringlock_engine::traits::SimObject;
use ringlock_engine::types::SimError;
use ringlock_track::entity::Entity;
use ringlock_track::{enter, exit};

use crate::types::FlowError;

pub struct BoundedQueue<T>
where
    T: SimObject,
{
    pub entity: Rc<Entity>,
    capacity: usize,
    data: VecDeque<T>,
    max_level: usize,
}

impl<T> BoundedQueue<T>
where
    T: SimObject,
{
    /// Create a queue that can hold `capacity` objects.
    ///
    /// Returns a `ConfigMismatch` error if `capacity` is 0.
    pub fn new(parent: &Rc<Entity>, name: &str, capacity: usize) -> Result<Self, SimError> {
        let entity = Rc::new(Entity::new(parent, name));
        if capacity == 0 {
            return config_mismatch!(entity, "capacity", "must be at least 1");
        }
        Ok(Self {
            entity,
            capacity,
            data: VecDeque::with_capacity(capacity),
            max_level: 0,
        })
    }

    /// Append an object unless the queue is full.
    pub fn push(&mut self, value: T) -> Result<(), FlowError> {
        if self.is_full() {
            return Err(FlowError::QueueFull);
        }
        enter!(self.entity ; value.id());
        self.data.push_back(value);
        self.max_level = self.max_level.max(self.data.len());
        Ok(())
    }

    pub fn pop(&mut self) -> Option<T> {
        let value = self.data.pop_front()?;
        exit!(self.entity ; value.id());
        Some(value)
    }

    #[must_use]
    pub fn front(&self) -> Option<&T> {
        self.data.front()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.data.len() >= self.capacity
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn free_slots(&self) -> usize {
        self.capacity - self.data.len()
    }

    /// The highest occupancy the queue has reached.
    #[must_use]
    pub fn max_level(&self) -> usize {
        self.max_level
    }
}

#[cfg(test)]
mod tests {
    use ringlock_track::entity::toplevel;
    use ringlock_track::tracker::dev_null_tracker;

    use super::*;

    #[test]
    fn zero_capacity_fails() {
        let tracker = dev_null_tracker();
        let top = toplevel(&tracker, "top");
        let err = BoundedQueue::<usize>::new(&top, "queue", 0)
            .err()
            .unwrap();
        assert_eq!(
            format!("{err}"),
            "Error: ConfigMismatch: top::queue.capacity: must be at least 1"
        );
    }

    #[test]
    fn never_exceeds_capacity() {
        let tracker = dev_null_tracker();
        let top = toplevel(&tracker, "top");
        let mut queue = BoundedQueue::new(&top, "queue", 3).unwrap();

        let mut rejected = 0;
        for i in 0..10_usize {
            if queue.push(i).is_err() {
                rejected += 1;
            }
            assert!(queue.len() <= queue.capacity());
        }
        assert_eq!(rejected, 7);
        assert_eq!(queue.max_level(), 3);
        assert!(queue.is_full());
        assert_eq!(queue.free_slots(), 0);
    }

    #[test]
    fn first_in_first_out() {
        let tracker = dev_null_tracker();
        let top = toplevel(&tracker, "top");
        let mut queue = BoundedQueue::new(&top, "queue", 4).unwrap();
        for i in [5_usize, 6, 7] {
            queue.push(i).unwrap();
        }
        assert_eq!(queue.front(), Some(&5));
        assert_eq!(queue.pop(), Some(5));
        assert_eq!(queue.pop(), Some(6));
        assert_eq!(queue.pop(), Some(7));
        assert_eq!(queue.pop(), None);
        assert!(queue.is_empty());
    }
}
