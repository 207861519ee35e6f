// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! This module represents the time during a simulation.

use std::cell::Cell;
use std::rc::Rc;

use ringlock_track::entity::Entity;
use ringlock_track::set_time;

use crate::time::clock::{Clock, TaskWaker};

/// The overall owner of time within a simulation.
///
/// Contains all Clocks and the current simulation time in picoseconds.
#[derive(Clone)]
pub struct SimTime {
    pub entity: Rc<Entity>,

    /// Shared with every clock so that they all see the same time.
    current_ps: Rc<Cell<u64>>,

    /// Clocks are created on demand, one per distinct period, in creation
    /// order. That order breaks ties between clocks with events at the same
    /// time.
    clocks: Vec<Clock>,
}

impl SimTime {
    #[must_use]
    pub fn new(parent: &Rc<Entity>) -> Self {
        Self {
            entity: Rc::new(Entity::new(parent, "time")),
            current_ps: Rc::new(Cell::new(0)),
            clocks: Vec::new(),
        }
    }

    /// Return the clock with `period_ps`, creating it on first use.
    pub fn get_clock(&mut self, period_ps: u64) -> Clock {
        if let Some(clock) = self.clocks.iter().find(|c| c.period_ps() == period_ps) {
            return clock.clone();
        }
        let clock = Clock::new(period_ps, self.current_ps.clone());
        self.clocks.push(clock.clone());
        clock
    }

    /// Move time to the earliest pending clock edge and return the tasks
    /// waiting for it. Ties go to the clock created first.
    pub fn advance_time(&mut self) -> Option<Vec<TaskWaker>> {
        // `min_by_key` returns the first of equal elements
        let next_clock = self.clocks.iter().min_by_key(|c| c.time_of_next())?;
        let (next_ps, wakers) = next_clock.pop_next()?;
        if next_ps > self.current_ps.get() {
            set_time!(self.entity ; next_ps);
            self.current_ps.set(next_ps);
        }
        Some(wakers)
    }

    #[must_use]
    pub fn time_now_ps(&self) -> u64 {
        self.current_ps.get()
    }

    /// The simulation can exit once only background tasks are waiting.
    #[must_use]
    pub fn can_exit(&self) -> bool {
        self.clocks.iter().all(Clock::only_background_waiting)
    }
}

#[cfg(test)]
mod tests {
    use ringlock_track::entity::toplevel;
    use ringlock_track::tracker::dev_null_tracker;

    use super::*;

    #[test]
    fn clock_created_once() {
        let tracker = dev_null_tracker();
        let top = toplevel(&tracker, "top");

        let mut time = SimTime::new(&top);
        let _clk1 = time.get_clock(1000);
        assert_eq!(time.clocks.len(), 1);

        let _clk2 = time.get_clock(1000);
        assert_eq!(time.clocks.len(), 1);
    }

    #[test]
    fn create_different_clocks() {
        let tracker = dev_null_tracker();
        let top = toplevel(&tracker, "top");

        let mut time = SimTime::new(&top);
        let _clk1 = time.get_clock(1000);
        let _clk2 = time.get_clock(3000);
        assert_eq!(time.clocks.len(), 2);
    }

    #[test]
    fn nothing_to_advance() {
        let tracker = dev_null_tracker();
        let top = toplevel(&tracker, "top");

        let mut time = SimTime::new(&top);
        let _clk = time.get_clock(1000);
        assert!(time.advance_time().is_none());
        assert!(time.can_exit());
        assert_eq!(time.time_now_ps(), 0);
    }
}
