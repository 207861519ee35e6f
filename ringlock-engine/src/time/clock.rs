// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! A clock ticking at a fixed period on the shared simulation timeline.
//!
//! All time is kept as an integer number of picoseconds so that periods such
//! as `3ms` and delays such as `1ps` can be mixed exactly and the order of
//! events is fully deterministic.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

/// A clock tick index. Tick `n` of a clock happens at `n * period_ps`.
pub type ClockTick = u64;

/// A clock with a fixed period. Clones share the same wait queue.
#[derive(Clone)]
pub struct Clock {
    period_ps: u64,
    state: Rc<ClockState>,
}

/// A task parked until a clock edge.
pub struct TaskWaker {
    pub waker: Waker,

    /// Set for background tasks that should not keep the simulation alive,
    /// such as the logger polling loop.
    pub can_exit: bool,
}

struct ClockState {
    /// The current simulation time, shared by all clocks.
    now_ps: Rc<Cell<u64>>,

    /// Parked tasks by the tick they wait for, woken in parking order.
    waiting: RefCell<BTreeMap<ClockTick, Vec<TaskWaker>>>,
}

impl Clock {
    /// Create a new [Clock] with the specified period sharing the time `now_ps`.
    ///
    /// # Panics
    ///
    /// If the period is zero.
    pub fn new(period_ps: u64, now_ps: Rc<Cell<u64>>) -> Self {
        assert!(period_ps > 0, "Clock period must be non-zero");
        Self {
            period_ps,
            state: Rc::new(ClockState {
                now_ps,
                waiting: RefCell::new(BTreeMap::new()),
            }),
        }
    }

    /// Returns the clock period in picoseconds.
    #[must_use]
    pub fn period_ps(&self) -> u64 {
        self.period_ps
    }

    /// Returns the most recent [ClockTick] at or before the current time.
    #[must_use]
    pub fn tick_now(&self) -> ClockTick {
        self.state.now_ps.get() / self.period_ps
    }

    /// Returns the current time in picoseconds.
    #[must_use]
    pub fn time_now_ps(&self) -> u64 {
        self.state.now_ps.get()
    }

    /// Returns the time in picoseconds of the next event registered with this
    /// clock.
    #[must_use]
    pub fn time_of_next(&self) -> u64 {
        let waiting = self.state.waiting.borrow();
        waiting
            .keys()
            .next()
            .map_or(u64::MAX, |tick| self.to_ps(*tick))
    }

    /// Remove the tasks waiting for the earliest pending edge, returning
    /// the time of that edge.
    pub(crate) fn pop_next(&self) -> Option<(u64, Vec<TaskWaker>)> {
        let (tick, wakers) = self.state.waiting.borrow_mut().pop_first()?;
        Some((self.to_ps(tick), wakers))
    }

    /// Whether every task waiting on this clock is a background task.
    pub(crate) fn only_background_waiting(&self) -> bool {
        self.state
            .waiting
            .borrow()
            .values()
            .flatten()
            .all(|task_waker| task_waker.can_exit)
    }

    /// Convert the given [ClockTick] to a time in picoseconds for this clock.
    #[must_use]
    pub fn to_ps(&self, tick: ClockTick) -> u64 {
        tick * self.period_ps
    }

    /// Returns a [ClockDelay] future which must be `await`ed to delay until
    /// the `ticks`-th next clock edge.
    #[must_use = "Futures do nothing unless you `.await` or otherwise use them"]
    pub fn wait_ticks(&self, ticks: u64) -> ClockDelay {
        self.delay(ticks, false)
    }

    /// Returns a [ClockDelay] future which must be `await`ed to delay the
    /// specified number of ticks. However, if the remainder of the simulation
    /// completes then this future is allowed to not complete. This allows the
    /// user to create tasks that can run continuously as long as the rest of
    /// the simulation continues to run.
    #[must_use = "Futures do nothing unless you `.await` or otherwise use them"]
    pub fn wait_ticks_or_exit(&self, ticks: u64) -> ClockDelay {
        self.delay(ticks, true)
    }

    fn delay(&self, ticks: u64, can_exit: bool) -> ClockDelay {
        let until = self.tick_now() + ticks;
        ClockDelay {
            clock: self.clone(),
            until,
            until_ps: self.to_ps(until),
            scheduled: false,
            can_exit,
        }
    }
}

/// Future returned by the clock to manage advancing time using async functions.
pub struct ClockDelay {
    clock: Clock,
    until: ClockTick,
    until_ps: u64,
    scheduled: bool,
    can_exit: bool,
}

impl Future for ClockDelay {
    type Output = ();
    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.clock.time_now_ps() >= self.until_ps {
            return Poll::Ready(());
        }
        // A task woken early by something else stays parked where it is
        if !self.scheduled {
            self.scheduled = true;
            let task_waker = TaskWaker {
                waker: cx.waker().clone(),
                can_exit: self.can_exit,
            };
            self.clock
                .state
                .waiting
                .borrow_mut()
                .entry(self.until)
                .or_default()
                .push(task_waker);
        }
        Poll::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn convert_to_ps() {
        let now = Rc::new(Cell::new(0));
        let clk_ms = Clock::new(1_000_000_000, now.clone());
        assert_eq!(3_000_000_000, clk_ms.to_ps(3));

        let clk_ps = Clock::new(1, now);
        assert_eq!(7, clk_ps.to_ps(7));
    }

    #[test]
    fn tick_now_rounds_down() {
        let now = Rc::new(Cell::new(0));
        let clk = Clock::new(3, now.clone());
        assert_eq!(clk.tick_now(), 0);

        now.set(8);
        assert_eq!(clk.tick_now(), 2);

        now.set(9);
        assert_eq!(clk.tick_now(), 3);
    }

    #[test]
    fn no_events_is_max_time() {
        let clk = Clock::new(5, Rc::new(Cell::new(0)));
        assert_eq!(clk.time_of_next(), u64::MAX);
        assert!(clk.pop_next().is_none());
        assert!(clk.only_background_waiting());
    }
}
