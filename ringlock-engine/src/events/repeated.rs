// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! An event that can be triggered any number of times.
//!
//! A listener only sees notifications that happen after it started
//! listening. Channels use one to wake their delivery task when a new object
//! is sent.

use std::cell::Cell;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use futures::Future;
use futures::future::FusedFuture;

use super::Waiters;
use crate::traits::{BoxFuture, Event};

struct RepeatedState<T: Copy> {
    waiters: Waiters,
    result: Cell<T>,
}

#[derive(Clone)]
pub struct Repeated<T: Copy> {
    state: Rc<RepeatedState<T>>,
}

impl<T: Copy> Repeated<T> {
    pub fn new(value: T) -> Self {
        Self {
            state: Rc::new(RepeatedState {
                waiters: Waiters::default(),
                result: Cell::new(value),
            }),
        }
    }

    pub fn notify(&self) {
        self.state.waiters.wake_all();
    }

    /// Notify with a new value; later notifications without a value repeat
    /// it.
    pub fn notify_result(&self, result: T) {
        self.state.result.set(result);
        self.notify();
    }
}

impl Default for Repeated<()> {
    fn default() -> Self {
        Self::new(())
    }
}

impl<T: Copy + 'static> Event<T> for Repeated<T> {
    fn listen(&self) -> BoxFuture<'static, T> {
        Box::pin(RepeatedFuture {
            state: self.state.clone(),
            parked: false,
            done: false,
        })
    }

    fn clone_dyn(&self) -> Box<dyn Event<T>> {
        Box::new(self.clone())
    }
}

pub struct RepeatedFuture<T: Copy> {
    state: Rc<RepeatedState<T>>,
    parked: bool,
    done: bool,
}

impl<T: Copy> Future for RepeatedFuture<T> {
    type Output = T;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        // The first poll only registers, so past notifications are not seen
        if !self.parked {
            self.parked = true;
            self.state.waiters.park(cx.waker());
            return Poll::Pending;
        }
        self.done = true;
        Poll::Ready(self.state.result.get())
    }
}

impl<T: Copy> FusedFuture for RepeatedFuture<T> {
    fn is_terminated(&self) -> bool {
        self.done
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Engine;
    use crate::test_helpers::start_test;
    use crate::time::PS_PER_NS;

    #[test]
    fn listener_sees_later_values() {
        let mut engine: Engine = start_test(file!());
        let event = Repeated::new(0_u32);
        let seen = Rc::new(Cell::new(0));

        {
            let event = event.clone();
            let seen = seen.clone();
            engine.spawn(async move {
                seen.set(event.listen().await);
                Ok(())
            });
        }
        let clock = engine.clock_ps(PS_PER_NS);
        engine.spawn(async move {
            clock.wait_ticks(3).await;
            event.notify_result(5);
            Ok(())
        });

        engine.run().unwrap();
        assert_eq!(seen.get(), 5);
    }
}
