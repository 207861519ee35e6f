// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! An event that can only be triggered once.
//!
//! The logger uses one to announce that it has declared deadlock, and
//! [`Engine::run_for`](crate::engine::Engine::run_for) uses one to stop the
//! run.

use std::cell::Cell;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use futures::Future;
use futures::future::FusedFuture;

use super::Waiters;
use crate::sim_error;
use crate::traits::{BoxFuture, Event};
use crate::types::SimResult;

struct OnceState<T: Copy> {
    waiters: Waiters,
    triggered: Cell<bool>,
    result: Cell<T>,
}

/// A cloneable handle to an event that fires at most once.
///
/// All clones share the same state, so one clone can be kept by the
/// component that triggers it while others are handed out to listeners.
/// Listening after the event fired completes immediately.
#[derive(Clone)]
pub struct Once<T: Copy> {
    state: Rc<OnceState<T>>,
}

impl<T: Copy> Once<T> {
    pub fn new(value: T) -> Self {
        Self {
            state: Rc::new(OnceState {
                waiters: Waiters::default(),
                triggered: Cell::new(false),
                result: Cell::new(value),
            }),
        }
    }

    /// Trigger the event, waking all listeners.
    ///
    /// Returns an error if the event has already been triggered.
    pub fn notify(&self) -> SimResult {
        if self.state.triggered.replace(true) {
            return sim_error!("once event already triggered");
        }
        self.state.waiters.wake_all();
        Ok(())
    }

    /// Trigger the event with a value that listeners will receive.
    pub fn notify_result(&self, result: T) -> SimResult {
        self.state.result.set(result);
        self.notify()
    }

    #[must_use]
    pub fn is_triggered(&self) -> bool {
        self.state.triggered.get()
    }
}

impl Default for Once<()> {
    fn default() -> Self {
        Self::new(())
    }
}

impl<T: Copy + 'static> Event<T> for Once<T> {
    fn listen(&self) -> BoxFuture<'static, T> {
        Box::pin(OnceFuture {
            state: self.state.clone(),
            done: false,
        })
    }

    fn clone_dyn(&self) -> Box<dyn Event<T>> {
        Box::new(self.clone())
    }
}

pub struct OnceFuture<T: Copy> {
    state: Rc<OnceState<T>>,
    done: bool,
}

impl<T: Copy> Future for OnceFuture<T> {
    type Output = T;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if !self.state.triggered.get() {
            self.state.waiters.park(cx.waker());
            return Poll::Pending;
        }
        self.done = true;
        Poll::Ready(self.state.result.get())
    }
}

impl<T: Copy> FusedFuture for OnceFuture<T> {
    fn is_terminated(&self) -> bool {
        self.done
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_notify_fails() {
        let event = Once::new(3_u64);
        assert!(!event.is_triggered());
        event.notify_result(7).unwrap();
        assert!(event.is_triggered());
        assert_eq!(
            format!("{}", event.notify().unwrap_err()),
            "Error: once event already triggered"
        );
    }
}
