// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! Single-threaded executor driving all node and logger tasks.
//!
//! Woken tasks are polled in the order they were woken. When nothing is left
//! to poll, time advances to the earliest clock edge any task waits for and
//! the waiters of that edge are woken.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

use ringlock_track::entity::Entity;
use ringlock_track::trace;

use crate::time::clock::Clock;
use crate::time::simtime::SimTime;
use crate::types::SimResult;

type TaskFuture = Pin<Box<dyn Future<Output = SimResult>>>;

struct Task {
    future: RefCell<TaskFuture>,
    queue: Rc<RunQueue>,
}

/// Tasks woken since they were last polled, plus the simulation time.
struct RunQueue {
    woken: RefCell<Vec<Rc<Task>>>,
    time: RefCell<SimTime>,
}

impl RunQueue {
    fn push(self: &Rc<Self>, future: impl Future<Output = SimResult> + 'static) {
        let task = Rc::new(Task {
            future: RefCell::new(Box::pin(future)),
            queue: self.clone(),
        });
        self.woken.borrow_mut().push(task);
    }
}

// The waker data pointer is always an `Rc<Task>` turned into a raw pointer.
const VTABLE: RawWakerVTable = RawWakerVTable::new(clone_waker, wake, wake_by_ref, drop_waker);

fn raw_waker(task: Rc<Task>) -> RawWaker {
    RawWaker::new(Rc::into_raw(task).cast::<()>(), &VTABLE)
}

unsafe fn clone_waker(data: *const ()) -> RawWaker {
    unsafe {
        Rc::increment_strong_count(data.cast::<Task>());
        raw_waker(Rc::from_raw(data.cast::<Task>()))
    }
}

unsafe fn wake(data: *const ()) {
    unsafe {
        let task = Rc::from_raw(data.cast::<Task>());
        task.queue.clone().woken.borrow_mut().push(task);
    }
}

unsafe fn wake_by_ref(data: *const ()) {
    unsafe {
        Rc::increment_strong_count(data.cast::<Task>());
        wake(data);
    }
}

unsafe fn drop_waker(data: *const ()) {
    unsafe { drop(Rc::from_raw(data.cast::<Task>())) }
}

fn waker_for(task: Rc<Task>) -> Waker {
    unsafe { Waker::from_raw(raw_waker(task)) }
}

/// Polls tasks and advances time. Cloning shares the same queue.
#[derive(Clone)]
pub struct Executor {
    pub entity: Rc<Entity>,
    queue: Rc<RunQueue>,
}

impl Executor {
    /// Run until `finished` is set, no task is waiting any more, or only
    /// tasks waiting in a
    /// [`wait_ticks_or_exit`](crate::time::clock::Clock::wait_ticks_or_exit)
    /// remain.
    pub fn run(&self, finished: &Cell<bool>) -> SimResult {
        loop {
            self.poll_woken(finished)?;
            if finished.get() {
                return Ok(());
            }
            if !self.queue.woken.borrow().is_empty() {
                continue;
            }

            let mut time = self.queue.time.borrow_mut();
            if time.can_exit() {
                trace!(self.entity ; "Only background tasks remain");
                return Ok(());
            }
            let Some(waiters) = time.advance_time() else {
                return Ok(());
            };
            drop(time);
            for waiter in waiters {
                waiter.waker.wake();
            }
        }
    }

    /// Poll every task woken so far, returning the first error a task
    /// finishes with.
    ///
    /// Tasks not yet polled when `finished` is set stay queued, ahead of any
    /// woken since, for the next run.
    pub fn poll_woken(&self, finished: &Cell<bool>) -> SimResult {
        let woken: Vec<Rc<Task>> = self.queue.woken.borrow_mut().drain(..).collect();
        for (i, task) in woken.iter().enumerate() {
            if finished.get() {
                self.queue
                    .woken
                    .borrow_mut()
                    .splice(0..0, woken[i..].iter().cloned());
                break;
            }
            let waker = waker_for(task.clone());
            let mut context = Context::from_waker(&waker);
            if let Poll::Ready(Err(e)) = task.future.borrow_mut().as_mut().poll(&mut context) {
                return Err(e);
            }
        }
        Ok(())
    }

    pub fn get_clock(&self, period_ps: u64) -> Clock {
        self.queue.time.borrow_mut().get_clock(period_ps)
    }

    #[must_use]
    pub fn time_now_ps(&self) -> u64 {
        self.queue.time.borrow().time_now_ps()
    }
}

/// Spawns new tasks into the [`Executor`] it was created with.
#[derive(Clone)]
pub struct Spawner {
    queue: Rc<RunQueue>,
}

impl Spawner {
    pub fn spawn(&self, future: impl Future<Output = SimResult> + 'static) {
        self.queue.push(future);
    }
}

pub fn new_executor_and_spawner(top: &Rc<Entity>) -> (Executor, Spawner) {
    let queue = Rc::new(RunQueue {
        woken: RefCell::new(Vec::new()),
        time: RefCell::new(SimTime::new(top)),
    });
    let executor = Executor {
        entity: Rc::new(Entity::new(top, "executor")),
        queue: queue.clone(),
    };
    (executor, Spawner { queue })
}
