// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! Different types of events.
//!
//! Events should be used to coordinate between
//! [spawned](crate::executor::Spawner) tasks so that they can run in an
//! event-driven manner and yield until there is something ready to process.
//!
//! [Basic events](crate::events::once) are created to be triggered once using
//! the `notify()` method. Any number of other tasks can be waiting for the
//! event to be triggered. The `listen()` method is used to wait for the event
//! to be triggered. [Repeated](crate::events::repeated) events can be
//! triggered any number of times.
//!
//! # Example:
//!
//! An event being created to co-ordinate between two tasks.
//!
//! ```rust
//! # use ringlock_engine::engine::Engine;
//! # use ringlock_engine::events::once::Once;
//! # use ringlock_engine::run_simulation;
//! # use ringlock_engine::time::PS_PER_NS;
//! # use ringlock_engine::traits::Event;
//! #
//! let mut engine = Engine::default();
//! let event = Once::default();
//!
//! let listen = event.clone();
//! engine.spawn(async move {
//!     listen.listen().await;
//!     Ok(())
//! });
//!
//! let clock = engine.clock_ps(PS_PER_NS);
//! engine.spawn(async move {
//!     clock.wait_ticks(10).await;
//!     event.notify()
//! });
//!
//! run_simulation!(engine);
//! assert_eq!(engine.time_now_ps(), 10 * PS_PER_NS);
//! ```

use std::cell::RefCell;
use std::task::Waker;

pub mod once;
pub mod repeated;

/// Tasks parked on an event, woken in the order they started waiting.
#[derive(Default)]
struct Waiters(RefCell<Vec<Waker>>);

impl Waiters {
    fn park(&self, waker: &Waker) {
        self.0.borrow_mut().push(waker.clone());
    }

    fn wake_all(&self) {
        let waiting = self.0.take();
        for waker in waiting {
            waker.wake();
        }
    }
}
