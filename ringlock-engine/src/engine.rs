// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! The simulation engine.
//!
//! The [`Engine`] owns the [`Executor`], the simulation top-level
//! [`Entity`] and the [`Registry`] of components which are spawned when the
//! simulation is run.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::Rc;

use ringlock_track::entity::{Entity, toplevel};
use ringlock_track::tracker::stdout_tracker;
use ringlock_track::{Tracker, trace};

use crate::events::once::Once;
use crate::executor::{self, Executor, Spawner};
use crate::time::PS_PER_NS;
use crate::time::clock::Clock;
use crate::traits::BoxFuture;
use crate::types::{Component, Eventable, SimError, SimResult};

pub struct Registry {
    pub entity: Rc<Entity>,
    components: RefCell<Vec<Component>>,
}

impl Registry {
    fn new(parent: &Rc<Entity>) -> Self {
        Self {
            entity: Rc::new(Entity::new(parent, "registry")),
            components: RefCell::new(Vec::new()),
        }
    }

    pub fn spawn_components(&self, spawner: &Spawner) {
        let mut guard = self.components.borrow_mut();

        trace!(self.entity ; "Spawning {} components", guard.len());

        for component in guard.drain(..) {
            spawner.spawn(async move { component.run().await });
        }
    }

    pub fn register(&self, component: Component) {
        self.components.borrow_mut().push(component);
    }
}

/// Notify `stop` once `wait` completes unless something else already did,
/// recording in `flag` that this waiter won.
async fn fire_once(
    stop: Once<()>,
    flag: Option<Rc<Cell<bool>>>,
    wait: impl Future<Output = ()>,
) -> SimResult {
    wait.await;
    if stop.is_triggered() {
        return Ok(());
    }
    if let Some(flag) = flag {
        flag.set(true);
    }
    stop.notify()
}

pub struct Engine {
    pub executor: Executor,
    spawner: Spawner,
    toplevel: Rc<Entity>,
    tracker: Tracker,
    registry: Registry,
}

impl Engine {
    /// Create a standalone engine.
    pub fn new(tracker: &Tracker) -> Self {
        let toplevel = toplevel(tracker, "top");
        let (executor, spawner) = executor::new_executor_and_spawner(&toplevel);
        let registry = Registry::new(&toplevel);
        Self {
            executor,
            spawner,
            toplevel,
            tracker: tracker.clone(),
            registry,
        }
    }

    /// Register a component that will be run as the simulation starts
    pub fn register(&self, component: Component) {
        self.registry.register(component);
    }

    /// Run until only background tasks remain.
    pub fn run(&mut self) -> SimResult {
        self.run_with_stop(None)
    }

    /// Run until `event` fires or only background tasks remain.
    pub fn run_until<T: Copy + 'static>(&mut self, event: Eventable<T>) -> SimResult {
        self.run_with_stop(Some(Box::pin(async move {
            event.listen().await;
        })))
    }

    /// Run for `duration_ps` picoseconds, stopping early if `event` fires.
    ///
    /// Returns `true` if the run was stopped by `event`.
    pub fn run_for(
        &mut self,
        duration_ps: u64,
        event: Option<Eventable<()>>,
    ) -> Result<bool, SimError> {
        let stop = Once::default();
        let stopped_early = Rc::new(Cell::new(false));

        let clock = self.clock_ps(1);
        self.spawn(fire_once(stop.clone(), None, async move {
            clock.wait_ticks(duration_ps).await;
        }));
        if let Some(event) = event {
            self.spawn(fire_once(stop.clone(), Some(stopped_early.clone()), async move {
                event.listen().await;
            }));
        }

        self.run_until(Box::new(stop))?;
        Ok(stopped_early.get())
    }

    fn run_with_stop(&mut self, stop: Option<BoxFuture<'static, ()>>) -> SimResult {
        self.registry.spawn_components(&self.spawner);

        let finished = Rc::new(Cell::new(false));
        if let Some(stop) = stop {
            let finished = finished.clone();
            self.spawner.spawn(async move {
                stop.await;
                finished.set(true);
                Ok(())
            });
        }
        self.executor.run(&finished)
    }

    #[must_use]
    pub fn spawner(&self) -> Spawner {
        self.spawner.clone()
    }

    pub fn spawn(&self, future: impl Future<Output = SimResult> + 'static) {
        self.spawner.spawn(future);
    }

    /// Returns a clock that ticks every nanosecond.
    #[must_use]
    pub fn default_clock(&mut self) -> Clock {
        self.executor.get_clock(PS_PER_NS)
    }

    /// Returns the clock with the given period. Clocks are shared between all
    /// users of the same period.
    ///
    /// # Panics
    ///
    /// If `period_ps` is zero.
    #[must_use]
    pub fn clock_ps(&mut self, period_ps: u64) -> Clock {
        self.executor.get_clock(period_ps)
    }

    #[must_use]
    pub fn time_now_ps(&self) -> u64 {
        self.executor.time_now_ps()
    }

    #[must_use]
    pub fn top(&self) -> &Rc<Entity> {
        &self.toplevel
    }

    #[must_use]
    pub fn tracker(&self) -> Tracker {
        self.tracker.clone()
    }
}

/// Create a default engine that sends [`Track`](ringlock_track::Track) events
/// to stdout.
///
/// This is provided to keep documentation examples simple with fewer
/// concepts to have to consider at once.
impl Default for Engine {
    fn default() -> Self {
        let tracker = stdout_tracker(log::Level::Info);
        Self::new(&tracker)
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        // The tracker can be using a buffered writer and so it needs to be shut down
        // cleanly to ensure that it is flushed properly.
        self.tracker.shutdown();
    }
}
