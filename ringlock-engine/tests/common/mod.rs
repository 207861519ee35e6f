// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

use std::cell::Cell;
use std::rc::Rc;

use ringlock_engine::engine::Engine;
use ringlock_engine::events::once::Once;

/// Spawn a task that ticks every nanosecond forever and so keeps the
/// simulation alive.
pub fn spawn_activity(engine: &mut Engine) {
    let clock = engine.default_clock();
    engine.spawn(async move {
        loop {
            clock.wait_ticks(1).await;
        }
    });
}

/// Spawn a background loop, like the logger's, that counts nanosecond ticks
/// without keeping the simulation alive.
pub fn spawn_background_counter(engine: &mut Engine) -> Rc<Cell<u64>> {
    let count = Rc::new(Cell::new(0));
    let clock = engine.default_clock();
    let counted = count.clone();
    engine.spawn(async move {
        loop {
            clock.wait_ticks_or_exit(1).await;
            counted.set(counted.get() + 1);
        }
    });
    count
}

/// An event that fires `delay_ns` nanoseconds into the run.
pub fn once_after<T: Copy + 'static>(engine: &mut Engine, delay_ns: u64, value: T) -> Box<Once<T>> {
    let event = Once::new(value);
    let clock = engine.default_clock();
    let fire = event.clone();
    engine.spawn(async move {
        clock.wait_ticks(delay_ns).await;
        fire.notify()
    });
    Box::new(event)
}
