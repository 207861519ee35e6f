// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

// TODO: enable this warning to ensure all public interfaces are documented.
// Enable warnings for missing documentation
// #![warn(missing_docs)]

#![doc(test(attr(warn(unused))))]

//! `ringlock` - a deterministic event-driven simulation engine
//!
//! This library provides the core of the [engine](crate::engine) which
//! executes event driven asynchronous simulation components. The components
//! used to build ring networks live in `ringlock-components` and the models
//! of ring nodes and the deadlock logger live in `ringlock-models`.
//!
//! # Time
//!
//! All time is kept in integer picoseconds. The [engine](crate::engine::Engine)
//! manages the [clocks](crate::time::clock), each of which has a fixed
//! period. Clocks with the same period are shared, and when two clocks have
//! events at the same time the clock created first is processed first. This
//! makes every simulation reproducible.
//!
//! # Simple Application
//!
//! ```rust
//! use ringlock_engine::engine::Engine;
//! use ringlock_engine::port::{InPort, OutPort};
//! use ringlock_engine::run_simulation;
//! use ringlock_engine::time::PS_PER_MS;
//!
//! let mut engine = Engine::default();
//! let rx = InPort::<usize>::new(engine.top(), "rx");
//! let mut tx = OutPort::<usize>::new(engine.top(), "tx");
//! tx.connect(rx.state()).unwrap();
//!
//! let clock = engine.clock_ps(PS_PER_MS);
//! engine.spawn(async move {
//!     clock.wait_ticks(2).await;
//!     tx.put(42)
//! });
//! engine.spawn(async move {
//!     assert_eq!(rx.get()?.await, 42);
//!     Ok(())
//! });
//!
//! run_simulation!(engine);
//! assert_eq!(engine.time_now_ps(), 2 * PS_PER_MS);
//! ```

pub mod engine;
pub mod events;
pub mod executor;
pub mod port;
pub mod test_helpers;
pub mod time;
pub mod traits;
pub mod types;

#[macro_export]
/// Spawn all component run() functions and then run the simulation.
macro_rules! run_simulation {
    ($engine:ident) => {
        $engine.run().unwrap();
    };
    ($engine:ident, $expect:expr) => {
        match $engine.run() {
            Ok(()) => panic!("Expected an error!"),
            Err(e) => assert_eq!(format!("{e}").as_str(), $expect),
        }
    };
}
