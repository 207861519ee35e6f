// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! Simulation time.
//!
//! Time is an integer number of picoseconds. Each [`Clock`](clock::Clock) has
//! a fixed period and all clocks share the one [`SimTime`](simtime::SimTime).

pub mod clock;
pub mod simtime;

pub const PS_PER_NS: u64 = 1_000;
pub const PS_PER_US: u64 = 1_000 * PS_PER_NS;
pub const PS_PER_MS: u64 = 1_000 * PS_PER_US;
pub const PS_PER_S: u64 = 1_000 * PS_PER_MS;

/// Convert a time in picoseconds to milliseconds for reporting.
#[must_use]
pub fn ps_to_ms(time_ps: u64) -> f64 {
    time_ps as f64 / PS_PER_MS as f64
}
