// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! What a node tells the logger about each of its ticks.

use std::fmt;

use ringlock_engine::traits::SimObject;
use ringlock_track::id::Unique;
use ringlock_track::{Id, NO_ID};

/// Classification of one node tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TickState {
    /// Nothing to send and nothing arrived.
    Idle,

    /// At least one message was sent or delivered.
    Active,

    /// Pending work could not be sent or enqueued.
    Blocked,
}

impl fmt::Display for TickState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TickState::Idle => write!(f, "Idle"),
            TickState::Active => write!(f, "Active"),
            TickState::Blocked => write!(f, "Blocked"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatusReport {
    pub node_id: usize,
    pub node_tick: u64,
    pub state: TickState,
    pub queue_occupancy: usize,

    /// Tick period of the reporting node, so that the logger knows when the
    /// next report is due.
    pub period_ps: u64,

    /// Time at which the report was sent.
    pub time_ps: u64,
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "node {} tick {}: {} ({} queued)",
            self.node_id, self.node_tick, self.state, self.queue_occupancy
        )
    }
}

impl Unique for StatusReport {
    fn id(&self) -> Id {
        NO_ID
    }
}

impl SimObject for StatusReport {}
