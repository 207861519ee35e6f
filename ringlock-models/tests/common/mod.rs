// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

use ringlock_engine::time::PS_PER_MS;
use ringlock_models::node::{Destination, NodeConfig};
use ringlock_models::status::TickState;

/// Three nodes in credit mode, each with a full queue of messages for the
/// node two hops away and nothing else to do.
pub fn credit_cycle(queue_max_size: usize) -> Vec<(NodeConfig, u64)> {
    (0..3)
        .map(|id| {
            let mut config = NodeConfig::new(id, 3, queue_max_size);
            config.message_gen = 0.0;
            config.destination = Destination::Fixed((id + 2) % 3);
            config.credit_control = true;
            (config, PS_PER_MS)
        })
        .collect()
}

pub fn count_state(states: &[TickState], state: TickState) -> usize {
    states.iter().filter(|s| **s == state).count()
}
