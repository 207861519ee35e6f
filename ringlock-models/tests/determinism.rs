// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

use ringlock_engine::test_helpers::start_test;
use ringlock_engine::time::PS_PER_MS;
use ringlock_models::logger::LoggerConfig;
use ringlock_models::logger::monitor::TickSummary;
use ringlock_models::node::{NodeConfig, NodeStats};
use ringlock_models::status::TickState;
use ringlock_models::test_helpers::build_ring;

type Outcome = (Vec<NodeStats>, Vec<Vec<TickState>>, Vec<TickSummary>);

fn run_once(seed: u64) -> Outcome {
    let mut engine = start_test(file!());

    let periods = [PS_PER_MS, 3 * PS_PER_MS, 2 * PS_PER_MS, 5 * PS_PER_MS];
    let nodes = (0..4)
        .map(|id| {
            let mut config = NodeConfig::new(id, 4, 6);
            config.message_gen = 0.6;
            config.credit_control = id % 2 == 0;
            config.seed = seed;
            (config, periods[id])
        })
        .collect();
    let logger = (LoggerConfig::new(4, 40, 40), 2 * PS_PER_MS);
    let ring = build_ring(&mut engine, nodes, Some(logger)).unwrap();
    let logger = ring.logger.unwrap();

    engine
        .run_for(2_000 * PS_PER_MS, Some(logger.deadlock_declared()))
        .unwrap();

    (
        ring.nodes.iter().map(|n| n.stats()).collect(),
        ring.nodes.iter().map(|n| n.tick_states()).collect(),
        logger.history(),
    )
}

#[test]
fn same_seed_same_run() {
    let first = run_once(42);
    let second = run_once(42);
    assert_eq!(first, second);
    assert!(!first.2.is_empty());
}
