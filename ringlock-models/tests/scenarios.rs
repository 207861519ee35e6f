// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

use ringlock_engine::test_helpers::start_test;
use ringlock_engine::time::{PS_PER_MS, PS_PER_S};
use ringlock_models::logger::LoggerConfig;
use ringlock_models::logger::monitor::LoggerState;
use ringlock_models::node::{Destination, NodeConfig};
use ringlock_models::status::TickState;
use ringlock_models::test_helpers::build_ring;

mod common;
use common::{count_state, credit_cycle};

#[test]
fn mixed_clocks_with_back_pressure_keep_running() {
    let mut engine = start_test(file!());

    let sizes = [120, 100, 80];
    let periods = [3 * PS_PER_MS, 5 * PS_PER_MS, 2 * PS_PER_MS];
    let nodes = (0..3)
        .map(|id| {
            let mut config = NodeConfig::new(id, 3, sizes[id]);
            config.message_gen = 0.9;
            config.seed = 11;
            (config, periods[id])
        })
        .collect();
    let ring = build_ring(&mut engine, nodes, None).unwrap();

    let stopped_early = engine.run_for(10_000 * PS_PER_MS, None).unwrap();
    assert!(!stopped_early);
    assert_eq!(engine.time_now_ps(), 10_000 * PS_PER_MS);

    let mut delivered = 0;
    let mut rejected = 0;
    let mut queue_full = 0;
    for (node, size) in ring.nodes.iter().zip(sizes) {
        assert!(node.max_queue_len() <= size);
        assert!(node.credits_outstanding() <= size);
        let stats = node.stats();
        assert!(stats.ticks + 1 >= 10_000 * PS_PER_MS / node.period_ps());
        assert_eq!(node.tick_states().len() as u64, stats.ticks);
        delivered += stats.delivered;
        rejected += stats.rejected;
        queue_full += stats.queue_full;
    }
    assert!(delivered > 0);
    assert!(rejected > 0);
    assert!(queue_full >= rejected);
}

#[test]
fn queues_stay_within_capacity_every_tick() {
    let mut engine = start_test(file!());

    let sizes = [8, 6, 4];
    let nodes = (0..3)
        .map(|id| {
            let mut config = NodeConfig::new(id, 3, sizes[id]);
            config.message_gen = 0.9;
            config.seed = 17;
            (config, PS_PER_MS)
        })
        .collect();
    let ring = build_ring(&mut engine, nodes, None).unwrap();

    // Stop half way between edges so that each step runs one tick per node
    engine.run_for(PS_PER_MS / 2, None).unwrap();
    for tick in 1..=300 {
        engine.run_for(PS_PER_MS, None).unwrap();
        for (node, size) in ring.nodes.iter().zip(sizes) {
            assert_eq!(node.stats().ticks, tick);
            assert!(node.queue_len() <= size);
            assert!(node.credits_outstanding() <= size);
        }
    }

    let rejected: usize = ring.nodes.iter().map(|n| n.stats().rejected).sum();
    let stalls: usize = ring.nodes.iter().map(|n| n.stats().credit_stalls).sum();
    assert!(rejected > 0);
    assert!(stalls > 0);
}

#[test]
fn credit_cycle_is_declared_a_deadlock() {
    let mut engine = start_test(file!());

    let logger = (LoggerConfig::new(3, 50, 50), PS_PER_MS);
    let ring = build_ring(&mut engine, credit_cycle(4), Some(logger)).unwrap();
    for node in &ring.nodes {
        node.preload((node.id() + 2) % 3, 4).unwrap();
    }
    let logger = ring.logger.unwrap();

    let stopped_early = engine
        .run_for(10_000 * PS_PER_MS, Some(logger.deadlock_declared()))
        .unwrap();
    assert!(stopped_early);
    assert_eq!(logger.state(), LoggerState::DeadlockDeclared);

    // Reports reach the logger one of its ticks after they are sent
    let event = logger.deadlock_event().unwrap();
    assert_eq!(event.logger_tick, 51);
    assert_eq!(event.time_ps, 51 * PS_PER_MS);
    assert_eq!(event.node_ids(), vec![0, 1, 2]);
    for node in &event.nodes {
        assert_eq!(node.consecutive_request, 50);
        assert_eq!(node.consecutive_idle, 0);
        assert_eq!(node.last_state, Some(TickState::Blocked));
    }

    for node in &ring.nodes {
        let states = node.tick_states();
        assert!(states.len() >= 50);
        assert_eq!(count_state(&states, TickState::Blocked), states.len());
        assert_eq!(node.queue_len(), 4);
        assert_eq!(node.stats().forwarded, 0);
    }
}

#[test]
fn deadlock_needs_every_node() {
    let mut engine = start_test(file!());

    // Node 2 has nothing queued and never grants credit, so nodes 0 and 1 are
    // blocked while node 2 stays below its idle threshold.
    let mut nodes = credit_cycle(4);
    nodes[2].0.issue_credit = false;
    let logger = (LoggerConfig::new(3, 1_000_000, 20), PS_PER_MS);
    let ring = build_ring(&mut engine, nodes, Some(logger)).unwrap();
    ring.nodes[0].preload(2, 4).unwrap();
    ring.nodes[1].preload(0, 4).unwrap();
    let logger = ring.logger.unwrap();

    let stopped_early = engine
        .run_for(200 * PS_PER_MS, Some(logger.deadlock_declared()))
        .unwrap();
    assert!(!stopped_early);
    assert_eq!(logger.state(), LoggerState::Monitoring);

    let records = logger.records();
    assert!(records[0].consecutive_request >= 20);
    assert!(records[1].consecutive_request >= 20);
    assert_eq!(records[2].consecutive_request, 0);
    assert!(records[2].consecutive_idle >= 20);
}

fn stuck_partners() -> Vec<(NodeConfig, u64)> {
    (0..2)
        .map(|id| {
            let mut config = NodeConfig::new(id, 2, 50);
            config.message_gen = 0.0;
            config.destination = Destination::Fixed(1 - id);
            config.credit_control = true;
            config.issue_credit = false;
            (config, 10 * PS_PER_S)
        })
        .collect()
}

#[test]
fn no_credit_stalls_on_first_tick() {
    let mut engine = start_test(file!());

    let ring = build_ring(&mut engine, stuck_partners(), None).unwrap();
    for node in &ring.nodes {
        node.preload(1 - node.id(), 1).unwrap();
    }

    engine.run_for(15 * PS_PER_S, None).unwrap();
    for node in &ring.nodes {
        assert_eq!(node.stats().credit_stalls, 1);
        assert_eq!(node.tick_states(), vec![TickState::Blocked]);
        assert_eq!(node.credit_balance(), 0);
        assert_eq!(node.queue_len(), 1);
    }
}

#[test]
fn no_credit_stays_blocked() {
    let mut engine = start_test(file!());

    let logger = (LoggerConfig::new(2, 100, 5), 10 * PS_PER_S);
    let ring = build_ring(&mut engine, stuck_partners(), Some(logger)).unwrap();
    for node in &ring.nodes {
        node.preload(1 - node.id(), 1).unwrap();
    }
    let logger = ring.logger.unwrap();

    let stopped_early = engine
        .run_for(1_000 * PS_PER_S, Some(logger.deadlock_declared()))
        .unwrap();
    assert!(stopped_early);

    let event = logger.deadlock_event().unwrap();
    assert_eq!(event.logger_tick, 6);
    for node in &ring.nodes {
        let stats = node.stats();
        assert!(stats.credit_stalls >= 5);
        assert_eq!(stats.credits_issued, 0);
        assert_eq!(stats.forwarded, 0);
        assert_eq!(
            count_state(&node.tick_states(), TickState::Blocked),
            node.tick_states().len()
        );
    }
}
