// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

use std::rc::Rc;

use ringlock_components::channel::Channel;
use ringlock_components::connect_port;
use ringlock_engine::engine::Engine;
use ringlock_engine::test_helpers::start_test;
use ringlock_engine::time::PS_PER_MS;
use ringlock_models::logger::monitor::LoggerState;
use ringlock_models::logger::{Logger, LoggerConfig};
use ringlock_models::node::{Node, NodeConfig};
use ringlock_models::test_helpers::build_ring;
use ringlock_track::Tracker;
use ringlock_track::log::Level;
use ringlock_track::tracker::{EntityManager, InMemoryTracker};

#[test]
fn thresholds_must_be_positive() {
    let mut engine = start_test(file!());
    let clock = engine.clock_ps(PS_PER_MS);
    let result = Logger::new_and_register(
        &engine,
        &clock,
        engine.top(),
        "logger",
        LoggerConfig::new(3, 0, 10),
    );
    let Err(err) = result else {
        panic!("zero threshold accepted");
    };
    assert_eq!(
        format!("{err}"),
        "Error: ConfigMismatch: top::logger.idle_threshold: must be at least 1"
    );
}

#[test]
fn report_port_out_of_range() {
    let mut engine = start_test(file!());
    let clock = engine.clock_ps(PS_PER_MS);
    let logger = Logger::new_and_register(
        &engine,
        &clock,
        engine.top(),
        "logger",
        LoggerConfig::new(3, 10, 10),
    )
    .unwrap();

    let Err(err) = logger.port_report_rx_i(3) else {
        panic!("port 3 exists");
    };
    assert_eq!(
        format!("{err}"),
        "Error: ConfigMismatch: top::logger.num_nodes: no report port 3 on a logger for 3 nodes"
    );
}

#[test]
fn node_count_mismatch() {
    let mut engine = start_test(file!());
    let clock = engine.clock_ps(PS_PER_MS);
    let link_clock = engine.clock_ps(1);
    let top = engine.top().clone();
    let logger = Logger::new_and_register(
        &engine,
        &clock,
        &top,
        "logger",
        LoggerConfig::new(3, 10, 10),
    )
    .unwrap();

    for id in 0..2 {
        let node = Node::new_and_register(
            &engine,
            &clock,
            &top,
            &format!("node{id}"),
            NodeConfig::new(id, 2, 4),
        )
        .unwrap();
        let report =
            Channel::new_and_register(&engine, &link_clock, &top, &format!("report{id}"), 1)
                .unwrap();
        connect_port!(node, report_tx => report, rx).unwrap();
        connect_port!(report, tx => logger, report_rx, id).unwrap();
    }

    let err = logger.validate().unwrap_err();
    assert_eq!(
        format!("{err}"),
        "Error: ConfigMismatch: top::logger.num_nodes: 3 report ports but 2 connected"
    );
}

#[test]
fn idle_ring_is_declared() {
    let mut engine = start_test(file!());

    let nodes = (0..3)
        .map(|id| {
            let mut config = NodeConfig::new(id, 3, 4);
            config.message_gen = 0.0;
            (config, PS_PER_MS)
        })
        .collect();
    let logger = (LoggerConfig::new(3, 10, 1_000), PS_PER_MS);
    let ring = build_ring(&mut engine, nodes, Some(logger)).unwrap();
    let logger = ring.logger.unwrap();

    assert!(
        engine
            .run_for(1_000 * PS_PER_MS, Some(logger.deadlock_declared()))
            .unwrap()
    );
    let event = logger.deadlock_event().unwrap();
    assert_eq!(event.logger_tick, 11);
    assert!(event.nodes.iter().all(|n| n.consecutive_idle == 10));

    // One history row for every logger tick up to the declaration
    assert_eq!(logger.history().len(), 11);
    assert!(logger.history()[0].nodes.iter().all(|n| n.in_gap));
}

#[test]
fn busy_ring_is_never_declared() {
    let mut engine = start_test(file!());

    let nodes = (0..3)
        .map(|id| {
            let mut config = NodeConfig::new(id, 3, 8);
            config.message_gen = 1.0;
            config.forward_quota = 2;
            config.seed = 5;
            config.credit_control = false;
            (config, PS_PER_MS)
        })
        .collect();
    let logger = (LoggerConfig::new(3, 10, 10), 2 * PS_PER_MS);
    let ring = build_ring(&mut engine, nodes, Some(logger)).unwrap();
    let logger = ring.logger.unwrap();

    let stopped_early = engine
        .run_for(200 * PS_PER_MS, Some(logger.deadlock_declared()))
        .unwrap();
    assert!(!stopped_early);
    assert_eq!(logger.state(), LoggerState::Monitoring);
    assert!(logger.deadlock_event().is_none());

    // With a slower logger some reports are superseded within a batch
    let records = logger.records();
    assert!(records.iter().all(|r| r.reports_superseded > 0));
    assert!(records.iter().all(|r| !r.in_gap));
}

#[test]
fn history_csv_has_a_row_per_tick() {
    let mut engine = start_test(file!());

    let nodes = (0..2)
        .map(|id| {
            let mut config = NodeConfig::new(id, 2, 4);
            config.message_gen = 0.0;
            (config, PS_PER_MS)
        })
        .collect();
    let logger = (LoggerConfig::new(2, 5, 5), PS_PER_MS);
    let ring = build_ring(&mut engine, nodes, Some(logger)).unwrap();
    let logger = ring.logger.unwrap();
    engine
        .run_for(100 * PS_PER_MS, Some(logger.deadlock_declared()))
        .unwrap();

    let mut csv = Vec::new();
    logger.write_history_csv(&mut csv).unwrap();
    let csv = String::from_utf8(csv).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 1 + 6);
    assert!(lines[0].starts_with("logger_tick,time_ps,node0_idle"));
    assert_eq!(lines[6], "6,6000000000,5,0,0,0,5,0,0,0");
}

#[test]
fn declaration_is_logged_by_the_logger() {
    let mut manager = EntityManager::new(Level::Warn);
    manager
        .add_entity_level_filter(r"top::logger$", Level::Info)
        .unwrap();
    let memory = Rc::new(InMemoryTracker::new(manager));
    let tracker: Tracker = memory.clone();
    let mut engine = Engine::new(&tracker);

    let nodes = (0..2)
        .map(|id| {
            let mut config = NodeConfig::new(id, 2, 4);
            config.message_gen = 0.0;
            (config, PS_PER_MS)
        })
        .collect();
    let logger = (LoggerConfig::new(2, 3, 3), PS_PER_MS);
    let ring = build_ring(&mut engine, nodes, Some(logger)).unwrap();
    let logger = ring.logger.unwrap();
    engine
        .run_for(100 * PS_PER_MS, Some(logger.deadlock_declared()))
        .unwrap();

    assert_eq!(
        memory.count_matching(r":INFO: deadlock at logger tick 4 \(4000000000ps\)"),
        1
    );
    assert_eq!(memory.count_matching(":WARN:"), 0);
}

fn idle_pair() -> Vec<(NodeConfig, u64)> {
    (0..2)
        .map(|id| {
            let mut config = NodeConfig::new(id, 2, 4);
            config.message_gen = 0.0;
            (config, PS_PER_MS)
        })
        .collect()
}

#[test]
fn node_counters_logged_every_tick() {
    let mut manager = EntityManager::new(Level::Warn);
    manager
        .add_entity_level_filter(r"top::logger$", Level::Debug)
        .unwrap();
    let memory = Rc::new(InMemoryTracker::new(manager));
    let tracker: Tracker = memory.clone();
    let mut engine = Engine::new(&tracker);

    let logger = (LoggerConfig::new(2, 3, 3), PS_PER_MS);
    let ring = build_ring(&mut engine, idle_pair(), Some(logger)).unwrap();
    let logger = ring.logger.unwrap();
    engine
        .run_for(100 * PS_PER_MS, Some(logger.deadlock_declared()))
        .unwrap();

    // One line per node for each of the four logger ticks
    assert_eq!(memory.count_matching(r":DEBUG: node \d: "), 8);
    assert_eq!(
        memory.count_matching(r":DEBUG: node 0: unknown, idle 0, requests 0$"),
        1
    );
    assert_eq!(
        memory.count_matching(r":DEBUG: node 1: Idle, idle 3, requests 0$"),
        1
    );
}

#[test]
fn reports_after_declaration_are_dropped() {
    let mut engine = start_test(file!());

    let logger = (LoggerConfig::new(2, 3, 3), PS_PER_MS);
    let ring = build_ring(&mut engine, idle_pair(), Some(logger)).unwrap();
    let logger = ring.logger.unwrap();

    // Keep running past the declaration
    let stopped_early = engine.run_for(50 * PS_PER_MS, None).unwrap();
    assert!(!stopped_early);

    assert_eq!(logger.state(), LoggerState::DeadlockDeclared);
    assert_eq!(logger.deadlock_event().unwrap().logger_tick, 4);
    assert_eq!(logger.history().len(), 4);
    assert!(logger.reports_dropped() > 80);
}
