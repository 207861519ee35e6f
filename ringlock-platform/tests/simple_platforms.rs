// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

use std::io::Write;

use ringlock_engine::test_helpers::start_test;
use ringlock_engine::time::PS_PER_MS;
use ringlock_models::logger::monitor::LoggerState;
use ringlock_models::node::NodeStats;
use ringlock_models::status::TickState;
use ringlock_platform::Platform;
use ringlock_platform::builder::LinkDescriptor;
use ringlock_platform::random::{RandomLogger, random_ring};

const CREDIT_CYCLE: &str = "
seed: 1
nodes:
  - name: node0
    queue_max_size: 4
    tick_freq: 1ms
    message_gen: 0.0
    credit_control: true
    preload: { count: 4, destination: node2 }
  - name: node1
    queue_max_size: 4
    tick_freq: 1ms
    message_gen: 0.0
    credit_control: true
    preload: { count: 4, destination: node0 }
  - name: node2
    queue_max_size: 4
    tick_freq: 1ms
    message_gen: 0.0
    credit_control: true
    preload: { count: 4, destination: node1 }
logger:
  tick_freq: 1ms
  num_nodes: 3
  idle_threshold: 50
  request_threshold: 50
";

#[test]
fn default_ring_links() {
    let mut engine = start_test(file!());
    let platform = Platform::from_string(
        &mut engine,
        "
nodes:
  - name: a
  - name: b
  - name: c
ring_delay: 2ms
",
    )
    .unwrap();

    assert_eq!(platform.num_nodes(), 3);
    assert_eq!(platform.node_idx_from_name("c").unwrap(), 2);
    assert!(platform.logger().is_none());
    assert!(platform.nodes().iter().all(|n| n.config().credit_control));
    assert_eq!(
        platform.links(),
        &[
            LinkDescriptor {
                from: 0,
                to: 1,
                delay_ps: 2 * PS_PER_MS
            },
            LinkDescriptor {
                from: 1,
                to: 2,
                delay_ps: 2 * PS_PER_MS
            },
            LinkDescriptor {
                from: 2,
                to: 0,
                delay_ps: 2 * PS_PER_MS
            },
        ]
    );

    let description = format!("{platform}");
    assert!(description.contains("top::a (queue 50, tick 10s, message_gen 0.5)"));
    assert!(description.contains("top::c -> top::a (2ms)"));
}

#[test]
fn explicit_links() {
    let mut engine = start_test(file!());
    let platform = Platform::from_string(
        &mut engine,
        "
nodes:
  - { name: node0, tick_freq: 1ms, message_gen: 1.0, destination: node1 }
  - { name: node1, tick_freq: 1ms, message_gen: 0.0 }
  - { name: node2, tick_freq: 1ms, message_gen: 0.0 }
links:
  - { from: node0, to: node2, delay: 1ps }
  - { from: node2, to: node1, delay: 1ps }
  - { from: node1, to: node0, delay: 1ps }
",
    )
    .unwrap();

    let deadlocked = platform.run(&mut engine, 100 * PS_PER_MS).unwrap();
    assert!(!deadlocked);

    // Messages for node1 pass through node2 on the way
    let node2 = platform.node("node2").unwrap().stats();
    assert!(node2.forwarded > 90);
    assert_eq!(node2.delivered, 0);
    assert!(platform.node("node1").unwrap().stats().delivered > 90);
}

#[test]
fn credit_cycle_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(CREDIT_CYCLE.as_bytes()).unwrap();

    let mut engine = start_test(file!());
    let platform = Platform::from_file(&mut engine, file.path()).unwrap();

    let deadlocked = platform.run(&mut engine, 10_000 * PS_PER_MS).unwrap();
    assert!(deadlocked);

    let logger = platform.logger().unwrap();
    assert_eq!(logger.state(), LoggerState::DeadlockDeclared);
    let event = logger.deadlock_event().unwrap();
    assert_eq!(event.logger_tick, 51);
    assert!(event.nodes.iter().all(|n| n.consecutive_request == 50));

    for node in platform.nodes() {
        assert!(
            node.tick_states()
                .iter()
                .all(|state| *state == TickState::Blocked)
        );
    }
}

#[test]
fn flowing_ring_without_logger() {
    let mut engine = start_test(file!());
    let platform = Platform::from_string(
        &mut engine,
        "
seed: 1234
nodes:
  - { name: node0, queue_max_size: 120, tick_freq: 3ms, message_gen: 0.9 }
  - { name: node1, queue_max_size: 100, tick_freq: 5ms, message_gen: 0.9 }
  - { name: node2, queue_max_size: 80, tick_freq: 2ms, message_gen: 0.9 }
",
    )
    .unwrap();

    assert!(!platform.run(&mut engine, 1_000 * PS_PER_MS).unwrap());
    for node in platform.nodes() {
        assert!(node.max_queue_len() <= node.config().queue_max_size);
        assert!(node.stats().delivered > 0);
    }
}

fn run_random_ring(seed: u64) -> Vec<NodeStats> {
    let cfg = random_ring(4, 80..=120, 2..=5, 0.9, seed, Some(RandomLogger::default())).unwrap();
    let mut engine = start_test(file!());
    let platform = Platform::build(&mut engine, &cfg).unwrap();
    platform.run(&mut engine, 500 * PS_PER_MS).unwrap();
    platform.nodes().iter().map(|n| n.stats()).collect()
}

#[test]
fn random_ring_is_reproducible() {
    let first = run_random_ring(99);
    assert_eq!(first, run_random_ring(99));
    assert!(first.iter().all(|stats| stats.generated > 0));
}
