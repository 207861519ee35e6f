// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! The report printed at the end of a run.

use std::io::{self, Write};

use ringlock_engine::time::ps_to_ms;
use ringlock_platform::Platform;
use ringlock_track::entity::GetEntity;

pub fn write_summary(
    writer: &mut dyn Write,
    platform: &Platform,
    time_now_ps: u64,
) -> io::Result<()> {
    match platform.logger().and_then(|logger| logger.deadlock_event()) {
        Some(event) => writeln!(writer, "Deadlock: {event}")?,
        None => writeln!(
            writer,
            "No deadlock declared after {:.3}ms",
            ps_to_ms(time_now_ps)
        )?,
    }

    writeln!(
        writer,
        "{:<16} {:>8} {:>9} {:>9} {:>9} {:>9} {:>8} {:>10} {:>10}  last",
        "node",
        "ticks",
        "generated",
        "rejected",
        "delivered",
        "forwarded",
        "full",
        "no-credit",
        "queued"
    )?;
    for node in platform.nodes() {
        let stats = node.stats();
        let last = node
            .tick_states()
            .last()
            .map_or_else(|| "-".to_string(), ToString::to_string);
        writeln!(
            writer,
            "{:<16} {:>8} {:>9} {:>9} {:>9} {:>9} {:>8} {:>10} {:>10}  {last}",
            node.entity().name,
            stats.ticks,
            stats.generated,
            stats.rejected,
            stats.delivered,
            stats.forwarded,
            stats.queue_full,
            stats.credit_stalls,
            format!("{}/{}", node.queue_len(), node.config().queue_max_size),
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use ringlock_engine::test_helpers::start_test;
    use ringlock_engine::time::PS_PER_MS;

    use super::*;

    #[test]
    fn idle_ring_summary() {
        let mut engine = start_test(file!());
        let platform = Platform::from_string(
            &mut engine,
            "
nodes:
  - { name: node0, queue_max_size: 4, tick_freq: 1ms, message_gen: 0.0 }
  - { name: node1, queue_max_size: 4, tick_freq: 1ms, message_gen: 0.0 }
logger:
  tick_freq: 1ms
  num_nodes: 2
  idle_threshold: 3
",
        )
        .unwrap();
        assert!(platform.run(&mut engine, 100 * PS_PER_MS).unwrap());

        let mut out = Vec::new();
        write_summary(&mut out, &platform, engine.time_now_ps()).unwrap();
        let out = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(
            lines[0],
            "Deadlock: deadlock at logger tick 4 (4000000000ps) across nodes \
             [0: idle=3 request=0, 1: idle=3 request=0]"
        );
        assert!(lines[1].starts_with("node "));
        assert!(lines[2].starts_with("node0 "));
        assert!(lines[2].ends_with("0/4  Idle"));
        assert_eq!(lines.len(), 4);
    }
}
