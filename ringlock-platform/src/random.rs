// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Seeded generation of ring configurations.

use std::ops::RangeInclusive;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ringlock_engine::config_mismatch;
use ringlock_engine::time::PS_PER_MS;
use ringlock_engine::types::SimError;

use crate::types::{LoggerSection, NodeSection, PlatformConfig};

/// Options for [`random_ring`] beyond the node parameters.
#[derive(Clone, Debug)]
pub struct RandomLogger {
    pub tick_ms: u64,
    pub idle_threshold: u64,
    pub request_threshold: u64,
}

impl Default for RandomLogger {
    fn default() -> Self {
        Self {
            tick_ms: 1,
            idle_threshold: 50,
            request_threshold: 50,
        }
    }
}

/// Create a ring of `num_nodes` nodes with queue sizes and tick periods drawn
/// uniformly from the given ranges.
///
/// The same arguments always produce the same configuration.
pub fn random_ring(
    num_nodes: usize,
    queue_sizes: RangeInclusive<usize>,
    tick_ms: RangeInclusive<u64>,
    message_gen: f64,
    seed: u64,
    logger: Option<RandomLogger>,
) -> Result<PlatformConfig, SimError> {
    if num_nodes == 0 {
        return config_mismatch!("random_ring", "num_nodes", "must be at least 1");
    }
    if queue_sizes.is_empty() || *queue_sizes.start() == 0 {
        return config_mismatch!(
            "random_ring",
            "queue_sizes",
            "{queue_sizes:?} contains no valid queue size"
        );
    }
    if tick_ms.is_empty() || *tick_ms.start() == 0 {
        return config_mismatch!(
            "random_ring",
            "tick_ms",
            "{tick_ms:?} contains no valid tick period"
        );
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let nodes = (0..num_nodes)
        .map(|i| NodeSection {
            name: format!("node{i}"),
            queue_max_size: Some(rng.gen_range(queue_sizes.clone())),
            tick_freq: Some(rng.gen_range(tick_ms.clone()) * PS_PER_MS),
            message_gen: Some(message_gen),
            forward_quota: None,
            destination: None,
            credit_control: None,
            issue_credit: None,
            preload: None,
        })
        .collect();

    let logger = logger.map(|logger| LoggerSection {
        name: None,
        tick_freq: Some(logger.tick_ms * PS_PER_MS),
        num_nodes,
        idle_threshold: Some(logger.idle_threshold),
        request_threshold: Some(logger.request_threshold),
        grace_window: None,
    });

    Ok(PlatformConfig {
        seed: Some(seed),
        nodes,
        logger,
        ring_delay: Some(PS_PER_MS),
        report_delay: Some(1),
        links: None,
        report_links: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizes_and_ticks(cfg: &PlatformConfig) -> Vec<(Option<usize>, Option<u64>)> {
        cfg.nodes
            .iter()
            .map(|n| (n.queue_max_size, n.tick_freq))
            .collect()
    }

    #[test]
    fn same_seed_same_ring() {
        let a = random_ring(5, 80..=120, 2..=5, 0.9, 1234, None).unwrap();
        let b = random_ring(5, 80..=120, 2..=5, 0.9, 1234, None).unwrap();
        assert_eq!(sizes_and_ticks(&a), sizes_and_ticks(&b));
    }

    #[test]
    fn values_within_ranges() {
        let cfg = random_ring(20, 80..=120, 2..=5, 0.9, 7, Some(RandomLogger::default())).unwrap();
        for node in &cfg.nodes {
            let size = node.queue_max_size.unwrap();
            assert!((80..=120).contains(&size));
            let tick = node.tick_freq.unwrap();
            assert_eq!(tick % PS_PER_MS, 0);
            assert!((2..=5).contains(&(tick / PS_PER_MS)));
        }
        assert_eq!(cfg.logger.unwrap().num_nodes, 20);
    }

    #[test]
    fn empty_range_rejected() {
        #[allow(clippy::reversed_empty_ranges)]
        let err = random_ring(3, 10..=5, 2..=5, 0.9, 7, None).unwrap_err();
        assert_eq!(
            format!("{err}"),
            "Error: ConfigMismatch: random_ring.queue_sizes: 10..=5 contains no valid queue size"
        );
    }
}
