// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! Wire small rings for tests without going through a platform file.

use std::rc::Rc;

use ringlock_components::channel::Channel;
use ringlock_components::connect_port;
use ringlock_engine::engine::Engine;
use ringlock_engine::types::SimError;

use crate::logger::{Logger, LoggerConfig};
use crate::node::{Node, NodeConfig};

/// Delay of every link in a test ring.
pub const LINK_DELAY_PS: u64 = 1;

pub struct TestRing {
    pub nodes: Vec<Rc<Node>>,
    pub logger: Option<Rc<Logger>>,
}

/// Build a ring from `(config, tick period)` pairs. Node `i` sends to node
/// `i + 1`. Credit links are added for nodes in credit mode and report links
/// when there is a logger.
pub fn build_ring(
    engine: &mut Engine,
    nodes: Vec<(NodeConfig, u64)>,
    logger: Option<(LoggerConfig, u64)>,
) -> Result<TestRing, SimError> {
    let top = engine.top().clone();
    let link_clock = engine.clock_ps(1);

    let mut built = Vec::with_capacity(nodes.len());
    for (config, period_ps) in nodes {
        let clock = engine.clock_ps(period_ps);
        let name = format!("node{}", config.id);
        built.push(Node::new_and_register(engine, &clock, &top, &name, config)?);
    }

    let num_nodes = built.len();
    for (i, from) in built.iter().enumerate() {
        let to = &built[(i + 1) % num_nodes];
        let ring = Channel::new_and_register(
            engine,
            &link_clock,
            &top,
            &format!("ring{i}"),
            LINK_DELAY_PS,
        )?;
        connect_port!(from, ring_tx => ring, rx)?;
        connect_port!(ring, tx => to, ring_rx)?;

        if from.config().credit_control {
            let credit = Channel::new_and_register(
                engine,
                &link_clock,
                &top,
                &format!("credit{i}"),
                LINK_DELAY_PS,
            )?;
            connect_port!(to, credit_tx => credit, rx)?;
            connect_port!(credit, tx => from, credit_rx)?;
        }
    }

    let logger = match logger {
        Some((config, period_ps)) => {
            let clock = engine.clock_ps(period_ps);
            let logger = Logger::new_and_register(engine, &clock, &top, "logger", config)?;
            for node in &built {
                let report = Channel::new_and_register(
                    engine,
                    &link_clock,
                    &top,
                    &format!("report{}", node.id()),
                    LINK_DELAY_PS,
                )?;
                connect_port!(node, report_tx => report, rx)?;
                connect_port!(report, tx => logger, report_rx, node.id())?;
            }
            logger.validate()?;
            Some(logger)
        }
        None => None,
    };

    Ok(TestRing {
        nodes: built,
        logger,
    })
}
