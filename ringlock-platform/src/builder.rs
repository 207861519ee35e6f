// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

use std::collections::HashMap;
use std::rc::Rc;

use ringlock_components::channel::Channel;
use ringlock_components::connect_port;
use ringlock_engine::config_mismatch;
use ringlock_engine::engine::Engine;
use ringlock_engine::sim_error;
use ringlock_engine::time::{PS_PER_MS, PS_PER_S};
use ringlock_engine::types::{SimError, SimResult};
use ringlock_models::logger::{Logger, LoggerConfig};
use ringlock_models::node::{DEFAULT_MESSAGE_GEN, Destination, Node, NodeConfig};
use ringlock_track::entity::Entity;

use crate::types::{NodeSection, PlatformConfig};

pub const DEFAULT_SEED: u64 = 121_212;
pub const DEFAULT_QUEUE_MAX_SIZE: usize = 50;
pub const DEFAULT_NODE_TICK_PS: u64 = 10 * PS_PER_S;
pub const DEFAULT_LOGGER_TICK_PS: u64 = PS_PER_S;
pub const DEFAULT_THRESHOLD: u64 = 50;
pub const DEFAULT_RING_DELAY_PS: u64 = PS_PER_MS;
pub const DEFAULT_REPORT_DELAY_PS: u64 = 1;

/// One directed ring link between two nodes, by index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LinkDescriptor {
    pub from: usize,
    pub to: usize,
    pub delay_ps: u64,
}

/// One node to logger link.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReportLinkDescriptor {
    pub node: usize,
    pub port: usize,
    pub delay_ps: u64,
}

pub type NodeIdxByName = HashMap<String, usize>;

pub fn index_nodes(cfg: &PlatformConfig) -> Result<NodeIdxByName, SimError> {
    if cfg.nodes.is_empty() {
        return config_mismatch!("platform", "nodes", "at least one node is required");
    }
    let mut idx_by_name = NodeIdxByName::new();
    for (i, node) in cfg.nodes.iter().enumerate() {
        if idx_by_name.insert(node.name.clone(), i).is_some() {
            return sim_error!(format!("Duplicate node name {}", node.name));
        }
    }
    Ok(idx_by_name)
}

fn lookup(idx_by_name: &NodeIdxByName, entity: &str, field: &str, name: &str) -> Result<usize, SimError> {
    match idx_by_name.get(name) {
        Some(idx) => Ok(*idx),
        None => config_mismatch!(entity, field, "unknown node '{name}'"),
    }
}

/// Resolve the ring links of a configuration.
///
/// Without explicit `links` node `i` is connected to node `(i + 1) % n`.
/// Every node must end up with exactly one outgoing and one incoming link.
pub fn resolve_links(
    cfg: &PlatformConfig,
    idx_by_name: &NodeIdxByName,
) -> Result<Vec<LinkDescriptor>, SimError> {
    let num_nodes = cfg.nodes.len();
    let links = match &cfg.links {
        Some(sections) => {
            let mut links = Vec::with_capacity(sections.len());
            for (i, link) in sections.iter().enumerate() {
                let entity = format!("links[{i}]");
                let from = lookup(idx_by_name, &entity, "from", &link.from)?;
                let to = lookup(idx_by_name, &entity, "to", &link.to)?;
                if from == to {
                    return config_mismatch!(entity, "to", "'{}' cannot link to itself", link.to);
                }
                links.push(LinkDescriptor {
                    from,
                    to,
                    delay_ps: link.delay,
                });
            }
            links
        }
        None => {
            if num_nodes < 2 {
                return Ok(Vec::new());
            }
            let delay_ps = cfg.ring_delay.unwrap_or(DEFAULT_RING_DELAY_PS);
            (0..num_nodes)
                .map(|from| LinkDescriptor {
                    from,
                    to: (from + 1) % num_nodes,
                    delay_ps,
                })
                .collect()
        }
    };

    let mut outgoing = vec![0; num_nodes];
    let mut incoming = vec![0; num_nodes];
    for link in &links {
        outgoing[link.from] += 1;
        incoming[link.to] += 1;
    }
    for (i, node) in cfg.nodes.iter().enumerate() {
        if num_nodes > 1 && (outgoing[i] != 1 || incoming[i] != 1) {
            return config_mismatch!(
                node.name,
                "links",
                "needs one outgoing and one incoming link, has {} and {}",
                outgoing[i],
                incoming[i]
            );
        }
    }
    Ok(links)
}

pub fn resolve_report_links(
    cfg: &PlatformConfig,
    idx_by_name: &NodeIdxByName,
) -> Result<Vec<ReportLinkDescriptor>, SimError> {
    let default_delay_ps = cfg.report_delay.unwrap_or(DEFAULT_REPORT_DELAY_PS);
    match (&cfg.logger, &cfg.report_links) {
        (None, None) => Ok(Vec::new()),
        (None, Some(_)) => config_mismatch!("platform", "report_links", "no logger to report to"),
        (Some(_), None) => Ok((0..cfg.nodes.len())
            .map(|node| ReportLinkDescriptor {
                node,
                port: node,
                delay_ps: default_delay_ps,
            })
            .collect()),
        (Some(_), Some(sections)) => {
            let mut links = Vec::with_capacity(sections.len());
            for (i, link) in sections.iter().enumerate() {
                let entity = format!("report_links[{i}]");
                links.push(ReportLinkDescriptor {
                    node: lookup(idx_by_name, &entity, "node", &link.node)?,
                    port: link.port,
                    delay_ps: link.delay.unwrap_or(default_delay_ps),
                });
            }
            Ok(links)
        }
    }
}

fn build_destination(
    section: &NodeSection,
    idx_by_name: &NodeIdxByName,
) -> Result<Destination, SimError> {
    match section.destination.as_deref() {
        None | Some("uniform") => Ok(Destination::Uniform),
        Some(name) => Ok(Destination::Fixed(lookup(
            idx_by_name,
            &section.name,
            "destination",
            name,
        )?)),
    }
}

fn build_node_config(
    cfg: &PlatformConfig,
    id: usize,
    idx_by_name: &NodeIdxByName,
) -> Result<NodeConfig, SimError> {
    let section = &cfg.nodes[id];
    let mut config = NodeConfig::new(
        id,
        cfg.nodes.len(),
        section.queue_max_size.unwrap_or(DEFAULT_QUEUE_MAX_SIZE),
    );
    config.message_gen = section.message_gen.unwrap_or(DEFAULT_MESSAGE_GEN);
    config.forward_quota = section.forward_quota.unwrap_or(1);
    config.destination = build_destination(section, idx_by_name)?;
    config.credit_control = section.credit_control.unwrap_or(true);
    config.issue_credit = section.issue_credit.unwrap_or(true);
    config.seed = cfg.seed.unwrap_or(DEFAULT_SEED);
    Ok(config)
}

pub fn build_nodes(
    engine: &mut Engine,
    parent: &Rc<Entity>,
    cfg: &PlatformConfig,
    idx_by_name: &NodeIdxByName,
) -> Result<Vec<Rc<Node>>, SimError> {
    let mut nodes = Vec::with_capacity(cfg.nodes.len());
    for (id, section) in cfg.nodes.iter().enumerate() {
        let tick_ps = section.tick_freq.unwrap_or(DEFAULT_NODE_TICK_PS);
        if tick_ps == 0 {
            return config_mismatch!(section.name, "tick_freq", "must be non-zero");
        }
        let clock = engine.clock_ps(tick_ps);
        let config = build_node_config(cfg, id, idx_by_name)?;
        let node = Node::new_and_register(engine, &clock, parent, &section.name, config)?;

        if let Some(preload) = &section.preload {
            let dest = lookup(idx_by_name, &section.name, "preload", &preload.destination)?;
            node.preload(dest, preload.count)?;
        }
        nodes.push(node);
    }
    Ok(nodes)
}

pub fn build_logger(
    engine: &mut Engine,
    parent: &Rc<Entity>,
    cfg: &PlatformConfig,
) -> Result<Option<Rc<Logger>>, SimError> {
    let Some(section) = &cfg.logger else {
        return Ok(None);
    };
    let name = section.name.as_deref().unwrap_or("logger");
    let tick_ps = section.tick_freq.unwrap_or(DEFAULT_LOGGER_TICK_PS);
    if tick_ps == 0 {
        return config_mismatch!(name, "tick_freq", "must be non-zero");
    }

    let clock = engine.clock_ps(tick_ps);
    let mut config = LoggerConfig::new(
        section.num_nodes,
        section.idle_threshold.unwrap_or(DEFAULT_THRESHOLD),
        section.request_threshold.unwrap_or(DEFAULT_THRESHOLD),
    );
    config.grace_ps = section.grace_window;
    Ok(Some(Logger::new_and_register(
        engine, &clock, parent, name, config,
    )?))
}

/// Create a channel for every link and connect the nodes through them.
///
/// Links leaving a node in credit mode get a credit channel in the opposite
/// direction.
pub fn connect_links(
    engine: &mut Engine,
    parent: &Rc<Entity>,
    nodes: &[Rc<Node>],
    links: &[LinkDescriptor],
) -> SimResult {
    // Channels use a picosecond clock so that link delays are exact
    let link_clock = engine.clock_ps(1);
    for link in links {
        let from = &nodes[link.from];
        let to = &nodes[link.to];

        let name = format!("link_{}_{}", from.entity.name, to.entity.name);
        let ring = Channel::new_and_register(engine, &link_clock, parent, &name, link.delay_ps)?;
        connect_port!(from, ring_tx => ring, rx)?;
        connect_port!(ring, tx => to, ring_rx)?;

        if from.config().credit_control {
            let name = format!("credit_{}_{}", to.entity.name, from.entity.name);
            let credit =
                Channel::new_and_register(engine, &link_clock, parent, &name, link.delay_ps)?;
            connect_port!(to, credit_tx => credit, rx)?;
            connect_port!(credit, tx => from, credit_rx)?;
        }
    }
    Ok(())
}

pub fn connect_reports(
    engine: &mut Engine,
    parent: &Rc<Entity>,
    nodes: &[Rc<Node>],
    logger: &Rc<Logger>,
    links: &[ReportLinkDescriptor],
) -> SimResult {
    let link_clock = engine.clock_ps(1);
    for link in links {
        let node = &nodes[link.node];
        let name = format!("report_{}", node.entity.name);
        let report = Channel::new_and_register(engine, &link_clock, parent, &name, link.delay_ps)?;
        connect_port!(node, report_tx => report, rx)?;
        connect_port!(report, tx => logger, report_rx, link.port)?;
    }
    logger.validate()
}
