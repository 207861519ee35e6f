// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Build ring networks from configuration files.
//!
//! A [`Platform`] is described by a YAML [`PlatformConfig`]:
//!
//! ```rust
//! use ringlock_engine::engine::Engine;
//! use ringlock_platform::Platform;
//!
//! let mut engine = Engine::default();
//! let platform = Platform::from_string(
//!     &mut engine,
//!     r"
//! nodes:
//!   - { name: node0, queue_max_size: 4, tick_freq: 1ms, message_gen: 0.0 }
//!   - { name: node1, queue_max_size: 4, tick_freq: 1ms, message_gen: 0.0 }
//! logger:
//!   tick_freq: 1ms
//!   num_nodes: 2
//!   idle_threshold: 5
//! ",
//! )
//! .unwrap();
//!
//! let deadlocked = platform.run(&mut engine, 1_000_000_000_000).unwrap();
//! assert!(deadlocked);
//! ```

use std::collections::HashMap;
use std::fmt::{self, Display};
use std::path::Path;
use std::rc::Rc;

use ringlock_engine::engine::Engine;
use ringlock_engine::sim_error;
use ringlock_engine::types::SimError;
use ringlock_model_builder::EntityGet;
use ringlock_models::logger::Logger;
use ringlock_models::node::Node;
use ringlock_track::entity::{Entity, GetEntity};

use crate::builder::{
    LinkDescriptor, build_logger, build_nodes, connect_links, connect_reports, index_nodes,
    resolve_links, resolve_report_links,
};
use crate::types::PlatformConfig;

pub mod builder;
pub mod random;
pub mod types;

#[derive(EntityGet)]
pub struct Platform {
    entity: Rc<Entity>,
    nodes: Vec<Rc<Node>>,
    nodes_idx_by_name: HashMap<String, usize>,
    logger: Option<Rc<Logger>>,
    links: Vec<LinkDescriptor>,
}

impl Platform {
    pub fn from_file(engine: &mut Engine, platform_path: &Path) -> Result<Self, SimError> {
        let s = std::fs::read_to_string(platform_path)
            .map_err(|e| SimError(format!("Unable to read {}: {e}", platform_path.display())))?;
        Platform::from_string(engine, &s)
            .map_err(|e| SimError(format!("{}: {}", platform_path.display(), e.0)))
    }

    pub fn from_string(engine: &mut Engine, platform_config: &str) -> Result<Self, SimError> {
        let cfg: PlatformConfig = serde_yaml::from_str(platform_config)
            .map_err(|e| SimError(format!("serde_yaml::from_str failed: {e}")))?;
        Platform::build(engine, &cfg)
    }

    /// Create all nodes, the logger and the channels between them.
    pub fn build(engine: &mut Engine, cfg: &PlatformConfig) -> Result<Self, SimError> {
        let nodes_idx_by_name = index_nodes(cfg)?;
        let links = resolve_links(cfg, &nodes_idx_by_name)?;
        let report_links = resolve_report_links(cfg, &nodes_idx_by_name)?;

        let top = engine.top().clone();
        let nodes = build_nodes(engine, &top, cfg, &nodes_idx_by_name)?;
        let logger = build_logger(engine, &top, cfg)?;

        connect_links(engine, &top, &nodes, &links)?;
        if let Some(logger) = &logger {
            connect_reports(engine, &top, &nodes, logger, &report_links)?;
        }

        let entity = Rc::new(Entity::new(&top, "platform"));
        Ok(Platform {
            entity,
            nodes,
            nodes_idx_by_name,
            logger,
            links,
        })
    }

    /// Run for at most `run_ps`, stopping early if the logger declares a
    /// deadlock.
    ///
    /// Returns whether a deadlock was declared.
    pub fn run(&self, engine: &mut Engine, run_ps: u64) -> Result<bool, SimError> {
        let deadlock = self.logger.as_ref().map(|l| l.deadlock_declared());
        engine.run_for(run_ps, deadlock)
    }

    pub fn node_idx_from_name(&self, node_name: &str) -> Result<usize, SimError> {
        match self.nodes_idx_by_name.get(node_name) {
            Some(idx) => Ok(*idx),
            None => sim_error!(format!("No Node '{node_name}'")),
        }
    }

    pub fn node(&self, node_name: &str) -> Result<&Rc<Node>, SimError> {
        let idx = self.node_idx_from_name(node_name)?;
        Ok(&self.nodes[idx])
    }

    #[must_use]
    pub fn nodes(&self) -> &[Rc<Node>] {
        &self.nodes
    }

    #[must_use]
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn logger(&self) -> Option<&Rc<Logger>> {
        self.logger.as_ref()
    }

    #[must_use]
    pub fn links(&self) -> &[LinkDescriptor] {
        &self.links
    }
}

impl Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Nodes:")?;
        for (i, node) in self.nodes.iter().enumerate() {
            let config = node.config();
            writeln!(
                f,
                "  {i}: {} (queue {}, tick {}, message_gen {})",
                node.entity(),
                config.queue_max_size,
                types::format_duration(node.period_ps()),
                config.message_gen
            )?;
        }

        writeln!(f, "\nLinks:")?;
        for link in &self.links {
            writeln!(
                f,
                "  {} -> {} ({})",
                self.nodes[link.from].entity(),
                self.nodes[link.to].entity(),
                types::format_duration(link.delay_ps)
            )?;
        }

        if let Some(logger) = &self.logger {
            writeln!(f, "\nLogger:")?;
            writeln!(f, "  {} ({} nodes)", logger.entity(), logger.num_nodes())?;
        }
        Ok(())
    }
}
