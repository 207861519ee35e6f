// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! The distributed deadlock logger.
//!
//! The logger has one `report_rx` port per node. On each of its own ticks it
//! drains every port and hands the reports to a [`DeadlockMonitor`]. A
//! deadlock is declared when every node has been idle or blocked for at least
//! the configured number of consecutive ticks, at which point the logger
//! notifies [`Logger::deadlock_declared`]. Reports that arrive after that are
//! drained and dropped.
//!
//! # Ports
//!
//! This component has `num_nodes` [input ports](ringlock_engine::port::InPort),
//! connected with the indexed form of
//! [`connect_port!`](ringlock_components::connect_port):
//!
//! ```text
//!  node0.report_tx --> report_rx[0] +--------+
//!  node1.report_tx --> report_rx[1] | logger |
//!        ...           ...          +--------+
//! ```

pub mod monitor;

use std::cell::{Cell, RefCell};
use std::io::{self, Write};
use std::rc::Rc;

use async_trait::async_trait;
use ringlock_components::take_option;
use ringlock_engine::engine::Engine;
use ringlock_engine::events::once::Once;
use ringlock_engine::port::{InPort, PortStateResult};
use ringlock_engine::time::clock::Clock;
use ringlock_engine::traits::Runnable;
use ringlock_engine::types::{Eventable, SimError, SimResult};
use ringlock_engine::{config_mismatch, sim_error};
use ringlock_model_builder::{EntityDisplay, EntityGet};
use ringlock_track::entity::Entity;
use ringlock_track::{debug, info, warn};

use self::monitor::{DeadlockEvent, DeadlockMonitor, LoggerState, NodeRecord, TickSummary};
use crate::status::StatusReport;

#[derive(Clone, Debug)]
pub struct LoggerConfig {
    pub num_nodes: usize,

    /// Consecutive idle ticks after which a node counts as stalled.
    pub idle_threshold: u64,

    /// Consecutive blocked ticks after which a node counts as stalled.
    pub request_threshold: u64,

    /// How late a report may be before its node is treated as silent. Two
    /// logger periods when not set.
    pub grace_ps: Option<u64>,
}

impl LoggerConfig {
    #[must_use]
    pub fn new(num_nodes: usize, idle_threshold: u64, request_threshold: u64) -> Self {
        Self {
            num_nodes,
            idle_threshold,
            request_threshold,
            grace_ps: None,
        }
    }
}

#[derive(EntityGet, EntityDisplay)]
pub struct Logger {
    pub entity: Rc<Entity>,
    clock: Clock,
    config: LoggerConfig,
    monitor: RefCell<DeadlockMonitor>,
    report_rx: RefCell<Option<Vec<InPort<StatusReport>>>>,
    declared: Once<()>,
    dropped: Cell<u64>,
}

impl Logger {
    pub fn new_and_register(
        engine: &Engine,
        clock: &Clock,
        parent: &Rc<Entity>,
        name: &str,
        config: LoggerConfig,
    ) -> Result<Rc<Self>, SimError> {
        let entity = Rc::new(Entity::new(parent, name));
        if config.num_nodes == 0 {
            return config_mismatch!(entity, "num_nodes", "must be at least 1");
        }
        if config.idle_threshold == 0 {
            return config_mismatch!(entity, "idle_threshold", "must be at least 1");
        }
        if config.request_threshold == 0 {
            return config_mismatch!(entity, "request_threshold", "must be at least 1");
        }

        let grace_ps = config.grace_ps.unwrap_or(2 * clock.period_ps());
        let monitor = DeadlockMonitor::new(
            config.num_nodes,
            config.idle_threshold,
            config.request_threshold,
            grace_ps,
        );
        let report_rx = (0..config.num_nodes)
            .map(|i| InPort::new(&entity, &format!("report_rx{i}")))
            .collect();

        let rc_self = Rc::new(Self {
            entity,
            clock: clock.clone(),
            config,
            monitor: RefCell::new(monitor),
            report_rx: RefCell::new(Some(report_rx)),
            declared: Once::default(),
            dropped: Cell::new(0),
        });
        engine.register(rc_self.clone());
        Ok(rc_self)
    }

    pub fn port_report_rx_i(&self, i: usize) -> PortStateResult<StatusReport> {
        match self.report_rx.borrow().as_ref() {
            Some(ports) => match ports.get(i) {
                Some(port) => port.state(),
                None => config_mismatch!(
                    self.entity,
                    "num_nodes",
                    "no report port {i} on a logger for {} nodes",
                    self.config.num_nodes
                ),
            },
            None => sim_error!("port already in use by a running component"),
        }
    }

    /// Check that a node is connected to every report port.
    pub fn validate(&self) -> SimResult {
        match self.report_rx.borrow().as_ref() {
            Some(ports) => self.check_connected(ports),
            None => Ok(()),
        }
    }

    fn check_connected(&self, ports: &[InPort<StatusReport>]) -> SimResult {
        let connected = ports.iter().filter(|p| p.is_connected()).count();
        if connected != self.config.num_nodes {
            return config_mismatch!(
                self.entity,
                "num_nodes",
                "{} report ports but {connected} connected",
                self.config.num_nodes
            );
        }
        Ok(())
    }

    /// An event that fires when a deadlock is declared.
    #[must_use]
    pub fn deadlock_declared(&self) -> Eventable<()> {
        Box::new(self.declared.clone())
    }

    #[must_use]
    pub fn state(&self) -> LoggerState {
        self.monitor.borrow().state()
    }

    #[must_use]
    pub fn deadlock_event(&self) -> Option<DeadlockEvent> {
        self.monitor.borrow().event().cloned()
    }

    #[must_use]
    pub fn records(&self) -> Vec<NodeRecord> {
        self.monitor.borrow().records().to_vec()
    }

    #[must_use]
    pub fn history(&self) -> Vec<TickSummary> {
        self.monitor.borrow().history().to_vec()
    }

    pub fn write_history_csv(&self, writer: &mut dyn Write) -> io::Result<()> {
        monitor::write_history_csv(writer, self.config.num_nodes, self.monitor.borrow().history())
    }

    /// Reports read and dropped after the deadlock was declared.
    #[must_use]
    pub fn reports_dropped(&self) -> u64 {
        self.dropped.get()
    }

    #[must_use]
    pub fn num_nodes(&self) -> usize {
        self.config.num_nodes
    }

    fn drain(port: &InPort<StatusReport>) -> Result<Vec<StatusReport>, SimError> {
        let mut reports = Vec::new();
        while let Some(report) = port.try_get()? {
            reports.push(report);
        }
        Ok(reports)
    }

    fn log_records(&self) {
        for record in self.monitor.borrow().records() {
            let state = match (record.in_gap, record.last_state) {
                (false, Some(state)) => state.to_string(),
                _ => String::from("unknown"),
            };
            debug!(self.entity ; "node {}: {state}, idle {}, requests {}",
                record.node_id, record.consecutive_idle, record.consecutive_request);
        }
    }
}

#[async_trait(?Send)]
impl Runnable for Logger {
    async fn run(&self) -> SimResult {
        let ports = take_option!(self.report_rx);
        self.check_connected(&ports)?;

        loop {
            self.clock.wait_ticks_or_exit(1).await;

            let batches = ports
                .iter()
                .map(Self::drain)
                .collect::<Result<Vec<_>, SimError>>()?;
            let outcome = self.monitor.borrow_mut().tick(
                self.clock.tick_now(),
                self.clock.time_now_ps(),
                &batches,
            );

            for node in outcome.entered_gap {
                warn!(self.entity ; "no report from node {node}, excluded from detection");
            }
            for node in outcome.left_gap {
                debug!(self.entity ; "node {node} reporting again");
            }
            self.log_records();
            if let Some(event) = outcome.declared {
                info!(self.entity ; "{event}");
                self.declared.notify()?;
                break;
            }
        }

        loop {
            self.clock.wait_ticks_or_exit(1).await;
            for port in &ports {
                let dropped = Self::drain(port)?.len() as u64;
                self.dropped.set(self.dropped.get() + dropped);
            }
        }
    }
}
