// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Deadlock detection over batches of status reports.
//!
//! The [`DeadlockMonitor`] holds no ports and no clock so that it can be
//! driven directly. The [`Logger`](super::Logger) component feeds it once per
//! logger tick with everything that arrived since the previous tick.

use std::fmt;
use std::io::{self, Write};

use crate::status::{StatusReport, TickState};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoggerState {
    Monitoring,
    DeadlockDeclared,
}

impl fmt::Display for LoggerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoggerState::Monitoring => write!(f, "Monitoring"),
            LoggerState::DeadlockDeclared => write!(f, "DeadlockDeclared"),
        }
    }
}

/// What the logger knows about one node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeRecord {
    pub node_id: usize,
    pub consecutive_idle: u64,
    pub consecutive_request: u64,
    pub last_state: Option<TickState>,
    pub last_report_tick: Option<u64>,
    pub last_report_ps: Option<u64>,
    pub period_ps: u64,

    /// No report has arrived within one node period plus the grace window.
    /// A node that has never reported is in a gap.
    pub in_gap: bool,
    pub gaps_entered: u64,

    pub state_changes: u64,
    pub reports_seen: u64,
    /// Reports that arrived in the same batch as a more recent one.
    pub reports_superseded: u64,
}

impl NodeRecord {
    fn new(node_id: usize) -> Self {
        Self {
            node_id,
            consecutive_idle: 0,
            consecutive_request: 0,
            last_state: None,
            last_report_tick: None,
            last_report_ps: None,
            period_ps: 0,
            in_gap: true,
            gaps_entered: 0,
            state_changes: 0,
            reports_seen: 0,
            reports_superseded: 0,
        }
    }

    fn apply(&mut self, report: &StatusReport) {
        match report.state {
            TickState::Idle => {
                self.consecutive_idle += 1;
                self.consecutive_request = 0;
            }
            TickState::Blocked => {
                self.consecutive_request += 1;
                self.consecutive_idle = 0;
            }
            TickState::Active => {
                self.consecutive_idle = 0;
                self.consecutive_request = 0;
            }
        }
        if self.last_state.is_some_and(|last| last != report.state) {
            self.state_changes += 1;
        }
        self.node_id = report.node_id;
        self.last_state = Some(report.state);
        self.last_report_tick = Some(report.node_tick);
        self.last_report_ps = Some(report.time_ps);
        self.period_ps = report.period_ps;
    }

    fn is_overdue(&self, now_ps: u64, grace_ps: u64) -> bool {
        match self.last_report_ps {
            Some(last_ps) => now_ps > last_ps + self.period_ps + grace_ps,
            None => true,
        }
    }

    fn counters(&self) -> NodeCounters {
        NodeCounters {
            node_id: self.node_id,
            consecutive_idle: self.consecutive_idle,
            consecutive_request: self.consecutive_request,
            last_state: self.last_state,
        }
    }
}

/// The counters of one node at the moment a deadlock was declared.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeCounters {
    pub node_id: usize,
    pub consecutive_idle: u64,
    pub consecutive_request: u64,
    pub last_state: Option<TickState>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeadlockEvent {
    pub logger_tick: u64,
    pub time_ps: u64,
    pub nodes: Vec<NodeCounters>,
}

impl DeadlockEvent {
    #[must_use]
    pub fn node_ids(&self) -> Vec<usize> {
        self.nodes.iter().map(|n| n.node_id).collect()
    }
}

impl fmt::Display for DeadlockEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "deadlock at logger tick {} ({}ps) across nodes [",
            self.logger_tick, self.time_ps
        )?;
        for (i, node) in self.nodes.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(
                f,
                "{}: idle={} request={}",
                node.node_id, node.consecutive_idle, node.consecutive_request
            )?;
        }
        write!(f, "]")
    }
}

/// The state of one node as seen on one logger tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeSummary {
    pub consecutive_idle: u64,
    pub consecutive_request: u64,
    pub state_changes: u64,
    pub in_gap: bool,
}

/// One row of logger history.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TickSummary {
    pub logger_tick: u64,
    pub time_ps: u64,
    pub nodes: Vec<NodeSummary>,
}

impl TickSummary {
    fn write_csv(&self, writer: &mut dyn Write) -> io::Result<()> {
        write!(writer, "{},{}", self.logger_tick, self.time_ps)?;
        for node in &self.nodes {
            write!(
                writer,
                ",{},{},{},{}",
                node.consecutive_idle,
                node.consecutive_request,
                node.state_changes,
                u8::from(node.in_gap)
            )?;
        }
        writeln!(writer)
    }
}

/// Write logger history as CSV, one row per logger tick.
pub fn write_history_csv(
    writer: &mut dyn Write,
    num_nodes: usize,
    history: &[TickSummary],
) -> io::Result<()> {
    write!(writer, "logger_tick,time_ps")?;
    for i in 0..num_nodes {
        write!(
            writer,
            ",node{i}_idle,node{i}_request,node{i}_changes,node{i}_gap"
        )?;
    }
    writeln!(writer)?;
    for row in history {
        row.write_csv(writer)?;
    }
    Ok(())
}

/// Changes caused by one call to [`DeadlockMonitor::tick`].
#[derive(Debug, Default)]
pub struct TickOutcome {
    /// Nodes that had reported before and have now gone quiet.
    pub entered_gap: Vec<usize>,

    /// Nodes that reported again after a gap.
    pub left_gap: Vec<usize>,

    pub declared: Option<DeadlockEvent>,
}

pub struct DeadlockMonitor {
    idle_threshold: u64,
    request_threshold: u64,
    grace_ps: u64,
    records: Vec<NodeRecord>,
    state: LoggerState,
    event: Option<DeadlockEvent>,
    history: Vec<TickSummary>,
}

impl DeadlockMonitor {
    #[must_use]
    pub fn new(num_nodes: usize, idle_threshold: u64, request_threshold: u64, grace_ps: u64) -> Self {
        Self {
            idle_threshold,
            request_threshold,
            grace_ps,
            records: (0..num_nodes).map(NodeRecord::new).collect(),
            state: LoggerState::Monitoring,
            event: None,
            history: Vec::new(),
        }
    }

    /// Consume one batch of reports per node.
    ///
    /// Only the most recent report in a batch updates the counters of its
    /// node. Once a deadlock has been declared further batches are ignored.
    pub fn tick(
        &mut self,
        logger_tick: u64,
        now_ps: u64,
        batches: &[Vec<StatusReport>],
    ) -> TickOutcome {
        let mut outcome = TickOutcome::default();
        if self.state == LoggerState::DeadlockDeclared {
            return outcome;
        }

        for (record, batch) in self.records.iter_mut().zip(batches) {
            if let Some(latest) = batch.last() {
                record.reports_seen += batch.len() as u64;
                record.reports_superseded += batch.len() as u64 - 1;
                record.apply(latest);
            }
        }

        for (i, record) in self.records.iter_mut().enumerate() {
            let in_gap = record.is_overdue(now_ps, self.grace_ps);
            if in_gap && !record.in_gap {
                record.gaps_entered += 1;
                outcome.entered_gap.push(i);
            } else if !in_gap && record.in_gap && record.gaps_entered > 0 {
                outcome.left_gap.push(i);
            }
            record.in_gap = in_gap;
        }

        self.history.push(TickSummary {
            logger_tick,
            time_ps: now_ps,
            nodes: self
                .records
                .iter()
                .map(|r| NodeSummary {
                    consecutive_idle: r.consecutive_idle,
                    consecutive_request: r.consecutive_request,
                    state_changes: r.state_changes,
                    in_gap: r.in_gap,
                })
                .collect(),
        });

        if self.all_nodes_stalled() {
            let event = DeadlockEvent {
                logger_tick,
                time_ps: now_ps,
                nodes: self.records.iter().map(NodeRecord::counters).collect(),
            };
            self.state = LoggerState::DeadlockDeclared;
            self.event = Some(event.clone());
            outcome.declared = Some(event);
        }
        outcome
    }

    /// Every node reports and has been idle or requesting for long enough.
    fn all_nodes_stalled(&self) -> bool {
        !self.records.is_empty()
            && self.records.iter().all(|r| {
                !r.in_gap
                    && (r.consecutive_idle >= self.idle_threshold
                        || r.consecutive_request >= self.request_threshold)
            })
    }

    #[must_use]
    pub fn state(&self) -> LoggerState {
        self.state
    }

    #[must_use]
    pub fn records(&self) -> &[NodeRecord] {
        &self.records
    }

    #[must_use]
    pub fn event(&self) -> Option<&DeadlockEvent> {
        self.event.as_ref()
    }

    #[must_use]
    pub fn history(&self) -> &[TickSummary] {
        &self.history
    }
}
