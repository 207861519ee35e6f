// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! A node of a ring network.
//!
//! Each node owns a [`BoundedQueue`] fed by its upstream link, a message
//! generator and, when credit control is enabled, a [`CreditCounter`] for its
//! downstream link. It ticks on its own clock and does all of its work in
//! that tick.
//!
//! # Ports
//!
//! This component has five ports:
//!  - Two [input ports](ringlock_engine::port::InPort): `ring_rx`, `credit_rx`
//!  - Three [output ports](ringlock_engine::port::OutPort): `ring_tx`,
//!    `credit_tx`, `report_tx`
//!
//! `credit_rx` is only read in credit mode. `credit_tx` and `report_tx` are
//! optional and only used when connected.
//!
//! # Diagram
//!
//! ```text
//!                  +------------------------------------------+
//!  -> ring_rx ---> | queue --> deliver                        |
//!                  |   |  \--> forward ---------------------> | --> ring_tx
//!                  |   ^                         ^            |
//!                  | generate                 credits         |
//!  <- credit_tx <- | freed slots          <---------------    | <-- credit_rx
//!                  |                                          | --> report_tx
//!                  +------------------------------------------+
//! ```
//!
//! # Tick
//!
//! Every tick the node:
//!  1. absorbs any credits returned by its downstream neighbour.
//!  2. moves arrived messages into its queue while there is room. Messages
//!     that do not fit stay in `ring_rx`.
//!  3. delivers or forwards up to `forward_quota` messages from the head of
//!     its queue. In credit mode each forward consumes a credit and stalls
//!     when there are none.
//!  4. generates a new message with probability `message_gen`.
//!  5. grants its upstream neighbour credit for every free slot not already
//!     promised to it.
//!  6. classifies the tick and sends a [`StatusReport`].
//!
//! # Credit
//!
//! A node that issues credit counts the credits it has granted and not yet
//! seen used, and only grants free slots beyond that count. Generated
//! messages may still take a credited slot, in which case the arrival waits
//! in `ring_rx`. The outstanding grant never exceeds `queue_max_size`, so
//! neither does that backlog.
//!
//! Without credit control a sender never waits. A full queue then holds
//! arrivals back in its own `ring_rx` without bound.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ringlock_components::flow_controls::credit::CreditCounter;
use ringlock_components::queue::BoundedQueue;
use ringlock_components::types::Credit;
use ringlock_components::{connect_tx, port_rx, take_option};
use ringlock_engine::engine::Engine;
use ringlock_engine::port::{InPort, OutPort, PortStateResult};
use ringlock_engine::time::clock::Clock;
use ringlock_engine::traits::Runnable;
use ringlock_engine::types::{SimError, SimResult};
use ringlock_engine::{config_mismatch, sim_error};
use ringlock_model_builder::{EntityDisplay, EntityGet};
use ringlock_track::entity::Entity;
use ringlock_track::id::Unique;
use ringlock_track::{debug, destroy, trace};

use crate::message::Message;
use crate::status::{StatusReport, TickState};

/// Probability of generating a message each tick when none is configured.
pub const DEFAULT_MESSAGE_GEN: f64 = 0.5;

/// How a node picks the destination of the messages it generates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Destination {
    /// A peer chosen uniformly from all other nodes.
    #[default]
    Uniform,

    /// Always the given node.
    Fixed(usize),
}

#[derive(Clone, Debug)]
pub struct NodeConfig {
    pub id: usize,
    pub total_nodes: usize,
    pub queue_max_size: usize,
    pub message_gen: f64,
    pub forward_quota: usize,
    pub destination: Destination,

    /// Consume a credit for every message sent on `ring_tx`. On by default.
    pub credit_control: bool,

    /// Return credits on `credit_tx`. A node that never does models a stuck
    /// partner.
    pub issue_credit: bool,

    pub seed: u64,
}

impl NodeConfig {
    #[must_use]
    pub fn new(id: usize, total_nodes: usize, queue_max_size: usize) -> Self {
        Self {
            id,
            total_nodes,
            queue_max_size,
            message_gen: DEFAULT_MESSAGE_GEN,
            forward_quota: 1,
            destination: Destination::Uniform,
            credit_control: true,
            issue_credit: true,
            seed: 0,
        }
    }

    fn validate(&self, entity: &Entity) -> SimResult {
        if self.id >= self.total_nodes {
            return config_mismatch!(
                entity,
                "id",
                "{} out of range for {} nodes",
                self.id,
                self.total_nodes
            );
        }
        if !(0.0..=1.0).contains(&self.message_gen) {
            return config_mismatch!(
                entity,
                "message_gen",
                "{} is not a probability",
                self.message_gen
            );
        }
        if self.forward_quota == 0 {
            return config_mismatch!(entity, "forward_quota", "must be at least 1");
        }
        match self.destination {
            Destination::Fixed(dest) if dest >= self.total_nodes => {
                return config_mismatch!(
                    entity,
                    "destination",
                    "{dest} out of range for {} nodes",
                    self.total_nodes
                );
            }
            Destination::Fixed(dest) if dest == self.id => {
                return config_mismatch!(entity, "destination", "node {dest} cannot send to itself");
            }
            Destination::Uniform if self.total_nodes < 2 && self.message_gen > 0.0 => {
                return config_mismatch!(entity, "destination", "no peer to send to");
            }
            _ => {}
        }
        Ok(())
    }
}

/// Counters kept by each node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NodeStats {
    pub ticks: u64,
    pub generated: usize,
    /// Generated messages that were refused by a full queue.
    pub rejected: usize,
    pub delivered: usize,
    pub forwarded: usize,
    /// Ticks on which arrivals were held back plus rejected messages.
    pub queue_full: usize,
    /// Forwards refused for lack of credit.
    pub credit_stalls: usize,
    pub credits_issued: usize,
    pub credits_received: usize,
    pub credits_consumed: usize,
}

struct NodePorts {
    ring_rx: InPort<Message>,
    ring_tx: OutPort<Message>,
    credit_rx: InPort<Credit>,
    credit_tx: OutPort<Credit>,
    report_tx: OutPort<StatusReport>,
}

#[derive(EntityGet, EntityDisplay)]
pub struct Node {
    pub entity: Rc<Entity>,
    config: NodeConfig,
    clock: Clock,

    queue: RefCell<BoundedQueue<Message>>,
    credit: RefCell<CreditCounter>,
    /// Credits given to the upstream neighbour and not yet matched by an
    /// arrival.
    granted: Cell<usize>,
    rng: RefCell<StdRng>,
    next_seq: Cell<u64>,

    stats: RefCell<NodeStats>,
    tick_states: RefCell<Vec<TickState>>,

    ring_rx: RefCell<Option<InPort<Message>>>,
    ring_tx: RefCell<Option<OutPort<Message>>>,
    credit_rx: RefCell<Option<InPort<Credit>>>,
    credit_tx: RefCell<Option<OutPort<Credit>>>,
    report_tx: RefCell<Option<OutPort<StatusReport>>>,
}

impl Node {
    /// Create a node that ticks on every edge of `clock`.
    pub fn new_and_register(
        engine: &Engine,
        clock: &Clock,
        parent: &Rc<Entity>,
        name: &str,
        config: NodeConfig,
    ) -> Result<Rc<Self>, SimError> {
        let entity = Rc::new(Entity::new(parent, name));
        config.validate(&entity)?;

        let queue = BoundedQueue::new(&entity, "queue", config.queue_max_size)?;
        let credit = CreditCounter::new(&entity, "credit");
        let rng = StdRng::seed_from_u64(node_seed(config.seed, config.id));

        let ring_rx = InPort::new(&entity, "ring_rx");
        let ring_tx = OutPort::new(&entity, "ring_tx");
        let credit_rx = InPort::new(&entity, "credit_rx");
        let credit_tx = OutPort::new(&entity, "credit_tx");
        let report_tx = OutPort::new(&entity, "report_tx");

        let rc_self = Rc::new(Self {
            entity,
            config,
            clock: clock.clone(),
            queue: RefCell::new(queue),
            credit: RefCell::new(credit),
            granted: Cell::new(0),
            rng: RefCell::new(rng),
            next_seq: Cell::new(0),
            stats: RefCell::new(NodeStats::default()),
            tick_states: RefCell::new(Vec::new()),
            ring_rx: RefCell::new(Some(ring_rx)),
            ring_tx: RefCell::new(Some(ring_tx)),
            credit_rx: RefCell::new(Some(credit_rx)),
            credit_tx: RefCell::new(Some(credit_tx)),
            report_tx: RefCell::new(Some(report_tx)),
        });
        engine.register(rc_self.clone());
        Ok(rc_self)
    }

    pub fn connect_port_ring_tx(&self, port_state: PortStateResult<Message>) -> SimResult {
        connect_tx!(self.ring_tx, connect ; port_state)
    }

    pub fn port_ring_rx(&self) -> PortStateResult<Message> {
        port_rx!(self.ring_rx, state)
    }

    pub fn connect_port_credit_tx(&self, port_state: PortStateResult<Credit>) -> SimResult {
        connect_tx!(self.credit_tx, connect ; port_state)
    }

    pub fn port_credit_rx(&self) -> PortStateResult<Credit> {
        port_rx!(self.credit_rx, state)
    }

    pub fn connect_port_report_tx(&self, port_state: PortStateResult<StatusReport>) -> SimResult {
        connect_tx!(self.report_tx, connect ; port_state)
    }

    /// Fill the queue with `count` messages for `dest` before the simulation
    /// starts.
    pub fn preload(&self, dest: usize, count: usize) -> SimResult {
        if dest >= self.config.total_nodes {
            return config_mismatch!(
                self.entity,
                "preload",
                "destination {dest} out of range for {} nodes",
                self.config.total_nodes
            );
        }

        let mut queue = self.queue.borrow_mut();
        if count > queue.free_slots() {
            return config_mismatch!(
                self.entity,
                "preload",
                "{count} messages do not fit in a queue with {} free slots",
                queue.free_slots()
            );
        }

        for _ in 0..count {
            let message = Message::new(&self.entity, self.config.id, dest, self.take_seq(), 0);
            queue
                .push(message)
                .or_else(|e| sim_error!(format!("{}: preload {e}", self.entity)))?;
        }
        Ok(())
    }

    #[must_use]
    pub fn id(&self) -> usize {
        self.config.id
    }

    #[must_use]
    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    #[must_use]
    pub fn period_ps(&self) -> u64 {
        self.clock.period_ps()
    }

    /// The classification of every tick so far.
    #[must_use]
    pub fn tick_states(&self) -> Vec<TickState> {
        self.tick_states.borrow().clone()
    }

    #[must_use]
    pub fn stats(&self) -> NodeStats {
        let mut stats = *self.stats.borrow();
        let credit = self.credit.borrow();
        stats.credits_received = credit.issued();
        stats.credits_consumed = credit.consumed();
        stats
    }

    #[must_use]
    pub fn queue_len(&self) -> usize {
        self.queue.borrow().len()
    }

    #[must_use]
    pub fn max_queue_len(&self) -> usize {
        self.queue.borrow().max_level()
    }

    #[must_use]
    pub fn credit_balance(&self) -> usize {
        self.credit.borrow().balance()
    }

    fn take_seq(&self) -> u64 {
        let seq = self.next_seq.get();
        self.next_seq.set(seq + 1);
        seq
    }

    fn choose_destination(&self) -> usize {
        match self.config.destination {
            Destination::Fixed(dest) => dest,
            Destination::Uniform => {
                let peer = self
                    .rng
                    .borrow_mut()
                    .gen_range(0..self.config.total_nodes - 1);
                if peer >= self.config.id { peer + 1 } else { peer }
            }
        }
    }

    /// Credits handed out but not yet used.
    #[must_use]
    pub fn credits_outstanding(&self) -> usize {
        self.granted.get()
    }

    fn issues_credit(&self, ports: &NodePorts) -> bool {
        self.config.issue_credit && ports.credit_tx.is_connected()
    }

    /// Give the upstream neighbour credit for every free slot not already
    /// promised to it.
    fn grant_credit(
        &self,
        ports: &NodePorts,
        free_slots: usize,
        stats: &mut NodeStats,
    ) -> SimResult {
        let grant = free_slots.saturating_sub(self.granted.get());
        if grant > 0 {
            trace!(self.entity ; "grant {grant} credits");
            ports.credit_tx.put(Credit(grant))?;
            self.granted.set(self.granted.get() + grant);
            stats.credits_issued += grant;
        }
        Ok(())
    }

    fn tick(&self, ports: &NodePorts) -> SimResult {
        let tick = self.clock.tick_now();
        let mut stats = self.stats.borrow_mut();
        let mut queue = self.queue.borrow_mut();
        let mut credit = self.credit.borrow_mut();
        stats.ticks += 1;

        let mut blocked = false;
        let mut moved = 0;

        if self.config.credit_control {
            while let Some(granted) = ports.credit_rx.try_get()? {
                credit.absorb(granted);
            }
        }

        // Arrivals that do not fit are left at the link layer
        while !ports.ring_rx.is_empty() {
            if queue.is_full() {
                trace!(self.entity ; "queue full, {} held in ring_rx", ports.ring_rx.len());
                stats.queue_full += 1;
                blocked = true;
                break;
            }
            if let Some(message) = ports.ring_rx.try_get()? {
                self.granted.set(self.granted.get().saturating_sub(1));
                queue
                    .push(message)
                    .or_else(|e| sim_error!(format!("{}: {e} with free slots", self.entity)))?;
            }
        }

        for _ in 0..self.config.forward_quota {
            let Some(dest) = queue.front().map(Message::dest) else {
                break;
            };

            if dest == self.config.id {
                if let Some(message) = queue.pop() {
                    debug!(self.entity ; "deliver {}", message);
                    destroy!(self.entity ; message.id());
                    stats.delivered += 1;
                }
            } else {
                if self.config.credit_control {
                    if let Err(e) = credit.consume() {
                        trace!(self.entity ; "{e}: forward stalled");
                        stats.credit_stalls += 1;
                        blocked = true;
                        break;
                    }
                }
                if let Some(message) = queue.pop() {
                    trace!(self.entity ; "forward {}", message);
                    ports.ring_tx.put(message.forwarded())?;
                    stats.forwarded += 1;
                }
            }
            moved += 1;
        }

        let draw: f64 = self.rng.borrow_mut().gen_range(0.0..1.0);
        if draw < self.config.message_gen {
            let dest = self.choose_destination();
            let message = Message::new(&self.entity, self.config.id, dest, self.take_seq(), tick);
            let message_id = message.id();
            stats.generated += 1;
            if let Err(e) = queue.push(message) {
                debug!(self.entity ; "{e}: generated message rejected");
                destroy!(self.entity ; message_id);
                stats.rejected += 1;
                stats.queue_full += 1;
                blocked = true;
            }
        }

        if self.issues_credit(ports) {
            self.grant_credit(ports, queue.free_slots(), &mut stats)?;
        }

        let state = if moved > 0 {
            TickState::Active
        } else if blocked {
            TickState::Blocked
        } else {
            TickState::Idle
        };
        trace!(self.entity ; "tick {tick}: {state}, {} queued", queue.len());
        self.tick_states.borrow_mut().push(state);

        if ports.report_tx.is_connected() {
            ports.report_tx.put(StatusReport {
                node_id: self.config.id,
                node_tick: tick,
                state,
                queue_occupancy: queue.len(),
                period_ps: self.clock.period_ps(),
                time_ps: self.clock.time_now_ps(),
            })?;
        }
        Ok(())
    }
}

#[async_trait(?Send)]
impl Runnable for Node {
    async fn run(&self) -> SimResult {
        let ports = NodePorts {
            ring_rx: take_option!(self.ring_rx),
            ring_tx: take_option!(self.ring_tx),
            credit_rx: take_option!(self.credit_rx),
            credit_tx: take_option!(self.credit_tx),
            report_tx: take_option!(self.report_tx),
        };

        if self.issues_credit(&ports) {
            let free_slots = self.queue.borrow().free_slots();
            self.grant_credit(&ports, free_slots, &mut self.stats.borrow_mut())?;
        }

        loop {
            self.clock.wait_ticks_or_exit(1).await;
            self.tick(&ports)?;
        }
    }
}

/// Derive the seed of one node so that nodes sharing a configured seed do not
/// draw the same sequence.
#[must_use]
pub fn node_seed(seed: u64, id: usize) -> u64 {
    seed ^ (id as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}
