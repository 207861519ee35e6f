// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! A point-to-point link that delivers everything it is sent `delay_ps`
//! picoseconds later, in the order it was sent.
//!
//! A [Channel] has no capacity limit. It never refuses an object, so a
//! receiver that cannot keep up leaves objects waiting in its own input port.
//!
//! # Ports
//!
//! This component has the following ports:
//!  - One [input port](ringlock_engine::port::InPort): `rx`
//!  - One [output port](ringlock_engine::port::OutPort): `tx`
//!
//! # Function
//!
//! The [Channel] is split into two halves so that receiving is never held up
//! by an object waiting to be delivered:
//!
//!  - the input side stamps each object with its arrival time and appends it
//!    to a pending queue.
//!  - the output side waits until the arrival time of the object at the head
//!    of the pending queue and then sends it.
//!
//! ```rust
//! # use ringlock_components::channel::Channel;
//! # use ringlock_components::connect_port;
//! # use ringlock_engine::port::{InPort, OutPort};
//! # use ringlock_engine::run_simulation;
//! # use ringlock_engine::test_helpers::start_test;
//! # use ringlock_engine::time::PS_PER_MS;
//! # use ringlock_engine::types::SimResult;
//! #
//! # fn one_link() -> SimResult {
//! let mut engine = start_test(file!());
//! let clock = engine.clock_ps(1);
//! let top = engine.top().clone();
//!
//! let channel = Channel::new_and_register(&engine, &clock, &top, "link", PS_PER_MS)?;
//!
//! let mut tx = OutPort::new(&top, "tx");
//! let rx = InPort::new(&top, "rx");
//! tx.connect(channel.port_rx())?;
//! channel.connect_port_tx(rx.state())?;
//!
//! tx.put(7_usize)?;
//! engine.spawn(async move {
//!     assert_eq!(rx.get()?.await, 7);
//!     Ok(())
//! });
//! run_simulation!(engine);
//! assert_eq!(engine.time_now_ps(), PS_PER_MS);
//! # Ok(())
//! # }
//! # one_link().unwrap();
//! ```

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use async_trait::async_trait;
use ringlock_engine::engine::Engine;
use ringlock_engine::events::repeated::Repeated;
use ringlock_engine::executor::Spawner;
use ringlock_engine::port::{InPort, OutPort, PortStateResult};
use ringlock_engine::time::clock::Clock;
use ringlock_engine::traits::{Event, Runnable, SimObject};
use ringlock_engine::types::{SimError, SimResult};
use ringlock_model_builder::{EntityDisplay, EntityGet};
use ringlock_track::entity::Entity;
use ringlock_track::{enter, exit, trace};

use crate::{connect_tx, port_rx, take_option};

type Pending<T> = Rc<RefCell<VecDeque<(T, u64)>>>;

#[derive(EntityGet, EntityDisplay)]
pub struct Channel<T>
where
    T: SimObject,
{
    pub entity: Rc<Entity>,
    spawner: Spawner,
    clock: Clock,
    delay_ps: u64,

    rx: RefCell<Option<InPort<T>>>,
    pending: Pending<T>,
    pending_changed: Repeated<()>,
    tx: RefCell<Option<OutPort<T>>>,

    num_delivered: Rc<Cell<usize>>,
}

impl<T> Channel<T>
where
    T: SimObject,
{
    /// Create a channel. The delay is exact when `clock` has a period of
    /// one picosecond, otherwise arrivals are rounded up to the next edge of
    /// `clock`.
    pub fn new_and_register(
        engine: &Engine,
        clock: &Clock,
        parent: &Rc<Entity>,
        name: &str,
        delay_ps: u64,
    ) -> Result<Rc<Self>, SimError> {
        let spawner = engine.spawner();
        let entity = Rc::new(Entity::new(parent, name));
        let tx = OutPort::new(&entity, "tx");
        let rx = InPort::new(&entity, "rx");
        let rc_self = Rc::new(Self {
            entity,
            spawner,
            clock: clock.clone(),
            delay_ps,
            rx: RefCell::new(Some(rx)),
            pending: Rc::new(RefCell::new(VecDeque::new())),
            pending_changed: Repeated::default(),
            tx: RefCell::new(Some(tx)),
            num_delivered: Rc::new(Cell::new(0)),
        });
        engine.register(rc_self.clone());
        Ok(rc_self)
    }

    pub fn connect_port_tx(&self, port_state: PortStateResult<T>) -> SimResult {
        connect_tx!(self.tx, connect ; port_state)
    }

    pub fn port_rx(&self) -> PortStateResult<T> {
        port_rx!(self.rx, state)
    }

    #[must_use]
    pub fn delay_ps(&self) -> u64 {
        self.delay_ps
    }

    /// Number of objects currently travelling along the channel.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.pending.borrow().len()
    }

    #[must_use]
    pub fn num_delivered(&self) -> usize {
        self.num_delivered.get()
    }
}

#[async_trait(?Send)]
impl<T> Runnable for Channel<T>
where
    T: SimObject,
{
    async fn run(&self) -> SimResult {
        // Spawn the output side
        let tx = take_option!(self.tx);
        let entity = self.entity.clone();
        let clock = self.clock.clone();
        let pending = self.pending.clone();
        let pending_changed = self.pending_changed.clone();
        let num_delivered = self.num_delivered.clone();
        self.spawner.spawn(async move {
            run_tx(entity, tx, clock, pending, pending_changed, num_delivered).await
        });

        let rx = take_option!(self.rx);
        loop {
            let value = rx.get()?.await;
            enter!(self.entity ; value.id());

            let arrival_ps = self.clock.time_now_ps() + self.delay_ps;
            trace!(self.entity ; "{} arrives at {}ps", value, arrival_ps);
            self.pending.borrow_mut().push_back((value, arrival_ps));
            self.pending_changed.notify();
        }
    }
}

async fn run_tx<T>(
    entity: Rc<Entity>,
    tx: OutPort<T>,
    clock: Clock,
    pending: Pending<T>,
    pending_changed: Repeated<()>,
    num_delivered: Rc<Cell<usize>>,
) -> SimResult
where
    T: SimObject,
{
    loop {
        let next = pending.borrow().front().map(|(_, arrival_ps)| *arrival_ps);
        match next {
            Some(arrival_ps) => {
                // An object in flight keeps the simulation running
                if arrival_ps > clock.time_now_ps() {
                    let ticks = arrival_ps.div_ceil(clock.period_ps()) - clock.tick_now();
                    clock.wait_ticks(ticks).await;
                }

                // Only this task removes entries so the head is unchanged
                if let Some((value, _)) = pending.borrow_mut().pop_front() {
                    exit!(entity ; value.id());
                    tx.put(value)?;
                    num_delivered.set(num_delivered.get() + 1);
                }
            }
            None => {
                pending_changed.listen().await;
            }
        }
    }
}
