// Copyright (c) 2024 Graphcore Ltd. All rights reserved.

//! Port
//!
//! Ports carry objects between components. An [`OutPort`] is connected to
//! exactly one [`InPort`] and they share a [`PortState`] holding the objects
//! that have been sent but not yet consumed.
//!
//! Sending never blocks: [`OutPort::put`] appends to the shared buffer and
//! wakes any task waiting in [`InPort::get`]. This lets a receiver that is
//! unable to accept more work leave objects queued in the port, which is how
//! back-pressure is seen by the link that feeds it.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use futures::Future;
use futures::future::FusedFuture;
use ringlock_track::connect;
use ringlock_track::entity::Entity;

use crate::sim_error;
use crate::traits::SimObject;
use crate::types::{SimError, SimResult};

pub type PortStateResult<T> = Result<Rc<PortState<T>>, SimError>;
pub type PortGetResult<T> = Result<PortGet<T>, SimError>;

/// Objects sent to an [`InPort`] and not yet taken.
pub struct PortState<T: SimObject> {
    values: RefCell<VecDeque<T>>,
    waiting_get: RefCell<Option<Waker>>,
    pub in_port_entity: Rc<Entity>,
}

impl<T: SimObject> PortState<T> {
    fn new(in_port_entity: Rc<Entity>) -> Self {
        Self {
            values: RefCell::new(VecDeque::new()),
            waiting_get: RefCell::new(None),
            in_port_entity,
        }
    }
}

pub struct InPort<T: SimObject> {
    pub entity: Rc<Entity>,
    state: Rc<PortState<T>>,
    connected: Cell<bool>,
}

impl<T: SimObject> fmt::Display for InPort<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.entity.fmt(f)
    }
}

impl<T: SimObject> InPort<T> {
    #[must_use]
    pub fn new(parent: &Rc<Entity>, name: &str) -> Self {
        let entity = Rc::new(Entity::new(parent, name));
        Self {
            entity: entity.clone(),
            state: Rc::new(PortState::new(entity)),
            connected: Cell::new(false),
        }
    }

    /// Hand out the shared state so that an [`OutPort`] can be connected.
    ///
    /// Only one [`OutPort`] can ever be connected to an [`InPort`].
    pub fn state(&self) -> PortStateResult<T> {
        if self.connected.replace(true) {
            return sim_error!(format!("{self} already connected"));
        }
        Ok(self.state.clone())
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.get()
    }

    /// Wait for the next object.
    #[must_use = "Futures do nothing unless you `.await` or otherwise use them"]
    pub fn get(&self) -> PortGetResult<T> {
        self.check_connected()?;
        Ok(PortGet {
            state: self.state.clone(),
            done: false,
        })
    }

    /// Take the next object if there is one without waiting.
    pub fn try_get(&self) -> Result<Option<T>, SimError> {
        self.check_connected()?;
        Ok(self.state.values.borrow_mut().pop_front())
    }

    fn check_connected(&self) -> SimResult {
        if self.connected.get() {
            Ok(())
        } else {
            sim_error!(format!("{self} not connected"))
        }
    }

    /// Number of objects waiting in this port.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.values.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.values.borrow().is_empty()
    }
}

pub struct OutPort<T: SimObject> {
    pub entity: Rc<Entity>,
    state: Option<Rc<PortState<T>>>,
}

impl<T: SimObject> fmt::Display for OutPort<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.entity.fmt(f)
    }
}

impl<T: SimObject> OutPort<T> {
    #[must_use]
    pub fn new(parent: &Rc<Entity>, name: &str) -> Self {
        let entity = Rc::new(Entity::new(parent, name));
        Self {
            entity,
            state: None,
        }
    }

    pub fn connect(&mut self, port_state: PortStateResult<T>) -> SimResult {
        let port_state = port_state?;
        if self.state.is_some() {
            return sim_error!(format!("{self} already connected"));
        }
        connect!(self.entity ; port_state.in_port_entity);
        self.state = Some(port_state);
        Ok(())
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state.is_some()
    }

    /// Send an object. The object is buffered by the connected [`InPort`].
    pub fn put(&self, value: T) -> SimResult {
        let Some(state) = self.state.as_ref() else {
            return sim_error!(format!("{self} not connected"));
        };
        state.values.borrow_mut().push_back(value);
        if let Some(waker) = state.waiting_get.borrow_mut().take() {
            waker.wake();
        }
        Ok(())
    }
}

pub struct PortGet<T: SimObject> {
    state: Rc<PortState<T>>,
    done: bool,
}

impl<T: SimObject> Future for PortGet<T> {
    type Output = T;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let next = self.state.values.borrow_mut().pop_front();
        match next {
            Some(value) => {
                self.done = true;
                Poll::Ready(value)
            }
            None => {
                self.state.waiting_get.replace(Some(cx.waker().clone()));
                Poll::Pending
            }
        }
    }
}

impl<T: SimObject> FusedFuture for PortGet<T> {
    fn is_terminated(&self) -> bool {
        self.done
    }
}
