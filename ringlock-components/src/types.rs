// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! Types shared between components.

use std::error::Error;
use std::fmt;

use ringlock_engine::traits::SimObject;
use ringlock_track::id::Unique;
use ringlock_track::{Id, NO_ID};

/// A grant of permission to send `n` messages on a credit controlled link.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Credit(pub usize);

impl fmt::Display for Credit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credit({})", self.0)
    }
}

/// Credits are not tracked individually.
impl Unique for Credit {
    fn id(&self) -> Id {
        NO_ID
    }
}

impl SimObject for Credit {}

/// Recoverable flow-control conditions.
///
/// These never stop a simulation. The model that sees one decides how it
/// affects its state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlowError {
    /// A push to a [`BoundedQueue`](crate::queue::BoundedQueue) that is at
    /// capacity.
    QueueFull,

    /// A send on a credit controlled link with a zero balance.
    CreditExhausted,
}

impl fmt::Display for FlowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowError::QueueFull => write!(f, "QueueFull"),
            FlowError::CreditExhausted => write!(f, "CreditExhausted"),
        }
    }
}

impl Error for FlowError {}
