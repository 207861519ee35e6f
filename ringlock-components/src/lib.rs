// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! Simulation components.
//!
//! The building blocks that ring models are made of:
//!  - [`Channel`](channel::Channel): a point-to-point link with a fixed
//!    propagation delay.
//!  - [`BoundedQueue`](queue::BoundedQueue): a FIFO that never holds more
//!    than its capacity.
//!  - [`CreditCounter`](flow_controls::credit::CreditCounter): the credit
//!    balance for a credit controlled link.

pub mod channel;
pub mod connect;
pub mod flow_controls;
pub mod queue;
pub mod types;
