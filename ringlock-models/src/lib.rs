// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! Models of a ring network and of the logger that watches it for deadlock.
//!
//! - [`Node`](node::Node): generates, queues, forwards and delivers
//!   [`Message`](message::Message)s under bounded capacity and optional
//!   credit flow control, and reports its [`TickState`](status::TickState)
//!   every tick.
//! - [`Logger`](logger::Logger): collects the
//!   [`StatusReport`](status::StatusReport)s of every node and declares a
//!   deadlock once all of them have been starved for long enough.

pub mod logger;
pub mod message;
pub mod node;
pub mod status;
pub mod test_helpers;
