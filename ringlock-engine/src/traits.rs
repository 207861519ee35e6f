// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! A set of common traits used across the ringlock engine.

use std::fmt::{Debug, Display};
use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;
use ringlock_track::id::Unique;

use crate::types::SimResult;

/// Anything carried by a port: messages, credits, status reports.
///
/// `Unique` lets queues and channels emit enter/exit events for the object.
/// `'static` is needed because the objects are held by spawned futures.
pub trait SimObject: Clone + Debug + Display + Unique + 'static {}

impl SimObject for usize {}

/// Something that can be waited on, such as a clock edge or a logger
/// declaring deadlock.
pub trait Event<T> {
    #[must_use = "Futures do nothing unless you `.await` or otherwise use them"]
    fn listen(&self) -> BoxFuture<'static, T>;

    /// Allow cloning of Boxed elements
    fn clone_dyn(&self) -> Box<dyn Event<T>>;
}

/// Provide Clone implementation for boxed Event
impl<T> Clone for Box<dyn Event<T>> {
    fn clone(self: &Box<dyn Event<T>>) -> Box<dyn Event<T>> {
        self.clone_dyn()
    }
}

/// A component with its own task, spawned once by the
/// [`Engine`](crate::engine::Engine) when the run starts. Nodes and loggers
/// loop on their clock inside `run`.
#[async_trait(?Send)]
pub trait Runnable {
    async fn run(&self) -> SimResult;
}

pub type BoxFuture<'a, T> = Pin<std::boxed::Box<dyn Future<Output = T> + 'a>>;
