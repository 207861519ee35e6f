// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! The [`Track`] trait and the [`Tracker`]s implementing it.

pub mod dev_null;
pub mod entity_manager;
pub mod event;
pub mod in_memory;
pub mod multi_tracker;
pub mod text;

use std::io;
use std::rc::Rc;

pub use dev_null::DevNullTracker;
pub use entity_manager::EntityManager;
pub use event::TrackEvent;
pub use in_memory::InMemoryTracker;
pub use multi_tracker::MultiTracker;
pub use text::TextTracker;

use crate::Id;

/// Error used to return configuration errors
#[derive(Debug)]
pub struct TrackConfigError(pub String);

impl std::fmt::Display for TrackConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Error: {}", self.0)
    }
}

impl std::error::Error for TrackConfigError {}

/// The interface supported by all [`Tracker`]s.
///
/// Callers go through the macros of this crate, which check
/// [`is_entity_enabled`](Track::is_entity_enabled) before building an event.
pub trait Track {
    /// Allocate a new global ID.
    fn unique_id(&self) -> Id;

    /// Whether entity `id` emits events at `level`.
    fn is_entity_enabled(&self, id: Id, level: log::Level) -> bool;

    /// Register an entity and its full hierarchical name.
    fn add_entity(&self, id: Id, entity_name: &str);

    /// Record a _trace_ event.
    fn event(&self, event: &TrackEvent);

    /// Record a _log_ message.
    fn log(&self, msg_by: Id, level: log::Level, msg: std::fmt::Arguments);

    /// Flush any buffered output before the program exits.
    fn shutdown(&self);
}

/// The type of a [`Tracker`] that is shared across entities.
pub type Tracker = Rc<dyn Track>;

/// Create a [`Tracker`] that prints all enabled events to `stdout`.
#[must_use]
pub fn stdout_tracker(level: log::Level) -> Tracker {
    let writer = Box::new(io::BufWriter::new(io::stdout()));
    Rc::new(TextTracker::new(EntityManager::new(level), writer))
}

/// Create a [`Tracker`] that suppresses all events.
#[must_use]
pub fn dev_null_tracker() -> Tracker {
    Rc::new(DevNullTracker)
}
