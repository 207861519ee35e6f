// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! The _trace_ events understood by every [`Track`](crate::Track).

use std::fmt;

use crate::Id;

/// A modelling event emitted by an entity.
///
/// `by` is always the entity emitting the event and is the ID used to decide
/// whether the event is enabled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackEvent<'a> {
    /// An object arrived in entity `by` (queue push, channel send).
    Enter { by: Id, obj: Id },

    /// An object left entity `by`.
    Exit { by: Id, obj: Id },

    /// Entity `by` created the named object.
    Create { by: Id, obj: Id, name: &'a str },

    /// Entity `by` destroyed the object (a delivered message, a dropped
    /// entity).
    Destroy { by: Id, obj: Id },

    /// A port of entity `by` was connected to entity `to`.
    Connect { by: Id, to: Id },

    /// The engine clock of entity `by` advanced.
    Time { by: Id, time_ps: u64 },
}

impl TrackEvent<'_> {
    /// The entity that emitted the event.
    #[must_use]
    pub fn by(&self) -> Id {
        match *self {
            TrackEvent::Enter { by, .. }
            | TrackEvent::Exit { by, .. }
            | TrackEvent::Create { by, .. }
            | TrackEvent::Destroy { by, .. }
            | TrackEvent::Connect { by, .. }
            | TrackEvent::Time { by, .. } => by,
        }
    }
}

impl fmt::Display for TrackEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackEvent::Enter { by, obj } => write!(f, "{by}: enter {obj}"),
            TrackEvent::Exit { by, obj } => write!(f, "{by}: exit {obj}"),
            TrackEvent::Create { by, obj, name } => write!(f, "{by}: created {obj}, {name}"),
            TrackEvent::Destroy { by, obj } => write!(f, "{by}: destroyed {obj}"),
            TrackEvent::Connect { by, to } => write!(f, "{by}: connect to {to}"),
            TrackEvent::Time { by, time_ps } => write!(f, "{by}: set time to {time_ps}ps"),
        }
    }
}
