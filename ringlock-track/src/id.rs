// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! Identifiers of entities and of the objects they exchange.

use std::fmt;

/// An ID that is unique across the simulation.
///
/// Entities and tracked objects (messages) take their IDs from the
/// [`Tracker`](crate::Tracker). [`NO_ID`](crate::NO_ID) is shared by objects
/// that are never tracked individually, such as credits and status reports.
#[derive(Copy, Clone, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Id(pub u64);

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Objects that can be followed through the simulation by [`Id`].
pub trait Unique {
    /// Return the ID of this object.
    fn id(&self) -> Id;
}

impl Unique for Id {
    fn id(&self) -> Id {
        *self
    }
}

impl Unique for usize {
    fn id(&self) -> Id {
        Id(*self as u64)
    }
}
