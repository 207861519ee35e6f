// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! A simulation entity.
//!
//! Every node, logger, channel and port owns an [`Entity`]. Entities form a
//! tree below the single [`toplevel`] entity and their full names
//! (`top::node0::ring_rx`) are what the tracker level filters match.

use std::fmt;
use std::rc::Rc;

use crate::{Id, Tracker, create, destroy};

const JOIN: &str = "::";

/// A named node in the simulation hierarchy.
pub struct Entity {
    /// Name of this entity, without its parents.
    pub name: String,

    /// Parent entity. Only the top-level has none.
    pub parent: Option<Rc<Entity>>,

    /// Unique simulation identifier used for log messages.
    pub id: Id,

    /// [`Tracker`] used to handle trace/log events.
    pub tracker: Tracker,

    full_name: String,
}

impl Entity {
    /// Create a new entity below `parent`, sharing its tracker.
    #[must_use]
    pub fn new(parent: &Rc<Entity>, name: &str) -> Self {
        let full_name = format!("{}{JOIN}{name}", parent.full_name);
        let entity = Self::register(&parent.tracker, Some(parent.clone()), name, full_name);
        create!(entity);
        entity
    }

    fn register(
        tracker: &Tracker,
        parent: Option<Rc<Entity>>,
        name: &str,
        full_name: String,
    ) -> Self {
        let id = tracker.unique_id();
        tracker.add_entity(id, &full_name);
        Self {
            name: String::from(name),
            parent,
            id,
            tracker: tracker.clone(),
            full_name,
        }
    }

    /// The full hierarchical name of this entity.
    #[must_use]
    pub fn full_name(&self) -> &str {
        &self.full_name
    }
}

impl Drop for Entity {
    fn drop(&mut self) {
        destroy!(self);
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entity")
            .field("full_name", &self.full_name)
            .field("id", &self.id)
            .finish()
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name)
    }
}

/// Allow access to the [`Entity`] of any simulation component.
pub trait GetEntity {
    /// Return the entity that represents this component.
    fn entity(&self) -> &Rc<Entity>;
}

/// Create the top-level entity. This should be the only entity without a
/// parent.
pub fn toplevel(tracker: &Tracker, name: &str) -> Rc<Entity> {
    let top = Rc::new(Entity::register(tracker, None, name, name.to_string()));
    create!(top);
    top
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::dev_null_tracker;

    #[test]
    fn hierarchical_names() {
        let tracker = dev_null_tracker();
        let top = toplevel(&tracker, "top");
        let node = Rc::new(Entity::new(&top, "node0"));
        let port = Entity::new(&node, "ring_rx");

        assert_eq!(port.full_name(), "top::node0::ring_rx");
        assert_eq!(format!("{port}"), "top::node0::ring_rx");
        assert_eq!(port.name, "ring_rx");
        assert_eq!(format!("{top}"), "top");
    }
}
