// Copyright (c) 2020 Graphcore Ltd. All rights reserved.

use std::cell::RefCell;

use regex::Regex;

use crate::Id;
use crate::tracker::{EntityManager, Track, TrackEvent};

/// A tracker that keeps all enabled events in memory as text.
///
/// Tests hold on to an `Rc<InMemoryTracker>` and hand a clone of it to the
/// engine as the [`Tracker`](crate::Tracker) so that the events can be
/// inspected once the simulation has finished.
pub struct InMemoryTracker {
    entity_manager: EntityManager,
    lines: RefCell<Vec<String>>,
}

impl InMemoryTracker {
    /// Create a new [`InMemoryTracker`] with an [`EntityManager`].
    #[must_use]
    pub fn new(entity_manager: EntityManager) -> Self {
        Self {
            entity_manager,
            lines: RefCell::new(Vec::new()),
        }
    }

    /// Return a copy of all lines seen so far.
    #[must_use]
    pub fn events(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    /// Count the lines that match the regular expression `pattern`.
    ///
    /// # Panics
    ///
    /// If `pattern` is not a valid regular expression.
    #[must_use]
    pub fn count_matching(&self, pattern: &str) -> usize {
        let re = Regex::new(pattern).unwrap();
        self.lines.borrow().iter().filter(|l| re.is_match(l)).count()
    }

    /// Remove all recorded lines.
    pub fn clear(&self) {
        self.lines.borrow_mut().clear();
    }
}

impl Track for InMemoryTracker {
    fn unique_id(&self) -> Id {
        self.entity_manager.unique_id()
    }

    fn is_entity_enabled(&self, id: Id, level: log::Level) -> bool {
        self.entity_manager.is_enabled(id, level)
    }

    fn add_entity(&self, id: Id, entity_name: &str) {
        self.entity_manager.add_entity(id, entity_name);
    }

    fn event(&self, event: &TrackEvent) {
        self.lines.borrow_mut().push(event.to_string());
    }

    fn log(&self, id: Id, level: log::Level, msg: std::fmt::Arguments) {
        self.lines.borrow_mut().push(format!("{id}:{level}: {msg}"));
    }

    fn shutdown(&self) {}
}
