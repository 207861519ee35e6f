// Copyright (c) 2020 Graphcore Ltd. All rights reserved.

use std::cell::RefCell;
use std::fmt;
use std::io::Write;

use crate::tracker::{EntityManager, Track, TrackEvent};
use crate::{Id, Writer};

/// Writes one line of text per event to a [`Writer`].
pub struct TextTracker {
    entity_manager: EntityManager,
    writer: RefCell<Writer>,
}

impl TextTracker {
    /// Create a new [`TextTracker`] with an [`EntityManager`].
    pub fn new(entity_manager: EntityManager, writer: Writer) -> Self {
        Self {
            entity_manager,
            writer: RefCell::new(writer),
        }
    }

    fn write_line(&self, line: fmt::Arguments) {
        // A closed output stream must not abort the simulation
        let _ = writeln!(self.writer.borrow_mut(), "{line}");
    }
}

impl Track for TextTracker {
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
        self.write_line(format_args!("{event}"));
    }

    fn log(&self, id: Id, level: log::Level, msg: std::fmt::Arguments) {
        self.write_line(format_args!("{id}:{level}: {msg}"));
    }

    fn shutdown(&self) {
        let _ = self.writer.borrow_mut().flush();
    }
}
