// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

use crate::Id;
use crate::tracker::{EntityManager, Track, TrackEvent, Tracker};

/// Forwards every event to each of its [`Tracker`]s that has it enabled.
///
/// IDs come from a local [`EntityManager`] so that all trackers see the same
/// ID for an entity.
pub struct MultiTracker {
    ids: EntityManager,
    trackers: Vec<Tracker>,
}

impl MultiTracker {
    /// Add a new tracker
    pub fn add_tracker(&mut self, tracker: Tracker) {
        self.trackers.push(tracker);
    }

    fn enabled(&self, id: Id, level: log::Level) -> impl Iterator<Item = &Tracker> {
        self.trackers
            .iter()
            .filter(move |tracker| tracker.is_entity_enabled(id, level))
    }
}

impl Default for MultiTracker {
    fn default() -> Self {
        Self {
            ids: EntityManager::new(log::Level::Error),
            trackers: Vec::new(),
        }
    }
}

impl Track for MultiTracker {
    fn unique_id(&self) -> Id {
        self.ids.unique_id()
    }

    fn is_entity_enabled(&self, id: Id, level: log::Level) -> bool {
        self.enabled(id, level).next().is_some()
    }

    fn add_entity(&self, id: Id, entity_name: &str) {
        for tracker in &self.trackers {
            tracker.add_entity(id, entity_name);
        }
    }

    fn event(&self, event: &TrackEvent) {
        for tracker in self.enabled(event.by(), log::Level::Trace) {
            tracker.event(event);
        }
    }

    fn log(&self, id: Id, level: log::Level, msg: std::fmt::Arguments) {
        for tracker in self.enabled(id, level) {
            tracker.log(id, level, msg);
        }
    }

    fn shutdown(&self) {
        for tracker in &self.trackers {
            tracker.shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::tracker::InMemoryTracker;

    #[test]
    fn forwards_by_level() {
        let quiet = Rc::new(InMemoryTracker::new(EntityManager::new(log::Level::Warn)));
        let chatty = Rc::new(InMemoryTracker::new(EntityManager::new(log::Level::Trace)));
        let mut multi = MultiTracker::default();
        multi.add_tracker(quiet.clone());
        multi.add_tracker(chatty.clone());

        let id = multi.unique_id();
        multi.add_entity(id, "top::node0");
        multi.log(id, log::Level::Info, format_args!("tick"));
        multi.event(&TrackEvent::Enter { by: id, obj: Id(42) });

        assert!(quiet.events().is_empty());
        assert_eq!(chatty.events().len(), 2);
        assert_eq!(chatty.count_matching("enter 42"), 1);
    }
}
