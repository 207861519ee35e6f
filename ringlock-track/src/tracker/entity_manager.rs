// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Per-entity log levels and ID allocation shared by the trackers.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use regex::Regex;

use crate::tracker::TrackConfigError;
use crate::{Id, ROOT};

/// Decides which entities emit events at which level and hands out unique
/// [`Id`]s.
///
/// Entity names are matched against the level filters when the entity is
/// registered, the first matching filter wins. Only entities whose level
/// differs from the default are stored.
pub struct EntityManager {
    default_level: log::Level,
    filters: Vec<(Regex, log::Level)>,
    next_id: Cell<u64>,
    overrides: RefCell<HashMap<Id, log::Level>>,
}

impl EntityManager {
    /// Create a manager where every entity uses `default_level`.
    #[must_use]
    pub fn new(default_level: log::Level) -> Self {
        Self {
            default_level,
            filters: Vec::new(),
            next_id: Cell::new(ROOT.0 + 1),
            overrides: RefCell::new(HashMap::new()),
        }
    }

    /// Set every entity whose full name matches `regex_str` to `level`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use ringlock_track::tracker::EntityManager;
    /// let mut manager = EntityManager::new(log::Level::Warn);
    /// manager.add_entity_level_filter(".*logger.*", log::Level::Trace).unwrap();
    /// ```
    pub fn add_entity_level_filter(
        &mut self,
        regex_str: &str,
        level: log::Level,
    ) -> Result<(), TrackConfigError> {
        let regex = Regex::new(regex_str).map_err(|e| {
            TrackConfigError(format!("Failed to parse regex {regex_str}:\n{e}\n"))
        })?;
        self.filters.push((regex, level));
        Ok(())
    }

    pub(crate) fn unique_id(&self) -> Id {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        Id(id)
    }

    pub(crate) fn is_enabled(&self, id: Id, level: log::Level) -> bool {
        let entity_level = self
            .overrides
            .borrow()
            .get(&id)
            .copied()
            .unwrap_or(self.default_level);
        level <= entity_level
    }

    /// # Panics
    ///
    /// If an entity with a non-default level registers the same ID twice.
    pub(crate) fn add_entity(&self, id: Id, entity_name: &str) {
        let level = self.level_for(entity_name);
        if level == self.default_level {
            return;
        }
        let previous = self.overrides.borrow_mut().insert(id, level);
        assert!(
            previous.is_none(),
            "Entity ID {id} already seen ({entity_name})"
        );
    }

    fn level_for(&self, entity_name: &str) -> log::Level {
        self.filters
            .iter()
            .find_map(|(regex, level)| regex.is_match(entity_name).then_some(*level))
            .unwrap_or(self.default_level)
    }
}

#[cfg(test)]
mod tests {
    use log::Level;

    use super::*;

    const PATHS: [&str; 4] = [
        "top",
        "top::platform",
        "top::node0",
        "top::logger::monitor",
    ];

    fn levels(manager: &EntityManager) -> Vec<Level> {
        PATHS.iter().map(|p| manager.level_for(p)).collect()
    }

    #[test]
    fn no_filters() {
        let manager = EntityManager::new(Level::Error);
        assert_eq!(levels(&manager), vec![Level::Error; 4]);
    }

    #[test]
    fn first_matching_filter_wins() {
        let mut manager = EntityManager::new(Level::Error);
        manager
            .add_entity_level_filter(r".*node0", Level::Warn)
            .unwrap();
        manager
            .add_entity_level_filter(r"top::.*", Level::Info)
            .unwrap();

        assert_eq!(
            levels(&manager),
            vec![Level::Error, Level::Info, Level::Warn, Level::Info]
        );
    }

    #[test]
    fn overrides_apply_by_id() {
        let mut manager = EntityManager::new(Level::Error);
        manager
            .add_entity_level_filter(r".*logger.*", Level::Debug)
            .unwrap();

        let node = manager.unique_id();
        manager.add_entity(node, "top::node0");
        let monitor = manager.unique_id();
        manager.add_entity(monitor, "top::logger::monitor");

        assert!(!manager.is_enabled(node, Level::Debug));
        assert!(manager.is_enabled(monitor, Level::Debug));
        assert!(!manager.is_enabled(monitor, Level::Trace));
    }

    #[test]
    fn bad_regex() {
        let mut manager = EntityManager::new(Level::Error);
        let err = manager
            .add_entity_level_filter(r"node(", Level::Warn)
            .unwrap_err();
        assert!(err.0.starts_with("Failed to parse regex node("));
    }

    #[test]
    fn ids_follow_root() {
        let manager = EntityManager::new(Level::Error);
        for i in 0..10 {
            assert_eq!(manager.unique_id(), Id(i + ROOT.0 + 1));
        }
    }
}
