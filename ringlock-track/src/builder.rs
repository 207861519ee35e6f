// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Library functions to build trackers as defined by the user.

use std::io::BufWriter;
use std::rc::Rc;
use std::{fs, io};

use crate::tracker::{EntityManager, MultiTracker, TextTracker, TrackConfigError};
use crate::{Tracker, Writer};

/// Configuration options for an individual tracker.
pub struct TrackerConfig<'a> {
    /// Enable this tracker.
    pub enable: bool,

    /// Set the level at which this tracker should be enabled.
    pub level: log::Level,

    /// A regular expression to match which entities should have this level
    /// applied.
    pub filter_regex: &'a str,

    /// If required, the name of the file to which the tracker will write.
    pub file: Option<&'a str>,
}

impl Default for TrackerConfig<'_> {
    fn default() -> Self {
        Self {
            enable: true,
            level: log::Level::Warn,
            filter_regex: "",
            file: None,
        }
    }
}

/// Configuration options for all tracking.
pub struct TrackersConfig<'a> {
    /// Configuration for stdout.
    pub stdout: TrackerConfig<'a>,

    /// Configuration for a text log file.
    pub log_file: TrackerConfig<'a>,
}

/// A non-empty filter applies the configured level to matching entities only;
/// all others emit errors alone.
fn build_entity_manager(config: &TrackerConfig) -> Result<EntityManager, TrackConfigError> {
    let default_level = if config.filter_regex.is_empty() {
        config.level
    } else {
        log::Level::Error
    };

    let mut entity_manager = EntityManager::new(default_level);
    if !config.filter_regex.is_empty() {
        entity_manager.add_entity_level_filter(config.filter_regex, config.level)?;
    }
    Ok(entity_manager)
}

fn text_tracker(config: &TrackerConfig, writer: Writer) -> Result<Tracker, TrackConfigError> {
    Ok(Rc::new(TextTracker::new(build_entity_manager(config)?, writer)))
}

fn file_writer(config: &TrackerConfig) -> Result<Writer, TrackConfigError> {
    let filename = config
        .file
        .ok_or_else(|| TrackConfigError("No log file name specified".to_string()))?;
    let file = fs::File::create(filename)
        .map_err(|e| TrackConfigError(format!("Failed to create {filename}: {e}")))?;
    Ok(Box::new(BufWriter::new(file)))
}

/// Set up the stdout and file trackers that are enabled.
///
/// With neither enabled, warnings and errors still go to stdout.
pub fn setup_trackers(config: &TrackersConfig) -> Result<Tracker, TrackConfigError> {
    let mut trackers = Vec::new();
    if config.stdout.enable {
        trackers.push(text_tracker(&config.stdout, stdout_writer())?);
    }
    if config.log_file.enable {
        trackers.push(text_tracker(&config.log_file, file_writer(&config.log_file)?)?);
    }

    match trackers.len() {
        0 => text_tracker(&TrackerConfig::default(), stdout_writer()),
        1 => Ok(trackers.remove(0)),
        _ => {
            let mut multi = MultiTracker::default();
            for tracker in trackers {
                multi.add_tracker(tracker);
            }
            Ok(Rc::new(multi))
        }
    }
}

fn stdout_writer() -> Writer {
    Box::new(BufWriter::new(io::stdout()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::toplevel;
    use crate::warn;

    #[test]
    fn file_tracker_writes_messages() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sim.log");
        let path_str = path.to_str().unwrap();

        let config = TrackersConfig {
            stdout: TrackerConfig {
                enable: false,
                ..TrackerConfig::default()
            },
            log_file: TrackerConfig {
                file: Some(path_str),
                ..TrackerConfig::default()
            },
        };

        {
            let tracker = setup_trackers(&config).unwrap();
            let top = toplevel(&tracker, "top");
            warn!(top ; "credit balance exhausted");
            tracker.shutdown();
        }

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("WARN: credit balance exhausted"));
    }

    #[test]
    fn missing_file_name_is_an_error() {
        let config = TrackersConfig {
            stdout: TrackerConfig {
                enable: false,
                ..TrackerConfig::default()
            },
            log_file: TrackerConfig::default(),
        };
        let err = setup_trackers(&config).err().unwrap();
        assert_eq!(err.0, "No log file name specified");
    }

    #[test]
    fn bad_filter_is_an_error() {
        let config = TrackersConfig {
            stdout: TrackerConfig {
                filter_regex: "node[",
                ..TrackerConfig::default()
            },
            log_file: TrackerConfig {
                enable: false,
                ..TrackerConfig::default()
            },
        };
        assert!(setup_trackers(&config).is_err());
    }
}
