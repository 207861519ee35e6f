// Copyright (c) 2020 Graphcore Ltd. All rights reserved.

//! This module provides combined _track_ capabilities for the ringlock
//! simulator.
//!
//! _Track_ means the combination of _log_ and _trace_ where:
//!
//!   - _log_ are text-based human-readable messages emitted at various levels
//!     of verbosity (from `Trace` through to `Error`).
//!   - _trace_ provides a standard set of modelling events that can be emitted.
//!     For example, object creation/destruction or messages entering/exiting
//!     simulation [`Entities`](crate::entity::Entity).
//!
//! The _track_ events can be emitted to:
//!
//!   - a textual output (stdout or a file) based on the
//!     [log](https://docs.rs/log) crate levels.
//!   - an in-memory buffer that tests can inspect.
//!
//! Which entities emit at which level is decided per entity by its full
//! hierarchical name, so that a single node or the logger of a ring can be
//! traced while the rest stays quiet.

// Enable warnings for missing documentation
#![warn(missing_docs)]

pub use log;

pub mod builder;
pub mod entity;
pub mod id;
pub mod test_helpers;
pub mod tracker;

/// Type used for unique IDs
///
/// Each _log_/_trace_ event within the application is given a unique ID to
/// identify it. There are two reserved ID values: [NO_ID](constant.NO_ID.html)
/// and [ROOT](constant.ROOT.html)
pub use id::Id;
pub use tracker::{Track, TrackEvent, Tracker};

/// A type alias for objects that receive _log_ / _trace_ events.
pub type Writer = Box<dyn std::io::Write>;

/// ID value which indicates where there is no valid ID
pub const NO_ID: Id = id::Id(0);

/// The root ID from which all other IDs are derived
pub const ROOT: Id = id::Id(1);

/// Emit a [`TrackEvent`] if `$entity` is enabled at `Trace` level.
#[doc(hidden)]
#[macro_export]
macro_rules! track_event {
    ($entity:expr ; $event:expr) => {
        if $entity
            .tracker
            .is_entity_enabled($entity.id, $crate::log::Level::Trace)
        {
            $entity.tracker.event(&$event);
        }
    };
}

/// An object with ID `$obj_id` arrived in `$entity`.
#[macro_export]
macro_rules! enter {
    ($entity:expr ; $obj_id:expr) => {
        $crate::track_event!($entity ; $crate::TrackEvent::Enter {
            by: $entity.id,
            obj: $obj_id,
        })
    };
}

/// An object with ID `$obj_id` left `$entity`.
#[macro_export]
macro_rules! exit {
    ($entity:expr ; $obj_id:expr) => {
        $crate::track_event!($entity ; $crate::TrackEvent::Exit {
            by: $entity.id,
            obj: $obj_id,
        })
    };
}

/// Create a unique ID for tracking.
///
/// The user must specify an entity with a [`Tracker`] to create the ID.
#[macro_export]
macro_rules! create_id {
    ($entity:expr) => {{ $entity.tracker.unique_id() }};
}

/// Add a creation event.
///
/// The first form announces `$entity` itself, attributed to its parent. The
/// second form tracks the creation of an object by `$entity`; the object must
/// provide an `id` field and implement `Display`.
#[macro_export]
macro_rules! create {
    ($entity:expr) => {
        $crate::track_event!($entity ; $crate::TrackEvent::Create {
            by: $entity.parent.as_ref().map_or($crate::NO_ID, |p| p.id),
            obj: $entity.id,
            name: $entity.full_name(),
        })
    };
    ($entity:expr ; $created:expr) => {
        $crate::track_event!($entity ; $crate::TrackEvent::Create {
            by: $entity.id,
            obj: $created.id,
            name: &$created.to_string(),
        })
    };
}

/// Add a destroy event, for `$entity` itself or for an object it consumed.
#[macro_export]
macro_rules! destroy {
    ($entity:expr) => {
        $crate::track_event!($entity ; $crate::TrackEvent::Destroy {
            by: $entity.parent.as_ref().map_or($crate::NO_ID, |p| p.id),
            obj: $entity.id,
        })
    };
    ($entity:expr ; $destroyed_id:expr) => {
        $crate::track_event!($entity ; $crate::TrackEvent::Destroy {
            by: $entity.id,
            obj: $destroyed_id,
        })
    };
}

/// Connect two entities
#[macro_export]
macro_rules! connect {
    ($from_entity:expr ; $to_entity:expr) => {
        $crate::track_event!($from_entity ; $crate::TrackEvent::Connect {
            by: $from_entity.id,
            to: $to_entity.id,
        })
    };
}

/// Update the current time.
#[macro_export]
macro_rules! set_time {
    ($entity:expr ; $time_ps:expr) => {
        $crate::track_event!($entity ; $crate::TrackEvent::Time {
            by: $entity.id,
            time_ps: $time_ps,
        })
    };
}

/// Base macro for log messages of all level.
///
/// The message is only formatted if the [`Tracker`] has the entity enabled at
/// the given level.
#[macro_export]
macro_rules! log_base {
    ($entity:expr ; $lvl:expr, $($arg:tt)+) => (
        if $entity.tracker.is_entity_enabled($entity.id, $lvl) {
            $entity.tracker.log($entity.id, $lvl, format_args!($($arg)+));
        }
    );
}

/// The `trace` macro provides a wrapper for the [`log_base`] macro
/// at level `log::Level::Trace`
#[macro_export]
macro_rules! trace {
    ($entity:expr ; $($arg:tt)+) => (
        $crate::log_base!($entity ; $crate::log::Level::Trace, $($arg)+);
    );
}

/// The `debug` macro provides a wrapper for the [`log_base`] macro
/// at level `log::Level::Debug`
#[macro_export]
macro_rules! debug {
    ($entity:expr ; $($arg:tt)+) => (
        $crate::log_base!($entity ; $crate::log::Level::Debug, $($arg)+);
    );
}

/// The `info` macro provides a wrapper for the [`log_base`] macro at
/// level `log::Level::Info`
#[macro_export]
macro_rules! info {
    ($entity:expr ; $($arg:tt)+) => (
        $crate::log_base!($entity ; $crate::log::Level::Info, $($arg)+);
    );
}

/// The `warn` macro provides a wrapper for the [`log_base`] macro at
/// level `log::Level::Warn`
#[macro_export]
macro_rules! warn {
    ($entity:expr ; $($arg:tt)+) => (
        $crate::log_base!($entity ; $crate::log::Level::Warn, $($arg)+);
    );
}

/// the `error` macro provides a wrapper for the [`log_base`] macro
/// at level `log::Level::Error`
#[macro_export]
macro_rules! error {
    ($entity:expr ; $($arg:tt)+) => (
        $crate::log_base!($entity ; $crate::log::Level::Error, $($arg)+);
    );
}
