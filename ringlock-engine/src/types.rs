// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! Shared types.

use std::error::Error;
use std::fmt;
use std::rc::Rc;

use crate::traits::{Event, Runnable};


pub type Eventable<T> = Box<dyn Event<T> + 'static>;

/// The type of a component that can be registered with the `Engine` so that it
/// will automatically be spawned.
pub type Component = Rc<dyn Runnable + 'static>;

// Simulation errors

#[macro_export]
/// Build a [SimError] from a message that supports `to_string`
macro_rules! sim_error {
    ($msg:expr) => {
        Err($crate::types::SimError($msg.to_string()))
    };
}

#[macro_export]
/// Build a [SimError] for a setup-time configuration error.
///
/// The message names the entity and the field that failed validation:
///
/// ```rust
/// # use ringlock_engine::config_mismatch;
/// # use ringlock_engine::types::SimResult;
/// fn check() -> SimResult {
///     config_mismatch!("top::logger", "num_nodes", "expected 3, got 2")
/// }
/// assert_eq!(
///     format!("{}", check().unwrap_err()),
///     "Error: ConfigMismatch: top::logger.num_nodes: expected 3, got 2"
/// );
/// ```
macro_rules! config_mismatch {
    ($entity:expr, $field:expr, $($arg:tt)+) => {
        Err($crate::types::SimError(format!(
            "ConfigMismatch: {}.{}: {}",
            $entity,
            $field,
            format_args!($($arg)+)
        )))
    };
}

/// The `SimError` is what should be returned in the case of an error
#[derive(Debug)]
pub struct SimError(pub String);

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Error: {}", self.0)
    }
}

impl Error for SimError {}

/// The SimResult is the return type for most simulation functions
pub type SimResult = Result<(), SimError>;
