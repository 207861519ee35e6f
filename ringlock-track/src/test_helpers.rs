// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! Helpers for creating trackers in tests.

use std::fs;
use std::io::BufWriter;
use std::path::Path;
use std::rc::Rc;

use crate::Tracker;
use crate::tracker::{EntityManager, TextTracker};

/// Folder that receives one log file per test source file.
pub const TRACE_FOLDER: &str = "traces";

/// Create a [`Tracker`] writing `Debug` and above to
/// `traces/<test file stem>.log`. Pass `file!()`.
///
/// # Panics
///
/// If the trace folder or file cannot be created.
#[must_use]
pub fn create_tracker(full_filepath: &str) -> Tracker {
    fs::create_dir_all(TRACE_FOLDER).unwrap();

    let stem = Path::new(full_filepath)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap();
    let file = fs::File::create(Path::new(TRACE_FOLDER).join(format!("{stem}.log"))).unwrap();

    Rc::new(TextTracker::new(
        EntityManager::new(log::Level::Debug),
        Box::new(BufWriter::new(file)),
    ))
}
