// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Simulate a ring of nodes monitored by a deadlock logger.
//!
//! The ring is either read from a YAML platform file or generated at random
//! from a seed. Every node ticks on its own clock, forwards messages to its
//! neighbour and reports the state of each tick to the logger. The logger
//! declares a deadlock once every node has been idle or blocked for long
//! enough, which stops the simulation early.
//!
//! # Examples
//!
//! Running a random ring of five nodes for one simulated second:
//! ```txt
//! cargo run --bin sim-deadlock --release -- --random-nodes 5 --seed 7 --run-ms 1000
//! ```
//!
//! Running a platform file with logging of the logger only:
//! ```txt
//! cargo run --bin sim-deadlock --release -- --config ring.yaml --stdout \
//!     --stdout-level Debug --stdout-filter-regex '.*logger'
//! ```
//!
//! The process exits with code 2 when a deadlock was declared.
//!
//! # Diagram
//!
//! ```text
//!  /--------------------------------------------------\
//!  |                                                  |
//!  |  +-------+  link  +-------+  link  +-------+     |
//!  \->| node0 |------->| node1 |------->| node2 |-----/
//!     +-------+        +-------+        +-------+
//!         |                |                |
//!         | report         | report         | report
//!         v                v                v
//!     +------------------------------------------+
//!     |                  logger                  |
//!     +------------------------------------------+
//! ```

pub mod summary;
