// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! Flow control.

pub mod credit;
