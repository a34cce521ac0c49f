// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod batch;      // record batches + fan metadata
pub mod config;     // registry + YAML pipeline configs
pub mod engine;     // recursive push dispatch
pub mod errors;     // error handling
pub mod graph;      // builder + immutable stage graph
pub mod io;         // source/sink collaborators
pub mod observability;
pub mod stages;     // core and leaf stages
pub mod traits;     // the stage contract
