// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod loader;
mod registry;

pub use loader::{build_graph, load_config, PipelineConfig, StageConfig};
pub use registry::StageRegistry;
