// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod build;
mod runtime;

pub use build::BuildError;
pub use runtime::{EngineError, StageError};
