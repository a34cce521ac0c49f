// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod capture;
pub mod collect;
pub mod composite;
pub mod filter;
pub mod map;
pub mod partition;
pub mod print;
pub mod reshape;
pub mod tap;
pub mod window;

pub use capture::Capture;
pub use collect::Collector;
pub use composite::Composite;
pub use filter::Filter;
pub use map::{FieldMap, MapRows};
pub use partition::Partitioner;
pub use print::StdoutSink;
pub use reshape::{Reshape, RowFormat};
pub use tap::Tap;
pub use window::{Head, Skip, Tail};
