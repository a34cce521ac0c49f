// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Messages are organized by subsystem:
//!
//! * `engine` - pipeline lifecycle and dispatch events
//! * `collect` - fan-in group lifecycle events

pub mod collect;
pub mod engine;

/// Emit this message through `tracing` with its structured fields attached.
pub trait StructuredLog {
    fn log(&self);
}
