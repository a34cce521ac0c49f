// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging.
//!
//! Message types follow a struct-based pattern with a `Display`
//! implementation to keep magic strings out of the engine and stage code:
//! each operational event is a small struct in `messages`, logged through
//! the [`messages::StructuredLog`] trait.

pub mod messages;
