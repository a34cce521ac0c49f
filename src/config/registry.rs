// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::sync::Arc;

use crate::traits::Stage;

/// Newtype wrapper for the stage registry providing type safety
#[derive(Clone, Default)]
pub struct StageRegistry(pub HashMap<String, Arc<dyn Stage>>);

impl StageRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Register a stage under a name
    pub fn insert(&mut self, name: impl Into<String>, stage: Arc<dyn Stage>) {
        self.0.insert(name.into(), stage);
    }

    /// Get a stage by name
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Stage>> {
        self.0.get(name)
    }

    /// Check if a stage is registered
    pub fn contains_key(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Get all registered names
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }
}

impl std::fmt::Debug for StageRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageRegistry")
            .field("stage_count", &self.0.len())
            .field("stage_names", &self.0.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl From<HashMap<String, Arc<dyn Stage>>> for StageRegistry {
    fn from(map: HashMap<String, Arc<dyn Stage>>) -> Self {
        Self(map)
    }
}
