// Copyright 2025 Crrow
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::{collections::HashMap, sync::Arc};

use parking_lot::RwLock;

use crate::{PreferenceStore, Result};

/// Process-local store. Values live only as long as the process.
///
/// Used in tests, and as the session-only fallback when the database cannot
/// be opened.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    /// Pre-populate a key, as if persisted by an earlier run.
    #[must_use]
    pub fn with_entry(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.write().insert(key.into(), value.into());
        self
    }

    /// Snapshot of a key without going through the async port.
    pub fn peek(&self, key: &str) -> Option<String> { self.entries.read().get(key).cloned() }
}

#[async_trait::async_trait]
impl PreferenceStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> { Ok(self.peek(key)) }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_get_remove() {
        let store = MemoryStore::new().with_entry("a", "1");
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("1"));

        store.set("a", "2").await.unwrap();
        assert_eq!(store.peek("a").as_deref(), Some("2"));

        store.remove("a").await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), None);
    }
}
