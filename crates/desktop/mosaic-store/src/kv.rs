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

use serde::{Serialize, de::DeserializeOwned};
use snafu::ResultExt;
use sqlx::SqlitePool;

use crate::{err::*, preference::PreferenceStore};

/// Key-value store backed by SQLite
///
/// All values are serialized to JSON before storage
#[derive(Clone, Debug)]
pub struct KVStore {
    pool: SqlitePool,
}

impl KVStore {
    pub(crate) const fn new(pool: SqlitePool) -> Self { Self { pool } }

    /// Set a key-value pair, replacing any previous value.
    pub async fn set<T: Serialize + Sync + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let value_json = serde_json::to_string(value).context(CodecSnafu { key })?;

        sqlx::query("INSERT OR REPLACE INTO kv_table (key, value) VALUES (?, ?)")
            .bind(key)
            .bind(value_json)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Get a value by key, `None` if the key does not exist.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM kv_table WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some((value_json,)) => {
                let value = serde_json::from_str(&value_json).context(CodecSnafu { key })?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Remove a key-value pair
    pub async fn remove(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM kv_table WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl PreferenceStore for KVStore {
    async fn get(&self, key: &str) -> Result<Option<String>> { Self::get::<String>(self, key).await }

    async fn set(&self, key: &str, value: &str) -> Result<()> { Self::set(self, key, value).await }

    async fn remove(&self, key: &str) -> Result<()> { Self::remove(self, key).await }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};
    use tempfile::TempDir;

    use crate::{DatabaseConfig, PreferenceStore, db::DBStore};

    #[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug)]
    struct Session {
        id:   String,
        name: String,
    }

    async fn open(dir: &TempDir) -> DBStore {
        let config = DatabaseConfig::builder()
            .db_path(dir.path().join("nested").join("test.db"))
            .build();
        DBStore::new(config).await.unwrap()
    }

    #[tokio::test]
    async fn kv_store_test() {
        let tempdir = TempDir::new().unwrap();
        let db = open(&tempdir).await;
        let kv = db.kv_store();

        kv.set("str_key", "hello").await.unwrap();
        assert_eq!(kv.get::<String>("str_key").await.unwrap().unwrap(), "hello");
        assert_eq!(kv.get::<String>("nonexistent").await.unwrap(), None);

        kv.set("bool_key", &true).await.unwrap();
        assert!(kv.get::<bool>("bool_key").await.unwrap().unwrap());

        let session = Session {
            id:   "1".to_string(),
            name: "Run 2025-10-08".to_string(),
        };
        kv.set("session_key", &session).await.unwrap();
        assert_eq!(
            kv.get::<Session>("session_key").await.unwrap().unwrap(),
            session
        );

        kv.remove("str_key").await.unwrap();
        assert_eq!(kv.get::<String>("str_key").await.unwrap(), None);
    }

    #[tokio::test]
    async fn kv_store_overwrite_test() {
        let tempdir = TempDir::new().unwrap();
        let db = open(&tempdir).await;
        let kv = db.kv_store();

        kv.set("key", "first").await.unwrap();
        kv.set("key", "second").await.unwrap();
        assert_eq!(kv.get::<String>("key").await.unwrap().unwrap(), "second");
    }

    #[tokio::test]
    async fn preference_survives_reopen() {
        let tempdir = TempDir::new().unwrap();
        {
            let db = open(&tempdir).await;
            PreferenceStore::set(&db.kv_store(), "mosaic-theme", "dark")
                .await
                .unwrap();
            db.close().await;
        }

        let db = open(&tempdir).await;
        let value = PreferenceStore::get(&db.kv_store(), "mosaic-theme")
            .await
            .unwrap();
        assert_eq!(value.as_deref(), Some("dark"));
    }

    #[tokio::test]
    async fn decode_mismatch_is_a_codec_error() {
        let tempdir = TempDir::new().unwrap();
        let db = open(&tempdir).await;
        let kv = db.kv_store();

        kv.set("count", &42_i64).await.unwrap();
        let err = kv.get::<Session>("count").await.unwrap_err();
        assert!(matches!(err, crate::Error::Codec { .. }));
    }
}
