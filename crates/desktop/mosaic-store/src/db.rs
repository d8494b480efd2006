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

use snafu::ResultExt;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

use crate::{DatabaseConfig, err::*, kv::KVStore};

/// Database store that manages the SQLite connection pool
#[derive(Clone, Debug)]
pub struct DBStore {
    pool: SqlitePool,
}

impl DBStore {
    /// Open the database described by `config`, creating the file and its
    /// parent directory if needed, and apply pending migrations.
    #[tracing::instrument(level = "trace", err)]
    pub async fn new(config: DatabaseConfig) -> Result<Self> {
        let db_path = &config.db_path;

        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).context(CreateDirSnafu { path: parent })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .busy_timeout(config.busy_timeout);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        tracing::trace!("Initialized DBStore with path: {}", db_path.display());

        Ok(Self { pool })
    }

    /// Get a KV store instance
    pub fn kv_store(&self) -> KVStore { KVStore::new(self.pool.clone()) }

    /// Close every pooled connection.
    pub async fn close(&self) { self.pool.close().await }
}
