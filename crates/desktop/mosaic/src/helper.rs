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

use std::{
    collections::HashMap,
    io::{self, IsTerminal},
    path::Path,
    sync::{Arc, OnceLock},
};

use jiff::Timestamp;
use mosaic_player::{Session, catalog};
use mosaic_store::{DBStore, DatabaseConfig, MemoryStore, PreferenceStore};
use snafu::{ResultExt, Whatever};
use tracing::{info, warn};

static STARTUP_TIME: OnceLock<Timestamp> = OnceLock::new();

const FORCE_CLI_MODE_ENV_VAR_NAME: &str = "MOSAIC_FORCE_CLI_MODE";

#[inline]
pub(crate) fn startup_time() -> Timestamp { *STARTUP_TIME.get_or_init(Timestamp::now) }

pub(crate) fn init_paths() -> HashMap<io::ErrorKind, Vec<&'static Path>> {
    [
        mosaic_paths::config_dir(),
        mosaic_paths::database_dir(),
        mosaic_paths::logs_dir(),
    ]
    .into_iter()
    .fold(HashMap::default(), |mut errors, path| {
        if let Err(e) = std::fs::create_dir_all(path) {
            errors
                .entry(e.kind())
                .or_insert_with(Vec::new)
                .push(path.as_path());
        }
        errors
    })
}

pub(crate) fn files_not_created_on_launch(errors: HashMap<io::ErrorKind, Vec<&Path>>) -> String {
    let details = errors
        .into_iter()
        .filter(|(_, paths)| !paths.is_empty())
        .map(|(kind, paths)| {
            #[allow(unused_mut)] // for non-unix platforms
            let mut details = format!("{kind} when creating {paths:?}");

            #[cfg(unix)]
            {
                if kind == io::ErrorKind::PermissionDenied {
                    details.push_str(
                        "\n\nConsider using chown and chmod to fix the directory permissions, \
                         or pass --data-dir to use another location.",
                    );
                }
            }
            details
        })
        .collect::<Vec<_>>()
        .join("\n\n");
    format!("mosaic failed to launch: {details}")
}

pub(crate) fn stdout_is_a_pty() -> bool {
    std::env::var(FORCE_CLI_MODE_ENV_VAR_NAME).ok().is_none() && io::stdout().is_terminal()
}

/// Opens the preference database, falling back to a session-only store.
///
/// The returned [`DBStore`] must be closed on shutdown.
pub(crate) async fn open_store() -> (Arc<dyn PreferenceStore>, Option<DBStore>) {
    let config = DatabaseConfig::builder()
        .db_path(mosaic_paths::database_file().clone())
        .build();
    match DBStore::new(config).await {
        Ok(db) => {
            let store: Arc<dyn PreferenceStore> = Arc::new(db.kv_store());
            (store, Some(db))
        }
        Err(e) => {
            warn!(
                error = %e,
                "preference database unavailable, preferences will not survive this session"
            );
            let store: Arc<dyn PreferenceStore> = Arc::new(MemoryStore::new());
            (store, None)
        }
    }
}

/// Loads `--catalog`, else `catalog.json` in the config dir, else the demo
/// sessions.
pub(crate) fn load_catalog(explicit: Option<&Path>) -> Result<Vec<Session>, Whatever> {
    let path = match explicit {
        Some(path) => path,
        None => {
            let default = mosaic_paths::catalog_file();
            if !default.exists() {
                info!(path = %default.display(), "no catalog file, using demo sessions");
                return Ok(catalog::demo_catalog());
            }
            default.as_path()
        }
    };
    let sessions = catalog::load_catalog(path)
        .with_whatever_context(|_| format!("failed to load catalog {}", path.display()))?;
    info!(path = %path.display(), sessions = sessions.len(), "catalog loaded");
    Ok(sessions)
}
