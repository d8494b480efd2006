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

//! Platform directories for the mosaic dashboard.
//!
//! Every accessor resolves once and caches the result. A custom data
//! directory (see [`set_custom_data_dir`]) must be installed before the first
//! lookup.

use std::{
    path::{Path, PathBuf},
    sync::OnceLock,
};

static HOME_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Override installed by `set_custom_data_dir`.
static CUSTOM_DATA_DIR: OnceLock<PathBuf> = OnceLock::new();

/// On Linux/FreeBSD this is `$XDG_DATA_HOME/mosaic`.
static CURRENT_DATA_DIR: OnceLock<PathBuf> = OnceLock::new();

/// On Linux/FreeBSD this is `$XDG_CONFIG_HOME/mosaic`.
static CONFIG_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Returns the path to the user's home directory.
pub fn home_dir() -> &'static PathBuf {
    HOME_DIR.get_or_init(|| dirs::home_dir().unwrap_or_else(std::env::temp_dir))
}

/// Returns the configuration directory.
pub fn config_dir() -> &'static PathBuf {
    CONFIG_DIR.get_or_init(|| {
        if let Some(custom_dir) = CUSTOM_DATA_DIR.get() {
            custom_dir.join("config")
        } else if cfg!(target_os = "windows") {
            dirs::config_dir()
                .unwrap_or_else(|| home_dir().join("AppData").join("Roaming"))
                .join("Mosaic")
        } else if cfg!(any(target_os = "linux", target_os = "freebsd")) {
            dirs::config_dir()
                .unwrap_or_else(|| home_dir().join(".config"))
                .join("mosaic")
        } else {
            home_dir().join(".config").join("mosaic")
        }
    })
}

/// Returns the data directory.
pub fn data_dir() -> &'static PathBuf {
    CURRENT_DATA_DIR.get_or_init(|| {
        if let Some(custom_dir) = CUSTOM_DATA_DIR.get() {
            custom_dir.clone()
        } else if cfg!(any(target_os = "linux", target_os = "freebsd")) {
            dirs::data_local_dir()
                .unwrap_or_else(|| home_dir().join(".local").join("share"))
                .join("mosaic")
        } else {
            dirs::data_local_dir()
                .unwrap_or_else(|| home_dir().clone())
                .join("Mosaic")
        }
    })
}

/// Sets a custom directory for all user data.
///
/// Relative paths are canonicalized when possible and the directory is
/// created if missing.
///
/// # Panics
///
/// Panics if called after `data_dir` or `config_dir` has been resolved, or if
/// the directory cannot be created.
pub fn set_custom_data_dir<P: ?Sized + AsRef<Path>>(dir: &P) -> &'static PathBuf {
    assert!(
        CURRENT_DATA_DIR.get().is_none() && CONFIG_DIR.get().is_none(),
        "set_custom_data_dir called after data_dir or config_dir was initialized"
    );
    CUSTOM_DATA_DIR.get_or_init(|| {
        let mut path = dir.as_ref().to_path_buf();
        if path.is_relative() {
            if let Ok(abs) = path.canonicalize() {
                path = abs;
            }
        }

        std::fs::create_dir_all(&path).unwrap_or_else(|e| {
            panic!(
                "failed to create custom data directory {}: {e}",
                path.display()
            )
        });

        path
    })
}

/// Returns the logs directory.
pub fn logs_dir() -> &'static PathBuf {
    static LOGS_DIR: OnceLock<PathBuf> = OnceLock::new();
    LOGS_DIR.get_or_init(|| {
        if cfg!(target_os = "macos") && CUSTOM_DATA_DIR.get().is_none() {
            home_dir().join("Library/Logs/Mosaic")
        } else {
            data_dir().join("logs")
        }
    })
}

/// Returns the database directory.
pub fn database_dir() -> &'static PathBuf {
    static DATABASE_DIR: OnceLock<PathBuf> = OnceLock::new();
    DATABASE_DIR.get_or_init(|| data_dir().join("db"))
}

/// Returns the path to the preferences database.
pub fn database_file() -> &'static PathBuf {
    static DATABASE_FILE: OnceLock<PathBuf> = OnceLock::new();
    DATABASE_FILE.get_or_init(|| database_dir().join("mosaic.db"))
}

/// Returns the path to the default session catalog (`catalog.json`).
pub fn catalog_file() -> &'static PathBuf {
    static CATALOG_FILE: OnceLock<PathBuf> = OnceLock::new();
    CATALOG_FILE.get_or_init(|| config_dir().join("catalog.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_data_dir_roots_every_path() {
        let tmp = tempfile::TempDir::new().unwrap();
        let root = set_custom_data_dir(tmp.path()).clone();

        assert_eq!(data_dir(), &root);
        assert_eq!(config_dir(), &root.join("config"));
        assert_eq!(database_file(), &root.join("db").join("mosaic.db"));
        assert_eq!(catalog_file(), &root.join("config").join("catalog.json"));
        if !cfg!(target_os = "macos") {
            assert_eq!(logs_dir(), &root.join("logs"));
        }
    }
}
