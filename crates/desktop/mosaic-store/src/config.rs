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

use std::{path::PathBuf, time::Duration};

use smart_default::SmartDefault;

/// Where and how the preference database is opened.
#[derive(Debug, Clone, PartialEq, Eq, SmartDefault, bon::Builder)]
pub struct DatabaseConfig {
    /// SQLite file, created together with its parent directory on first open.
    #[default(_code = "PathBuf::from(\"mosaic.db\")")]
    #[builder(default = PathBuf::from("mosaic.db"), into)]
    pub db_path: PathBuf,

    /// Pool size. Preferences see a handful of writes per session.
    #[default = 2]
    #[builder(default = 2)]
    pub max_connections: u32,

    /// How long a statement waits on a locked file, e.g. when `mosaic theme`
    /// runs next to an open console.
    #[default(_code = "Duration::from_secs(5)")]
    #[builder(default = Duration::from_secs(5), into)]
    pub busy_timeout: Duration,
}
