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

//! Durable key-value storage for the mosaic dashboard.
//!
//! [`DBStore`] owns a SQLite pool; [`KVStore`] is the JSON-valued table on
//! top of it. Both [`KVStore`] and [`MemoryStore`] implement
//! [`PreferenceStore`], the port the theme preference persists through.

mod config;
mod db;
pub mod err;
mod kv;
mod memory;
mod preference;

pub use config::DatabaseConfig;
pub use db::DBStore;
pub use err::{Error, Result};
pub use kv::KVStore;
pub use memory::MemoryStore;
pub use preference::PreferenceStore;
