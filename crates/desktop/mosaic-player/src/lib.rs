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

//! Mosaic player - synchronized multi-stream review core.
//!
//! A review session ("rosbag") is picked from a categorized catalog while a
//! fixed set of video streams is driven as one logical transport. The crate
//! holds the state containers and their contracts; rendering and media
//! decoding stay outside.
//!
//! - [`media`]: the [`MediaHandle`] capability and the HTTP-backed
//!   [`StreamPlayer`].
//! - [`playback_group`]: best-effort broadcast of transport commands.
//! - [`selection`]: the session catalog and the single active selection.
//! - [`theme`]: the persisted light/dark preference.
//! - [`dashboard`]: the composition root wiring all of the above.

pub mod catalog;
pub mod config;
pub mod dashboard;
pub mod err;
pub mod media;
pub mod playback_group;
pub mod selection;
pub mod theme;
pub mod util;

pub use config::{AppConfig, DashboardConfig};
pub use dashboard::{Command, Dashboard, DashboardStatus, Reply};
pub use err::{Error, Result};
pub use media::{MediaErrorCode, MediaHandle, StreamError, StreamPlayer};
pub use playback_group::{PlaybackGroupController, RATE_PRESETS};
pub use selection::{GroupedCatalog, RosbagSelectionModel, Session};
pub use theme::{ColorSchemeSignal, ManualScheme, RootMarker, ThemeMode, ThemePreference, ThemeTarget};
