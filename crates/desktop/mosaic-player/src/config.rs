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

use std::time::Duration;

use mosaic_store::DatabaseConfig;
use smart_default::SmartDefault;

use crate::theme::DEFAULT_PREFERENCE_KEY;

/// Logical names of the six camera streams served for every session.
pub const DEFAULT_STREAMS: [&str; 6] = [
    "center_front_image_rect_compressed",
    "center_rear_image_rect_compressed",
    "driver_front_image_rect_compressed",
    "driver_rear_image_rect_compressed",
    "passenger_front_image_rect_compressed",
    "passenger_rear_image_rect_compressed",
];

/// Application configuration
#[derive(Debug, Clone, Default, bon::Builder)]
pub struct AppConfig {
    /// Database configuration
    #[builder(default)]
    pub database:  DatabaseConfig,
    /// Dashboard configuration
    #[builder(default)]
    pub dashboard: DashboardConfig,
}

/// Stream sources and preference settings for the dashboard.
#[derive(Debug, Clone, SmartDefault, bon::Builder)]
#[builder(on(String, into))]
pub struct DashboardConfig {
    /// Base url of the media server
    #[default = "http://localhost:8000"]
    #[builder(default = "http://localhost:8000".to_string())]
    pub server_url: String,

    /// Logical stream names, one slot each, in display order
    #[default(_code = "DEFAULT_STREAMS.iter().map(ToString::to_string).collect()")]
    #[builder(default = DEFAULT_STREAMS.iter().map(ToString::to_string).collect())]
    pub streams: Vec<String>,

    /// Timeout for the metadata probe of each stream
    #[default(_code = "Duration::from_secs(10)")]
    #[builder(default = Duration::from_secs(10), into)]
    pub probe_timeout: Duration,

    /// Key the theme preference is persisted under
    #[default = "mosaic-theme"]
    #[builder(default = DEFAULT_PREFERENCE_KEY.to_string())]
    pub preference_key: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_match_default() {
        let built = DashboardConfig::builder().build();
        let default = DashboardConfig::default();
        assert_eq!(built.server_url, default.server_url);
        assert_eq!(built.streams, default.streams);
        assert_eq!(built.probe_timeout, default.probe_timeout);
        assert_eq!(built.preference_key, DEFAULT_PREFERENCE_KEY);
        assert_eq!(default.streams.len(), 6);
    }
}
