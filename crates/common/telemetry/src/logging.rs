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
    env,
    io::IsTerminal,
    sync::{Arc, Mutex, Once},
};

use bon::Builder;
use once_cell::sync::{Lazy, OnceCell};
use serde::{Deserialize, Deserializer, Serialize, de};
use smart_default::SmartDefault;
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_log::LogTracer;
use tracing_subscriber::{EnvFilter, Layer, Registry, filter, layer::SubscriberExt};

/// Deserializes a string value, using `Default::default()` if the string is
/// empty.
///
/// Lets configuration files spell "use the default" as `log_format = ""`.
///
/// # Errors
/// Returns an error if the non-empty string does not name a valid `T`.
pub fn empty_string_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    let s = String::deserialize(deserializer)?;
    if s.is_empty() {
        Ok(T::default())
    } else {
        T::deserialize(de::value::StrDeserializer::new(&s)).map_err(|e: de::value::Error| {
            de::Error::custom(format!("invalid value, expect empty string, err: {e}"))
        })
    }
}

/// The default directory name for log files when file logging is enabled.
pub const DEFAULT_LOGGING_DIR: &str = "logs";

/// Global handle for changing the level filter at runtime.
///
/// Only populated once `init_global_logging` has run.
pub static RELOAD_HANDLE: OnceCell<tracing_subscriber::reload::Handle<filter::Targets, Registry>> =
    OnceCell::new();

/// Configuration options for the logging system.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, SmartDefault, Builder)]
#[serde(default)]
pub struct LoggingOptions {
    /// Directory for rolling log files.
    ///
    /// Empty means stdout only. Files rotate hourly and the directory is
    /// created on demand.
    #[default = ""]
    #[builder(default, into)]
    pub dir: String,

    /// Level filter such as `"info"` or `"debug,sqlx=warn"`.
    ///
    /// Falls back to `RUST_LOG`, then to `"info"`.
    #[builder(into)]
    pub level: Option<String>,

    /// Output format for log lines.
    #[serde(default, deserialize_with = "empty_string_as_default")]
    #[builder(default)]
    pub log_format: LogFormat,

    /// Maximum number of rotated files kept per log stream.
    #[default = 720]
    #[builder(default = 720)]
    pub max_log_files: usize,

    /// Whether to also write to stdout when file logging is enabled.
    #[default = true]
    #[builder(default = true)]
    pub append_stdout: bool,
}

/// Available log output formats.
#[derive(
    Clone,
    Debug,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Default,
    strum_macros::Display,
    strum_macros::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One JSON object per event, with the current span attached.
    ///
    /// ```json
    /// {"timestamp":"2025-10-08T12:00:00Z","level":"INFO","target":"mosaic_player","message":"broadcast play"}
    /// ```
    Json,

    /// Human-readable lines.
    #[default]
    Text,
}

/// Initialize logging for unit tests.
///
/// Writes to `UNITTEST_LOG_DIR` (default `/tmp/__unittest_logs`) at
/// `UNITTEST_LOG_LEVEL`. Safe to call from every test; only the first call
/// installs the subscriber.
pub fn init_default_ut_logging() {
    static START: Once = Once::new();

    START.call_once(|| {
        let Ok(mut g) = GLOBAL_UT_LOG_GUARD.as_ref().lock() else {
            return;
        };

        let dir =
            env::var("UNITTEST_LOG_DIR").unwrap_or_else(|_| "/tmp/__unittest_logs".to_string());

        let level = env::var("UNITTEST_LOG_LEVEL")
            .unwrap_or_else(|_| "debug,sqlx=warn,hyper=warn,reqwest=warn,h2=info".to_string());
        let opts = LoggingOptions {
            dir: dir.clone(),
            level: Some(level),
            ..Default::default()
        };
        *g = Some(init_global_logging("unittest", &opts));

        tracing::info!("logs dir = {}", dir);
    });
}

/// Keeps the unit-test writer guards alive for the whole test binary.
static GLOBAL_UT_LOG_GUARD: Lazy<Arc<Mutex<Option<Vec<WorkerGuard>>>>> =
    Lazy::new(|| Arc::new(Mutex::new(None)));

const DEFAULT_LOG_TARGETS: &str = "info";

type FilteredRegistry = tracing_subscriber::layer::Layered<
    tracing_subscriber::reload::Layer<filter::Targets, Registry>,
    Registry,
>;

type BoxedLayer = Box<dyn Layer<FilteredRegistry> + Send + Sync>;

fn fmt_layer<W>(writer: W, format: LogFormat, ansi: bool) -> BoxedLayer
where
    W: for<'w> tracing_subscriber::fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    match format {
        LogFormat::Json => tracing_subscriber::fmt::Layer::new()
            .json()
            .with_writer(writer)
            .with_ansi(ansi)
            .with_current_span(true)
            .with_span_list(true)
            .boxed(),
        LogFormat::Text => tracing_subscriber::fmt::Layer::new()
            .with_writer(writer)
            .with_ansi(ansi)
            .boxed(),
    }
}

fn rolling_appender(prefix: &str, opts: &LoggingOptions) -> RollingFileAppender {
    RollingFileAppender::builder()
        .rotation(Rotation::HOURLY)
        .filename_prefix(prefix)
        .max_log_files(opts.max_log_files)
        .build(&opts.dir)
        .unwrap_or_else(|e| {
            panic!(
                "initializing rolling file appender at {} failed: {}",
                &opts.dir, e
            )
        })
}

/// Install the global tracing subscriber.
///
/// Sets up, depending on `opts`:
///
/// - a stdout layer (if `append_stdout`),
/// - an hourly rolling file layer named after `app_name` (if `dir` is set),
/// - an error-only rolling file layer (if `dir` is set),
///
/// all behind a reloadable level filter exposed through [`RELOAD_HANDLE`].
///
/// The returned guards must stay alive for as long as logs should be
/// flushed. Only the first call has an effect.
///
/// # Panics
///
/// Panics if the log directory cannot be used or the level string does not
/// parse; both are startup misconfigurations.
pub fn init_global_logging(app_name: &str, opts: &LoggingOptions) -> Vec<WorkerGuard> {
    static START: Once = Once::new();
    let mut guards = vec![];

    START.call_once(|| {
        LogTracer::init().expect("log tracer must be valid");

        let filter = opts
            .level
            .as_deref()
            .or(env::var(EnvFilter::DEFAULT_ENV).ok().as_deref())
            .unwrap_or(DEFAULT_LOG_TARGETS)
            .parse::<filter::Targets>()
            .expect("error parsing log level string");

        let (dyn_filter, reload_handle) = tracing_subscriber::reload::Layer::new(filter);

        RELOAD_HANDLE
            .set(reload_handle)
            .expect("reload handle already set, maybe init_global_logging get called twice?");

        let prefix = app_name.to_ascii_lowercase();
        let mut layers: Vec<BoxedLayer> = Vec::new();

        if opts.append_stdout {
            let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());
            guards.push(guard);
            layers.push(fmt_layer(
                writer,
                opts.log_format,
                std::io::stdout().is_terminal(),
            ));
        }

        if !opts.dir.is_empty() {
            let (writer, guard) = tracing_appender::non_blocking(rolling_appender(&prefix, opts));
            guards.push(guard);
            layers.push(fmt_layer(writer, opts.log_format, false));

            let (writer, guard) =
                tracing_appender::non_blocking(rolling_appender(&format!("{prefix}-err"), opts));
            guards.push(guard);
            layers.push(
                fmt_layer(writer, opts.log_format, false)
                    .with_filter(filter::LevelFilter::ERROR)
                    .boxed(),
            );
        }

        let subscriber = Registry::default().with(dyn_filter).with(layers);

        tracing::subscriber::set_global_default(subscriber)
            .expect("error setting global tracing subscriber");
    });

    guards
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_format_falls_back_to_text() {
        let opts: LoggingOptions =
            serde_json::from_str(r#"{"dir":"","log_format":""}"#).unwrap();
        assert_eq!(opts.log_format, LogFormat::Text);
        assert_eq!(opts.max_log_files, 720);
        assert!(opts.append_stdout);
    }

    #[test]
    fn builder_matches_defaults() {
        let built = LoggingOptions::builder().build();
        assert_eq!(built, LoggingOptions::default());
    }

    #[test]
    fn parse_log_format() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert!("yaml".parse::<LogFormat>().is_err());
        assert_eq!(LogFormat::Json.to_string(), "json");
    }
}
