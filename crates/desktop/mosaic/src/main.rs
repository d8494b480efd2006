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

mod build_info;
mod console;
mod helper;

use std::{path::PathBuf, sync::Arc};

use clap::{Args, Parser, Subcommand};
use jiff::Timestamp;
use mosaic_common_telemetry::{LogFormat, LoggingOptions};
use mosaic_player::{
    Dashboard, DashboardConfig, ManualScheme, RootMarker, ThemeMode, ThemePreference,
};
use mosaic_store::{DBStore, PreferenceStore};
use snafu::{ResultExt, Whatever, whatever};

#[derive(Debug, Parser)]
#[clap(
name = "mosaic",
about = "Review recorded sessions across synchronized camera streams",
author = build_info::AUTHOR,
version = build_info::FULL_VERSION)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    commands: Option<Commands>,
}

#[derive(Debug, Clone, Args)]
struct GlobalArgs {
    /// Base url of the media server
    #[arg(long, global = true)]
    server_url: Option<String>,

    /// Use this directory for config, database and logs
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Session catalog (JSON array of sessions)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Log filter, e.g. `info` or `debug,sqlx=warn`
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log output format
    #[arg(long, global = true, default_value = "text")]
    log_format: LogFormat,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Run(RunArgs),
    Catalog(CatalogArgs),
    Theme(ThemeArgs),
}

#[derive(Debug, Clone, Default, Args)]
#[command(flatten_help = true)]
#[command(long_about = r"

Opens the review console: all streams are mounted and driven together.
Examples:

mosaic run --server-url http://localhost:8000

")]
struct RunArgs {}

impl RunArgs {
    async fn run(&self, global: &GlobalArgs) -> Result<(), Whatever> {
        let catalog = helper::load_catalog(global.catalog.as_deref())?;
        let (store, db) = helper::open_store().await;

        let mut config = DashboardConfig::default();
        if let Some(url) = &global.server_url {
            config.server_url.clone_from(url);
        }
        let scheme = Arc::new(ManualScheme::new(None));
        let (mut dashboard, errors) = Dashboard::open(
            config,
            catalog,
            store,
            scheme.clone(),
            Arc::new(RootMarker::new()),
        )
        .await
        .whatever_context("failed to open dashboard")?;
        dashboard.on_select(|session| {
            tracing::info!(
                id = %session.id,
                name = %session.name,
                category = session.category_or_default(),
                path = %session.path,
                "session selected"
            );
        });

        let elapsed = Timestamp::now().duration_since(helper::startup_time());
        tracing::info!(millis = elapsed.as_millis(), "console ready");

        let result = console::run(dashboard, errors, scheme).await;
        close(db).await;
        result
    }
}

#[derive(Debug, Clone, Args)]
#[command(flatten_help = true)]
#[command(long_about = r"

Prints the session catalog grouped by category.
Examples:

mosaic catalog --catalog sessions.json

")]
struct CatalogArgs {}

impl CatalogArgs {
    fn run(&self, global: &GlobalArgs) -> Result<(), Whatever> {
        let catalog = helper::load_catalog(global.catalog.as_deref())?;
        console::print_catalog(&mosaic_player::GroupedCatalog::from_sessions(&catalog));
        Ok(())
    }
}

#[derive(Debug, Clone, Args)]
#[command(long_about = r"

Reads or changes the persisted theme preference.
Examples:

mosaic theme show
mosaic theme set dark
mosaic theme clear

")]
struct ThemeArgs {
    #[command(subcommand)]
    action: ThemeAction,
}

#[derive(Debug, Clone, Subcommand)]
enum ThemeAction {
    /// Print the resolved mode
    Show,
    /// Persist an explicit mode
    Set { mode: ThemeMode },
    /// Flip and persist the mode
    Toggle,
    /// Forget the persisted mode
    Clear,
}

impl ThemeArgs {
    async fn run(&self) -> Result<(), Whatever> {
        let (store, db) = helper::open_store().await;
        let mode = self.apply(store).await;
        close(db).await;
        console::print_theme(mode);
        Ok(())
    }

    async fn apply(&self, store: Arc<dyn PreferenceStore>) -> ThemeMode {
        let key = DashboardConfig::default().preference_key;
        let mut theme = ThemePreference::init(
            key,
            store,
            Arc::new(ManualScheme::new(None)),
            Arc::new(RootMarker::new()),
        )
        .await;
        match &self.action {
            ThemeAction::Show => {}
            ThemeAction::Set { mode } => theme.set_mode(*mode).await,
            ThemeAction::Toggle => {
                theme.toggle().await;
            }
            ThemeAction::Clear => {
                theme.clear_persisted().await;
            }
        }
        theme.mode()
    }
}

async fn close(db: Option<DBStore>) {
    if let Some(db) = db {
        db.close().await;
    }
}

#[tokio::main]
async fn main() -> Result<(), Whatever> {
    helper::startup_time();
    let cli = Cli::parse();

    if let Some(dir) = &cli.global.data_dir {
        mosaic_paths::set_custom_data_dir(dir);
    }
    let file_errors = helper::init_paths();
    if !file_errors.is_empty() {
        whatever!("{}", helper::files_not_created_on_launch(file_errors));
    }

    let _guards = mosaic_common_telemetry::init_global_logging(
        "mosaic",
        &LoggingOptions::builder()
            .dir(mosaic_paths::logs_dir().to_string_lossy())
            .maybe_level(cli.global.log_level.clone())
            .log_format(cli.global.log_format)
            .append_stdout(helper::stdout_is_a_pty())
            .build(),
    );
    mosaic_common_telemetry::set_panic_hook();
    tracing::info!(
        "========== starting mosaic version {}, sha {} ==========",
        build_info::build::PKG_VERSION,
        build_info::build::COMMIT_HASH,
    );

    match cli.commands.unwrap_or(Commands::Run(RunArgs::default())) {
        Commands::Run(args) => args.run(&cli.global).await,
        Commands::Catalog(args) => args.run(&cli.global),
        Commands::Theme(args) => args.run().await,
    }
}
