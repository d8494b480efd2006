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

//! Interactive console over stdin.
//!
//! One task owns the [`Dashboard`]: operator input, system color-scheme
//! changes and stream errors are multiplexed with `tokio::select!`.

use std::{io::Write, sync::Arc};

use mosaic_player::{
    Command, Dashboard, GroupedCatalog, ManualScheme, RATE_PRESETS, Reply, StreamError,
    ThemeMode,
};
use snafu::{ResultExt, Whatever};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};
use tracing::{info, warn};

fn help() -> String {
    let rates = RATE_PRESETS
        .iter()
        .map(f64::to_string)
        .collect::<Vec<_>>()
        .join("|");
    format!(
        "\
commands:
  play | pause            drive every mounted stream
  rate <{rates}>[x]       playback rate for every stream
  seek <seconds>          seek every stream
  select <id>             pick a session
  catalog                 list sessions by category
  theme [toggle|light|dark|clear]
  system <dark|light|none>  simulate a system color-scheme change
  mount <i> | unmount <i> attach or detach the view of slot i
  status                  show selection, theme and streams
  help | quit"
    )
}

pub(crate) async fn run(
    mut dashboard: Dashboard,
    mut errors: mpsc::UnboundedReceiver<StreamError>,
    scheme: Arc<ManualScheme>,
) -> Result<(), Whatever> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut system = dashboard.theme().system_changes();

    println!("{}", help());
    prompt();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.whatever_context("failed to read stdin")? else {
                    break;
                };
                match line.trim() {
                    "" => {}
                    "quit" | "exit" => break,
                    "help" => println!("{}", help()),
                    input if input.starts_with("system") => simulate_system(&scheme, input),
                    input => match input.parse::<Command>() {
                        Ok(command) => match dashboard.dispatch(command).await {
                            Ok(reply) => print_reply(&reply),
                            Err(e) => println!("error: {e}"),
                        },
                        Err(e) => println!("{e}, try `help`"),
                    },
                }
                prompt();
            }
            Ok(()) = system.changed() => {
                let prefers_dark = *system.borrow_and_update();
                if let Some(prefers_dark) = prefers_dark {
                    if dashboard.on_system_scheme(prefers_dark).await {
                        println!("theme follows system: {}", dashboard.theme().mode());
                    } else {
                        println!("system scheme changed, theme stays {}", dashboard.theme().mode());
                    }
                    prompt();
                }
            }
            Some(err) = errors.recv() => {
                println!("\n! {err}");
                prompt();
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    info!("console closed");
    Ok(())
}

fn simulate_system(scheme: &ManualScheme, input: &str) {
    let value = match input.split_whitespace().nth(1) {
        Some("dark") => Some(true),
        Some("light") => Some(false),
        Some("none") => None,
        _ => {
            println!("usage: system <dark|light|none>");
            return;
        }
    };
    scheme.set(value);
}

fn prompt() {
    print!("mosaic> ");
    if let Err(e) = std::io::stdout().flush() {
        warn!(error = %e, "failed to flush stdout");
    }
}

pub(crate) fn print_reply(reply: &Reply) {
    match reply {
        Reply::Done => println!("ok"),
        Reply::Selected(session) => {
            println!("selected {} ({}) at {}", session.name, session.id, session.path);
        }
        Reply::Theme(mode) => print_theme(*mode),
        Reply::Status(status) => print!("{status}"),
        Reply::Catalog(grouped) => print_catalog(grouped),
    }
}

pub(crate) fn print_theme(mode: ThemeMode) { println!("theme: {mode}") }

pub(crate) fn print_catalog(grouped: &GroupedCatalog) {
    if grouped.is_empty() {
        println!("no sessions");
        return;
    }
    for group in grouped.groups() {
        println!("{}", group.category);
        for session in &group.sessions {
            println!("  [{}] {}  {}", session.id, session.name, session.path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn help_lists_rate_presets() {
        assert!(help().contains("rate <0.5|1|2>[x]"));
    }
}
