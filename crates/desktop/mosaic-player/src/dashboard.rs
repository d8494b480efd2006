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

//! Composition root.
//!
//! Wires the session selection to an external callback, mounts one
//! [`StreamPlayer`] per configured stream into the [`PlaybackGroupController`]
//! and routes transport commands to it. Stream errors from every player are
//! funneled into one channel, tagged with their slot, and never aggregated.

use std::{fmt, str::FromStr, sync::Arc};

use mosaic_store::PreferenceStore;
use reqwest::Url;
use snafu::OptionExt;
use tokio::{sync::mpsc, task::AbortHandle};
use tracing::info;

use crate::{
    config::DashboardConfig,
    err::{Error, InvalidCommandSnafu, Result, SlotOutOfRangeSnafu},
    media::{ErrorSink, MediaHandle, StreamError, StreamPlayer, stream_locator},
    playback_group::PlaybackGroupController,
    selection::{GroupedCatalog, RosbagSelectionModel, Session},
    theme::{ColorSchemeSignal, ThemeMode, ThemePreference, ThemeTarget},
};

/// Operator commands understood by the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    PlayAll,
    PauseAll,
    SetRate(f64),
    SeekAll(f64),
    Select(String),
    ToggleTheme,
    SetTheme(ThemeMode),
    ClearTheme,
    Mount(usize),
    Unmount(usize),
    Status,
    Catalog,
}

impl FromStr for Command {
    type Err = Error;

    /// Parses console input such as `play`, `rate 2x`, `seek 12.5`,
    /// `select 3`, `theme dark` or `unmount 4`.
    fn from_str(input: &str) -> Result<Self> {
        let invalid = |reason: &str| InvalidCommandSnafu { input, reason }.build();
        let mut words = input.split_whitespace();
        let verb = words.next().ok_or_else(|| invalid("empty command"))?;
        let arg = words.next();
        if words.next().is_some() {
            return Err(invalid("too many arguments"));
        }

        let number = |what: &str| -> Result<f64> {
            let raw = arg.ok_or_else(|| invalid(&format!("missing {what}")))?;
            let raw = raw.trim_end_matches(['x', 'X']);
            raw.parse::<f64>()
                .map_err(|_| invalid(&format!("`{raw}` is not a valid {what}")))
        };
        let slot = || -> Result<usize> {
            let raw = arg.ok_or_else(|| invalid("missing slot index"))?;
            raw.parse::<usize>()
                .map_err(|_| invalid(&format!("`{raw}` is not a slot index")))
        };

        let command = match (verb.to_ascii_lowercase().as_str(), arg) {
            ("play", None) => Self::PlayAll,
            ("pause", None) => Self::PauseAll,
            ("rate", _) => Self::SetRate(number("rate")?),
            ("seek", _) => Self::SeekAll(number("position")?),
            ("select", Some(id)) => Self::Select(id.to_owned()),
            ("select", None) => return Err(invalid("missing session id")),
            ("theme", None | Some("toggle")) => Self::ToggleTheme,
            ("theme", Some("clear")) => Self::ClearTheme,
            ("theme", Some(mode)) => Self::SetTheme(
                mode.parse()
                    .map_err(|_| invalid(&format!("unknown theme `{mode}`")))?,
            ),
            ("mount", _) => Self::Mount(slot()?),
            ("unmount", _) => Self::Unmount(slot()?),
            ("status", None) => Self::Status,
            ("catalog" | "list", None) => Self::Catalog,
            _ => return Err(invalid("unknown command")),
        };
        Ok(command)
    }
}

/// Result of a dispatched command.
#[derive(Debug, Clone)]
pub enum Reply {
    Done,
    Selected(Session),
    Theme(ThemeMode),
    Status(DashboardStatus),
    Catalog(GroupedCatalog),
}

#[derive(Debug, Clone)]
pub struct SlotStatus {
    pub index:    usize,
    pub locator:  String,
    pub mounted:  bool,
    pub loaded:   bool,
    pub playing:  bool,
    pub ended:    bool,
    pub rate:     f64,
    pub position: f64,
    pub error:    Option<StreamError>,
}

#[derive(Debug, Clone)]
pub struct DashboardStatus {
    pub theme:       ThemeMode,
    pub selected_id: Option<String>,
    /// `None` when nothing is selected or the selection went stale.
    pub selected:    Option<Session>,
    pub slots:       Vec<SlotStatus>,
}

impl fmt::Display for DashboardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "theme: {}", self.theme)?;
        match (&self.selected_id, &self.selected) {
            (_, Some(session)) => writeln!(f, "selected: {} ({})", session.name, session.id)?,
            (Some(id), None) => writeln!(f, "selected: {id} (no longer in catalog)")?,
            (None, None) => writeln!(f, "selected: none")?,
        }
        for slot in &self.slots {
            let state = match (slot.mounted, &slot.error, slot.loaded, slot.playing) {
                (false, ..) => "unmounted",
                (true, Some(_), ..) => "failed",
                (true, None, false, _) => "loading",
                (true, None, true, _) if slot.ended => "ended",
                (true, None, true, true) => "playing",
                (true, None, true, false) => "paused",
            };
            write!(
                f,
                "[{}] {:<9} {:>8.2}s x{} {}",
                slot.index, state, slot.position, slot.rate, slot.locator
            )?;
            if let Some(err) = &slot.error {
                write!(f, " ({err})")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

pub struct Dashboard {
    config:    DashboardConfig,
    client:    reqwest::Client,
    locators:  Vec<Url>,
    selection: RosbagSelectionModel,
    group:     PlaybackGroupController,
    theme:     ThemePreference,
    /// Owning references for mounted views; the group only holds weak ones.
    players:   Vec<Option<Arc<StreamPlayer>>>,
    /// In-flight metadata probe per slot; aborted when the slot unmounts.
    probes:    Vec<Option<AbortHandle>>,
    errors:    mpsc::UnboundedSender<StreamError>,
}

impl fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dashboard")
            .field("selection", &self.selection)
            .field("group", &self.group)
            .field("theme", &self.theme)
            .finish_non_exhaustive()
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        for probe in self.probes.iter().flatten() {
            probe.abort();
        }
    }
}

impl Dashboard {
    /// Builds the dashboard and mounts every configured stream.
    ///
    /// Must run inside a tokio runtime; each mounted stream probes its
    /// locator in the background. The returned receiver yields stream
    /// errors from all slots.
    pub async fn open(
        config: DashboardConfig,
        catalog: Vec<Session>,
        store: Arc<dyn PreferenceStore>,
        signal: Arc<dyn ColorSchemeSignal>,
        target: Arc<dyn ThemeTarget>,
    ) -> Result<(Self, mpsc::UnboundedReceiver<StreamError>)> {
        let locators = config
            .streams
            .iter()
            .map(|name| stream_locator(&config.server_url, name))
            .collect::<Result<Vec<_>>>()?;
        let group = PlaybackGroupController::new(locators.iter().map(Url::to_string));
        let theme =
            ThemePreference::init(config.preference_key.clone(), store, signal, target).await;
        let (errors, rx) = mpsc::unbounded_channel();

        let mut dashboard = Self {
            players: vec![None; locators.len()],
            probes: locators.iter().map(|_| None).collect(),
            client: reqwest::Client::new(),
            locators,
            selection: RosbagSelectionModel::new(catalog),
            group,
            theme,
            errors,
            config,
        };
        for index in 0..dashboard.locators.len() {
            dashboard.mount(index)?;
        }
        info!(
            streams = dashboard.locators.len(),
            sessions = dashboard.selection.catalog().len(),
            "dashboard ready"
        );
        Ok((dashboard, rx))
    }

    pub const fn config(&self) -> &DashboardConfig { &self.config }

    pub const fn selection(&self) -> &RosbagSelectionModel { &self.selection }

    pub const fn group(&self) -> &PlaybackGroupController { &self.group }

    pub const fn theme(&self) -> &ThemePreference { &self.theme }

    pub fn player(&self, index: usize) -> Option<&Arc<StreamPlayer>> {
        self.players.get(index).and_then(Option::as_ref)
    }

    /// Registers the callback that receives every newly selected session.
    pub fn on_select(&mut self, callback: impl FnMut(&Session) + Send + 'static) {
        self.selection.subscribe(callback);
    }

    pub fn set_catalog(&mut self, sessions: Vec<Session>) { self.selection.set_catalog(sessions); }

    /// Mounts a fresh player in slot `index`, replacing any mounted one.
    pub fn mount(&mut self, index: usize) -> Result<()> {
        let len = self.locators.len();
        let locator = self
            .locators
            .get(index)
            .cloned()
            .context(SlotOutOfRangeSnafu { index, len })?;

        let errors = self.errors.clone();
        let sink: ErrorSink = Arc::new(move |err| {
            // The receiver is gone only during shutdown.
            let _ = errors.send(err);
        });
        let player = Arc::new(StreamPlayer::new(
            index,
            locator,
            self.client.clone(),
            self.config.probe_timeout,
            sink,
        ));

        let handle: Arc<dyn MediaHandle> = player.clone();
        self.group.register_handle(index, &handle)?;
        self.abort_probe(index);
        self.players[index] = Some(player.clone());
        let probe = tokio::spawn(async move { player.load().await });
        self.probes[index] = Some(probe.abort_handle());
        Ok(())
    }

    /// Unmounts slot `index`. A probe still in flight is aborted, so the
    /// detached player never reports again.
    pub fn unmount(&mut self, index: usize) -> Result<()> {
        self.group.unregister_handle(index)?;
        self.abort_probe(index);
        self.players[index] = None;
        Ok(())
    }

    fn abort_probe(&mut self, index: usize) {
        if let Some(probe) = self.probes[index].take() {
            probe.abort();
        }
    }

    /// Forwards a system color-scheme change to the theme preference.
    pub async fn on_system_scheme(&mut self, prefers_dark: bool) -> bool {
        self.theme.on_system_change(prefers_dark).await
    }

    pub async fn dispatch(&mut self, command: Command) -> Result<Reply> {
        let reply = match command {
            Command::PlayAll => {
                self.group.play_all();
                Reply::Done
            }
            Command::PauseAll => {
                self.group.pause_all();
                Reply::Done
            }
            Command::SetRate(rate) => {
                self.group.set_rate_all(rate);
                Reply::Done
            }
            Command::SeekAll(seconds) => {
                self.group.seek_all(seconds);
                Reply::Done
            }
            Command::Select(id) => Reply::Selected(self.selection.select(&id)?.clone()),
            Command::ToggleTheme => Reply::Theme(self.theme.toggle().await),
            Command::SetTheme(mode) => {
                self.theme.set_mode(mode).await;
                Reply::Theme(mode)
            }
            Command::ClearTheme => Reply::Theme(self.theme.clear_persisted().await),
            Command::Mount(index) => {
                self.mount(index)?;
                Reply::Done
            }
            Command::Unmount(index) => {
                self.unmount(index)?;
                Reply::Done
            }
            Command::Status => Reply::Status(self.status()),
            Command::Catalog => Reply::Catalog(self.selection.grouped_view()),
        };
        Ok(reply)
    }

    pub fn status(&self) -> DashboardStatus {
        let slots = self
            .group
            .slots()
            .iter()
            .map(|slot| {
                let player = self.player(slot.index());
                SlotStatus {
                    index:    slot.index(),
                    locator:  slot.locator().to_owned(),
                    mounted:  slot.handle().is_some(),
                    loaded:   player.is_some_and(|p| p.is_loaded()),
                    playing:  player.is_some_and(|p| p.is_playing()),
                    ended:    player.is_some_and(|p| p.has_ended()),
                    rate:     player.map_or(1.0, |p| p.rate()),
                    position: slot.handle().map_or(0.0, |h| h.current_time()),
                    error:    player.and_then(|p| p.load_error()),
                }
            })
            .collect();

        DashboardStatus {
            theme: self.theme.mode(),
            selected_id: self.selection.selected_id().map(ToOwned::to_owned),
            selected: self.selection.selected_session().cloned(),
            slots,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_commands() {
        assert_eq!("play".parse::<Command>().unwrap(), Command::PlayAll);
        assert_eq!("  pause ".parse::<Command>().unwrap(), Command::PauseAll);
        assert_eq!("rate 0.5x".parse::<Command>().unwrap(), Command::SetRate(0.5));
        assert_eq!("rate 2".parse::<Command>().unwrap(), Command::SetRate(2.0));
        assert_eq!("seek 12.5".parse::<Command>().unwrap(), Command::SeekAll(12.5));
        assert_eq!(
            "select 3".parse::<Command>().unwrap(),
            Command::Select("3".into())
        );
        assert_eq!("theme".parse::<Command>().unwrap(), Command::ToggleTheme);
        assert_eq!(
            "theme dark".parse::<Command>().unwrap(),
            Command::SetTheme(ThemeMode::Dark)
        );
        assert_eq!("theme clear".parse::<Command>().unwrap(), Command::ClearTheme);
        assert_eq!("unmount 4".parse::<Command>().unwrap(), Command::Unmount(4));
        assert_eq!("LIST".parse::<Command>().unwrap(), Command::Catalog);
    }

    #[test]
    fn status_shows_ended_streams() {
        let slot = |index, playing, ended| SlotStatus {
            index,
            locator: format!("http://localhost:8000/video?filename={index}.mp4"),
            mounted: true,
            loaded: true,
            playing,
            ended,
            rate: 1.0,
            position: 30.0,
            error: None,
        };
        let status = DashboardStatus {
            theme:       ThemeMode::Light,
            selected_id: None,
            selected:    None,
            slots:       vec![slot(0, true, true), slot(1, true, false)],
        };

        let text = status.to_string();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[1], "selected: none");
        assert!(lines[2].starts_with("[0] ended"), "{}", lines[2]);
        assert!(lines[3].starts_with("[1] playing"), "{}", lines[3]);
    }

    #[test]
    fn reject_bad_commands() {
        for input in ["", "rate", "rate fast", "select", "theme sepia", "mount -1", "play now", "jump"]
        {
            let err = input.parse::<Command>().unwrap_err();
            assert!(
                matches!(err, Error::InvalidCommand { .. }),
                "{input:?} gave {err}"
            );
        }
    }
}
