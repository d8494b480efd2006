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

//! Light/dark preference with persisted > system > default precedence.
//!
//! [`ThemePreference`] is the only writer of the mode. Every mutation
//! persists through a [`PreferenceStore`] and is applied to the live
//! [`ThemeTarget`] before the call returns. A failed write is logged and the
//! in-memory mode still changes.

use std::{collections::BTreeSet, sync::Arc};

use mosaic_store::PreferenceStore;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::util::ResultExt;

/// Key the preference is persisted under.
pub const DEFAULT_PREFERENCE_KEY: &str = "mosaic-theme";

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl ThemeMode {
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    pub const fn from_prefers_dark(prefers_dark: bool) -> Self {
        if prefers_dark { Self::Dark } else { Self::Light }
    }
}

/// System color-scheme signal.
pub trait ColorSchemeSignal: Send + Sync {
    /// Current "prefers dark" reading, `None` when the environment has no
    /// opinion.
    fn prefers_dark(&self) -> Option<bool>;

    /// Change notifications. Dropping the receiver unsubscribes.
    fn subscribe(&self) -> watch::Receiver<Option<bool>>;
}

/// A color-scheme signal driven by hand, e.g. from a console or a test.
#[derive(Debug)]
pub struct ManualScheme {
    tx: watch::Sender<Option<bool>>,
}

impl ManualScheme {
    pub fn new(prefers_dark: Option<bool>) -> Self {
        let (tx, _) = watch::channel(prefers_dark);
        Self { tx }
    }

    /// Reports a system change to every subscriber.
    pub fn set(&self, prefers_dark: Option<bool>) { self.tx.send_replace(prefers_dark); }
}

impl ColorSchemeSignal for ManualScheme {
    fn prefers_dark(&self) -> Option<bool> { *self.tx.borrow() }

    fn subscribe(&self) -> watch::Receiver<Option<bool>> { self.tx.subscribe() }
}

/// The live rendering environment the mode is mirrored into.
pub trait ThemeTarget: Send + Sync {
    fn apply(&self, mode: ThemeMode);
}

/// Root-level class marker: holds exactly one of `light`/`dark` next to any
/// unrelated classes.
#[derive(Debug, Default)]
pub struct RootMarker {
    classes: RwLock<BTreeSet<String>>,
}

impl RootMarker {
    pub fn new() -> Self { Self::default() }

    pub fn contains(&self, class: &str) -> bool { self.classes.read().contains(class) }

    pub fn classes(&self) -> Vec<String> { self.classes.read().iter().cloned().collect() }

    pub fn add_class(&self, class: impl Into<String>) { self.classes.write().insert(class.into()); }
}

impl ThemeTarget for RootMarker {
    fn apply(&self, mode: ThemeMode) {
        let mut classes = self.classes.write();
        for m in [ThemeMode::Light, ThemeMode::Dark] {
            classes.remove(m.as_ref());
        }
        classes.insert(mode.to_string());
    }
}

pub struct ThemePreference {
    mode:   ThemeMode,
    key:    String,
    store:  Arc<dyn PreferenceStore>,
    signal: Arc<dyn ColorSchemeSignal>,
    target: Arc<dyn ThemeTarget>,
}

impl std::fmt::Debug for ThemePreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThemePreference")
            .field("mode", &self.mode)
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl ThemePreference {
    /// Resolves the initial mode and applies it to `target`.
    ///
    /// Initialization does not write to the store, so an unset preference
    /// stays unset and system changes keep being followed.
    pub async fn init(
        key: impl Into<String>,
        store: Arc<dyn PreferenceStore>,
        signal: Arc<dyn ColorSchemeSignal>,
        target: Arc<dyn ThemeTarget>,
    ) -> Self {
        let key = key.into();
        let persisted = read_persisted(store.as_ref(), &key).await;
        let mode = persisted
            .or_else(|| signal.prefers_dark().map(ThemeMode::from_prefers_dark))
            .unwrap_or_default();
        target.apply(mode);
        info!(%mode, persisted = persisted.is_some(), "theme resolved");

        Self {
            mode,
            key,
            store,
            signal,
            target,
        }
    }

    pub const fn mode(&self) -> ThemeMode { self.mode }

    pub fn key(&self) -> &str { &self.key }

    /// A new receiver for system color-scheme changes.
    pub fn system_changes(&self) -> watch::Receiver<Option<bool>> { self.signal.subscribe() }

    /// Flips the mode. A manual toggle always counts as an explicit choice.
    pub async fn toggle(&mut self) -> ThemeMode {
        let next = self.mode.toggled();
        self.commit(next).await;
        next
    }

    pub async fn set_mode(&mut self, mode: ThemeMode) { self.commit(mode).await; }

    /// Adopts a system change unless a persisted preference exists. Returns
    /// whether the change was adopted.
    pub async fn on_system_change(&mut self, prefers_dark: bool) -> bool {
        if read_persisted(self.store.as_ref(), &self.key).await.is_some() {
            info!(prefers_dark, "system scheme change ignored, preference is pinned");
            return false;
        }
        self.commit(ThemeMode::from_prefers_dark(prefers_dark)).await;
        true
    }

    /// Forgets the persisted preference and falls back to the system signal
    /// or the default, without persisting the fallback.
    pub async fn clear_persisted(&mut self) -> ThemeMode {
        self.store
            .remove(&self.key)
            .await
            .log_err("failed to clear theme preference");
        self.mode = self
            .signal
            .prefers_dark()
            .map(ThemeMode::from_prefers_dark)
            .unwrap_or_default();
        self.target.apply(self.mode);
        info!(mode = %self.mode, "theme preference cleared");
        self.mode
    }

    async fn commit(&mut self, mode: ThemeMode) {
        self.mode = mode;
        self.store
            .set(&self.key, mode.as_ref())
            .await
            .log_err("failed to persist theme preference");
        self.target.apply(mode);
        info!(%mode, "theme changed");
    }
}

async fn read_persisted(store: &dyn PreferenceStore, key: &str) -> Option<ThemeMode> {
    let raw = store
        .get(key)
        .await
        .log_err("failed to read theme preference")
        .flatten()?;
    raw.parse()
        .inspect_err(|_| warn!(key, value = %raw, "ignoring unrecognized theme preference"))
        .ok()
}
