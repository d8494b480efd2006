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

//! Session catalog and the single active selection.

use serde::{Deserialize, Serialize};
use snafu::OptionExt;
use tracing::info;

use crate::err::{Result, SelectionNotFoundSnafu};

/// Bucket for sessions without a category.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// A recorded data session ("rosbag").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, bon::Builder)]
#[builder(on(String, into))]
pub struct Session {
    pub id:       String,
    pub name:     String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Where the recording lives, a filesystem path or URL.
    pub path:     String,
}

impl Session {
    /// The bucket this session is listed under.
    pub fn category_or_default(&self) -> &str {
        self.category.as_deref().unwrap_or(UNCATEGORIZED)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryGroup {
    pub category: String,
    pub sessions: Vec<Session>,
}

/// Sessions bucketed by category.
///
/// Buckets appear in first-seen order and keep the catalog order inside.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupedCatalog {
    groups: Vec<CategoryGroup>,
}

impl GroupedCatalog {
    pub fn from_sessions<'a>(sessions: impl IntoIterator<Item = &'a Session>) -> Self {
        let mut groups: Vec<CategoryGroup> = Vec::new();
        for session in sessions {
            let category = session.category_or_default();
            match groups.iter_mut().find(|g| g.category == category) {
                Some(group) => group.sessions.push(session.clone()),
                None => groups.push(CategoryGroup {
                    category: category.to_owned(),
                    sessions: vec![session.clone()],
                }),
            }
        }
        Self { groups }
    }

    pub fn groups(&self) -> &[CategoryGroup] { &self.groups }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|g| g.category.as_str())
    }

    pub fn get(&self, category: &str) -> Option<&[Session]> {
        self.groups
            .iter()
            .find(|g| g.category == category)
            .map(|g| g.sessions.as_slice())
    }

    pub fn is_empty(&self) -> bool { self.groups.is_empty() }
}

pub type SelectionSubscriber = Box<dyn FnMut(&Session) + Send>;

/// Holds the catalog and at most one selected session.
///
/// Replacing the catalog leaves the selected id untouched even when it no
/// longer resolves; [`Self::selected_session`] re-validates on every read.
#[derive(Default)]
pub struct RosbagSelectionModel {
    catalog:     Vec<Session>,
    selected_id: Option<String>,
    subscribers: Vec<SelectionSubscriber>,
}

impl std::fmt::Debug for RosbagSelectionModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RosbagSelectionModel")
            .field("catalog", &self.catalog)
            .field("selected_id", &self.selected_id)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl RosbagSelectionModel {
    pub fn new(catalog: Vec<Session>) -> Self {
        Self {
            catalog,
            ..Self::default()
        }
    }

    pub fn catalog(&self) -> &[Session] { &self.catalog }

    /// Replaces the catalog wholesale. The current selection is kept as is.
    pub fn set_catalog(&mut self, sessions: Vec<Session>) {
        info!(sessions = sessions.len(), "catalog replaced");
        self.catalog = sessions;
    }

    /// Registers a callback invoked with the full session on every
    /// successful [`Self::select`], in subscription order.
    pub fn subscribe(&mut self, subscriber: impl FnMut(&Session) + Send + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    /// Selects `id` and notifies subscribers before returning.
    ///
    /// Fails with `SelectionNotFound` and leaves the selection unchanged if
    /// `id` is not in the current catalog.
    pub fn select(&mut self, id: &str) -> Result<&Session> {
        let position = self
            .catalog
            .iter()
            .position(|s| s.id == id)
            .context(SelectionNotFoundSnafu { id })?;

        self.selected_id = Some(id.to_owned());
        let session = &self.catalog[position];
        info!(id, name = %session.name, "session selected");
        for subscriber in &mut self.subscribers {
            subscriber(session);
        }
        Ok(session)
    }

    /// The raw selected id, which may be stale after a catalog change.
    pub fn selected_id(&self) -> Option<&str> { self.selected_id.as_deref() }

    /// The selected session, if the id still resolves in the catalog.
    pub fn selected_session(&self) -> Option<&Session> {
        let id = self.selected_id.as_deref()?;
        self.catalog.iter().find(|s| s.id == id)
    }

    pub fn is_selected(&self, id: &str) -> bool { self.selected_id.as_deref() == Some(id) }

    /// Recomputed from the catalog on every call.
    pub fn grouped_view(&self) -> GroupedCatalog { GroupedCatalog::from_sessions(&self.catalog) }
}
