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

//! Session catalog sources.

use std::{collections::HashSet, path::Path};

use snafu::{ResultExt, ensure};

use crate::{
    err::{CatalogDecodeSnafu, CatalogIoSnafu, DuplicateSessionSnafu, Result},
    selection::Session,
};

/// Reads a JSON array of sessions.
///
/// ```json
/// [{"id": "1", "name": "Run 2025-10-08", "category": "Experiments", "path": "/bags/run1.bag"}]
/// ```
pub fn load_catalog(path: impl AsRef<Path>) -> Result<Vec<Session>> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).context(CatalogIoSnafu { path })?;
    let sessions: Vec<Session> =
        serde_json::from_str(&raw).context(CatalogDecodeSnafu { path })?;
    validate(&sessions)?;
    Ok(sessions)
}

/// Session ids must be unique within a catalog.
pub fn validate(sessions: &[Session]) -> Result<()> {
    let mut seen = HashSet::with_capacity(sessions.len());
    for session in sessions {
        ensure!(
            seen.insert(session.id.as_str()),
            DuplicateSessionSnafu { id: &session.id }
        );
    }
    Ok(())
}

/// Built-in sessions used when no catalog file is available.
pub fn demo_catalog() -> Vec<Session> {
    vec![
        Session::builder()
            .id("1")
            .name("Run 2025-10-08")
            .category("Experiments")
            .path("/bags/run1.bag")
            .build(),
        Session::builder()
            .id("2")
            .name("Run 2025-10-09")
            .category("Experiments")
            .path("/bags/run2.bag")
            .build(),
        Session::builder()
            .id("3")
            .name("Debug Session")
            .category("Tests")
            .path("/bags/debug.bag")
            .build(),
    ]
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::selection::UNCATEGORIZED;

    #[test]
    fn demo_catalog_groups_into_two_buckets() {
        let grouped = crate::selection::GroupedCatalog::from_sessions(&demo_catalog());
        assert_eq!(
            grouped.categories().collect::<Vec<_>>(),
            vec!["Experiments", "Tests"]
        );
    }

    #[test]
    fn load_from_file_with_missing_category() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(
            &path,
            r#"[{"id":"a","name":"Loose","path":"/bags/a.bag"},
                {"id":"b","name":"Tagged","category":"Tests","path":"/bags/b.bag"}]"#,
        )
        .unwrap();

        let sessions = load_catalog(&path).unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].category_or_default(), UNCATEGORIZED);
        assert_eq!(sessions[1].category.as_deref(), Some("Tests"));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(
            &path,
            r#"[{"id":"a","name":"One","path":"/1"},{"id":"a","name":"Two","path":"/2"}]"#,
        )
        .unwrap();

        let err = load_catalog(&path).unwrap_err();
        assert!(matches!(err, crate::Error::DuplicateSession { ref id, .. } if id == "a"));
    }

    #[test]
    fn malformed_and_missing_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            load_catalog(&path).unwrap_err(),
            crate::Error::CatalogDecode { .. }
        ));
        assert!(matches!(
            load_catalog(dir.path().join("absent.json")).unwrap_err(),
            crate::Error::CatalogIo { .. }
        ));
    }
}
