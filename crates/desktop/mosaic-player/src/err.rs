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

use std::path::PathBuf;

use snafu::Snafu;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Snafu, Debug)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("Session {id} is not in the current catalog"))]
    SelectionNotFound {
        id:  String,
        #[snafu(implicit)]
        loc: snafu::Location,
    },

    #[snafu(display("Slot {index} is out of range, the group has {len} slots"))]
    SlotOutOfRange {
        index: usize,
        len:   usize,
        #[snafu(implicit)]
        loc:   snafu::Location,
    },

    #[snafu(display("Invalid stream locator for {name} under {base}: {message}"))]
    InvalidLocator {
        base:    String,
        name:    String,
        message: String,
        #[snafu(implicit)]
        loc:     snafu::Location,
    },

    #[snafu(display("Invalid command `{input}`: {reason}"))]
    InvalidCommand {
        input:  String,
        reason: String,
        #[snafu(implicit)]
        loc:    snafu::Location,
    },

    #[snafu(display("Failed to read session catalog {}", path.display()))]
    CatalogIo {
        path:   PathBuf,
        source: std::io::Error,
        #[snafu(implicit)]
        loc:    snafu::Location,
    },

    #[snafu(display("Failed to decode session catalog {}", path.display()))]
    CatalogDecode {
        path:   PathBuf,
        source: serde_json::Error,
        #[snafu(implicit)]
        loc:    snafu::Location,
    },

    #[snafu(display("Session id {id} appears more than once in the catalog"))]
    DuplicateSession {
        id:  String,
        #[snafu(implicit)]
        loc: snafu::Location,
    },
}
