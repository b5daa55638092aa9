// Copyright 2025 RISC Zero, Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::{fs::OpenOptions, io::Write, path::PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::Error;

/// Writes artifacts as pretty-printed JSON into a fixed directory.
///
/// Existing files are truncated. The directory itself is never created.
#[derive(Debug, Clone)]
pub struct FixtureWriter {
    directory: PathBuf,
}

impl FixtureWriter {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Serializes `artifact` and writes it to `filename`, returning the full path.
    pub fn write<T: Serialize>(&self, artifact: &T, filename: &str) -> Result<PathBuf, Error> {
        let json = serde_json::to_string_pretty(artifact)?;
        self.write_str(&json, filename)
    }

    pub fn write_str(&self, contents: &str, filename: &str) -> Result<PathBuf, Error> {
        let path = self.directory.join(filename);
        let io_err = |source| Error::Io {
            path: path.clone(),
            source,
        };

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .map_err(io_err)?;
        file.write_all(contents.as_bytes()).map_err(io_err)?;

        debug!(path = %path.display(), bytes = contents.len(), "Wrote fixture");
        Ok(path)
    }
}
