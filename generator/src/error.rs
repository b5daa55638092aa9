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

use std::{fmt, io, path::PathBuf};

use fixture_core::{ClientError, ConsistencyError};

use crate::{beacon_client, renderer::RenderError};

/// The artifact a protocol client call was producing when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Checkpoint,
    SyncCommitteeUpdate,
    FinalizedHeaderUpdate,
    HeaderUpdate,
}

impl Stage {
    /// Returns a closure wrapping a client error into an [Error] tagged with this stage.
    pub(crate) fn failed(self) -> impl FnOnce(ClientError) -> Error {
        move |source| Error::Client {
            stage: self,
            source,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Checkpoint => write!(f, "initial checkpoint"),
            Stage::SyncCommitteeUpdate => write!(f, "sync committee update"),
            Stage::FinalizedHeaderUpdate => write!(f, "finalized header update"),
            Stage::HeaderUpdate => write!(f, "header update"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(#[from] chainspec::Error),
    #[error("invalid beacon endpoint: {0}")]
    Endpoint(#[source] beacon_client::Error),
    #[error("get {stage}: {source}")]
    Client {
        stage: Stage,
        #[source]
        source: ClientError,
    },
    #[error(transparent)]
    Consistency(#[from] ConsistencyError),
    #[error("write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("encode fixture: {0}")]
    Encoding(#[from] serde_json::Error),
    #[error("render benchmark fixtures: {0}")]
    Render(#[from] RenderError),
}

impl Error {
    /// Returns the stage of a failed client call, if that is what went wrong.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Error::Client { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}
