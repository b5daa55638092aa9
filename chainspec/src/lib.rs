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

//! Resolve the timing constants of the supported beacon chain presets.

use std::{fmt, fs, path::Path, str::FromStr};

use serde::{Deserialize, Serialize};

pub type Slot = u64;
pub type Epoch = u64;
pub type SyncPeriod = u64;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("missing spec, valid values are mainnet or minimal")]
    MissingSpec,
    #[error("unknown spec {0:?}, valid values are mainnet or minimal")]
    UnknownSpec(String),
    #[error("{spec} setting {field} must be non-zero")]
    ZeroSetting { spec: ActiveSpec, field: &'static str },
    #[error("could not read spec config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse spec config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// The beacon chain preset a fixture run targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum ActiveSpec {
    Mainnet,
    Minimal,
}

impl ActiveSpec {
    pub fn is_mainnet(&self) -> bool {
        matches!(self, ActiveSpec::Mainnet)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActiveSpec::Mainnet => "mainnet",
            ActiveSpec::Minimal => "minimal",
        }
    }
}

impl fmt::Display for ActiveSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActiveSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mainnet" => Ok(ActiveSpec::Mainnet),
            "minimal" => Ok(ActiveSpec::Minimal),
            other => Err(Error::UnknownSpec(other.to_string())),
        }
    }
}

/// Timing constants of a preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecSettings {
    pub slots_in_epoch: u64,
    pub epochs_per_sync_committee_period: u64,
    /// Length of the `block_roots` vector in the beacon state.
    pub slots_per_historical_root: u64,
    pub seconds_per_slot: u64,
}

impl SpecSettings {
    pub const fn mainnet() -> Self {
        Self {
            slots_in_epoch: 32,
            epochs_per_sync_committee_period: 256,
            slots_per_historical_root: 8192,
            seconds_per_slot: 12,
        }
    }

    pub const fn minimal() -> Self {
        Self {
            slots_in_epoch: 8,
            epochs_per_sync_committee_period: 8,
            slots_per_historical_root: 64,
            seconds_per_slot: 6,
        }
    }

    pub const fn for_spec(spec: ActiveSpec) -> Self {
        match spec {
            ActiveSpec::Mainnet => Self::mainnet(),
            ActiveSpec::Minimal => Self::minimal(),
        }
    }

    #[inline]
    pub fn slots_per_sync_committee_period(&self) -> u64 {
        self.slots_in_epoch * self.epochs_per_sync_committee_period
    }

    #[inline]
    pub fn compute_sync_period_at_slot(&self, slot: Slot) -> SyncPeriod {
        slot / self.slots_per_sync_committee_period()
    }

    /// Index of `slot` in the `block_roots` vector of a beacon state.
    #[inline]
    pub fn block_roots_index(&self, slot: Slot) -> usize {
        (slot % self.slots_per_historical_root) as usize
    }

    fn validate(&self, spec: ActiveSpec) -> Result<(), Error> {
        let fields = [
            ("slots_in_epoch", self.slots_in_epoch),
            (
                "epochs_per_sync_committee_period",
                self.epochs_per_sync_committee_period,
            ),
            ("slots_per_historical_root", self.slots_per_historical_root),
            ("seconds_per_slot", self.seconds_per_slot),
        ];
        match fields.iter().find(|(_, value)| *value == 0) {
            Some((field, _)) => Err(Error::ZeroSetting { spec, field }),
            None => Ok(()),
        }
    }
}

/// Per-preset settings, optionally overridden from a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecConfig {
    #[serde(default = "SpecSettings::mainnet")]
    pub mainnet: SpecSettings,
    #[serde(default = "SpecSettings::minimal")]
    pub minimal: SpecSettings,
}

impl Default for SpecConfig {
    fn default() -> Self {
        Self {
            mainnet: SpecSettings::mainnet(),
            minimal: SpecSettings::minimal(),
        }
    }
}

impl SpecConfig {
    /// Parses a YAML document. JSON is accepted as well.
    pub fn from_yaml_str(s: &str) -> Result<Self, Error> {
        let config: SpecConfig = serde_yaml::from_str(s)?;
        config.mainnet.validate(ActiveSpec::Mainnet)?;
        config.minimal.validate(ActiveSpec::Minimal)?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&contents)
    }

    pub fn settings(&self, spec: ActiveSpec) -> SpecSettings {
        match spec {
            ActiveSpec::Mainnet => self.mainnet,
            ActiveSpec::Minimal => self.minimal,
        }
    }
}
