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

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use fixture_core::{
    ActiveSpec, ConsistencyError, FORCE_CHECKPOINT_CALL_INDEX, ProtocolClient, SpecSettings,
    checkpoint_call_hex, ensure_finalized_update_follows, ensure_no_period_drift,
};
use tracing::info;

use crate::{
    BenchmarkData, BenchmarkRenderer, Error, FixtureWriter, FixturesModuleRenderer, Stage,
};

pub const FIXTURE_DIR: &str = "parachain/pallets/ethereum-beacon-client/tests/fixtures";
pub const BENCHMARK_DIR: &str = "parachain/pallets/ethereum-beacon-client/src/benchmarking";
pub const BENCHMARK_FILENAME: &str = "fixtures.rs";

/// Slots the chain is allowed to advance between the checkpoint and the updates.
pub const DEFAULT_CHAIN_ADVANCE_SLOTS: u64 = 5;

pub const CHECKPOINT_FIXTURE: &str = "initial-checkpoint";
pub const CHECKPOINT_DUMP_FIXTURE: &str = "dump-initial-checkpoint";
pub const SYNC_COMMITTEE_UPDATE_FIXTURE: &str = "sync-committee-update";
pub const FINALIZED_HEADER_UPDATE_FIXTURE: &str = "finalized-header-update";
pub const EXECUTION_HEADER_UPDATE_FIXTURE: &str = "execution-header-update";

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub spec: ActiveSpec,
    pub settings: SpecSettings,
    pub fixture_dir: PathBuf,
    pub benchmark_dir: PathBuf,
    pub benchmark_filename: String,
    pub checkpoint_call_index: [u8; 2],
    pub chain_advance_slots: u64,
    /// Time to wait for the chain to produce `chain_advance_slots` new slots,
    /// `seconds_per_slot * chain_advance_slots` unless overridden.
    pub chain_advance_wait: Duration,
    pub emit_benchmark_artifacts: bool,
    pub export_checkpoint_json: bool,
}

impl PipelineConfig {
    /// Returns the default configuration with all paths relative to `project_root`.
    pub fn new(spec: ActiveSpec, settings: SpecSettings, project_root: impl AsRef<Path>) -> Self {
        let root = project_root.as_ref();
        Self {
            spec,
            settings,
            fixture_dir: root.join(FIXTURE_DIR),
            benchmark_dir: root.join(BENCHMARK_DIR),
            benchmark_filename: BENCHMARK_FILENAME.to_string(),
            checkpoint_call_index: FORCE_CHECKPOINT_CALL_INDEX,
            chain_advance_slots: DEFAULT_CHAIN_ADVANCE_SLOTS,
            chain_advance_wait: Duration::from_secs(
                settings.seconds_per_slot * DEFAULT_CHAIN_ADVANCE_SLOTS,
            ),
            emit_benchmark_artifacts: spec.is_mainnet(),
            export_checkpoint_json: true,
        }
    }

    pub fn with_chain_advance_wait(mut self, wait: Duration) -> Self {
        self.chain_advance_wait = wait;
        self
    }

    pub fn with_export_checkpoint_json(mut self, export: bool) -> Self {
        self.export_checkpoint_json = export;
        self
    }

    pub fn fixture_filename(&self, name: &str) -> String {
        format!("{name}.{}.json", self.spec)
    }
}

/// Paths written by a complete fixture run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFixtures {
    pub checkpoint: PathBuf,
    pub sync_committee_update: PathBuf,
    pub finalized_header_update: PathBuf,
    pub execution_header_update: PathBuf,
    pub benchmark: Option<PathBuf>,
}

/// Drives a [ProtocolClient] through the fixture generation workflows.
pub struct FixturePipeline<C, R = FixturesModuleRenderer> {
    client: C,
    renderer: R,
    config: PipelineConfig,
    fixtures: FixtureWriter,
    benchmarks: FixtureWriter,
}

impl<C: ProtocolClient> FixturePipeline<C> {
    pub fn new(client: C, config: PipelineConfig) -> Self {
        Self::with_renderer(client, FixturesModuleRenderer, config)
    }
}

impl<C: ProtocolClient, R: BenchmarkRenderer> FixturePipeline<C, R> {
    pub fn with_renderer(client: C, renderer: R, config: PipelineConfig) -> Self {
        Self {
            client,
            renderer,
            fixtures: FixtureWriter::new(&config.fixture_dir),
            benchmarks: FixtureWriter::new(&config.benchmark_dir),
            config,
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Fetches the current checkpoint and returns it encoded as a
    /// `force_checkpoint` call.
    #[tracing::instrument(skip(self), fields(spec = %self.config.spec))]
    pub fn generate_checkpoint(&self) -> Result<String, Error> {
        let checkpoint = self
            .client
            .get_checkpoint()
            .map_err(Stage::Checkpoint.failed())?;
        info!(slot = checkpoint.slot(), "Fetched initial checkpoint");

        if self.config.export_checkpoint_json {
            let path = self.fixtures.write(
                &checkpoint,
                &self.config.fixture_filename(CHECKPOINT_DUMP_FIXTURE),
            )?;
            info!(path = %path.display(), "Exported checkpoint");
        }

        Ok(checkpoint_call_hex(
            self.config.checkpoint_call_index,
            &checkpoint,
        ))
    }

    /// Produces the full fixture set: checkpoint, sync committee update,
    /// finalized header update and execution header update, plus the
    /// benchmark module when enabled.
    #[tracing::instrument(skip(self), fields(spec = %self.config.spec))]
    pub fn generate_beacon_data(&self) -> Result<GeneratedFixtures, Error> {
        let settings = &self.config.settings;

        let checkpoint = self
            .client
            .get_checkpoint()
            .map_err(Stage::Checkpoint.failed())?;
        let checkpoint_slot = checkpoint.slot();
        let checkpoint_path = self.fixtures.write(
            &checkpoint,
            &self.config.fixture_filename(CHECKPOINT_FIXTURE),
        )?;
        let initial_period = self.client.compute_sync_period_at_slot(checkpoint_slot);
        info!(
            slot = checkpoint_slot,
            period = initial_period,
            "Created initial checkpoint"
        );

        self.wait_for_chain();

        let next_slot = checkpoint_slot + self.config.chain_advance_slots;
        ensure_no_period_drift(checkpoint_slot, next_slot, settings)?;
        let next_period = self.client.compute_sync_period_at_slot(next_slot);

        let sync_committee_update = self
            .client
            .get_sync_committee_period_update(next_period)
            .map_err(Stage::SyncCommitteeUpdate.failed())?;
        let sync_committee_update_path = self.fixtures.write(
            &sync_committee_update,
            &self.config.fixture_filename(SYNC_COMMITTEE_UPDATE_FIXTURE),
        )?;
        info!(period = next_period, "Created sync committee update");

        let finalized_update = self
            .client
            .get_finalized_update()
            .map_err(Stage::FinalizedHeaderUpdate.failed())?;
        let finalized_update_path = self.fixtures.write(
            &finalized_update.payload,
            &self.config.fixture_filename(FINALIZED_HEADER_UPDATE_FIXTURE),
        )?;
        info!(
            attested_slot = finalized_update.payload.attested_header.slot,
            finalized_slot = finalized_update.payload.finalized_header.slot,
            signature_slot = finalized_update.payload.signature_slot,
            "Created finalized header update"
        );

        ensure_finalized_update_follows(checkpoint_slot, &finalized_update.payload, settings)?;

        let header_slot = finalized_update.header_update_slot().ok_or(
            ConsistencyError::FinalizedSlotTooLow(finalized_update.payload.finalized_header.slot),
        )?;
        let header_update = self
            .client
            .get_header_update_with_ancestry_proof(header_slot, &finalized_update.proof())
            .map_err(Stage::HeaderUpdate.failed())?;
        let header_update_path = self.fixtures.write(
            &header_update,
            &self.config.fixture_filename(EXECUTION_HEADER_UPDATE_FIXTURE),
        )?;
        info!(
            slot = header_update.header.slot,
            target_slot = header_slot,
            "Created execution header update"
        );

        let benchmark = if self.config.emit_benchmark_artifacts {
            let data = BenchmarkData::new(
                &checkpoint,
                &sync_committee_update,
                &finalized_update.payload,
                &header_update,
            )?;
            let module = self.renderer.render(&data)?;
            let path = self
                .benchmarks
                .write_str(&module, &self.config.benchmark_filename)?;
            info!(path = %path.display(), "Rendered benchmark fixtures");
            Some(path)
        } else {
            None
        };

        Ok(GeneratedFixtures {
            checkpoint: checkpoint_path,
            sync_committee_update: sync_committee_update_path,
            finalized_header_update: finalized_update_path,
            execution_header_update: header_update_path,
            benchmark,
        })
    }

    fn wait_for_chain(&self) {
        let wait = self.config.chain_advance_wait;
        if wait.is_zero() {
            return;
        }
        info!(
            seconds = wait.as_secs(),
            slots = self.config.chain_advance_slots,
            "Waiting for the chain to advance"
        );
        std::thread::sleep(wait);
    }
}
