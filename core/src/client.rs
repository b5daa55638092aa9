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

use crate::{
    CheckpointUpdate, ExecutionHeaderUpdate, FinalizedUpdate, Proof, Slot, SyncPeriod, Update,
};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("beacon API request failed: {0}")]
    Request(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("unexpected beacon API response: {0}")]
    InvalidResponse(String),
    #[error("slot {slot} is older than the block roots of finalized slot {finalized_slot}")]
    SlotOutOfRange { slot: Slot, finalized_slot: Slot },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Source of the light client artifacts a fixture run is built from.
///
/// Calls are independent of each other; any ordering or consistency
/// requirement between their results is enforced by the caller.
pub trait ProtocolClient {
    /// Returns the bootstrap checkpoint at the latest finalized block.
    fn get_checkpoint(&self) -> Result<CheckpointUpdate, ClientError>;

    /// Returns the update that rotates the sync committee of `period`.
    fn get_sync_committee_period_update(&self, period: SyncPeriod)
    -> Result<Update, ClientError>;

    fn get_finalized_update(&self) -> Result<FinalizedUpdate, ClientError>;

    /// Returns the execution header update for the first block at or after
    /// `slot`, with an ancestry proof against `checkpoint`.
    fn get_header_update_with_ancestry_proof(
        &self,
        slot: Slot,
        checkpoint: &Proof,
    ) -> Result<ExecutionHeaderUpdate, ClientError>;

    fn compute_sync_period_at_slot(&self, slot: Slot) -> SyncPeriod;
}

impl<C: ProtocolClient + ?Sized> ProtocolClient for Box<C> {
    fn get_checkpoint(&self) -> Result<CheckpointUpdate, ClientError> {
        (**self).get_checkpoint()
    }

    fn get_sync_committee_period_update(
        &self,
        period: SyncPeriod,
    ) -> Result<Update, ClientError> {
        (**self).get_sync_committee_period_update(period)
    }

    fn get_finalized_update(&self) -> Result<FinalizedUpdate, ClientError> {
        (**self).get_finalized_update()
    }

    fn get_header_update_with_ancestry_proof(
        &self,
        slot: Slot,
        checkpoint: &Proof,
    ) -> Result<ExecutionHeaderUpdate, ClientError> {
        (**self).get_header_update_with_ancestry_proof(slot, checkpoint)
    }

    fn compute_sync_period_at_slot(&self, slot: Slot) -> SyncPeriod {
        (**self).compute_sync_period_at_slot(slot)
    }
}

pub type BoxedProtocolClient = Box<dyn ProtocolClient>;
