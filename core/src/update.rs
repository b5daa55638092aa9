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

use alloy_primitives::{Address, Bytes};
use serde::{Deserialize, Serialize};

use crate::{BeaconHeader, Root, Slot, SyncAggregate, SyncCommittee};

/// Number of slots between the finalized header and the header used for the
/// execution header update fixture.
pub const HEADER_UPDATE_SLOT_OFFSET: u64 = 2;

/// Light client bootstrap state that anchors all subsequent updates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointUpdate {
    pub header: BeaconHeader,
    pub current_sync_committee: SyncCommittee,
    pub current_sync_committee_branch: Vec<Root>,
    pub validators_root: Root,
    pub block_roots_root: Root,
    pub block_roots_branch: Vec<Root>,
}

impl CheckpointUpdate {
    #[inline]
    pub fn slot(&self) -> Slot {
        self.header.slot
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextSyncCommitteeUpdate {
    pub next_sync_committee: SyncCommittee,
    pub next_sync_committee_branch: Vec<Root>,
}

/// A light client update. Carries a next sync committee when it rotates the
/// committee, otherwise it only advances the finalized header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Update {
    pub attested_header: BeaconHeader,
    pub sync_aggregate: SyncAggregate,
    pub signature_slot: Slot,
    pub next_sync_committee_update: Option<NextSyncCommitteeUpdate>,
    pub finalized_header: BeaconHeader,
    pub finality_branch: Vec<Root>,
    pub block_roots_root: Root,
    pub block_roots_branch: Vec<Root>,
}

/// A finality update together with the data needed to prove ancestry of
/// earlier headers against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedUpdate {
    pub payload: Update,
    pub finalized_header_block_root: Root,
    /// The `block_roots` vector of the finalized state.
    pub block_roots: Vec<Root>,
}

impl FinalizedUpdate {
    /// Builds the ancestry context for header updates below this finalized header.
    pub fn proof(&self) -> Proof {
        Proof {
            finalized_block_root: self.finalized_header_block_root,
            block_roots: self.block_roots.clone(),
            slot: self.payload.finalized_header.slot,
        }
    }

    /// Slot of the header proven by the execution header update, or `None`
    /// when the finalized header is too close to genesis.
    pub fn header_update_slot(&self) -> Option<Slot> {
        self.payload
            .finalized_header
            .slot
            .checked_sub(HEADER_UPDATE_SLOT_OFFSET)
    }
}

/// Finalized block against which an ancestry proof is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proof {
    pub finalized_block_root: Root,
    pub block_roots: Vec<Root>,
    pub slot: Slot,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AncestryProof {
    pub header_branch: Vec<Root>,
    pub finalized_block_root: Root,
}

/// Deneb execution payload header, unchanged in Electra.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionPayloadHeader {
    pub parent_hash: Root,
    pub fee_recipient: Address,
    pub state_root: Root,
    pub receipts_root: Root,
    pub logs_bloom: Bytes,
    pub prev_randao: Root,
    pub block_number: u64,
    pub gas_limit: u64,
    pub gas_used: u64,
    pub timestamp: u64,
    pub extra_data: Bytes,
    pub base_fee_per_gas: u64,
    pub block_hash: Root,
    pub transactions_root: Root,
    pub withdrawals_root: Root,
    pub blob_gas_used: u64,
    pub excess_blob_gas: u64,
}

/// A beacon header, its execution payload header and the proofs that link
/// them to a finalized block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionHeaderUpdate {
    pub header: BeaconHeader,
    pub ancestry_proof: Option<AncestryProof>,
    pub execution_header: ExecutionPayloadHeader,
    pub execution_branch: Vec<Root>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::B256;

    fn finalized_at(slot: Slot) -> FinalizedUpdate {
        FinalizedUpdate {
            payload: Update {
                finalized_header: BeaconHeader {
                    slot,
                    ..Default::default()
                },
                ..Default::default()
            },
            finalized_header_block_root: B256::repeat_byte(0xbe),
            block_roots: vec![B256::repeat_byte(1); 8],
        }
    }

    #[test]
    fn header_update_slot_is_two_below_finalized() {
        assert_eq!(finalized_at(1000).header_update_slot(), Some(998));
        assert_eq!(finalized_at(2).header_update_slot(), Some(0));
        assert_eq!(finalized_at(1).header_update_slot(), None);
    }

    #[test]
    fn proof_takes_finalized_context() {
        let update = finalized_at(168);
        let proof = update.proof();
        assert_eq!(proof.slot, 168);
        assert_eq!(proof.finalized_block_root, B256::repeat_byte(0xbe));
        assert_eq!(proof.block_roots, update.block_roots);
    }

    #[test]
    fn update_json_round_trip() {
        let update = Update {
            attested_header: BeaconHeader {
                slot: 184,
                proposer_index: 5,
                parent_root: B256::repeat_byte(0x13),
                state_root: B256::repeat_byte(0xcb),
                body_root: B256::repeat_byte(0xc9),
            },
            sync_aggregate: SyncAggregate {
                sync_committee_bits: Bytes::from(vec![0xff; 4]),
                sync_committee_signature: Default::default(),
            },
            signature_slot: 185,
            next_sync_committee_update: Some(NextSyncCommitteeUpdate {
                next_sync_committee: SyncCommittee {
                    pubkeys: vec![Default::default(); 2],
                    aggregate_pubkey: Default::default(),
                },
                next_sync_committee_branch: vec![B256::repeat_byte(7); 5],
            }),
            finalized_header: BeaconHeader {
                slot: 168,
                ..Default::default()
            },
            finality_branch: vec![B256::repeat_byte(0x15); 6],
            block_roots_root: B256::repeat_byte(0xdf),
            block_roots_branch: vec![B256::repeat_byte(0x8f); 5],
        };
        let json = serde_json::to_string_pretty(&update).unwrap();
        let decoded: Update = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, update);
    }

    #[test]
    fn missing_ancestry_proof_serializes_as_null() {
        let update = ExecutionHeaderUpdate::default();
        let json = serde_json::to_value(&update).unwrap();
        assert!(json["ancestry_proof"].is_null());
        assert_eq!(json["execution_header"]["base_fee_per_gas"], 0);
    }
}
