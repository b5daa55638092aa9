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

//! SCALE encoding of the checkpoint, as expected by the `force_checkpoint`
//! call of the on-chain beacon client.

use parity_scale_codec::{Compact, Encode, Output};

use crate::{BeaconHeader, CheckpointUpdate, Root, SyncCommittee};

/// Call index of `EthereumBeaconClient::force_checkpoint`.
pub const FORCE_CHECKPOINT_CALL_INDEX: [u8; 2] = [0x32, 0x00];

fn encode_branch<T: Output + ?Sized>(branch: &[Root], dest: &mut T) {
    Compact(branch.len() as u32).encode_to(dest);
    for node in branch {
        node.0.encode_to(dest);
    }
}

impl Encode for BeaconHeader {
    fn size_hint(&self) -> usize {
        2 * 8 + 3 * 32
    }

    fn encode_to<T: Output + ?Sized>(&self, dest: &mut T) {
        self.slot.encode_to(dest);
        self.proposer_index.encode_to(dest);
        self.parent_root.0.encode_to(dest);
        self.state_root.0.encode_to(dest);
        self.body_root.0.encode_to(dest);
    }
}

// The committee size is fixed by the runtime, so pubkeys encode as an array
// without a length prefix.
impl Encode for SyncCommittee {
    fn size_hint(&self) -> usize {
        (self.pubkeys.len() + 1) * crate::PUBKEY_SIZE
    }

    fn encode_to<T: Output + ?Sized>(&self, dest: &mut T) {
        for pubkey in &self.pubkeys {
            pubkey.0.encode_to(dest);
        }
        self.aggregate_pubkey.0.encode_to(dest);
    }
}

impl Encode for CheckpointUpdate {
    fn encode_to<T: Output + ?Sized>(&self, dest: &mut T) {
        self.header.encode_to(dest);
        self.current_sync_committee.encode_to(dest);
        encode_branch(&self.current_sync_committee_branch, dest);
        self.validators_root.0.encode_to(dest);
        self.block_roots_root.0.encode_to(dest);
        encode_branch(&self.block_roots_branch, dest);
    }
}

/// Encodes `checkpoint` as a `force_checkpoint` call and returns it as a
/// `0x`-prefixed hex string.
pub fn checkpoint_call_hex(call_index: [u8; 2], checkpoint: &CheckpointUpdate) -> String {
    let mut call = call_index.to_vec();
    checkpoint.encode_to(&mut call);
    format!("0x{}", alloy_primitives::hex::encode(call))
}
