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

//! [ProtocolClient] backed by the standard beacon node REST API.

use std::{future::Future, marker::PhantomData, ops::RangeInclusive};

use alloy_primitives::{Address, Bytes};
use ethereum_consensus::serde::as_str;
use fixture_core::{
    ActiveSpec, AncestryProof, BeaconHeader, BoxedProtocolClient, CheckpointUpdate, ClientError,
    ExecutionHeaderUpdate, ExecutionPayloadHeader, FinalizedUpdate, NextSyncCommitteeUpdate, Proof,
    ProtocolClient, Root, Slot, SpecSettings, SyncPeriod, Update,
};
use serde::Deserialize;
use ssz_rs::prelude::PathElement;
use tokio::runtime::Handle;
use tracing::{debug, info};

use crate::{
    beacon_client::{self, BeaconClient, LightClientHeader},
    preset::{
        ConsensusPreset, FieldProof, Mainnet, Minimal, ProofError, block_root, block_roots_vector,
        prove_fields,
    },
};

impl From<beacon_client::Error> for ClientError {
    fn from(err: beacon_client::Error) -> Self {
        match err {
            beacon_client::Error::NotFound(path) => ClientError::NotFound(path),
            beacon_client::Error::Json(err) => ClientError::InvalidResponse(err.to_string()),
            err => ClientError::Request(err.to_string()),
        }
    }
}

impl From<ProofError> for ClientError {
    fn from(err: ProofError) -> Self {
        ClientError::InvalidResponse(err.to_string())
    }
}

fn decode<'a, T: Deserialize<'a>>(what: &str, bytes: &'a [u8]) -> Result<T, ClientError> {
    serde_json::from_slice(bytes)
        .map_err(|err| ClientError::InvalidResponse(format!("{what}: {err}")))
}

/// `data` member of a beacon API response.
#[derive(Deserialize)]
struct Data<T> {
    data: T,
}

#[derive(Deserialize)]
struct SignedBlock<B> {
    message: BlockMessage<B>,
}

#[derive(Deserialize)]
struct BlockMessage<B> {
    body: B,
}

#[derive(Deserialize)]
struct PayloadBody {
    execution_payload: ExecutionPayload,
}

/// Scalar fields of an Electra execution payload.
#[derive(Deserialize)]
struct ExecutionPayload {
    parent_hash: Root,
    fee_recipient: Address,
    state_root: Root,
    receipts_root: Root,
    logs_bloom: Bytes,
    prev_randao: Root,
    #[serde(with = "as_str")]
    block_number: u64,
    #[serde(with = "as_str")]
    gas_limit: u64,
    #[serde(with = "as_str")]
    gas_used: u64,
    #[serde(with = "as_str")]
    timestamp: u64,
    extra_data: Bytes,
    #[serde(with = "as_str")]
    base_fee_per_gas: u64,
    block_hash: Root,
    #[serde(with = "as_str")]
    blob_gas_used: u64,
    #[serde(with = "as_str")]
    excess_blob_gas: u64,
}

impl ExecutionPayload {
    fn into_header(
        self,
        transactions_root: Root,
        withdrawals_root: Root,
    ) -> ExecutionPayloadHeader {
        ExecutionPayloadHeader {
            parent_hash: self.parent_hash,
            fee_recipient: self.fee_recipient,
            state_root: self.state_root,
            receipts_root: self.receipts_root,
            logs_bloom: self.logs_bloom,
            prev_randao: self.prev_randao,
            block_number: self.block_number,
            gas_limit: self.gas_limit,
            gas_used: self.gas_used,
            timestamp: self.timestamp,
            extra_data: self.extra_data,
            base_fee_per_gas: self.base_fee_per_gas,
            block_hash: self.block_hash,
            transactions_root,
            withdrawals_root,
            blob_gas_used: self.blob_gas_used,
            excess_blob_gas: self.excess_blob_gas,
        }
    }
}

/// The block roots of a state and the proof of their root inside it.
struct BlockRootsProof {
    block_roots: Vec<Root>,
    root: Root,
    branch: Vec<Root>,
}

fn beacon_header(header: LightClientHeader) -> BeaconHeader {
    header.beacon.into()
}

/// Returns what `fetch` finds at the first non-empty slot of `slots`.
async fn first_present<T, F, Fut>(
    slots: RangeInclusive<Slot>,
    mut fetch: F,
) -> Result<Option<T>, beacon_client::Error>
where
    F: FnMut(Slot) -> Fut,
    Fut: Future<Output = Result<T, beacon_client::Error>>,
{
    for slot in slots {
        match fetch(slot).await {
            Ok(found) => return Ok(Some(found)),
            Err(beacon_client::Error::NotFound(_)) => debug!(slot, "Empty slot"),
            Err(err) => return Err(err),
        }
    }
    Ok(None)
}

/// Proves that `block_root`, the root of the block at `slot`, is one of the
/// block roots of `checkpoint`. There is nothing to prove for the finalized
/// block itself.
fn ancestry_proof<P: ConsensusPreset>(
    settings: &SpecSettings,
    slot: Slot,
    block_root: Root,
    checkpoint: &Proof,
) -> Result<Option<AncestryProof>, ClientError> {
    if slot == checkpoint.slot {
        return Ok(None);
    }

    let index = settings.block_roots_index(slot);
    if checkpoint.block_roots.get(index) != Some(&block_root) {
        return Err(ClientError::InvalidResponse(format!(
            "block at slot {slot} is not an ancestor of finalized slot {}",
            checkpoint.slot
        )));
    }

    let block_roots = block_roots_vector::<P>(&checkpoint.block_roots)?;
    let path: &[PathElement] = &[index.into()];
    let FieldProof { branch, .. } = prove_fields(&block_roots, &[path])?.remove(0);
    Ok(Some(AncestryProof {
        header_branch: branch,
        finalized_block_root: checkpoint.finalized_block_root,
    }))
}

/// Protocol client for preset `P`.
///
/// Must be called from within a multi-threaded tokio runtime.
pub struct BeaconApiProtocolClient<P> {
    client: BeaconClient,
    settings: SpecSettings,
    _preset: PhantomData<P>,
}

impl<P: ConsensusPreset> BeaconApiProtocolClient<P> {
    pub fn new(client: BeaconClient, settings: SpecSettings) -> Self {
        Self {
            client,
            settings,
            _preset: PhantomData,
        }
    }

    fn block_on<F: Future>(&self, f: F) -> F::Output {
        tokio::task::block_in_place(|| Handle::current().block_on(f))
    }

    #[tracing::instrument(skip(self))]
    async fn block_roots_at(&self, slot: Slot) -> Result<BlockRootsProof, ClientError> {
        let bytes = self.client.get_beacon_state_json(slot).await?;
        let state: Data<P::BeaconState> = decode("beacon state", &bytes)?;
        drop(bytes);

        let path: &[PathElement] = &["block_roots".into()];
        let FieldProof { leaf, branch } = prove_fields(&state.data, &[path])?.remove(0);
        debug!(root = %leaf, depth = branch.len(), "Proved block roots");
        Ok(BlockRootsProof {
            block_roots: P::block_roots(&state.data),
            root: leaf,
            branch,
        })
    }

    async fn checkpoint(&self) -> Result<CheckpointUpdate, ClientError> {
        let checkpoints = self.client.get_finality_checkpoints("head").await?;
        let bootstrap = self
            .client
            .get_light_client_bootstrap(checkpoints.finalized.root)
            .await?;
        let genesis = self.client.get_genesis().await?;

        let header = beacon_header(bootstrap.header);
        let block_roots = self.block_roots_at(header.slot).await?;
        info!(
            epoch = checkpoints.finalized.epoch,
            slot = header.slot,
            "Fetched bootstrap"
        );

        Ok(CheckpointUpdate {
            header,
            current_sync_committee: bootstrap.current_sync_committee,
            current_sync_committee_branch: bootstrap.current_sync_committee_branch,
            validators_root: genesis.genesis_validators_root,
            block_roots_root: block_roots.root,
            block_roots_branch: block_roots.branch,
        })
    }

    async fn sync_committee_period_update(
        &self,
        period: SyncPeriod,
    ) -> Result<Update, ClientError> {
        let update = self
            .client
            .get_light_client_updates(period, 1)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                ClientError::NotFound(format!("light client update for period {period}"))
            })?;

        let finalized_header = beacon_header(update.finalized_header);
        let block_roots = self.block_roots_at(finalized_header.slot).await?;

        Ok(Update {
            attested_header: beacon_header(update.attested_header),
            sync_aggregate: update.sync_aggregate,
            signature_slot: update.signature_slot,
            next_sync_committee_update: Some(NextSyncCommitteeUpdate {
                next_sync_committee: update.next_sync_committee,
                next_sync_committee_branch: update.next_sync_committee_branch,
            }),
            finalized_header,
            finality_branch: update.finality_branch,
            block_roots_root: block_roots.root,
            block_roots_branch: block_roots.branch,
        })
    }

    async fn finalized_update(&self) -> Result<FinalizedUpdate, ClientError> {
        let update = self.client.get_light_client_finality_update().await?;

        let finalized_header = beacon_header(update.finalized_header);
        let block_roots = self.block_roots_at(finalized_header.slot).await?;

        Ok(FinalizedUpdate {
            finalized_header_block_root: block_root(&finalized_header)?,
            payload: Update {
                attested_header: beacon_header(update.attested_header),
                sync_aggregate: update.sync_aggregate,
                signature_slot: update.signature_slot,
                next_sync_committee_update: None,
                finalized_header,
                finality_branch: update.finality_branch,
                block_roots_root: block_roots.root,
                block_roots_branch: block_roots.branch,
            },
            block_roots: block_roots.block_roots,
        })
    }

    /// Returns the first header at or after `slot`, skipping empty slots for
    /// at most one epoch and never past `max_slot`.
    async fn first_header_from(
        &self,
        slot: Slot,
        max_slot: Slot,
    ) -> Result<BeaconHeader, ClientError> {
        let last = max_slot.min(slot + self.settings.slots_in_epoch);
        first_present(slot..=last, |candidate| self.client.get_block_header(candidate))
            .await?
            .map(|response| response.header.message.into())
            .ok_or_else(|| ClientError::NotFound(format!("block header in slots {slot}..={last}")))
    }

    async fn header_update(
        &self,
        slot: Slot,
        checkpoint: &Proof,
    ) -> Result<ExecutionHeaderUpdate, ClientError> {
        let slots_per_historical_root = self.settings.slots_per_historical_root;
        if slot > checkpoint.slot || checkpoint.slot - slot >= slots_per_historical_root {
            return Err(ClientError::SlotOutOfRange {
                slot,
                finalized_slot: checkpoint.slot,
            });
        }

        let header = self.first_header_from(slot, checkpoint.slot).await?;
        let ancestry_proof =
            ancestry_proof::<P>(&self.settings, header.slot, block_root(&header)?, checkpoint)?;

        let bytes = self.client.get_block_json(header.slot).await?;
        let body: Data<SignedBlock<P::BeaconBlockBody>> = decode("beacon block", &bytes)?;
        let payload: Data<SignedBlock<PayloadBody>> = decode("execution payload", &bytes)?;
        drop(bytes);

        let execution_payload: &[PathElement] = &["execution_payload".into()];
        let transactions: &[PathElement] = &["execution_payload".into(), "transactions".into()];
        let withdrawals: &[PathElement] = &["execution_payload".into(), "withdrawals".into()];
        let proofs = prove_fields(
            &body.data.message.body,
            &[execution_payload, transactions, withdrawals],
        )?;
        let [execution, transactions, withdrawals]: [FieldProof; 3] = proofs
            .try_into()
            .map_err(|_| ClientError::InvalidResponse("missing execution payload proofs".into()))?;

        Ok(ExecutionHeaderUpdate {
            header,
            ancestry_proof,
            execution_header: payload
                .data
                .message
                .body
                .execution_payload
                .into_header(transactions.leaf, withdrawals.leaf),
            execution_branch: execution.branch,
        })
    }
}

impl<P: ConsensusPreset> ProtocolClient for BeaconApiProtocolClient<P> {
    fn get_checkpoint(&self) -> Result<CheckpointUpdate, ClientError> {
        self.block_on(self.checkpoint())
    }

    fn get_sync_committee_period_update(
        &self,
        period: SyncPeriod,
    ) -> Result<Update, ClientError> {
        self.block_on(self.sync_committee_period_update(period))
    }

    fn get_finalized_update(&self) -> Result<FinalizedUpdate, ClientError> {
        self.block_on(self.finalized_update())
    }

    fn get_header_update_with_ancestry_proof(
        &self,
        slot: Slot,
        checkpoint: &Proof,
    ) -> Result<ExecutionHeaderUpdate, ClientError> {
        self.block_on(self.header_update(slot, checkpoint))
    }

    fn compute_sync_period_at_slot(&self, slot: Slot) -> SyncPeriod {
        self.settings.compute_sync_period_at_slot(slot)
    }
}

/// Creates the beacon API protocol client matching `spec`.
pub fn protocol_client(
    spec: ActiveSpec,
    endpoint: &str,
    settings: SpecSettings,
) -> Result<BoxedProtocolClient, beacon_client::Error> {
    let client = BeaconClient::new(endpoint)?;
    Ok(match spec {
        ActiveSpec::Mainnet => Box::new(BeaconApiProtocolClient::<Mainnet>::new(client, settings)),
        ActiveSpec::Minimal => Box::new(BeaconApiProtocolClient::<Minimal>::new(client, settings)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sha2::{Digest, Sha256};
    use ssz_rs::prelude::HashTreeRoot;

    #[test]
    fn decodes_execution_payload_fields() {
        let root = format!("0x{}", "11".repeat(32));
        let json = serde_json::json!({
            "data": {
                "message": {
                    "slot": "166",
                    "body": {
                        "execution_payload": {
                            "parent_hash": root,
                            "fee_recipient": format!("0x{}", "00".repeat(20)),
                            "state_root": root,
                            "receipts_root": root,
                            "logs_bloom": format!("0x{}", "00".repeat(256)),
                            "prev_randao": root,
                            "block_number": "166",
                            "gas_limit": "68022694",
                            "gas_used": "0",
                            "timestamp": "1704700423",
                            "extra_data": "0xd983010d05",
                            "base_fee_per_gas": "7",
                            "block_hash": root,
                            "transactions": [],
                            "withdrawals": [],
                            "blob_gas_used": "0",
                            "excess_blob_gas": "0"
                        }
                    }
                }
            }
        });
        let bytes = serde_json::to_vec(&json).unwrap();
        let block: Data<SignedBlock<PayloadBody>> = decode("block", &bytes).unwrap();
        let header = block
            .data
            .message
            .body
            .execution_payload
            .into_header(Root::repeat_byte(0x7f), Root::repeat_byte(0x28));
        assert_eq!(header.block_number, 166);
        assert_eq!(header.gas_limit, 68022694);
        assert_eq!(header.base_fee_per_gas, 7);
        assert_eq!(header.logs_bloom.len(), 256);
        assert_eq!(header.transactions_root, Root::repeat_byte(0x7f));
        assert_eq!(header.withdrawals_root, Root::repeat_byte(0x28));
    }

    #[test]
    fn malformed_responses_are_invalid() {
        let err = decode::<Data<PayloadBody>>("block", b"{\"data\": {}}").unwrap_err();
        assert!(matches!(err, ClientError::InvalidResponse(msg) if msg.starts_with("block:")));
    }

    #[test]
    fn not_found_maps_through() {
        let err: ClientError =
            beacon_client::Error::NotFound("eth/v1/beacon/headers/7".into()).into();
        assert!(matches!(err, ClientError::NotFound(_)));
    }

    fn branch_root(leaf: Root, branch: &[Root], index: usize) -> Root {
        branch
            .iter()
            .enumerate()
            .fold(leaf, |node, (depth, sibling)| {
                let (left, right) = if (index >> depth) & 1 == 1 {
                    (sibling, &node)
                } else {
                    (&node, sibling)
                };
                Root::from_slice(&Sha256::new().chain_update(left).chain_update(right).finalize())
            })
    }

    fn finalized_at(slot: Slot) -> Proof {
        Proof {
            finalized_block_root: Root::repeat_byte(0xbe),
            block_roots: (0..64u8).map(Root::repeat_byte).collect(),
            slot,
        }
    }

    #[test]
    fn finalized_header_needs_no_ancestry() {
        let settings = SpecSettings::minimal();
        let proof = ancestry_proof::<Minimal>(&settings, 168, Root::ZERO, &finalized_at(168));
        assert_eq!(proof.unwrap(), None);
    }

    #[test]
    fn ancestry_branch_proves_block_root() {
        let settings = SpecSettings::minimal();
        let checkpoint = finalized_at(168);
        let block_root = Root::repeat_byte(38);

        let proof = ancestry_proof::<Minimal>(&settings, 166, block_root, &checkpoint)
            .unwrap()
            .unwrap();
        assert_eq!(proof.finalized_block_root, Root::repeat_byte(0xbe));
        assert_eq!(proof.header_branch.len(), 6);

        let block_roots = block_roots_vector::<Minimal>(&checkpoint.block_roots).unwrap();
        let expected = block_roots.hash_tree_root().unwrap();
        assert_eq!(
            branch_root(block_root, &proof.header_branch, 38).as_slice(),
            expected.as_slice()
        );
        assert_ne!(
            branch_root(block_root, &proof.header_branch, 39).as_slice(),
            expected.as_slice()
        );
    }

    #[test]
    fn rejects_block_outside_finalized_history() {
        let settings = SpecSettings::minimal();
        let err = ancestry_proof::<Minimal>(&settings, 166, Root::ZERO, &finalized_at(168))
            .unwrap_err();
        assert!(
            matches!(err, ClientError::InvalidResponse(msg) if msg.contains("not an ancestor"))
        );
    }

    #[test]
    fn rejects_block_roots_of_wrong_length() {
        let settings = SpecSettings::minimal();
        let checkpoint = Proof {
            block_roots: vec![Root::repeat_byte(22); 32],
            ..finalized_at(168)
        };
        let err = ancestry_proof::<Minimal>(&settings, 150, Root::repeat_byte(22), &checkpoint)
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn skips_empty_slots() {
        let mut fetched = Vec::new();
        let found = first_present(160..=168, |slot| {
            fetched.push(slot);
            async move {
                if slot < 163 {
                    Err(beacon_client::Error::NotFound(format!("headers/{slot}")))
                } else {
                    Ok(slot)
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(found, Some(163));
        assert_eq!(fetched, [160, 161, 162, 163]);
    }

    #[tokio::test]
    async fn gives_up_after_last_slot() {
        let found = first_present(160..=162, |slot| async move {
            Err::<Slot, _>(beacon_client::Error::NotFound(format!("headers/{slot}")))
        })
        .await
        .unwrap();
        assert_eq!(found, None);
    }

    #[tokio::test]
    async fn other_errors_stop_the_search() {
        let mut fetched = 0;
        let err = first_present(160..=168, |_| {
            fetched += 1;
            let err = serde_json::from_str::<u64>("").unwrap_err();
            async move { Err::<Slot, _>(beacon_client::Error::Json(err)) }
        })
        .await
        .unwrap_err();
        assert!(matches!(err, beacon_client::Error::Json(_)));
        assert_eq!(fetched, 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn rejects_header_slot_outside_block_roots() {
        let client = BeaconApiProtocolClient::<Minimal>::new(
            BeaconClient::new("http://127.0.0.1:1").unwrap(),
            SpecSettings::minimal(),
        );
        let proof = Proof {
            finalized_block_root: Root::ZERO,
            block_roots: vec![Root::ZERO; 64],
            slot: 200,
        };
        for slot in [136, 201] {
            let err = client
                .get_header_update_with_ancestry_proof(slot, &proof)
                .unwrap_err();
            assert!(matches!(
                err,
                ClientError::SlotOutOfRange { slot: s, finalized_slot: 200 } if s == slot
            ));
        }
    }
}
