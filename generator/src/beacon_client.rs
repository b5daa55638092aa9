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

use std::{collections::HashMap, fmt::Display};

use ethereum_consensus::serde::as_str;
use fixture_core::{BeaconHeader, Epoch, Root, Slot, SyncAggregate, SyncCommittee, SyncPeriod};
use reqwest::{IntoUrl, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};
use url::Url;

/// Errors returned by the [BeaconClient].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("could not parse URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{0} not found")]
    NotFound(String),
    #[error("could not decode response: {0}")]
    Json(#[from] serde_json::Error),
}

/// Wrapper returned by the API calls.
#[derive(Debug, Deserialize)]
pub struct Response<T> {
    pub data: T,
    #[serde(flatten)]
    pub meta: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiBeaconHeader {
    #[serde(with = "as_str")]
    pub slot: Slot,
    #[serde(with = "as_str")]
    pub proposer_index: u64,
    pub parent_root: Root,
    pub state_root: Root,
    pub body_root: Root,
}

impl From<ApiBeaconHeader> for BeaconHeader {
    fn from(header: ApiBeaconHeader) -> Self {
        Self {
            slot: header.slot,
            proposer_index: header.proposer_index,
            parent_root: header.parent_root,
            state_root: header.state_root,
            body_root: header.body_root,
        }
    }
}

/// Light client header. The execution part is not used by the fixtures.
#[derive(Debug, Clone, Deserialize)]
pub struct LightClientHeader {
    pub beacon: ApiBeaconHeader,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LightClientBootstrap {
    pub header: LightClientHeader,
    pub current_sync_committee: SyncCommittee,
    pub current_sync_committee_branch: Vec<Root>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LightClientUpdate {
    pub attested_header: LightClientHeader,
    pub next_sync_committee: SyncCommittee,
    pub next_sync_committee_branch: Vec<Root>,
    pub finalized_header: LightClientHeader,
    pub finality_branch: Vec<Root>,
    pub sync_aggregate: SyncAggregate,
    #[serde(with = "as_str")]
    pub signature_slot: Slot,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LightClientFinalityUpdate {
    pub attested_header: LightClientHeader,
    pub finalized_header: LightClientHeader,
    pub finality_branch: Vec<Root>,
    pub sync_aggregate: SyncAggregate,
    #[serde(with = "as_str")]
    pub signature_slot: Slot,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Genesis {
    pub genesis_validators_root: Root,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Checkpoint {
    #[serde(with = "as_str")]
    pub epoch: Epoch,
    pub root: Root,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FinalityCheckpoints {
    pub previous_justified: Checkpoint,
    pub current_justified: Checkpoint,
    pub finalized: Checkpoint,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignedHeader {
    pub message: ApiBeaconHeader,
}

/// Response returned by the `get_block_header` API.
#[derive(Debug, Clone, Deserialize)]
pub struct GetBlockHeaderResponse {
    pub root: Root,
    pub canonical: bool,
    pub header: SignedHeader,
}

/// Simple beacon API client that can query headers, blocks, states and the
/// light client endpoints.
pub struct BeaconClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl BeaconClient {
    /// Creates a new beacon endpoint API client.
    pub fn new<U: IntoUrl>(endpoint: U) -> Result<Self, Error> {
        Ok(Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into_url()?,
        })
    }

    async fn http_get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let bytes = self.http_get_bytes(path).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn http_get_bytes(&self, path: &str) -> Result<Vec<u8>, Error> {
        let target = self.endpoint.join(path)?;
        let resp = self.http.get(target).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(path.to_string()));
        }
        let value = resp.error_for_status()?.bytes().await?.to_vec();
        Ok(value)
    }

    /// Retrieves the block header for given block id.
    #[tracing::instrument(skip(self), fields(block_id = %block_id))]
    pub async fn get_block_header(
        &self,
        block_id: impl Display,
    ) -> Result<GetBlockHeaderResponse, Error> {
        let path = format!("eth/v1/beacon/headers/{block_id}");
        let result: Response<GetBlockHeaderResponse> = self.http_get(&path).await?;
        Ok(result.data)
    }

    /// Retrieves the raw JSON of the block for given block id.
    #[tracing::instrument(skip(self), fields(block_id = %block_id))]
    pub async fn get_block_json(&self, block_id: impl Display) -> Result<Vec<u8>, Error> {
        let path = format!("eth/v2/beacon/blocks/{block_id}");
        self.http_get_bytes(&path).await
    }

    /// Retrieves the raw JSON of the beacon state for given state id.
    #[tracing::instrument(skip(self), fields(state_id = %state_id))]
    pub async fn get_beacon_state_json(&self, state_id: impl Display) -> Result<Vec<u8>, Error> {
        let path = format!("eth/v2/debug/beacon/states/{state_id}");
        self.http_get_bytes(&path).await
    }

    #[tracing::instrument(skip(self), fields(state_id = %state_id))]
    pub async fn get_finality_checkpoints(
        &self,
        state_id: impl Display,
    ) -> Result<FinalityCheckpoints, Error> {
        let path = format!("eth/v1/beacon/states/{state_id}/finality_checkpoints");
        let result: Response<FinalityCheckpoints> = self.http_get(&path).await?;
        Ok(result.data)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_genesis(&self) -> Result<Genesis, Error> {
        let result: Response<Genesis> = self.http_get("eth/v1/beacon/genesis").await?;
        Ok(result.data)
    }

    #[tracing::instrument(skip(self), fields(block_root = %block_root))]
    pub async fn get_light_client_bootstrap(
        &self,
        block_root: Root,
    ) -> Result<LightClientBootstrap, Error> {
        let path = format!("eth/v1/beacon/light_client/bootstrap/{block_root}");
        let result: Response<LightClientBootstrap> = self.http_get(&path).await?;
        Ok(result.data)
    }

    /// Retrieves the best light client updates of `count` consecutive periods.
    #[tracing::instrument(skip(self))]
    pub async fn get_light_client_updates(
        &self,
        start_period: SyncPeriod,
        count: u64,
    ) -> Result<Vec<LightClientUpdate>, Error> {
        let path =
            format!("eth/v1/beacon/light_client/updates?start_period={start_period}&count={count}");
        let result: Vec<Response<LightClientUpdate>> = self.http_get(&path).await?;
        Ok(result.into_iter().map(|update| update.data).collect())
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_light_client_finality_update(
        &self,
    ) -> Result<LightClientFinalityUpdate, Error> {
        let result: Response<LightClientFinalityUpdate> = self
            .http_get("eth/v1/beacon/light_client/finality_update")
            .await?;
        Ok(result.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::B256;

    #[test]
    fn decodes_string_encoded_numbers() {
        let json = r#"{
            "version": "electra",
            "data": {
                "root": "0xbe7d9cc4483ed0065fc7c32e2a783ca3782d8dbd7bfe899fd7c0bcee82f11629",
                "canonical": true,
                "header": {
                    "message": {
                        "slot": "166",
                        "proposer_index": "7",
                        "parent_root": "0x1111111111111111111111111111111111111111111111111111111111111111",
                        "state_root": "0x2222222222222222222222222222222222222222222222222222222222222222",
                        "body_root": "0x3333333333333333333333333333333333333333333333333333333333333333"
                    },
                    "signature": "0x00"
                }
            }
        }"#;
        let response: Response<GetBlockHeaderResponse> = serde_json::from_str(json).unwrap();
        assert_eq!(response.meta["version"], "electra");
        let header: BeaconHeader = response.data.header.message.into();
        assert_eq!(header.slot, 166);
        assert_eq!(header.proposer_index, 7);
        assert_eq!(header.body_root, B256::repeat_byte(0x33));
    }

    #[test]
    fn decodes_finality_update() {
        let root = format!("\"0x{}\"", "ab".repeat(32));
        let header = |slot: u64| {
            format!(
                r#"{{"beacon": {{"slot": "{slot}", "proposer_index": "1", "parent_root": {root}, "state_root": {root}, "body_root": {root}}}, "execution_branch": []}}"#
            )
        };
        let json = format!(
            r#"{{"version": "electra", "data": {{
                "attested_header": {},
                "finalized_header": {},
                "finality_branch": [{root}, {root}],
                "sync_aggregate": {{"sync_committee_bits": "0xff", "sync_committee_signature": "0x{}"}},
                "signature_slot": "106"
            }}}}"#,
            header(105),
            header(96),
            "00".repeat(96)
        );
        let update: Response<LightClientFinalityUpdate> = serde_json::from_str(&json).unwrap();
        assert_eq!(update.data.attested_header.beacon.slot, 105);
        assert_eq!(update.data.finalized_header.beacon.slot, 96);
        assert_eq!(update.data.finality_branch.len(), 2);
        assert_eq!(update.data.sync_aggregate.sync_committee_bits[..], [0xff]);
        assert_eq!(update.data.signature_slot, 106);
    }

    #[test]
    fn endpoint_paths_join_onto_base() {
        let client = BeaconClient::new("http://127.0.0.1:9596").unwrap();
        let target = client
            .endpoint
            .join("eth/v1/beacon/light_client/updates?start_period=3&count=1")
            .unwrap();
        assert_eq!(
            target.as_str(),
            "http://127.0.0.1:9596/eth/v1/beacon/light_client/updates?start_period=3&count=1"
        );
    }
}
