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

//! Consensus presets the beacon API client can decode states and blocks for.

use ethereum_consensus::{electra, phase0::BeaconBlockHeader};
use fixture_core::{BeaconHeader, Root, SpecSettings};
use serde::de::DeserializeOwned;
use ssz_rs::prelude::{GeneralizedIndexable, HashTreeRoot, Node, Path, Prove, Vector};
use ssz_rs::proofs::Prover;

const MAINNET_SLOTS_PER_HISTORICAL_ROOT: usize =
    SpecSettings::mainnet().slots_per_historical_root as usize;
const MINIMAL_SLOTS_PER_HISTORICAL_ROOT: usize =
    SpecSettings::minimal().slots_per_historical_root as usize;

/// Binds a preset to its Electra SSZ containers.
pub trait ConsensusPreset: Send + Sync + 'static {
    type BeaconState: DeserializeOwned + Prove + GeneralizedIndexable + Send;
    type BeaconBlockBody: DeserializeOwned + Prove + GeneralizedIndexable + Send;
    /// The `block_roots` vector of [Self::BeaconState].
    type BlockRoots: Prove + GeneralizedIndexable + TryFrom<Vec<Node>>;

    fn block_roots(state: &Self::BeaconState) -> Vec<Root>;
}

#[derive(Debug, Clone, Copy)]
pub struct Mainnet;

impl ConsensusPreset for Mainnet {
    type BeaconState = electra::mainnet::BeaconState;
    type BeaconBlockBody = electra::mainnet::BeaconBlockBody;
    type BlockRoots = Vector<Node, MAINNET_SLOTS_PER_HISTORICAL_ROOT>;

    fn block_roots(state: &Self::BeaconState) -> Vec<Root> {
        state.block_roots.iter().map(root).collect()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Minimal;

impl ConsensusPreset for Minimal {
    type BeaconState = electra::minimal::BeaconState;
    type BeaconBlockBody = electra::minimal::BeaconBlockBody;
    type BlockRoots = Vector<Node, MINIMAL_SLOTS_PER_HISTORICAL_ROOT>;

    fn block_roots(state: &Self::BeaconState) -> Vec<Root> {
        state.block_roots.iter().map(root).collect()
    }
}

fn node(root: &Root) -> Node {
    Node::from_slice(root.as_slice())
}

fn root(node: &Node) -> Root {
    Root::from_slice(node.as_slice())
}

/// A single leaf of an SSZ container together with its Merkle branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldProof {
    pub leaf: Root,
    pub branch: Vec<Root>,
}

#[derive(Debug, thiserror::Error)]
#[error("could not prove {path}: {message}")]
pub struct ProofError {
    path: String,
    message: String,
}

/// Proves every path in `paths` against `container`, computing its tree once.
pub fn prove_fields<T: Prove + GeneralizedIndexable>(
    container: &T,
    paths: &[Path],
) -> Result<Vec<FieldProof>, ProofError> {
    let tree = container.compute_tree().map_err(|e| ProofError {
        path: "<root>".to_string(),
        message: e.to_string(),
    })?;

    paths
        .iter()
        .map(|path| {
            let err = |e: &dyn std::fmt::Display| ProofError {
                path: format!("{path:?}"),
                message: e.to_string(),
            };
            let gindex = T::generalized_index(path).map_err(|e| err(&e))?;
            let mut prover = Prover::from(gindex);
            prover
                .compute_proof_cached_tree(container, &tree)
                .map_err(|e| err(&e))?;
            let proof = prover.into_proof();
            Ok(FieldProof {
                leaf: root(&proof.leaf),
                branch: proof.branch.iter().map(root).collect(),
            })
        })
        .collect()
}

/// Returns the block root of `header`.
pub fn block_root(header: &BeaconHeader) -> Result<Root, ProofError> {
    let header = BeaconBlockHeader {
        slot: header.slot,
        proposer_index: header.proposer_index as usize,
        parent_root: node(&header.parent_root),
        state_root: node(&header.state_root),
        body_root: node(&header.body_root),
    };
    header
        .hash_tree_root()
        .map(|node| root(&node))
        .map_err(|e| ProofError {
            path: "<header>".to_string(),
            message: e.to_string(),
        })
}

/// Rebuilds the `block_roots` vector of preset `P` from plain roots.
pub fn block_roots_vector<P: ConsensusPreset>(
    block_roots: &[Root],
) -> Result<P::BlockRoots, ProofError> {
    P::BlockRoots::try_from(block_roots.iter().map(node).collect()).map_err(|_| ProofError {
        path: "block_roots".to_string(),
        message: format!("unexpected length {}", block_roots.len()),
    })
}
