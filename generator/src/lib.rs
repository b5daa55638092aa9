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

//! Generates light client test fixtures and benchmark data for the beacon
//! client pallet from a running beacon node.

pub mod beacon_client;
mod error;
mod fixture_writer;
mod pipeline;
pub mod preset;
mod protocol_client;
mod renderer;

pub use error::{Error, Stage};
pub use fixture_writer::FixtureWriter;
pub use pipeline::*;
pub use protocol_client::{BeaconApiProtocolClient, protocol_client};
pub use renderer::{
    BenchmarkData, BenchmarkRenderer, FixturesModuleRenderer, GENERATED_HEADER, RenderError,
};
