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

use alloy_primitives::{B256, FixedBytes};

mod beacon;
mod canonical;
mod client;
mod consistency;
mod scale;
mod update;

pub use beacon::*;
pub use canonical::*;
pub use client::*;
pub use consistency::*;
pub use scale::*;
pub use update::*;

pub use chainspec::{ActiveSpec, Epoch, Slot, SpecSettings, SyncPeriod};

pub type Root = B256;
pub type PublicKeyBytes = FixedBytes<48>;
pub type SignatureBytes = FixedBytes<96>;

pub const PUBKEY_SIZE: usize = 48;
