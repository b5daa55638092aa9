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

//! Rewrites artifacts so their hashes can be embedded as bare hex literals.

use serde::Serialize;
use serde_json::Value;

pub const HEX_PREFIX: &str = "0x";

/// Strips the `0x` prefix of a hex string. Strings that are not `0x`
/// followed by hex digits are returned unchanged.
#[inline]
pub fn strip_hex_prefix(s: &str) -> &str {
    match s.strip_prefix(HEX_PREFIX) {
        Some(bare) if bare.bytes().all(|b| b.is_ascii_hexdigit()) => bare,
        _ => s,
    }
}

/// Recursively rewrites every hex string in `value` to bare lowercase hex.
///
/// Applying it more than once is a no-op.
pub fn canonicalize(value: &mut Value) {
    match value {
        Value::String(s) => {
            let bare = strip_hex_prefix(s);
            if bare.len() != s.len() {
                *s = bare.to_ascii_lowercase();
            }
        }
        Value::Array(items) => items.iter_mut().for_each(canonicalize),
        Value::Object(fields) => fields.values_mut().for_each(canonicalize),
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

/// Serializes `artifact` into a JSON document and canonicalizes it. The
/// artifact itself is left untouched.
pub fn canonical_document<T: Serialize>(artifact: &T) -> Result<Value, serde_json::Error> {
    let mut value = serde_json::to_value(artifact)?;
    canonicalize(&mut value);
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BeaconHeader, CheckpointUpdate, SyncCommittee};
    use alloy_primitives::B256;
    use serde_json::json;

    fn contains_prefix(value: &Value) -> bool {
        match value {
            Value::String(s) => s.starts_with(HEX_PREFIX),
            Value::Array(items) => items.iter().any(contains_prefix),
            Value::Object(fields) => fields.values().any(contains_prefix),
            _ => false,
        }
    }

    #[test]
    fn strips_nested_hashes() {
        let mut value = json!({
            "slot": 152,
            "root": "0xABcd",
            "branch": ["0x01", "0x02"],
            "inner": {"proof": null, "bits": "0xff"},
        });
        canonicalize(&mut value);
        assert_eq!(
            value,
            json!({
                "slot": 152,
                "root": "abcd",
                "branch": ["01", "02"],
                "inner": {"proof": null, "bits": "ff"},
            })
        );
    }

    #[test]
    fn idempotent() {
        let checkpoint = CheckpointUpdate {
            header: BeaconHeader {
                slot: 152,
                parent_root: B256::repeat_byte(0x7e),
                ..Default::default()
            },
            current_sync_committee: SyncCommittee {
                pubkeys: vec![Default::default(); 4],
                aggregate_pubkey: Default::default(),
            },
            current_sync_committee_branch: vec![B256::repeat_byte(0xc6); 5],
            ..Default::default()
        };
        let once = canonical_document(&checkpoint).unwrap();
        let mut twice = once.clone();
        canonicalize(&mut twice);
        assert_eq!(once, twice);
        assert!(!contains_prefix(&once));
        assert_eq!(once["header"]["slot"], 152);
        assert_eq!(once["header"]["parent_root"], "7e".repeat(32));
    }

    #[test]
    fn bare_strings_are_left_alone() {
        // "0" does not carry the prefix and must not be shortened further.
        let mut value = json!(["0", "x0", "00"]);
        canonicalize(&mut value);
        assert_eq!(value, json!(["0", "x0", "00"]));
    }

    #[test]
    fn double_prefix_is_not_hex() {
        let mut value = json!({"tag": "0x0x12", "name": "0xgg", "empty": "0x"});
        canonicalize(&mut value);
        let once = value.clone();
        canonicalize(&mut value);
        assert_eq!(once, value);
        assert_eq!(value, json!({"tag": "0x0x12", "name": "0xgg", "empty": ""}));
        assert_eq!(strip_hex_prefix("0x0x12"), "0x0x12");
    }
}
