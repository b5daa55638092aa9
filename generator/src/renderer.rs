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

//! Renders canonicalized fixtures into the benchmarking module of the beacon
//! client pallet.

use fixture_core::{
    CheckpointUpdate, ExecutionHeaderUpdate, Update, canonical_document, strip_hex_prefix,
};
use proc_macro2::{Literal, TokenStream};
use quote::quote;
use serde::Serialize;
use serde_json::{Map, Value};

pub const GENERATED_HEADER: &str = "// Generated, do not edit!\n// See README.md for instructions to generate\n";

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("field `{field}` holds a value that cannot be rendered: {value}")]
    Unsupported { field: String, value: Value },
    #[error("no fixture type is known for field `{0}`")]
    UnknownStruct(String),
    #[error("fixture `{0}` is not a JSON object")]
    NotAnObject(&'static str),
    #[error("generated module does not parse: {0}")]
    Syntax(#[from] syn::Error),
}

/// The four canonicalized documents a benchmark module is rendered from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BenchmarkData {
    pub checkpoint_update: Value,
    pub sync_committee_update: Value,
    pub finalized_header_update: Value,
    pub header_update: Value,
}

impl BenchmarkData {
    pub fn new(
        checkpoint: &CheckpointUpdate,
        sync_committee_update: &Update,
        finalized_header_update: &Update,
        header_update: &ExecutionHeaderUpdate,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            checkpoint_update: canonical_document(checkpoint)?,
            sync_committee_update: canonical_document(sync_committee_update)?,
            finalized_header_update: canonical_document(finalized_header_update)?,
            header_update: canonical_document(header_update)?,
        })
    }
}

pub trait BenchmarkRenderer {
    fn render(&self, data: &BenchmarkData) -> Result<String, RenderError>;
}

impl<R: BenchmarkRenderer + ?Sized> BenchmarkRenderer for &R {
    fn render(&self, data: &BenchmarkData) -> Result<String, RenderError> {
        (**self).render(data)
    }
}

/// Renders the `fixtures.rs` module consumed by the pallet benchmarks.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixturesModuleRenderer;

/// Struct type of the object stored under a field name.
const STRUCT_TYPES: &[(&str, &str)] = &[
    ("header", "BeaconHeader"),
    ("attested_header", "BeaconHeader"),
    ("finalized_header", "BeaconHeader"),
    ("current_sync_committee", "SyncCommittee"),
    ("next_sync_committee", "SyncCommittee"),
    ("sync_aggregate", "SyncAggregate"),
    ("next_sync_committee_update", "NextSyncCommitteeUpdate"),
    ("ancestry_proof", "AncestryProof"),
    ("execution_header", "deneb::ExecutionPayloadHeader"),
];

const OPTIONAL_FIELDS: &[&str] = &["next_sync_committee_update", "ancestry_proof"];

// Fields whose target type is the raw byte array produced by `hex!`.
const RAW_BYTES_FIELDS: &[&str] = &["sync_committee_bits"];

// Fields rendered as fixed-size arrays instead of vectors.
const ARRAY_FIELDS: &[&str] = &["pubkeys"];

impl FixturesModuleRenderer {
    fn fixture(
        name: &str,
        ty: &str,
        document: &Value,
        template_var: &'static str,
    ) -> Result<TokenStream, RenderError> {
        let fields = document
            .as_object()
            .ok_or(RenderError::NotAnObject(template_var))?;
        let name = syn::parse_str::<syn::Ident>(name)?;
        let ty = syn::parse_str::<syn::Path>(ty)?;
        let literal = struct_literal(&ty, fields)?;
        Ok(quote! {
            pub fn #name() -> Box<#ty> {
                Box::new(#literal)
            }
        })
    }
}

impl BenchmarkRenderer for FixturesModuleRenderer {
    fn render(&self, data: &BenchmarkData) -> Result<String, RenderError> {
        let fixtures = vec![
            Self::fixture(
                "make_checkpoint",
                "CheckpointUpdate",
                &data.checkpoint_update,
                "CheckpointUpdate",
            )?,
            Self::fixture(
                "make_sync_committee_update",
                "Update",
                &data.sync_committee_update,
                "SyncCommitteeUpdate",
            )?,
            Self::fixture(
                "make_finalized_header_update",
                "Update",
                &data.finalized_header_update,
                "FinalizedHeaderUpdate",
            )?,
            Self::fixture(
                "make_execution_header_update",
                "ExecutionHeaderUpdate",
                &data.header_update,
                "HeaderUpdate",
            )?,
        ];

        let tokens = quote! {
            use crate::{CheckpointUpdate, ExecutionHeaderUpdate, Update};
            use hex_literal::hex;
            use snowbridge_beacon_primitives::{
                types::deneb, updates::AncestryProof, BeaconHeader, NextSyncCommitteeUpdate,
                SyncAggregate, SyncCommittee, VersionedExecutionPayloadHeader,
            };
            use sp_core::U256;
            use sp_std::{boxed::Box, vec};

            #(#fixtures)*
        };

        let file = syn::parse2::<syn::File>(tokens)?;
        Ok(format!("{GENERATED_HEADER}{}", prettyplease::unparse(&file)))
    }
}

fn struct_literal(ty: &syn::Path, fields: &Map<String, Value>) -> Result<TokenStream, RenderError> {
    let inits = fields
        .iter()
        .map(|(name, value)| {
            let ident = syn::parse_str::<syn::Ident>(name)?;
            let value = value_expr(name, value)?;
            Ok(quote!(#ident: #value))
        })
        .collect::<Result<Vec<_>, RenderError>>()?;
    Ok(quote!(#ty { #(#inits),* }))
}

fn value_expr(field: &str, value: &Value) -> Result<TokenStream, RenderError> {
    let unsupported = || RenderError::Unsupported {
        field: field.to_string(),
        value: value.clone(),
    };

    let expr = match value {
        Value::Null => quote!(None),
        Value::Bool(b) => quote!(#b),
        Value::Number(n) => {
            let n = n.as_u64().ok_or_else(unsupported)?;
            if field == "base_fee_per_gas" {
                let lit = Literal::u64_suffixed(n);
                quote!(U256::from(#lit))
            } else {
                let lit = Literal::u64_unsuffixed(n);
                quote!(#lit)
            }
        }
        Value::String(s) => {
            // documents are canonicalized before rendering
            let s = strip_hex_prefix(s);
            if !s.bytes().all(|b| b.is_ascii_hexdigit()) || s.len() % 2 != 0 {
                return Err(unsupported());
            }
            if RAW_BYTES_FIELDS.contains(&field) {
                quote!(hex!(#s))
            } else {
                quote!(hex!(#s).into())
            }
        }
        Value::Array(items) => {
            let items = items
                .iter()
                .map(|item| value_expr(field, item))
                .collect::<Result<Vec<_>, _>>()?;
            if ARRAY_FIELDS.contains(&field) {
                quote!([#(#items),*])
            } else {
                quote!(vec![#(#items),*])
            }
        }
        Value::Object(fields) => {
            let ty = STRUCT_TYPES
                .iter()
                .find(|(name, _)| *name == field)
                .map(|(_, ty)| *ty)
                .ok_or_else(|| RenderError::UnknownStruct(field.to_string()))?;
            let literal = struct_literal(&syn::parse_str(ty)?, fields)?;
            if field == "execution_header" {
                quote!(VersionedExecutionPayloadHeader::Deneb(#literal))
            } else if OPTIONAL_FIELDS.contains(&field) {
                quote!(Some(#literal))
            } else {
                literal
            }
        }
    };
    Ok(expr)
}
