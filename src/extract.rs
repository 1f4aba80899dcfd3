// Copyright (c) 2025 Ledgerclip Maintainers.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Boundary to the AI statement extractor. The extraction call itself
//! (model choice, prompting, the upstream HTTP request) lives outside this
//! crate; what crosses the boundary is the loosely-typed transaction array
//! below, which `engine::ingest` coerces into canonical candidates.

use serde::Deserialize;
use serde_json::Value;

use crate::errors::LedgerError;

/// One record as the extractor emits it. Everything is optional or loose on
/// purpose: completion output is not trustworthy enough for a strict schema,
/// so the strictness lives in the normalizer instead.
#[derive(Debug, Clone, Deserialize)]
pub struct RawTransaction {
    pub date: Option<String>,
    pub description: Option<String>,
    /// Number or numeric string; anything else rejects the record.
    pub amount: Option<Value>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub category: Option<String>,
    pub source: Option<String>,
}

/// Collaborator contract for statement extraction.
pub trait StatementExtractor {
    fn extract(
        &self,
        file_bytes: &[u8],
        mime_type: &str,
        category_hints: &[String],
    ) -> Result<Vec<RawTransaction>, LedgerError>;
}

/// Parse a saved extractor response (a JSON array of raw records).
pub fn parse_raw_batch(json: &str) -> Result<Vec<RawTransaction>, LedgerError> {
    serde_json::from_str(json)
        .map_err(|e| LedgerError::Upstream(format!("unparsable extractor output: {}", e)))
}
