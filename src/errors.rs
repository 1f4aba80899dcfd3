// Copyright (c) 2025 Ledgerclip Maintainers.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use thiserror::Error;

/// Engine error taxonomy. Validation failures are per-record and never abort
/// a batch; capacity and upstream failures are per-round and abort the round.
/// Duplicate candidates are not errors at all (see `IngestReport`).
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("sync would need {planned} feed requests but only {remaining} remain today")]
    CapacityExceeded { planned: usize, remaining: usize },

    #[error("feed error: {0}")]
    Upstream(String),

    #[error("authentication failed: {0}")]
    Auth(String),
}

impl LedgerError {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        LedgerError::Validation {
            field,
            reason: reason.into(),
        }
    }
}
