// Copyright (c) 2025 Ledgerclip Maintainers.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashSet;

use crate::models::{NewTransaction, Transaction, TxKind};

/// Stable identity key for a transaction. Pure function of the content
/// fields; two entries differing only in id (or any link field) collide.
pub fn fingerprint(
    date: NaiveDate,
    kind: TxKind,
    amount: Decimal,
    description: &str,
    category: &str,
) -> String {
    format!(
        "{}|{}|{}|{}|{}",
        date.format("%Y-%m-%d"),
        kind.as_str(),
        amount.round_dp(2),
        description.trim().to_lowercase(),
        category.trim().to_lowercase()
    )
}

pub fn fingerprint_tx(t: &Transaction) -> String {
    fingerprint(t.date, t.kind, t.amount, &t.description, &t.category)
}

pub fn fingerprint_new(t: &NewTransaction) -> String {
    fingerprint(t.date, t.kind, t.amount, &t.description, &t.category)
}

/// Seen-set over the existing ledger plus the batch processed so far. Feed
/// entries carry a source-stable `external_id`; identity on that id takes
/// precedence over the content fingerprint, because feed entries may be
/// re-categorized locally after import.
#[derive(Debug, Default)]
pub struct DedupIndex {
    fingerprints: HashSet<String>,
    external_ids: HashSet<String>,
}

impl DedupIndex {
    pub fn from_ledger(ledger: &[Transaction]) -> Self {
        let mut idx = DedupIndex::default();
        for t in ledger {
            idx.fingerprints.insert(fingerprint_tx(t));
            if let Some(ext) = &t.external_id {
                idx.external_ids.insert(ext.clone());
            }
        }
        idx
    }

    pub fn is_duplicate(&self, candidate: &NewTransaction) -> bool {
        if let Some(ext) = &candidate.external_id {
            if self.external_ids.contains(ext) {
                return true;
            }
        }
        self.fingerprints.contains(&fingerprint_new(candidate))
    }

    /// Record an accepted candidate so later entries of the same batch are
    /// checked against it too.
    pub fn insert(&mut self, candidate: &NewTransaction) {
        self.fingerprints.insert(fingerprint_new(candidate));
        if let Some(ext) = &candidate.external_id {
            self.external_ids.insert(ext.clone());
        }
    }
}
