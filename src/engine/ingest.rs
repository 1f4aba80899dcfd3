// Copyright (c) 2025 Ledgerclip Maintainers.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use serde_json::Value;

use crate::errors::LedgerError;
use crate::extract::RawTransaction;
use crate::models::{NewTransaction, TxKind};
use crate::utils::{normalize_date, parse_loose_amount};

/// Manual entry: straight validation, no heuristics. Negative amounts are
/// rejected here rather than folded; the user picked the kind explicitly.
pub fn manual(
    date: chrono::NaiveDate,
    description: &str,
    amount: Decimal,
    kind: TxKind,
    category: Option<&str>,
) -> Result<NewTransaction, LedgerError> {
    let description = description.trim();
    if description.is_empty() {
        return Err(LedgerError::validation("description", "must not be empty"));
    }
    if amount <= Decimal::ZERO {
        return Err(LedgerError::validation(
            "amount",
            format!("must be positive, got {}", amount),
        ));
    }
    let mut t = NewTransaction::new(date, description, amount, kind);
    if let Some(c) = category.map(str::trim).filter(|c| !c.is_empty()) {
        t.category = c.to_string();
    }
    Ok(t)
}

/// Result of pushing a loose batch through the coercion boundary. Bad records
/// are rejected one by one; the batch itself always goes through.
#[derive(Debug, Default)]
pub struct NormalizedBatch {
    pub accepted: Vec<NewTransaction>,
    pub rejected: Vec<String>,
}

/// Coerce extractor output into canonical candidates. Amounts fold to their
/// absolute value, kind defaults to `expense`, category to `Uncategorized`,
/// and `source` is stamped with the originating filename when the extractor
/// left it out. A record without a parsable date cannot be placed in any
/// period and is rejected.
pub fn normalize_extracted(raw: &[RawTransaction], source_name: &str) -> NormalizedBatch {
    let mut batch = NormalizedBatch::default();
    for (i, r) in raw.iter().enumerate() {
        let Some(date) = r.date.as_deref().and_then(normalize_date) else {
            batch
                .rejected
                .push(format!("record {}: missing or invalid date", i + 1));
            continue;
        };
        let Some(amount) = r.amount.as_ref().and_then(coerce_amount) else {
            batch
                .rejected
                .push(format!("record {}: missing or non-numeric amount", i + 1));
            continue;
        };
        let description = r
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .unwrap_or("(no description)");
        let kind = r
            .kind
            .as_deref()
            .and_then(TxKind::parse)
            .unwrap_or(TxKind::Expense);

        let mut t = NewTransaction::new(date, description, amount.abs(), kind);
        if let Some(c) = r.category.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            t.category = c.to_string();
        }
        t.source = Some(
            r.source
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or(source_name)
                .to_string(),
        );
        batch.accepted.push(t);
    }
    batch
}

fn coerce_amount(v: &Value) -> Option<Decimal> {
    match v {
        Value::Number(n) => n.to_string().parse::<Decimal>().ok(),
        Value::String(s) => parse_loose_amount(s),
        _ => None,
    }
}
