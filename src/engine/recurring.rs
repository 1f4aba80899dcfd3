// Copyright (c) 2025 Ledgerclip Maintainers.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;

use crate::models::{NewTransaction, RecurringRule, Transaction};
use crate::utils::days_in_month;

/// Entries still missing for `period` (YYYY-MM). Pure: mutates nothing,
/// knows nothing about "now" (the caller picks the period, so backfill and
/// forward projection are the same call). At most one entry per rule per
/// period: a rule is skipped when the ledger already holds an entry carrying
/// its id dated inside the period, which makes repeated calls idempotent and
/// means disabling a rule never retracts an entry generated earlier.
pub fn project(
    rules: &[RecurringRule],
    period: &str,
    ledger: &[Transaction],
) -> Vec<NewTransaction> {
    let Some((year, month)) = parse_period(period) else {
        return Vec::new();
    };

    let mut out = Vec::new();
    for rule in rules {
        if !rule.enabled {
            continue;
        }
        // Month keys are zero-padded, so string order is chronological order.
        if rule.start_month.as_str() > period {
            continue;
        }
        let already = ledger.iter().any(|t| {
            t.recurring_id == Some(rule.id) && t.date.format("%Y-%m").to_string() == period
        });
        if already {
            continue;
        }
        let day = rule.day_of_month.clamp(1, days_in_month(year, month));
        let Some(date) = NaiveDate::from_ymd_opt(year, month, day) else {
            continue;
        };
        out.push(NewTransaction {
            date,
            description: rule.description.clone(),
            amount: rule.amount,
            kind: rule.kind,
            category: rule.category.clone(),
            debt_account_id: rule.debt_account_id.filter(|_| rule.kind.is_debt()),
            asset_account_id: rule.asset_account_id.filter(|_| rule.kind.is_asset()),
            recurring_id: Some(rule.id),
            external_id: None,
            source: None,
        });
    }
    out
}

fn parse_period(period: &str) -> Option<(i32, u32)> {
    let (y, m) = period.split_once('-')?;
    let year = y.parse::<i32>().ok()?;
    let month = m.parse::<u32>().ok().filter(|m| (1..=12).contains(m))?;
    Some((year, month))
}
