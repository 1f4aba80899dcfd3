// Copyright (c) 2025 Ledgerclip Maintainers.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Windowed, rate-limited sync against the bank-aggregation feed. The feed
//! caps the span of a single request and the number of requests per day, so
//! a round is planned up front (fail fast on capacity) and fetched window by
//! window, sequentially. Any window error aborts the whole round: the cursor
//! never advances past a range that was not actually covered.

use chrono::DateTime;
use rust_decimal::Decimal;

use crate::errors::LedgerError;
use crate::feed::{FeedClient, FeedTransaction};
use crate::models::{AccountRole, FeedLink, NewTransaction, Transaction, TxKind};

use super::fingerprint::DedupIndex;

/// Feed-imposed maximum span of one request, in days.
pub const SPAN_CAP_DAYS: i64 = 60;
/// Feed-imposed request quota per calendar day.
pub const DAILY_REQUEST_CAP: usize = 24;
/// Incremental re-fetch overlap, covering late-posting transactions.
pub const OVERLAP_DAYS: i64 = 3;

const DAY: i64 = 86_400;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPlan {
    /// Half-open `[start, end)` epoch ranges, oldest first.
    pub windows: Vec<(i64, i64)>,
    pub incremental: bool,
}

/// Decide which ranges to request. Incremental mode (requested span fits in
/// one window) starts from the cursor minus the overlap when that is later
/// than the requested lower bound; backfill mode ignores the cursor and
/// partitions the whole span into cap-width windows, last one short. The
/// planned request count is checked against the remaining daily budget
/// before anything is issued.
pub fn plan_windows(
    requested_days_back: i64,
    now: i64,
    last_sync: Option<i64>,
    span_cap_days: i64,
    overlap_days: i64,
    request_budget: usize,
) -> Result<SyncPlan, LedgerError> {
    if requested_days_back <= 0 {
        return Err(LedgerError::validation(
            "days",
            format!("must be positive, got {}", requested_days_back),
        ));
    }

    // Capacity is decided arithmetically before any epoch math or window
    // allocation, so an oversized span fails fast instead of overflowing or
    // materializing a huge plan.
    let planned = if requested_days_back <= span_cap_days {
        1
    } else {
        (requested_days_back as u64).div_ceil(span_cap_days as u64)
    };
    let planned = usize::try_from(planned).unwrap_or(usize::MAX);
    if planned > request_budget {
        return Err(LedgerError::CapacityExceeded {
            planned,
            remaining: request_budget,
        });
    }

    let lower = now - requested_days_back * DAY;
    let plan = if requested_days_back <= span_cap_days {
        let cursor_floor = last_sync.map(|ls| ls - overlap_days * DAY).unwrap_or(0);
        let start = lower.max(cursor_floor);
        SyncPlan {
            windows: vec![(start, now)],
            incremental: true,
        }
    } else {
        let mut windows = Vec::new();
        let mut start = lower;
        while start < now {
            let end = (start + span_cap_days * DAY).min(now);
            windows.push((start, end));
            start = end;
        }
        SyncPlan {
            windows,
            incremental: false,
        }
    };

    Ok(plan)
}

/// Map one feed entry to a canonical candidate. Zero amounts are dropped.
/// Without a role mapping the sign decides income vs expense; a debt-mapped
/// account turns inflows into payments and outflows into charges; an
/// asset-mapped account turns inflows into deposits, while outflows fall
/// back to plain expenses (a withdrawal that got spent).
pub fn map_feed_transaction(
    feed_account_id: &str,
    t: &FeedTransaction,
    role: Option<(AccountRole, i64)>,
    now: i64,
) -> Option<NewTransaction> {
    let amount: Decimal = t.amount.trim().parse().ok()?;
    if amount.is_zero() {
        return None;
    }
    let inflow = amount >= Decimal::ZERO;

    let (kind, debt_id, asset_id) = match role {
        Some((AccountRole::Debt, local)) if inflow => (TxKind::DebtPayment, Some(local), None),
        Some((AccountRole::Debt, local)) => (TxKind::DebtCharge, Some(local), None),
        Some((AccountRole::Asset, local)) if inflow => (TxKind::AssetDeposit, None, Some(local)),
        _ if inflow => (TxKind::Income, None, None),
        _ => (TxKind::Expense, None, None),
    };

    let epoch = t.posted.or(t.transacted_at).unwrap_or(now);
    let date = DateTime::from_timestamp(epoch, 0)?.date_naive();
    let description = t
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or("(no description)");

    let mut out = NewTransaction::new(date, description, amount.abs(), kind);
    out.debt_account_id = debt_id;
    out.asset_account_id = asset_id;
    out.external_id = Some(format!("simplefin:{}:{}", feed_account_id, t.id));
    out.source = Some("simplefin".to_string());
    Some(out)
}

#[derive(Debug, Default)]
pub struct SyncOutcome {
    pub accepted: Vec<NewTransaction>,
    pub duplicates: usize,
    pub windows_fetched: usize,
}

/// Fetch every planned window in order and fold the results through the
/// Deduplicator, against the existing ledger and across windows. The first
/// window error aborts the round with nothing to commit; the caller only
/// persists (and only advances the cursor) on a fully successful round.
pub fn run_round(
    client: &dyn FeedClient,
    access_url: &str,
    plan: &SyncPlan,
    existing: &[Transaction],
    links: &[FeedLink],
    now: i64,
) -> Result<SyncOutcome, LedgerError> {
    let mut index = DedupIndex::from_ledger(existing);
    let mut outcome = SyncOutcome::default();

    for &(start, end) in &plan.windows {
        // Failed rounds name the window that broke; auth failures stay auth.
        let window = client
            .fetch_window(access_url, start, end)
            .map_err(|e| match e {
                LedgerError::Auth(msg) => LedgerError::Auth(msg),
                other => {
                    LedgerError::Upstream(format!("window [{}, {}): {}", start, end, other))
                }
            })?;
        if !window.errors.is_empty() {
            return Err(LedgerError::Upstream(format!(
                "window [{}, {}): {}",
                start,
                end,
                window.errors.join("; ")
            )));
        }
        outcome.windows_fetched += 1;
        for account in &window.accounts {
            let role = links
                .iter()
                .find(|l| l.feed_account_id == account.id)
                .map(|l| (l.role, l.local_id));
            for t in &account.transactions {
                let Some(candidate) = map_feed_transaction(&account.id, t, role, now) else {
                    continue;
                };
                if index.is_duplicate(&candidate) {
                    outcome.duplicates += 1;
                } else {
                    index.insert(&candidate);
                    outcome.accepted.push(candidate);
                }
            }
        }
    }
    Ok(outcome)
}
