// Copyright (c) 2025 Ledgerclip Maintainers.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::cell::RefCell;

use rust_decimal::Decimal;

use ledgerclip::engine::sync::{
    DAILY_REQUEST_CAP, OVERLAP_DAYS, SPAN_CAP_DAYS, map_feed_transaction, plan_windows, run_round,
};
use ledgerclip::errors::LedgerError;
use ledgerclip::feed::{FeedAccount, FeedClient, FeedTransaction, FeedWindow};
use ledgerclip::models::{AccountRole, FeedLink, TxKind};

const DAY: i64 = 86_400;
const NOW: i64 = 1_760_000_000;

fn feed_tx(id: &str, posted: Option<i64>, amount: &str, desc: &str) -> FeedTransaction {
    FeedTransaction {
        id: id.to_string(),
        posted,
        transacted_at: None,
        amount: amount.to_string(),
        description: Some(desc.to_string()),
    }
}

fn window_with(account_id: &str, txs: Vec<FeedTransaction>) -> FeedWindow {
    FeedWindow {
        accounts: vec![FeedAccount {
            id: account_id.to_string(),
            name: None,
            transactions: txs,
        }],
        errors: vec![],
    }
}

/// Serves canned windows in order and records every range it was asked for.
struct ScriptedFeed {
    responses: RefCell<Vec<Result<FeedWindow, LedgerError>>>,
    calls: RefCell<Vec<(i64, i64)>>,
}

impl ScriptedFeed {
    fn new(responses: Vec<Result<FeedWindow, LedgerError>>) -> Self {
        Self {
            responses: RefCell::new(responses),
            calls: RefCell::new(Vec::new()),
        }
    }
}

impl FeedClient for ScriptedFeed {
    fn fetch_window(
        &self,
        _access_url: &str,
        start: i64,
        end: i64,
    ) -> Result<FeedWindow, LedgerError> {
        self.calls.borrow_mut().push((start, end));
        self.responses.borrow_mut().remove(0)
    }
}

#[test]
fn backfill_partitions_into_cap_width_windows() {
    let plan = plan_windows(150, NOW, None, SPAN_CAP_DAYS, OVERLAP_DAYS, DAILY_REQUEST_CAP)
        .unwrap();
    assert!(!plan.incremental);
    assert_eq!(plan.windows.len(), 3);
    let lower = NOW - 150 * DAY;
    assert_eq!(plan.windows[0], (lower, lower + 60 * DAY));
    assert_eq!(plan.windows[1], (lower + 60 * DAY, lower + 120 * DAY));
    // Last window is short and ends exactly at now: contiguous, no gaps.
    assert_eq!(plan.windows[2], (lower + 120 * DAY, NOW));
}

#[test]
fn incremental_starts_from_the_cursor_minus_overlap() {
    let last_sync = NOW - 10 * DAY;
    let plan = plan_windows(60, NOW, Some(last_sync), SPAN_CAP_DAYS, 2, DAILY_REQUEST_CAP)
        .unwrap();
    assert!(plan.incremental);
    assert_eq!(plan.windows, vec![(NOW - 12 * DAY, NOW)]);
}

#[test]
fn incremental_never_starts_before_the_requested_span() {
    // Cursor far in the past: the requested lower bound wins.
    let plan = plan_windows(30, NOW, Some(NOW - 400 * DAY), SPAN_CAP_DAYS, OVERLAP_DAYS, 24)
        .unwrap();
    assert_eq!(plan.windows, vec![(NOW - 30 * DAY, NOW)]);
}

#[test]
fn capacity_is_checked_before_any_request() {
    let err = plan_windows(300, NOW, None, SPAN_CAP_DAYS, OVERLAP_DAYS, 2).unwrap_err();
    match err {
        LedgerError::CapacityExceeded { planned, remaining } => {
            assert_eq!(planned, 5);
            assert_eq!(remaining, 2);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn oversized_spans_fail_capacity_without_epoch_math() {
    // Large enough that multiplying into epoch seconds would overflow i64;
    // the capacity check must fire on the day count alone.
    let err = plan_windows(
        200_000_000_000_000,
        NOW,
        None,
        SPAN_CAP_DAYS,
        OVERLAP_DAYS,
        DAILY_REQUEST_CAP,
    )
    .unwrap_err();
    match err {
        LedgerError::CapacityExceeded { planned, remaining } => {
            assert!(planned > DAILY_REQUEST_CAP);
            assert_eq!(remaining, DAILY_REQUEST_CAP);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn nonpositive_span_is_rejected() {
    assert!(plan_windows(0, NOW, None, SPAN_CAP_DAYS, OVERLAP_DAYS, 24).is_err());
    assert!(plan_windows(-5, NOW, None, SPAN_CAP_DAYS, OVERLAP_DAYS, 24).is_err());
}

#[test]
fn role_mapping_decides_the_kind() {
    let debt = Some((AccountRole::Debt, 7));
    let asset = Some((AccountRole::Asset, 3));

    let payment = map_feed_transaction("a1", &feed_tx("t1", Some(NOW), "100.00", "pmt"), debt, NOW)
        .unwrap();
    assert_eq!(payment.kind, TxKind::DebtPayment);
    assert_eq!(payment.debt_account_id, Some(7));

    let charge = map_feed_transaction("a1", &feed_tx("t2", Some(NOW), "-45.10", "store"), debt, NOW)
        .unwrap();
    assert_eq!(charge.kind, TxKind::DebtCharge);
    assert_eq!(charge.amount, "45.10".parse::<Decimal>().unwrap());

    let deposit = map_feed_transaction("a2", &feed_tx("t3", Some(NOW), "300", "save"), asset, NOW)
        .unwrap();
    assert_eq!(deposit.kind, TxKind::AssetDeposit);
    assert_eq!(deposit.asset_account_id, Some(3));

    // Asset outflow is a plain expense, not linked to the account.
    let spent = map_feed_transaction("a2", &feed_tx("t4", Some(NOW), "-20", "atm"), asset, NOW)
        .unwrap();
    assert_eq!(spent.kind, TxKind::Expense);
    assert_eq!(spent.asset_account_id, None);

    let unmapped = map_feed_transaction("a3", &feed_tx("t5", Some(NOW), "-9.99", "sub"), None, NOW)
        .unwrap();
    assert_eq!(unmapped.kind, TxKind::Expense);
    assert_eq!(unmapped.external_id.as_deref(), Some("simplefin:a3:t5"));
    assert_eq!(unmapped.source.as_deref(), Some("simplefin"));
}

#[test]
fn zero_amounts_are_dropped() {
    assert!(map_feed_transaction("a1", &feed_tx("t1", Some(NOW), "0", "hold"), None, NOW).is_none());
    assert!(
        map_feed_transaction("a1", &feed_tx("t2", Some(NOW), "0.00", "hold"), None, NOW).is_none()
    );
}

#[test]
fn date_falls_back_posted_then_transacted_then_now() {
    let posted = feed_tx("t1", Some(NOW - 5 * DAY), "1", "a");
    let mut transacted = feed_tx("t2", None, "1", "b");
    transacted.transacted_at = Some(NOW - 9 * DAY);
    let neither = feed_tx("t3", None, "1", "c");

    let d1 = map_feed_transaction("a", &posted, None, NOW).unwrap().date;
    let d2 = map_feed_transaction("a", &transacted, None, NOW).unwrap().date;
    let d3 = map_feed_transaction("a", &neither, None, NOW).unwrap().date;
    assert!(d1 > d2);
    assert_eq!(
        d3,
        chrono::DateTime::from_timestamp(NOW, 0).unwrap().date_naive()
    );
}

#[test]
fn round_fetches_windows_in_order_and_dedups_across_them() {
    let plan = plan_windows(120, NOW, None, SPAN_CAP_DAYS, OVERLAP_DAYS, 24).unwrap();
    // The overlap means the same entry can appear in two windows.
    let dup = feed_tx("t1", Some(NOW - 70 * DAY), "-12.50", "Corner Store");
    let feed = ScriptedFeed::new(vec![
        Ok(window_with("a1", vec![dup.clone()])),
        Ok(window_with(
            "a1",
            vec![dup, feed_tx("t2", Some(NOW - 3 * DAY), "-4.00", "Coffee")],
        )),
    ]);

    let outcome = run_round(&feed, "https://feed.example", &plan, &[], &[], NOW).unwrap();
    assert_eq!(outcome.windows_fetched, 2);
    assert_eq!(outcome.accepted.len(), 2);
    assert_eq!(outcome.duplicates, 1);
    assert_eq!(*feed.calls.borrow(), plan.windows);
}

#[test]
fn a_window_error_aborts_the_round() {
    let plan = plan_windows(120, NOW, None, SPAN_CAP_DAYS, OVERLAP_DAYS, 24).unwrap();
    let feed = ScriptedFeed::new(vec![
        Ok(window_with("a1", vec![feed_tx("t1", Some(NOW - 70 * DAY), "-1", "x")])),
        Err(LedgerError::Upstream("connection reset".into())),
    ]);

    let err = run_round(&feed, "https://feed.example", &plan, &[], &[], NOW).unwrap_err();
    // The error names the window that broke.
    let (start, end) = plan.windows[1];
    match err {
        LedgerError::Upstream(msg) => {
            assert!(msg.contains(&format!("window [{}, {})", start, end)));
            assert!(msg.contains("connection reset"));
        }
        other => panic!("unexpected error: {other}"),
    }
    // Both windows were attempted, nothing is handed back to commit.
    assert_eq!(feed.calls.borrow().len(), 2);
}

#[test]
fn auth_failures_stay_auth_failures() {
    let plan = plan_windows(30, NOW, None, SPAN_CAP_DAYS, OVERLAP_DAYS, 24).unwrap();
    let feed = ScriptedFeed::new(vec![Err(LedgerError::Auth("credentials revoked".into()))]);
    let err = run_round(&feed, "https://feed.example", &plan, &[], &[], NOW).unwrap_err();
    assert!(matches!(err, LedgerError::Auth(_)));
}

#[test]
fn in_band_feed_errors_abort_too() {
    let plan = plan_windows(30, NOW, None, SPAN_CAP_DAYS, OVERLAP_DAYS, 24).unwrap();
    let mut window = window_with("a1", vec![feed_tx("t1", Some(NOW - DAY), "-1", "x")]);
    window.errors.push("Connection to institution failed".to_string());
    let feed = ScriptedFeed::new(vec![Ok(window)]);

    let err = run_round(&feed, "https://feed.example", &plan, &[], &[], NOW).unwrap_err();
    match err {
        LedgerError::Upstream(msg) => assert!(msg.contains("institution failed")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn existing_ledger_entries_are_not_refetched() {
    let mut conn = rusqlite::Connection::open_in_memory().unwrap();
    ledgerclip::db::init_schema(&mut conn).unwrap();
    let seeded = map_feed_transaction(
        "a1",
        &feed_tx("t1", Some(NOW - 2 * DAY), "-4.00", "Coffee"),
        None,
        NOW,
    )
    .unwrap();
    ledgerclip::ledger::append_batch(&mut conn, &[seeded]).unwrap();
    let existing = ledgerclip::ledger::load(&conn).unwrap();

    let plan = plan_windows(30, NOW, None, SPAN_CAP_DAYS, OVERLAP_DAYS, 24).unwrap();
    let feed = ScriptedFeed::new(vec![Ok(window_with(
        "a1",
        vec![
            feed_tx("t1", Some(NOW - 2 * DAY), "-4.00", "Coffee"),
            feed_tx("t2", Some(NOW - DAY), "-7.00", "Lunch"),
        ],
    ))]);

    let links: Vec<FeedLink> = vec![];
    let outcome = run_round(&feed, "https://feed.example", &plan, &existing, &links, NOW).unwrap();
    assert_eq!(outcome.accepted.len(), 1);
    assert_eq!(outcome.duplicates, 1);
    assert_eq!(outcome.accepted[0].description, "Lunch");
}
