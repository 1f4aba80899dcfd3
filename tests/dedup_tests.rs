// Copyright (c) 2025 Ledgerclip Maintainers.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use ledgerclip::engine::fingerprint::{DedupIndex, fingerprint_new, fingerprint_tx};
use ledgerclip::ledger;
use ledgerclip::models::{NewTransaction, Transaction, TxKind};

fn setup() -> rusqlite::Connection {
    let mut conn = rusqlite::Connection::open_in_memory().unwrap();
    ledgerclip::db::init_schema(&mut conn).unwrap();
    conn
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn candidate(desc: &str, amount: &str) -> NewTransaction {
    let mut t = NewTransaction::new(date("2025-03-10"), desc, dec(amount), TxKind::Expense);
    t.category = "Groceries".to_string();
    t
}

#[test]
fn fingerprint_ignores_id_and_normalizes_text() {
    let accepted = Transaction {
        id: 42,
        date: date("2025-03-10"),
        description: "  Corner Store  ".to_string(),
        amount: dec("12.5"),
        kind: TxKind::Expense,
        category: " GROCERIES ".to_string(),
        debt_account_id: None,
        asset_account_id: None,
        recurring_id: None,
        external_id: None,
        source: None,
    };
    let mut incoming = candidate("corner store", "12.50");
    incoming.category = "groceries".to_string();
    assert_eq!(fingerprint_tx(&accepted), fingerprint_new(&incoming));
}

#[test]
fn fingerprint_differs_on_content() {
    let a = candidate("Corner Store", "12.50");
    let b = candidate("Corner Store", "12.51");
    assert_ne!(fingerprint_new(&a), fingerprint_new(&b));

    let mut c = candidate("Corner Store", "12.50");
    c.kind = TxKind::Income;
    assert_ne!(fingerprint_new(&a), fingerprint_new(&c));
}

#[test]
fn external_id_takes_precedence_over_fingerprint() {
    let mut conn = setup();
    let mut feed_tx = candidate("Coffee", "4.00");
    feed_tx.external_id = Some("simplefin:acct1:tx9".to_string());
    ledger::append_batch(&mut conn, std::slice::from_ref(&feed_tx)).unwrap();

    // Same external id, different content (re-categorized after import).
    let mut again = feed_tx.clone();
    again.category = "Dining".to_string();
    again.amount = dec("4.25");
    let idx = DedupIndex::from_ledger(&ledger::load(&conn).unwrap());
    assert!(idx.is_duplicate(&again));

    let report = ledger::append_batch(&mut conn, &[again]).unwrap();
    assert_eq!(report.added, 0);
    assert_eq!(report.duplicates, 1);
}

#[test]
fn same_batch_twice_is_idempotent() {
    let mut conn = setup();
    let batch = vec![
        candidate("Corner Store", "12.50"),
        candidate("Gas", "40.00"),
        candidate("Coffee", "4.00"),
    ];
    let first = ledger::append_batch(&mut conn, &batch).unwrap();
    assert_eq!(first.added, 3);
    assert_eq!(first.duplicates, 0);

    let second = ledger::append_batch(&mut conn, &batch).unwrap();
    assert_eq!(second.added, 0);
    assert_eq!(second.duplicates, 3);

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 3);
}

#[test]
fn duplicates_within_one_batch_are_caught() {
    let mut conn = setup();
    let batch = vec![
        candidate("Corner Store", "12.50"),
        candidate("Corner Store", "12.50"),
    ];
    let report = ledger::append_batch(&mut conn, &batch).unwrap();
    assert_eq!(report.added, 1);
    assert_eq!(report.duplicates, 1);
}

#[test]
fn matching_content_with_new_external_id_is_still_a_duplicate() {
    let mut conn = setup();
    let mut a = candidate("Coffee", "4.00");
    a.external_id = Some("simplefin:acct1:tx1".to_string());
    ledger::append_batch(&mut conn, &[a]).unwrap();

    let idx = DedupIndex::from_ledger(&ledger::load(&conn).unwrap());
    let mut b = candidate("Coffee", "4.00");
    b.external_id = Some("simplefin:acct1:tx2".to_string());
    // External-id precedence only short-circuits when the id itself matches;
    // otherwise the content fingerprint still applies.
    assert!(idx.is_duplicate(&b));
}
