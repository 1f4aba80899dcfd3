// Copyright (c) 2025 Ledgerclip Maintainers.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use ledgerclip::engine::recurring::project;
use ledgerclip::ledger;
use ledgerclip::models::{RecurringRule, TxKind};

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn rule(id: i64, day: u32, start_month: &str) -> RecurringRule {
    RecurringRule {
        id,
        enabled: true,
        description: "Rent".to_string(),
        amount: dec("1500"),
        kind: TxKind::Expense,
        category: "Housing".to_string(),
        day_of_month: day,
        start_month: start_month.to_string(),
        debt_account_id: None,
        asset_account_id: None,
    }
}

#[test]
fn projects_one_entry_per_rule_per_period() {
    let rules = vec![rule(1, 1, "2025-01"), rule(2, 15, "2025-01")];
    let out = project(&rules, "2025-03", &[]);
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].date, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
    assert_eq!(out[0].recurring_id, Some(1));
    assert_eq!(out[1].date, NaiveDate::from_ymd_opt(2025, 3, 15).unwrap());
    assert_eq!(out[1].description, "Rent");
    assert_eq!(out[1].amount, dec("1500"));
}

#[test]
fn day_clamps_to_the_months_length() {
    let rules = vec![rule(1, 31, "2025-01")];
    let feb = project(&rules, "2025-02", &[]);
    assert_eq!(feb[0].date, NaiveDate::from_ymd_opt(2025, 2, 28).unwrap());

    let leap = project(&rules, "2024-02", &[]);
    assert_eq!(leap[0].date, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());

    let april = project(&rules, "2025-04", &[]);
    assert_eq!(april[0].date, NaiveDate::from_ymd_opt(2025, 4, 30).unwrap());
}

#[test]
fn start_month_is_an_inclusive_lower_bound() {
    let rules = vec![rule(1, 1, "2025-03")];
    assert!(project(&rules, "2025-02", &[]).is_empty());
    assert_eq!(project(&rules, "2025-03", &[]).len(), 1);
    assert_eq!(project(&rules, "2025-04", &[]).len(), 1);
}

#[test]
fn disabled_rules_do_not_project() {
    let mut r = rule(1, 1, "2025-01");
    r.enabled = false;
    assert!(project(&[r], "2025-03", &[]).is_empty());
}

#[test]
fn projection_is_idempotent_per_period() {
    let mut conn = rusqlite::Connection::open_in_memory().unwrap();
    ledgerclip::db::init_schema(&mut conn).unwrap();
    let rules = vec![rule(1, 5, "2025-01")];
    conn.execute(
        "INSERT INTO recurring_rules(id, enabled, description, amount, kind, category, day_of_month, start_month)
         VALUES (1, 1, 'Rent', '1500', 'expense', 'Housing', 5, '2025-01')",
        [],
    )
    .unwrap();

    let first = project(&rules, "2025-03", &ledger::load(&conn).unwrap());
    assert_eq!(first.len(), 1);
    for t in &first {
        ledger::insert(&conn, t).unwrap();
    }

    let second = project(&rules, "2025-03", &ledger::load(&conn).unwrap());
    assert!(second.is_empty());

    // Other periods are unaffected.
    let other = project(&rules, "2025-04", &ledger::load(&conn).unwrap());
    assert_eq!(other.len(), 1);
}

#[test]
fn backfill_works_because_the_caller_picks_the_period() {
    let rules = vec![rule(1, 10, "2024-01")];
    let past = project(&rules, "2024-06", &[]);
    assert_eq!(past[0].date, NaiveDate::from_ymd_opt(2024, 6, 10).unwrap());
}

#[test]
fn account_link_copies_only_for_the_matching_family() {
    let mut r = rule(1, 1, "2025-01");
    r.kind = TxKind::DebtPayment;
    r.debt_account_id = Some(9);
    let out = project(&[r], "2025-03", &[]);
    assert_eq!(out[0].debt_account_id, Some(9));
    assert_eq!(out[0].asset_account_id, None);

    // A stale link on a non-debt rule is dropped at projection.
    let mut r2 = rule(2, 1, "2025-01");
    r2.debt_account_id = Some(9);
    let out2 = project(&[r2], "2025-03", &[]);
    assert_eq!(out2[0].debt_account_id, None);
}
