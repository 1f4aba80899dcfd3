// Copyright (c) 2025 Ledgerclip Maintainers.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use ledgerclip::engine::cashflow::{aggregate, is_transfer};
use ledgerclip::models::{Period, Transaction, TxKind};

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn tx(date: &str, kind: TxKind, amount: &str, category: &str, desc: &str) -> Transaction {
    Transaction {
        id: 0,
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        description: desc.to_string(),
        amount: dec(amount),
        kind,
        category: category.to_string(),
        debt_account_id: None,
        asset_account_id: None,
        recurring_id: None,
        external_id: None,
        source: None,
    }
}

#[test]
fn month_filter_is_a_prefix_match() {
    let ledger = vec![
        tx("2025-05-01", TxKind::Income, "100", "Salary", "pay"),
        tx("2025-06-01", TxKind::Income, "999", "Salary", "pay"),
    ];
    let s = aggregate(
        &ledger,
        &Period::Month("2025-05".to_string()),
        &BTreeMap::new(),
        5,
    );
    assert_eq!(s.income, dec("100"));
}

#[test]
fn spend_includes_debt_charges_and_interest() {
    let mut charge = tx("2025-05-03", TxKind::DebtCharge, "80", "Dining", "card dinner");
    charge.debt_account_id = Some(1);
    let mut interest = tx("2025-05-28", TxKind::DebtInterest, "12", "Interest", "apr");
    interest.debt_account_id = Some(1);
    let ledger = vec![
        tx("2025-05-01", TxKind::Income, "2000", "Salary", "pay"),
        tx("2025-05-02", TxKind::Expense, "300", "Groceries", "food"),
        charge,
        interest,
    ];
    let s = aggregate(
        &ledger,
        &Period::Month("2025-05".to_string()),
        &BTreeMap::new(),
        5,
    );
    assert_eq!(s.spend, dec("392"));
}

#[test]
fn transfers_are_excluded_from_spend() {
    let ledger = vec![
        tx("2025-05-01", TxKind::Income, "2000", "Salary", "pay"),
        tx("2025-05-02", TxKind::Expense, "500", "Transfers", "Transfer to savings"),
        tx("2025-05-03", TxKind::Expense, "500", "Transfers", "TRANSFER FROM checking"),
        tx("2025-05-04", TxKind::Expense, "40", "Dining", "dinner"),
    ];
    let s = aggregate(
        &ledger,
        &Period::Month("2025-05".to_string()),
        &BTreeMap::new(),
        5,
    );
    assert_eq!(s.spend, dec("40"));
    assert!(is_transfer("Transfer to savings"));
    assert!(!is_transfer("wire transfer fee"));
}

#[test]
fn payments_to_charged_accounts_are_not_double_counted_in_cash_left() {
    // Card 1 got charged this month; paying it down is covering spend that
    // was already counted, so the payment stays out of cash_left. The loan
    // payment (account 2, no charges) is a true outflow.
    let mut charge = tx("2025-05-03", TxKind::DebtCharge, "80", "Dining", "card dinner");
    charge.debt_account_id = Some(1);
    let mut card_payment = tx("2025-05-20", TxKind::DebtPayment, "80", "Card", "payment");
    card_payment.debt_account_id = Some(1);
    let mut loan_payment = tx("2025-05-21", TxKind::DebtPayment, "200", "Loan", "payment");
    loan_payment.debt_account_id = Some(2);
    let ledger = vec![
        tx("2025-05-01", TxKind::Income, "2000", "Salary", "pay"),
        charge,
        card_payment,
        loan_payment,
    ];
    let s = aggregate(
        &ledger,
        &Period::Month("2025-05".to_string()),
        &BTreeMap::new(),
        5,
    );
    assert_eq!(s.debt_payments, dec("280"));
    // cash_left = 2000 - (80 spend + 0 savings + 200 counted payments)
    assert_eq!(s.cash_left, dec("1720"));
}

#[test]
fn rates_are_zero_when_income_is_zero() {
    let ledger = vec![
        tx("2025-05-02", TxKind::AssetDeposit, "100", "Savings", "stash"),
        tx("2025-05-03", TxKind::DebtPayment, "50", "Loan", "payment"),
    ];
    let s = aggregate(
        &ledger,
        &Period::Month("2025-05".to_string()),
        &BTreeMap::new(),
        5,
    );
    assert_eq!(s.savings_rate, Decimal::ZERO);
    assert_eq!(s.debt_payoff_rate, Decimal::ZERO);
}

#[test]
fn savings_and_rates() {
    let ledger = vec![
        tx("2025-05-01", TxKind::Income, "2000", "Salary", "pay"),
        tx("2025-05-02", TxKind::AssetDeposit, "300", "Savings", "stash"),
        tx("2025-05-03", TxKind::DebtPayment, "500", "Loan", "payment"),
        tx("2025-05-04", TxKind::AssetGrowth, "50", "Savings", "interest"),
    ];
    let s = aggregate(
        &ledger,
        &Period::Month("2025-05".to_string()),
        &BTreeMap::new(),
        5,
    );
    assert_eq!(s.savings, dec("300")); // growth is not savings inflow
    assert_eq!(s.savings_rate, dec("0.15"));
    assert_eq!(s.debt_payoff_rate, dec("0.25"));
    assert_eq!(s.cash_left, dec("1200"));
}

#[test]
fn overspend_is_sorted_and_truncated() {
    let mut budgets = BTreeMap::new();
    budgets.insert("Dining".to_string(), dec("100"));
    budgets.insert("Groceries".to_string(), dec("200"));
    budgets.insert("Fuel".to_string(), dec("50"));
    budgets.insert("Fun".to_string(), dec("400"));
    let ledger = vec![
        tx("2025-05-01", TxKind::Expense, "180", "Dining", "a"), // over by 80
        tx("2025-05-02", TxKind::Expense, "210", "Groceries", "b"), // over by 10
        tx("2025-05-03", TxKind::Expense, "95", "Fuel", "c"),    // over by 45
        tx("2025-05-04", TxKind::Expense, "100", "Fun", "d"),    // under
        tx("2025-05-05", TxKind::Expense, "30", "Unbudgeted", "e"), // no limit set
    ];
    let s = aggregate(
        &ledger,
        &Period::Month("2025-05".to_string()),
        &budgets,
        2,
    );
    assert_eq!(s.overspent.len(), 2);
    assert_eq!(s.overspent[0].category, "Dining");
    assert_eq!(s.overspent[0].over, dec("80"));
    assert_eq!(s.overspent[1].category, "Fuel");
    assert_eq!(s.overspent[1].over, dec("45"));
}

#[test]
fn yearly_period_scales_budgets_by_twelve() {
    let mut budgets = BTreeMap::new();
    budgets.insert("Dining".to_string(), dec("100"));
    let ledger = vec![
        tx("2025-02-01", TxKind::Expense, "600", "Dining", "a"),
        tx("2025-09-01", TxKind::Expense, "650", "Dining", "b"),
    ];
    let s = aggregate(&ledger, &Period::Year("2025".to_string()), &budgets, 5);
    assert_eq!(s.overspent.len(), 1);
    assert_eq!(s.overspent[0].budget, dec("1200"));
    assert_eq!(s.overspent[0].over, dec("50"));
}
