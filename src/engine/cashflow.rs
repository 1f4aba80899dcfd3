// Copyright (c) 2025 Ledgerclip Maintainers.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashSet};

use crate::models::{CashflowSummary, CategoryOverspend, Period, Transaction, TxKind};

// Description heuristic for internal transfers. Substring-based and known to
// be imperfect on odd descriptions; it only excludes expense rows from spend.
static TRANSFER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)transfer\s+(to|from)").unwrap());

pub fn is_transfer(description: &str) -> bool {
    TRANSFER_RE.is_match(description)
}

/// Period-scoped cashflow and budget health, recomputed from scratch on every
/// call. `budgets` maps category to its monthly limit; limits scale by 12 for
/// yearly periods. `top_n` bounds the overspend list.
pub fn aggregate(
    ledger: &[Transaction],
    period: &Period,
    budgets: &BTreeMap<String, Decimal>,
    top_n: usize,
) -> CashflowSummary {
    let in_period: Vec<&Transaction> = ledger.iter().filter(|t| period.contains(t.date)).collect();

    // Debt accounts that were charged this period: payments toward them are
    // left out of cash_left, otherwise a credit-card purchase counts once as
    // spend and again as the payment that covers it.
    let charged_accounts: HashSet<i64> = in_period
        .iter()
        .filter(|t| t.kind == TxKind::DebtCharge)
        .filter_map(|t| t.debt_account_id)
        .collect();

    let mut income = Decimal::ZERO;
    let mut spend = Decimal::ZERO;
    let mut debt_payments = Decimal::ZERO;
    let mut counted_payments = Decimal::ZERO;
    let mut savings = Decimal::ZERO;
    let mut by_category: BTreeMap<String, Decimal> = BTreeMap::new();

    for t in &in_period {
        match t.kind {
            TxKind::Income => income += t.amount,
            TxKind::Expense => {
                if is_transfer(&t.description) {
                    continue;
                }
                spend += t.amount;
                *by_category.entry(t.category.clone()).or_default() += t.amount;
            }
            TxKind::DebtCharge | TxKind::DebtInterest => {
                spend += t.amount;
                *by_category.entry(t.category.clone()).or_default() += t.amount;
            }
            TxKind::DebtPayment => {
                debt_payments += t.amount;
                let excluded = t
                    .debt_account_id
                    .map(|id| charged_accounts.contains(&id))
                    .unwrap_or(false);
                if !excluded {
                    counted_payments += t.amount;
                }
            }
            TxKind::AssetDeposit => savings += t.amount,
            TxKind::AssetGrowth => {}
        }
    }

    let cash_left = income - (spend + savings + counted_payments);
    let (savings_rate, debt_payoff_rate) = if income.is_zero() {
        (Decimal::ZERO, Decimal::ZERO)
    } else {
        (savings / income, debt_payments / income)
    };

    let factor = period.budget_factor();
    let mut overspent: Vec<CategoryOverspend> = by_category
        .into_iter()
        .filter_map(|(category, actual)| {
            let limit = budgets.get(&category)? * factor;
            let over = actual - limit;
            (over > Decimal::ZERO).then_some(CategoryOverspend {
                category,
                budget: limit,
                actual,
                over,
            })
        })
        .collect();
    overspent.sort_by(|a, b| b.over.cmp(&a.over));
    overspent.truncate(top_n);

    CashflowSummary {
        income,
        spend,
        debt_payments,
        savings,
        cash_left,
        savings_rate,
        debt_payoff_rate,
        overspent,
    }
}
