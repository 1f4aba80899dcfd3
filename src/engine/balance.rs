// Copyright (c) 2025 Ledgerclip Maintainers.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;

use crate::models::{AssetAccount, AssetBalance, DebtAccount, DebtBalance, Transaction, TxKind};

/// Current debt position, derived from the starting balance and linked
/// history on every read. Nothing is cached, so editing or deleting old
/// entries needs no migration. An account with no linked entries comes back
/// at exactly its starting balance.
pub fn debt_balance(account: &DebtAccount, ledger: &[Transaction]) -> DebtBalance {
    let mut payments = Decimal::ZERO;
    let mut interest = Decimal::ZERO;
    let mut charges = Decimal::ZERO;
    for t in ledger {
        if t.debt_account_id != Some(account.id) {
            continue;
        }
        match t.kind {
            TxKind::DebtPayment => payments += t.amount,
            TxKind::DebtInterest => interest += t.amount,
            TxKind::DebtCharge => charges += t.amount,
            _ => {}
        }
    }
    DebtBalance {
        current: account.starting_balance + charges - payments + interest,
        payments,
        interest,
        charges,
    }
}

pub fn asset_balance(account: &AssetAccount, ledger: &[Transaction]) -> AssetBalance {
    let mut deposits = Decimal::ZERO;
    let mut growth = Decimal::ZERO;
    for t in ledger {
        if t.asset_account_id != Some(account.id) {
            continue;
        }
        match t.kind {
            TxKind::AssetDeposit => deposits += t.amount,
            TxKind::AssetGrowth => growth += t.amount,
            _ => {}
        }
    }
    AssetBalance {
        current: account.starting_balance + deposits + growth,
        deposits,
        growth,
    }
}

/// "Paid off" is a display interpretation, not stored state.
pub fn is_paid_off(balance: &DebtBalance) -> bool {
    balance.current <= Decimal::ZERO
}
