// Copyright (c) 2025 Ledgerclip Maintainers.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Transaction kind. Sign is never stored on amounts; it is implied here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TxKind {
    Income,
    Expense,
    DebtPayment,
    DebtInterest,
    DebtCharge,
    AssetDeposit,
    AssetGrowth,
}

impl TxKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxKind::Income => "income",
            TxKind::Expense => "expense",
            TxKind::DebtPayment => "debt-payment",
            TxKind::DebtInterest => "debt-interest",
            TxKind::DebtCharge => "debt-charge",
            TxKind::AssetDeposit => "asset-deposit",
            TxKind::AssetGrowth => "asset-growth",
        }
    }

    /// Accepts the legacy alias `debt` (old exports used it for payments).
    /// The alias is normalized here and never written back out.
    pub fn parse(s: &str) -> Option<TxKind> {
        match s.trim().to_lowercase().as_str() {
            "income" => Some(TxKind::Income),
            "expense" => Some(TxKind::Expense),
            "debt-payment" | "debt" => Some(TxKind::DebtPayment),
            "debt-interest" => Some(TxKind::DebtInterest),
            "debt-charge" => Some(TxKind::DebtCharge),
            "asset-deposit" => Some(TxKind::AssetDeposit),
            "asset-growth" => Some(TxKind::AssetGrowth),
            _ => None,
        }
    }

    pub fn is_debt(&self) -> bool {
        matches!(
            self,
            TxKind::DebtPayment | TxKind::DebtInterest | TxKind::DebtCharge
        )
    }

    pub fn is_asset(&self) -> bool {
        matches!(self, TxKind::AssetDeposit | TxKind::AssetGrowth)
    }
}

impl std::fmt::Display for TxKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TxKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TxKind::parse(s).ok_or_else(|| format!("Unknown transaction kind '{}'", s))
    }
}

impl TryFrom<String> for TxKind {
    type Error = String;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<TxKind> for String {
    fn from(k: TxKind) -> String {
        k.as_str().to_string()
    }
}

/// An accepted ledger entry. `id` is assigned by the store at acceptance and
/// is immutable afterwards; `amount` is always non-negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub date: NaiveDate,
    pub description: String,
    pub amount: Decimal,
    pub kind: TxKind,
    pub category: String,
    pub debt_account_id: Option<i64>,
    pub asset_account_id: Option<i64>,
    pub recurring_id: Option<i64>,
    pub external_id: Option<String>,
    pub source: Option<String>,
}

/// A candidate produced by an ingestion adapter, the projector, or the feed
/// mapper. It has no id: only the store assigns ids, and only at acceptance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTransaction {
    pub date: NaiveDate,
    pub description: String,
    pub amount: Decimal,
    pub kind: TxKind,
    pub category: String,
    pub debt_account_id: Option<i64>,
    pub asset_account_id: Option<i64>,
    pub recurring_id: Option<i64>,
    pub external_id: Option<String>,
    pub source: Option<String>,
}

impl NewTransaction {
    pub fn new(date: NaiveDate, description: &str, amount: Decimal, kind: TxKind) -> Self {
        NewTransaction {
            date,
            description: description.to_string(),
            amount,
            kind,
            category: "Uncategorized".to_string(),
            debt_account_id: None,
            asset_account_id: None,
            recurring_id: None,
            external_id: None,
            source: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebtAccount {
    pub id: i64,
    pub name: String,
    pub starting_balance: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetAccount {
    pub id: i64,
    pub name: String,
    pub starting_balance: Decimal,
}

/// Derived debt position. Never stored; recomputed from ledger history.
#[derive(Debug, Clone, Serialize)]
pub struct DebtBalance {
    pub current: Decimal,
    pub payments: Decimal,
    pub interest: Decimal,
    pub charges: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssetBalance {
    pub current: Decimal,
    pub deposits: Decimal,
    pub growth: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringRule {
    pub id: i64,
    pub enabled: bool,
    pub description: String,
    pub amount: Decimal,
    pub kind: TxKind,
    pub category: String,
    /// 1-31, clamped to the actual days in the target month at projection.
    pub day_of_month: u32,
    /// YYYY-MM, inclusive lower bound for projection.
    pub start_month: String,
    pub debt_account_id: Option<i64>,
    pub asset_account_id: Option<i64>,
}

/// Reporting period: a month key (`YYYY-MM`) or a year key (`YYYY`).
/// Period membership is a prefix match on the ISO date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Period {
    Month(String),
    Year(String),
}

impl Period {
    pub fn prefix(&self) -> &str {
        match self {
            Period::Month(m) => m,
            Period::Year(y) => y,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.format("%Y-%m-%d")
            .to_string()
            .starts_with(self.prefix())
    }

    /// Monthly budgets scale by 12 when the period is a whole year.
    pub fn budget_factor(&self) -> Decimal {
        match self {
            Period::Month(_) => Decimal::ONE,
            Period::Year(_) => Decimal::from(12),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryOverspend {
    pub category: String,
    pub budget: Decimal,
    pub actual: Decimal,
    pub over: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct CashflowSummary {
    pub income: Decimal,
    pub spend: Decimal,
    pub debt_payments: Decimal,
    pub savings: Decimal,
    pub cash_left: Decimal,
    pub savings_rate: Decimal,
    pub debt_payoff_rate: Decimal,
    pub overspent: Vec<CategoryOverspend>,
}

/// Outcome of one batch through the store. Duplicates are a normal outcome,
/// surfaced as a count; rejects carry the per-record reason.
#[derive(Debug, Default, Serialize)]
pub struct IngestReport {
    pub added: usize,
    pub duplicates: usize,
    pub rejected: Vec<String>,
}

/// Sync progress for the connected feed. Cleared whenever the access
/// credential changes; advanced only after a fully successful round.
#[derive(Debug, Clone)]
pub struct SyncCursor {
    pub access_url: String,
    pub last_sync_epoch: Option<i64>,
}

/// Role a feed account has been mapped to by the user. Consulted by the sync
/// mapper, managed by `sync link`/`sync unlink`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountRole {
    Debt,
    Asset,
}

impl AccountRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountRole::Debt => "debt",
            AccountRole::Asset => "asset",
        }
    }

    pub fn parse(s: &str) -> Option<AccountRole> {
        match s {
            "debt" => Some(AccountRole::Debt),
            "asset" => Some(AccountRole::Asset),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FeedLink {
    pub feed_account_id: String,
    pub role: AccountRole,
    pub local_id: i64,
}
