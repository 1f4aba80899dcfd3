// Copyright (c) 2025 Ledgerclip Maintainers.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! CSV statement heuristics. Two passes: a known tabular layout (separate
//! income and debit columns) detected by header names, then a generic
//! keyword-mapped fallback. Either way, rows without a usable date are
//! skipped silently and amounts are cleaned before parsing. A budget
//! sub-table may ride along anywhere in the same file under its own header;
//! transaction parsing steps around it.

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use std::io::Read;

use crate::models::{NewTransaction, TxKind};
use crate::utils::{normalize_date, parse_loose_amount};

static LOAN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)loan|debt").unwrap());

#[derive(Debug, Default)]
pub struct StatementImport {
    pub transactions: Vec<NewTransaction>,
    pub budgets: Vec<(String, Decimal)>,
}

struct KnownLayout {
    header_row: usize,
    date: usize,
    description: Option<usize>,
    income: usize,
    debit: usize,
    category: Option<usize>,
}

struct GenericLayout {
    header_row: usize,
    date: usize,
    description: Option<usize>,
    amount: usize,
    kind: Option<usize>,
    category: Option<usize>,
}

struct BudgetLayout {
    header_row: usize,
    category: usize,
    limit: usize,
}

pub fn parse_statement<R: Read>(reader: R) -> Result<StatementImport> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);
    let mut rows: Vec<Vec<String>> = Vec::new();
    for rec in rdr.records() {
        let rec = rec.context("Read CSV record")?;
        rows.push(rec.iter().map(|c| c.trim().to_string()).collect());
    }

    let mut out = StatementImport::default();

    // Budget sub-table first, so transaction parsing can step around it.
    let budget_span = find_budget_header(&rows).map(|b| {
        let end = parse_budget_rows(&rows, &b, &mut out.budgets);
        (b.header_row, end)
    });
    let outside = |i: usize| budget_span.map_or(true, |(s, e)| i < s || i >= e);

    let tx_rows: Vec<(usize, &Vec<String>)> = rows
        .iter()
        .enumerate()
        .filter(|(i, _)| outside(*i))
        .collect();

    if let Some(layout) = find_known_layout(&tx_rows) {
        for &(i, row) in &tx_rows {
            if i > layout.header_row {
                parse_known_row(row, &layout, &mut out);
            }
        }
    } else if let Some(layout) = find_generic_layout(&tx_rows) {
        for &(i, row) in &tx_rows {
            if i > layout.header_row {
                parse_generic_row(row, &layout, &mut out);
            }
        }
    }

    Ok(out)
}

fn cell<'a>(row: &'a [String], idx: usize) -> &'a str {
    row.get(idx).map(String::as_str).unwrap_or("")
}

fn col_containing(row: &[String], needles: &[&str]) -> Option<usize> {
    row.iter().position(|c| {
        let lc = c.to_lowercase();
        needles.iter().any(|n| lc.contains(n))
    })
}

fn find_known_layout(rows: &[(usize, &Vec<String>)]) -> Option<KnownLayout> {
    for &(i, row) in rows {
        let date = col_containing(row, &["date"]);
        let income = col_containing(row, &["income", "credit"]);
        let debit = col_containing(row, &["debit", "expense", "withdrawal"]);
        if let (Some(date), Some(income), Some(debit)) = (date, income, debit) {
            return Some(KnownLayout {
                header_row: i,
                date,
                description: col_containing(row, &["desc", "payee", "merchant"]),
                income,
                debit,
                category: col_containing(row, &["cat"]),
            });
        }
    }
    None
}

fn parse_known_row(row: &[String], layout: &KnownLayout, out: &mut StatementImport) {
    // Rows without a date are junk (totals, blanks, notes): skip silently.
    let Some(date) = normalize_date(cell(row, layout.date)) else {
        return;
    };
    let income_raw = cell(row, layout.income);
    let debit_raw = cell(row, layout.debit);
    let category = layout
        .category
        .map(|c| cell(row, c))
        .filter(|c| !c.is_empty());

    // Which side is populated decides the kind.
    let (amount, kind) = if let Some(a) = parse_loose_amount(income_raw) {
        (a.abs(), TxKind::Income)
    } else if let Some(a) = parse_loose_amount(debit_raw) {
        let kind = match category {
            Some(c) if LOAN_RE.is_match(c) => TxKind::DebtPayment,
            _ => TxKind::Expense,
        };
        (a.abs(), kind)
    } else {
        return;
    };

    let description = layout
        .description
        .map(|c| cell(row, c))
        .filter(|d| !d.is_empty())
        .unwrap_or("(no description)");
    let mut t = NewTransaction::new(date, description, amount, kind);
    if let Some(c) = category {
        t.category = c.to_string();
    }
    out.transactions.push(t);
}

fn find_generic_layout(rows: &[(usize, &Vec<String>)]) -> Option<GenericLayout> {
    for &(i, row) in rows {
        let date = col_containing(row, &["date"]);
        let amount = col_containing(row, &["amount"]);
        let (Some(date), Some(amount)) = (date, amount) else {
            continue;
        };
        return Some(GenericLayout {
            header_row: i,
            date,
            description: col_containing(row, &["desc", "payee", "merchant"]),
            amount,
            kind: col_containing(row, &["type", "kind"]),
            category: col_containing(row, &["cat"]),
        });
    }
    None
}

fn parse_generic_row(row: &[String], layout: &GenericLayout, out: &mut StatementImport) {
    let Some(date) = normalize_date(cell(row, layout.date)) else {
        return;
    };
    let Some(amount) = parse_loose_amount(cell(row, layout.amount)) else {
        return;
    };
    // An explicit type column wins; otherwise the sign decides and is
    // folded into the kind.
    let kind = layout
        .kind
        .and_then(|c| TxKind::parse(cell(row, c)))
        .unwrap_or(if amount < Decimal::ZERO {
            TxKind::Expense
        } else {
            TxKind::Income
        });
    let description = layout
        .description
        .map(|c| cell(row, c))
        .filter(|d| !d.is_empty())
        .unwrap_or("(no description)");
    let mut t = NewTransaction::new(date, description, amount.abs(), kind);
    if let Some(c) = layout.category.map(|c| cell(row, c)).filter(|c| !c.is_empty()) {
        t.category = c.to_string();
    }
    out.transactions.push(t);
}

fn find_budget_header(rows: &[Vec<String>]) -> Option<BudgetLayout> {
    rows.iter().enumerate().find_map(|(i, row)| {
        let category = col_containing(row, &["category"])?;
        let limit = col_containing(row, &["budget"])?;
        Some(BudgetLayout {
            header_row: i,
            category,
            limit,
        })
    })
}

/// Collect budget rows under the header using the header's own column
/// positions. Returns the exclusive end of the block: the first row that no
/// longer looks like a budget line (blank, or the start of another table)
/// ends it, and that row stays available to the transaction passes.
fn parse_budget_rows(
    rows: &[Vec<String>],
    layout: &BudgetLayout,
    out: &mut Vec<(String, Decimal)>,
) -> usize {
    for (i, row) in rows.iter().enumerate().skip(layout.header_row + 1) {
        let name = cell(row, layout.category);
        let Some(limit) = parse_loose_amount(cell(row, layout.limit)) else {
            return i;
        };
        if name.is_empty() {
            return i;
        }
        out.push((name.to_string(), limit.abs()));
    }
    rows.len()
}
