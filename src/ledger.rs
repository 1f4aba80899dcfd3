// Copyright (c) 2025 Ledgerclip Maintainers.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! The Ledger Store. Owns the write-side invariants: ids are assigned here at
//! acceptance and never change, amounts are stored non-negative, the legacy
//! kind alias never survives a write, and an account link is kept only when
//! the kind belongs to that family. Reads hand out full snapshots; every
//! derived number is recomputed from those, so edits and deletes need no
//! migration.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::engine::fingerprint::DedupIndex;
use crate::models::{
    AccountRole, AssetAccount, DebtAccount, FeedLink, IngestReport, NewTransaction, RecurringRule,
    SyncCursor, Transaction, TxKind,
};

fn parse_stored_decimal(s: &str, what: &str) -> Result<Decimal> {
    s.parse::<Decimal>()
        .with_context(|| format!("Invalid stored {} '{}'", what, s))
}

fn parse_stored_kind(s: &str) -> Result<TxKind> {
    TxKind::parse(s).with_context(|| format!("Invalid stored kind '{}'", s))
}

pub fn load(conn: &Connection) -> Result<Vec<Transaction>> {
    let mut stmt = conn.prepare(
        "SELECT id, date, description, amount, kind, category, debt_account_id,
                asset_account_id, recurring_id, external_id, source
         FROM transactions ORDER BY date, id",
    )?;
    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(r) = rows.next()? {
        let date_s: String = r.get(1)?;
        let amount_s: String = r.get(3)?;
        let kind_s: String = r.get(4)?;
        out.push(Transaction {
            id: r.get(0)?,
            date: NaiveDate::parse_from_str(&date_s, "%Y-%m-%d")
                .with_context(|| format!("Invalid stored date '{}'", date_s))?,
            description: r.get(2)?,
            amount: parse_stored_decimal(&amount_s, "amount")?,
            kind: parse_stored_kind(&kind_s)?,
            category: r.get(5)?,
            debt_account_id: r.get(6)?,
            asset_account_id: r.get(7)?,
            recurring_id: r.get(8)?,
            external_id: r.get(9)?,
            source: r.get(10)?,
        });
    }
    Ok(out)
}

/// Fold a candidate into the stored shape: absolute amount, defaulted
/// category, and account links only for the matching kind family.
fn normalized(c: &NewTransaction) -> NewTransaction {
    let mut t = c.clone();
    t.amount = t.amount.abs();
    t.description = t.description.trim().to_string();
    t.category = {
        let c = t.category.trim();
        if c.is_empty() {
            "Uncategorized".to_string()
        } else {
            c.to_string()
        }
    };
    if !t.kind.is_debt() {
        t.debt_account_id = None;
    }
    if !t.kind.is_asset() {
        t.asset_account_id = None;
    }
    t
}

pub fn insert(conn: &Connection, candidate: &NewTransaction) -> Result<i64> {
    let t = normalized(candidate);
    conn.execute(
        "INSERT INTO transactions(date, description, amount, kind, category,
            debt_account_id, asset_account_id, recurring_id, external_id, source)
         VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10)",
        params![
            t.date.format("%Y-%m-%d").to_string(),
            t.description,
            t.amount.to_string(),
            t.kind.as_str(),
            t.category,
            t.debt_account_id,
            t.asset_account_id,
            t.recurring_id,
            t.external_id,
            t.source,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Append a batch through the Deduplicator: candidates are checked against
/// the current ledger snapshot and against earlier entries of the same batch,
/// inside one sqlite transaction. Duplicates are counted, never errors.
pub fn append_batch(conn: &mut Connection, candidates: &[NewTransaction]) -> Result<IngestReport> {
    let snapshot = load(conn)?;
    let mut index = DedupIndex::from_ledger(&snapshot);
    let mut report = IngestReport::default();

    let tx = conn.transaction()?;
    for c in candidates {
        let c = normalized(c);
        if index.is_duplicate(&c) {
            report.duplicates += 1;
            continue;
        }
        tx.execute(
            "INSERT INTO transactions(date, description, amount, kind, category,
                debt_account_id, asset_account_id, recurring_id, external_id, source)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10)",
            params![
                c.date.format("%Y-%m-%d").to_string(),
                c.description,
                c.amount.to_string(),
                c.kind.as_str(),
                c.category,
                c.debt_account_id,
                c.asset_account_id,
                c.recurring_id,
                c.external_id,
                c.source,
            ],
        )?;
        index.insert(&c);
        report.added += 1;
    }
    tx.commit()?;
    Ok(report)
}

#[derive(Debug, Default)]
pub struct TransactionEdit {
    pub date: Option<NaiveDate>,
    pub description: Option<String>,
    pub amount: Option<Decimal>,
    pub kind: Option<TxKind>,
    pub category: Option<String>,
}

/// Edit an accepted entry in place. The id, provenance, and rule link are
/// immutable; changing the kind re-applies link coherence.
pub fn update_transaction(conn: &Connection, id: i64, edit: &TransactionEdit) -> Result<bool> {
    let existing: Option<(String, String, String, String, String)> = conn
        .query_row(
            "SELECT date, description, amount, kind, category FROM transactions WHERE id=?1",
            params![id],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?)),
        )
        .optional()?;
    let Some((date_s, description, amount_s, kind_s, category)) = existing else {
        return Ok(false);
    };

    let date = edit.date.unwrap_or(
        NaiveDate::parse_from_str(&date_s, "%Y-%m-%d")
            .with_context(|| format!("Invalid stored date '{}'", date_s))?,
    );
    let description = edit.description.clone().unwrap_or(description);
    let amount = edit
        .amount
        .map(|a| a.abs())
        .map(Ok)
        .unwrap_or_else(|| parse_stored_decimal(&amount_s, "amount"))?;
    let kind = edit
        .kind
        .map(Ok)
        .unwrap_or_else(|| parse_stored_kind(&kind_s))?;
    let category = edit.category.clone().unwrap_or(category);

    conn.execute(
        "UPDATE transactions SET date=?1, description=?2, amount=?3, kind=?4, category=?5,
            debt_account_id = CASE WHEN ?6 THEN debt_account_id ELSE NULL END,
            asset_account_id = CASE WHEN ?7 THEN asset_account_id ELSE NULL END
         WHERE id=?8",
        params![
            date.format("%Y-%m-%d").to_string(),
            description.trim(),
            amount.to_string(),
            kind.as_str(),
            category.trim(),
            kind.is_debt(),
            kind.is_asset(),
            id,
        ],
    )?;
    Ok(true)
}

pub fn delete_transaction(conn: &Connection, id: i64) -> Result<bool> {
    let n = conn.execute("DELETE FROM transactions WHERE id=?1", params![id])?;
    Ok(n > 0)
}

// ---- accounts ----

pub fn add_debt_account(conn: &Connection, name: &str, starting: Decimal) -> Result<i64> {
    conn.execute(
        "INSERT INTO debt_accounts(name, starting_balance) VALUES (?1,?2)",
        params![name.trim(), starting.to_string()],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn add_asset_account(conn: &Connection, name: &str, starting: Decimal) -> Result<i64> {
    conn.execute(
        "INSERT INTO asset_accounts(name, starting_balance) VALUES (?1,?2)",
        params![name.trim(), starting.to_string()],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn debt_accounts(conn: &Connection) -> Result<Vec<DebtAccount>> {
    let mut stmt =
        conn.prepare("SELECT id, name, starting_balance FROM debt_accounts ORDER BY name")?;
    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(r) = rows.next()? {
        let bal: String = r.get(2)?;
        out.push(DebtAccount {
            id: r.get(0)?,
            name: r.get(1)?,
            starting_balance: parse_stored_decimal(&bal, "starting balance")?,
        });
    }
    Ok(out)
}

pub fn asset_accounts(conn: &Connection) -> Result<Vec<AssetAccount>> {
    let mut stmt =
        conn.prepare("SELECT id, name, starting_balance FROM asset_accounts ORDER BY name")?;
    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(r) = rows.next()? {
        let bal: String = r.get(2)?;
        out.push(AssetAccount {
            id: r.get(0)?,
            name: r.get(1)?,
            starting_balance: parse_stored_decimal(&bal, "starting balance")?,
        });
    }
    Ok(out)
}

pub fn debt_account_by_name(conn: &Connection, name: &str) -> Result<DebtAccount> {
    let (id, bal): (i64, String) = conn
        .query_row(
            "SELECT id, starting_balance FROM debt_accounts WHERE name=?1",
            params![name],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .with_context(|| format!("Debt account '{}' not found", name))?;
    Ok(DebtAccount {
        id,
        name: name.to_string(),
        starting_balance: parse_stored_decimal(&bal, "starting balance")?,
    })
}

pub fn asset_account_by_name(conn: &Connection, name: &str) -> Result<AssetAccount> {
    let (id, bal): (i64, String) = conn
        .query_row(
            "SELECT id, starting_balance FROM asset_accounts WHERE name=?1",
            params![name],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .with_context(|| format!("Asset account '{}' not found", name))?;
    Ok(AssetAccount {
        id,
        name: name.to_string(),
        starting_balance: parse_stored_decimal(&bal, "starting balance")?,
    })
}

/// Removing an account unlinks its history (FK `ON DELETE SET NULL`), it
/// never deletes transactions or rules.
pub fn remove_debt_account(conn: &Connection, name: &str) -> Result<bool> {
    let n = conn.execute("DELETE FROM debt_accounts WHERE name=?1", params![name])?;
    Ok(n > 0)
}

pub fn remove_asset_account(conn: &Connection, name: &str) -> Result<bool> {
    let n = conn.execute("DELETE FROM asset_accounts WHERE name=?1", params![name])?;
    Ok(n > 0)
}

// ---- recurring rules ----

pub fn add_rule(conn: &Connection, rule: &RecurringRule) -> Result<i64> {
    conn.execute(
        "INSERT INTO recurring_rules(enabled, description, amount, kind, category,
            day_of_month, start_month, debt_account_id, asset_account_id)
         VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9)",
        params![
            rule.enabled,
            rule.description.trim(),
            rule.amount.to_string(),
            rule.kind.as_str(),
            rule.category.trim(),
            rule.day_of_month,
            rule.start_month,
            rule.debt_account_id,
            rule.asset_account_id,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn rules(conn: &Connection) -> Result<Vec<RecurringRule>> {
    let mut stmt = conn.prepare(
        "SELECT id, enabled, description, amount, kind, category, day_of_month,
                start_month, debt_account_id, asset_account_id
         FROM recurring_rules ORDER BY id",
    )?;
    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(r) = rows.next()? {
        let amount_s: String = r.get(3)?;
        let kind_s: String = r.get(4)?;
        out.push(RecurringRule {
            id: r.get(0)?,
            enabled: r.get(1)?,
            description: r.get(2)?,
            amount: parse_stored_decimal(&amount_s, "rule amount")?,
            kind: parse_stored_kind(&kind_s)?,
            category: r.get(5)?,
            day_of_month: r.get(6)?,
            start_month: r.get(7)?,
            debt_account_id: r.get(8)?,
            asset_account_id: r.get(9)?,
        });
    }
    Ok(out)
}

pub fn set_rule_enabled(conn: &Connection, id: i64, enabled: bool) -> Result<bool> {
    let n = conn.execute(
        "UPDATE recurring_rules SET enabled=?1 WHERE id=?2",
        params![enabled, id],
    )?;
    Ok(n > 0)
}

pub fn remove_rule(conn: &Connection, id: i64) -> Result<bool> {
    let n = conn.execute("DELETE FROM recurring_rules WHERE id=?1", params![id])?;
    Ok(n > 0)
}

// ---- category budgets ----

pub fn budgets(conn: &Connection) -> Result<BTreeMap<String, Decimal>> {
    let mut stmt = conn.prepare("SELECT category, monthly_limit FROM category_budgets")?;
    let mut rows = stmt.query([])?;
    let mut out = BTreeMap::new();
    while let Some(r) = rows.next()? {
        let cat: String = r.get(0)?;
        let lim: String = r.get(1)?;
        out.insert(cat, parse_stored_decimal(&lim, "budget limit")?);
    }
    Ok(out)
}

pub fn set_budget(conn: &Connection, category: &str, monthly_limit: Decimal) -> Result<()> {
    conn.execute(
        "INSERT INTO category_budgets(category, monthly_limit) VALUES (?1,?2)
         ON CONFLICT(category) DO UPDATE SET monthly_limit=excluded.monthly_limit",
        params![category.trim(), monthly_limit.to_string()],
    )?;
    Ok(())
}

pub fn remove_budget(conn: &Connection, category: &str) -> Result<bool> {
    let n = conn.execute(
        "DELETE FROM category_budgets WHERE category=?1",
        params![category],
    )?;
    Ok(n > 0)
}

// ---- sync cursor & feed links ----

fn setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    let v: Option<String> = conn
        .query_row("SELECT value FROM settings WHERE key=?1", params![key], |r| {
            r.get(0)
        })
        .optional()?;
    Ok(v)
}

fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, value],
    )?;
    Ok(())
}

pub fn cursor(conn: &Connection) -> Result<Option<SyncCursor>> {
    let Some(access_url) = setting(conn, "feed_access_url")? else {
        return Ok(None);
    };
    let last_sync_epoch = setting(conn, "feed_last_sync")?
        .map(|s| {
            s.parse::<i64>()
                .with_context(|| format!("Invalid stored sync epoch '{}'", s))
        })
        .transpose()?;
    Ok(Some(SyncCursor {
        access_url,
        last_sync_epoch,
    }))
}

/// Storing a new credential is a new trust boundary: any prior incremental
/// state is reset along with it.
pub fn set_access_credential(conn: &Connection, access_url: &str) -> Result<()> {
    set_setting(conn, "feed_access_url", access_url)?;
    conn.execute("DELETE FROM settings WHERE key='feed_last_sync'", [])?;
    Ok(())
}

pub fn advance_cursor(conn: &Connection, epoch: i64) -> Result<()> {
    set_setting(conn, "feed_last_sync", &epoch.to_string())
}

pub fn clear_feed(conn: &Connection) -> Result<()> {
    conn.execute(
        "DELETE FROM settings WHERE key IN ('feed_access_url','feed_last_sync')",
        [],
    )?;
    Ok(())
}

pub fn feed_links(conn: &Connection) -> Result<Vec<FeedLink>> {
    let mut stmt =
        conn.prepare("SELECT feed_account_id, role, local_id FROM feed_links ORDER BY feed_account_id")?;
    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(r) = rows.next()? {
        let role_s: String = r.get(1)?;
        let role = AccountRole::parse(&role_s)
            .with_context(|| format!("Invalid stored feed role '{}'", role_s))?;
        out.push(FeedLink {
            feed_account_id: r.get(0)?,
            role,
            local_id: r.get(2)?,
        });
    }
    Ok(out)
}

pub fn set_feed_link(
    conn: &Connection,
    feed_account_id: &str,
    role: AccountRole,
    local_id: i64,
) -> Result<()> {
    conn.execute(
        "INSERT INTO feed_links(feed_account_id, role, local_id) VALUES (?1,?2,?3)
         ON CONFLICT(feed_account_id) DO UPDATE SET role=excluded.role, local_id=excluded.local_id",
        params![feed_account_id, role.as_str(), local_id],
    )?;
    Ok(())
}

pub fn remove_feed_link(conn: &Connection, feed_account_id: &str) -> Result<bool> {
    let n = conn.execute(
        "DELETE FROM feed_links WHERE feed_account_id=?1",
        params![feed_account_id],
    )?;
    Ok(n > 0)
}

/// Daily feed request accounting. The value rolls over with the day key, so
/// yesterday's usage never counts against today.
pub fn requests_used_today(conn: &Connection, day: &str) -> Result<usize> {
    match setting(conn, "feed_requests")? {
        Some(v) => {
            let (d, n) = v.split_once(':').unwrap_or(("", "0"));
            if d == day {
                Ok(n.parse::<usize>().unwrap_or(0))
            } else {
                Ok(0)
            }
        }
        None => Ok(0),
    }
}

pub fn charge_requests(conn: &Connection, day: &str, n: usize) -> Result<()> {
    let used = requests_used_today(conn, day)?;
    set_setting(conn, "feed_requests", &format!("{}:{}", day, used + n))
}
