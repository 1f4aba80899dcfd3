// Copyright (c) 2025 Ledgerclip Maintainers.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;

use crate::utils::pretty_table;

/// Invariant audit over the stored ledger. Everything here should be
/// unreachable through the store's write paths; rows mean a bug or a
/// hand-edited database.
pub fn handle(conn: &Connection) -> Result<()> {
    let mut rows = Vec::new();

    // 1) Amounts must be stored non-negative.
    let mut stmt = conn.prepare("SELECT id, amount FROM transactions WHERE amount LIKE '-%'")?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let id: i64 = r.get(0)?;
        let amount: String = r.get(1)?;
        rows.push(vec!["negative_amount".into(), format!("tx {} = {}", id, amount)]);
    }

    // 2) A transaction is debt-linked or asset-linked, never both.
    let mut stmt = conn.prepare(
        "SELECT id FROM transactions WHERE debt_account_id IS NOT NULL AND asset_account_id IS NOT NULL",
    )?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let id: i64 = r.get(0)?;
        rows.push(vec!["dual_account_link".into(), format!("tx {}", id)]);
    }

    // 3) Link only for the matching kind family.
    let mut stmt = conn.prepare(
        "SELECT id, kind FROM transactions
         WHERE (debt_account_id IS NOT NULL AND kind NOT IN ('debt-payment','debt-interest','debt-charge'))
            OR (asset_account_id IS NOT NULL AND kind NOT IN ('asset-deposit','asset-growth'))",
    )?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let id: i64 = r.get(0)?;
        let kind: String = r.get(1)?;
        rows.push(vec!["kind_link_mismatch".into(), format!("tx {} ({})", id, kind)]);
    }

    // 4) The legacy alias is read-compatible but must never be written.
    let mut stmt = conn.prepare("SELECT id FROM transactions WHERE kind='debt'")?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let id: i64 = r.get(0)?;
        rows.push(vec!["legacy_debt_kind".into(), format!("tx {}", id)]);
    }

    // 5) Unknown kinds.
    let mut stmt = conn.prepare(
        "SELECT id, kind FROM transactions WHERE kind NOT IN
         ('income','expense','debt','debt-payment','debt-interest','debt-charge','asset-deposit','asset-growth')",
    )?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let id: i64 = r.get(0)?;
        let kind: String = r.get(1)?;
        rows.push(vec!["unknown_kind".into(), format!("tx {} ({})", id, kind)]);
    }

    // 6) Links pointing at rows that no longer exist. Unreachable while the
    // schema's ON DELETE SET NULL is in force; catches hand-edited files.
    let mut stmt = conn.prepare(
        "SELECT id FROM transactions t
         WHERE (t.debt_account_id IS NOT NULL AND NOT EXISTS
                    (SELECT 1 FROM debt_accounts d WHERE d.id=t.debt_account_id))
            OR (t.asset_account_id IS NOT NULL AND NOT EXISTS
                    (SELECT 1 FROM asset_accounts a WHERE a.id=t.asset_account_id))
            OR (t.recurring_id IS NOT NULL AND NOT EXISTS
                    (SELECT 1 FROM recurring_rules r WHERE r.id=t.recurring_id))",
    )?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let id: i64 = r.get(0)?;
        rows.push(vec!["dangling_reference".into(), format!("tx {}", id)]);
    }

    // 7) Feed links pointing at accounts that no longer exist.
    let mut stmt = conn.prepare(
        "SELECT feed_account_id FROM feed_links f
         WHERE (f.role='debt' AND NOT EXISTS (SELECT 1 FROM debt_accounts d WHERE d.id=f.local_id))
            OR (f.role='asset' AND NOT EXISTS (SELECT 1 FROM asset_accounts a WHERE a.id=f.local_id))",
    )?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let feed: String = r.get(0)?;
        rows.push(vec!["dangling_feed_link".into(), feed]);
    }

    // 8) A sync cursor without a credential cannot have been advanced.
    let orphan_cursor: i64 = conn.query_row(
        "SELECT COUNT(*) FROM settings WHERE key='feed_last_sync'
         AND NOT EXISTS (SELECT 1 FROM settings WHERE key='feed_access_url')",
        [],
        |r| r.get(0),
    )?;
    if orphan_cursor > 0 {
        rows.push(vec!["cursor_without_credential".into(), "settings".into()]);
    }

    if rows.is_empty() {
        println!("doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
