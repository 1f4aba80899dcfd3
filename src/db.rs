// Copyright (c) 2025 Ledgerclip Maintainers.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::Connection;
use std::fs;
use std::path::PathBuf;

static APP: Lazy<(&str, &str, &str)> = Lazy::new(|| ("io.ledgerclip", "Ledgerclip", "ledgerclip"));

pub fn db_path() -> Result<PathBuf> {
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("ledgerclip.sqlite"))
}

pub fn open_or_init() -> Result<Connection> {
    let path = db_path()?;
    let mut conn =
        Connection::open(&path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&mut conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS debt_accounts(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        starting_balance TEXT NOT NULL DEFAULT '0',
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE IF NOT EXISTS asset_accounts(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        starting_balance TEXT NOT NULL DEFAULT '0',
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE IF NOT EXISTS recurring_rules(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        enabled INTEGER NOT NULL DEFAULT 1,
        description TEXT NOT NULL,
        amount TEXT NOT NULL,
        kind TEXT NOT NULL,
        category TEXT NOT NULL DEFAULT 'Uncategorized',
        day_of_month INTEGER NOT NULL CHECK(day_of_month BETWEEN 1 AND 31),
        start_month TEXT NOT NULL,
        debt_account_id INTEGER,
        asset_account_id INTEGER,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY(debt_account_id) REFERENCES debt_accounts(id) ON DELETE SET NULL,
        FOREIGN KEY(asset_account_id) REFERENCES asset_accounts(id) ON DELETE SET NULL
    );

    -- The ledger. ids are assigned here and only here; deleting an account
    -- unlinks history, it never deletes it.
    CREATE TABLE IF NOT EXISTS transactions(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        date TEXT NOT NULL,
        description TEXT NOT NULL,
        amount TEXT NOT NULL,
        kind TEXT NOT NULL,
        category TEXT NOT NULL DEFAULT 'Uncategorized',
        debt_account_id INTEGER,
        asset_account_id INTEGER,
        recurring_id INTEGER,
        external_id TEXT UNIQUE,
        source TEXT,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY(debt_account_id) REFERENCES debt_accounts(id) ON DELETE SET NULL,
        FOREIGN KEY(asset_account_id) REFERENCES asset_accounts(id) ON DELETE SET NULL,
        FOREIGN KEY(recurring_id) REFERENCES recurring_rules(id) ON DELETE SET NULL
    );
    CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date);

    CREATE TABLE IF NOT EXISTS category_budgets(
        category TEXT PRIMARY KEY,
        monthly_limit TEXT NOT NULL
    );

    -- Feed account to local account role mapping for the sync mapper.
    CREATE TABLE IF NOT EXISTS feed_links(
        feed_account_id TEXT PRIMARY KEY,
        role TEXT NOT NULL CHECK(role IN ('debt','asset')),
        local_id INTEGER NOT NULL
    );
    "#,
    )?;
    Ok(())
}
