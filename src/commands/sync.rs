// Copyright (c) 2025 Ledgerclip Maintainers.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use rusqlite::Connection;

use crate::engine::sync::{DAILY_REQUEST_CAP, OVERLAP_DAYS, SPAN_CAP_DAYS, plan_windows, run_round};
use crate::feed::SimplefinFeed;
use crate::ledger;
use crate::models::AccountRole;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("connect", sub)) => connect(conn, sub)?,
        Some(("disconnect", _)) => {
            ledger::clear_feed(conn)?;
            println!("Disconnected from feed (cursor cleared)");
        }
        Some(("status", _)) => status(conn)?,
        Some(("link", sub)) => link(conn, sub)?,
        Some(("unlink", sub)) => {
            let feed_account = sub.get_one::<String>("feed-account").unwrap();
            if ledger::remove_feed_link(conn, feed_account)? {
                println!("Unlinked feed account '{}'", feed_account);
            } else {
                println!("No link for feed account '{}'", feed_account);
            }
        }
        Some(("run", sub)) => run(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn connect(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let token = sub.get_one::<String>("token").unwrap();
    let access_url = SimplefinFeed
        .claim(token)
        .context("Claim feed setup token")?;
    // A fresh credential is a fresh trust boundary; incremental state resets.
    ledger::set_access_credential(conn, &access_url)?;
    println!("Connected to feed");
    Ok(())
}

fn status(conn: &Connection) -> Result<()> {
    match ledger::cursor(conn)? {
        None => println!("Not connected"),
        Some(cursor) => match cursor.last_sync_epoch {
            None => println!("Connected, never synced"),
            Some(epoch) => {
                let when = DateTime::from_timestamp(epoch, 0)
                    .map(|d| d.to_rfc3339())
                    .unwrap_or_else(|| epoch.to_string());
                println!("Connected, last synced {}", when);
            }
        },
    }
    Ok(())
}

fn link(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let feed_account = sub.get_one::<String>("feed-account").unwrap();
    let (role, local_id) = match (sub.get_one::<String>("debt"), sub.get_one::<String>("asset")) {
        (Some(name), None) => (
            AccountRole::Debt,
            ledger::debt_account_by_name(conn, name.trim())?.id,
        ),
        (None, Some(name)) => (
            AccountRole::Asset,
            ledger::asset_account_by_name(conn, name.trim())?.id,
        ),
        _ => return Err(anyhow!("Pass exactly one of --debt or --asset")),
    };
    ledger::set_feed_link(conn, feed_account, role, local_id)?;
    println!(
        "Linked feed account '{}' as {} account",
        feed_account,
        role.as_str()
    );
    Ok(())
}

fn run(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let days = *sub.get_one::<i64>("days").unwrap();
    let cursor = ledger::cursor(conn)?
        .ok_or_else(|| anyhow!("Not connected; run `sync connect --token <setup-token>` first"))?;

    let now = Utc::now();
    let now_epoch = now.timestamp();
    let today = now.date_naive().format("%Y-%m-%d").to_string();
    let used = ledger::requests_used_today(conn, &today)?;
    let remaining = DAILY_REQUEST_CAP.saturating_sub(used);

    let plan = plan_windows(
        days,
        now_epoch,
        cursor.last_sync_epoch,
        SPAN_CAP_DAYS,
        OVERLAP_DAYS,
        remaining,
    )?;
    // Charged up front: a round that dies halfway must not make a retry able
    // to blow through the daily quota.
    ledger::charge_requests(conn, &today, plan.windows.len())?;

    let snapshot = ledger::load(conn)?;
    let links = ledger::feed_links(conn)?;
    let outcome = run_round(
        &SimplefinFeed,
        &cursor.access_url,
        &plan,
        &snapshot,
        &links,
        now_epoch,
    )?;

    let report = ledger::append_batch(conn, &outcome.accepted)?;
    // Cursor moves to request time, not data time, and only after the whole
    // round landed.
    ledger::advance_cursor(conn, now_epoch)?;

    println!(
        "Synced {} window(s) ({} mode): {} new, {} duplicate(s) skipped",
        outcome.windows_fetched,
        if plan.incremental { "incremental" } else { "backfill" },
        report.added,
        report.duplicates + outcome.duplicates,
    );
    Ok(())
}
