// Copyright (c) 2025 Ledgerclip Maintainers.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Result, anyhow};
use rusqlite::Connection;
use serde::Serialize;

use crate::engine::recurring::project;
use crate::ledger;
use crate::models::{RecurringRule, TxKind};
use crate::utils::{maybe_print_json, parse_decimal, parse_month, pretty_table};

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("enable", sub)) => toggle(conn, sub, true)?,
        Some(("disable", sub)) => toggle(conn, sub, false)?,
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            if ledger::remove_rule(conn, id)? {
                println!("Removed rule {} (generated entries stay in the ledger)", id);
            } else {
                println!("No rule {}", id);
            }
        }
        Some(("apply", sub)) => apply(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let kind: TxKind = sub
        .get_one::<String>("kind")
        .unwrap()
        .parse()
        .map_err(|e: String| anyhow!(e))?;
    let debt_account_id = sub
        .get_one::<String>("debt")
        .map(|name| -> Result<i64> {
            if !kind.is_debt() {
                return Err(anyhow!("--debt requires a debt-* kind, got '{}'", kind));
            }
            Ok(ledger::debt_account_by_name(conn, name.trim())?.id)
        })
        .transpose()?;
    let asset_account_id = sub
        .get_one::<String>("asset")
        .map(|name| -> Result<i64> {
            if !kind.is_asset() {
                return Err(anyhow!("--asset requires an asset-* kind, got '{}'", kind));
            }
            Ok(ledger::asset_account_by_name(conn, name.trim())?.id)
        })
        .transpose()?;

    let rule = RecurringRule {
        id: 0, // assigned by the store
        enabled: true,
        description: sub.get_one::<String>("description").unwrap().clone(),
        amount: parse_decimal(sub.get_one::<String>("amount").unwrap())?.abs(),
        kind,
        category: sub
            .get_one::<String>("category")
            .cloned()
            .unwrap_or_else(|| "Uncategorized".to_string()),
        day_of_month: *sub.get_one::<u32>("day").unwrap(),
        start_month: parse_month(sub.get_one::<String>("start-month").unwrap())?,
        debt_account_id,
        asset_account_id,
    };
    let id = ledger::add_rule(conn, &rule)?;
    println!(
        "Added rule {}: '{}' {} {} on day {} from {}",
        id, rule.description, rule.kind, rule.amount, rule.day_of_month, rule.start_month
    );
    Ok(())
}

#[derive(Serialize)]
struct RuleRow {
    id: i64,
    enabled: bool,
    description: String,
    amount: String,
    kind: String,
    category: String,
    day: u32,
    start_month: String,
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let data: Vec<RuleRow> = ledger::rules(conn)?
        .into_iter()
        .map(|r| RuleRow {
            id: r.id,
            enabled: r.enabled,
            description: r.description,
            amount: format!("{:.2}", r.amount),
            kind: r.kind.as_str().to_string(),
            category: r.category,
            day: r.day_of_month,
            start_month: r.start_month,
        })
        .collect();
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .into_iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    if r.enabled { "on".into() } else { "off".into() },
                    r.description,
                    r.amount,
                    r.kind,
                    r.category,
                    r.day.to_string(),
                    r.start_month,
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Enabled", "Description", "Amount", "Kind", "Category", "Day", "From"],
                rows
            )
        );
    }
    Ok(())
}

fn toggle(conn: &Connection, sub: &clap::ArgMatches, enabled: bool) -> Result<()> {
    let id = *sub.get_one::<i64>("id").unwrap();
    if ledger::set_rule_enabled(conn, id, enabled)? {
        println!("Rule {} {}", id, if enabled { "enabled" } else { "disabled" });
    } else {
        println!("No rule {}", id);
    }
    Ok(())
}

/// Project rules for one month and append whatever is still missing. Safe to
/// run repeatedly: a rule that already produced an entry for the month is
/// skipped by the projector.
fn apply(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let month = parse_month(sub.get_one::<String>("month").unwrap())?;
    let rules = ledger::rules(conn)?;
    let snapshot = ledger::load(conn)?;
    let missing = project(&rules, &month, &snapshot);
    let count = missing.len();
    for entry in &missing {
        ledger::insert(conn, entry)?;
    }
    println!("Projected {} entr{} for {}", count, if count == 1 { "y" } else { "ies" }, month);
    Ok(())
}
