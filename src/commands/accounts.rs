// Copyright (c) 2025 Ledgerclip Maintainers.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;

use crate::engine::balance::{asset_balance, debt_balance, is_paid_off};
use crate::ledger;
use crate::utils::{maybe_print_json, parse_decimal, pretty_table};

pub fn handle_debt(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim();
            let starting = parse_decimal(sub.get_one::<String>("starting").unwrap())?;
            ledger::add_debt_account(conn, name, starting)?;
            println!("Added debt account '{}' (starting {})", name, starting);
        }
        Some(("list", sub)) => list_debts(conn, sub)?,
        Some(("rm", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim();
            if ledger::remove_debt_account(conn, name)? {
                println!("Removed debt account '{}' (history unlinked, not deleted)", name);
            } else {
                println!("No debt account '{}'", name);
            }
        }
        _ => {}
    }
    Ok(())
}

pub fn handle_asset(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim();
            let starting = parse_decimal(sub.get_one::<String>("starting").unwrap())?;
            ledger::add_asset_account(conn, name, starting)?;
            println!("Added asset account '{}' (starting {})", name, starting);
        }
        Some(("list", sub)) => list_assets(conn, sub)?,
        Some(("rm", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim();
            if ledger::remove_asset_account(conn, name)? {
                println!("Removed asset account '{}' (history unlinked, not deleted)", name);
            } else {
                println!("No asset account '{}'", name);
            }
        }
        _ => {}
    }
    Ok(())
}

#[derive(Serialize)]
struct DebtRow {
    name: String,
    starting: String,
    payments: String,
    interest: String,
    charges: String,
    current: String,
    paid_off: bool,
}

fn list_debts(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let snapshot = ledger::load(conn)?;
    let data: Vec<DebtRow> = ledger::debt_accounts(conn)?
        .iter()
        .map(|a| {
            let b = debt_balance(a, &snapshot);
            DebtRow {
                name: a.name.clone(),
                starting: format!("{:.2}", a.starting_balance),
                payments: format!("{:.2}", b.payments),
                interest: format!("{:.2}", b.interest),
                charges: format!("{:.2}", b.charges),
                current: format!("{:.2}", b.current),
                paid_off: is_paid_off(&b),
            }
        })
        .collect();
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .into_iter()
            .map(|r| {
                vec![
                    r.name,
                    r.starting,
                    r.payments,
                    r.interest,
                    r.charges,
                    r.current,
                    if r.paid_off { "yes".into() } else { "".into() },
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Debt", "Starting", "Payments", "Interest", "Charges", "Current", "Paid off"],
                rows
            )
        );
    }
    Ok(())
}

#[derive(Serialize)]
struct AssetRow {
    name: String,
    starting: String,
    deposits: String,
    growth: String,
    current: String,
}

fn list_assets(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let snapshot = ledger::load(conn)?;
    let data: Vec<AssetRow> = ledger::asset_accounts(conn)?
        .iter()
        .map(|a| {
            let b = asset_balance(a, &snapshot);
            AssetRow {
                name: a.name.clone(),
                starting: format!("{:.2}", a.starting_balance),
                deposits: format!("{:.2}", b.deposits),
                growth: format!("{:.2}", b.growth),
                current: format!("{:.2}", b.current),
            }
        })
        .collect();
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .into_iter()
            .map(|r| vec![r.name, r.starting, r.deposits, r.growth, r.current])
            .collect();
        println!(
            "{}",
            pretty_table(&["Asset", "Starting", "Deposits", "Growth", "Current"], rows)
        );
    }
    Ok(())
}
