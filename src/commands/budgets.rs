// Copyright (c) 2025 Ledgerclip Maintainers.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Result, anyhow};
use rusqlite::Connection;
use serde::Serialize;

use crate::engine::cashflow;
use crate::ledger;
use crate::models::Period;
use crate::utils::{maybe_print_json, parse_decimal, parse_month, parse_year, pretty_table};

pub fn period_from_args(sub: &clap::ArgMatches) -> Result<Period> {
    match (
        sub.get_one::<String>("month"),
        sub.get_one::<String>("year"),
    ) {
        (Some(m), None) => Ok(Period::Month(parse_month(m)?)),
        (None, Some(y)) => Ok(Period::Year(parse_year(y)?)),
        _ => Err(anyhow!("Pass exactly one of --month or --year")),
    }
}

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => {
            let category = sub.get_one::<String>("category").unwrap().trim();
            let limit = parse_decimal(sub.get_one::<String>("limit").unwrap())?;
            ledger::set_budget(conn, category, limit)?;
            println!("Budget set: {} = {}/month", category, limit);
        }
        Some(("list", sub)) => list(conn, sub)?,
        Some(("rm", sub)) => {
            let category = sub.get_one::<String>("category").unwrap().trim();
            if ledger::remove_budget(conn, category)? {
                println!("Removed budget for '{}'", category);
            } else {
                println!("No budget for '{}'", category);
            }
        }
        Some(("report", sub)) => report(conn, sub)?,
        _ => {}
    }
    Ok(())
}

#[derive(Serialize)]
struct BudgetRow {
    category: String,
    monthly_limit: String,
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let data: Vec<BudgetRow> = ledger::budgets(conn)?
        .into_iter()
        .map(|(category, limit)| BudgetRow {
            category,
            monthly_limit: format!("{:.2}", limit),
        })
        .collect();
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .into_iter()
            .map(|r| vec![r.category, r.monthly_limit])
            .collect();
        println!("{}", pretty_table(&["Category", "Monthly limit"], rows));
    }
    Ok(())
}

fn report(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let period = period_from_args(sub)?;
    let top = *sub.get_one::<usize>("top").unwrap();
    let snapshot = ledger::load(conn)?;
    let budgets = ledger::budgets(conn)?;
    let summary = cashflow::aggregate(&snapshot, &period, &budgets, top);

    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &summary.overspent)? {
        if summary.overspent.is_empty() {
            println!("No category over budget in {}", period.prefix());
            return Ok(());
        }
        let rows = summary
            .overspent
            .iter()
            .map(|o| {
                vec![
                    o.category.clone(),
                    format!("{:.2}", o.budget),
                    format!("{:.2}", o.actual),
                    format!("{:.2}", o.over),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Category", "Budget", "Actual", "Over"], rows)
        );
    }
    Ok(())
}
