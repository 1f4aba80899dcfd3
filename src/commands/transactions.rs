// Copyright (c) 2025 Ledgerclip Maintainers.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Result, anyhow};
use rusqlite::Connection;
use serde::Serialize;

use crate::engine::ingest;
use crate::ledger::{self, TransactionEdit};
use crate::models::TxKind;
use crate::utils::{maybe_print_json, parse_date, parse_decimal, pretty_table};

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("edit", sub)) => edit(conn, sub)?,
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            if ledger::delete_transaction(conn, id)? {
                println!("Removed transaction {}", id);
            } else {
                println!("No transaction {}", id);
            }
        }
        _ => {}
    }
    Ok(())
}

fn add(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let date = parse_date(sub.get_one::<String>("date").unwrap())?;
    let description = sub.get_one::<String>("description").unwrap();
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let kind: TxKind = sub
        .get_one::<String>("kind")
        .unwrap()
        .parse()
        .map_err(|e: String| anyhow!(e))?;
    let category = sub.get_one::<String>("category").map(String::as_str);

    let mut candidate = ingest::manual(date, description, amount, kind, category)?;
    if let Some(name) = sub.get_one::<String>("debt") {
        if !kind.is_debt() {
            return Err(anyhow!("--debt requires a debt-* kind, got '{}'", kind));
        }
        candidate.debt_account_id = Some(ledger::debt_account_by_name(conn, name.trim())?.id);
    }
    if let Some(name) = sub.get_one::<String>("asset") {
        if !kind.is_asset() {
            return Err(anyhow!("--asset requires an asset-* kind, got '{}'", kind));
        }
        candidate.asset_account_id = Some(ledger::asset_account_by_name(conn, name.trim())?.id);
    }

    let report = ledger::append_batch(conn, &[candidate])?;
    if report.duplicates > 0 {
        println!("Skipped: identical entry already in the ledger");
    } else {
        println!("Recorded {} {} on {} '{}'", kind, amount, date, description.trim());
    }
    Ok(())
}

#[derive(Serialize)]
struct TxRow {
    id: i64,
    date: String,
    kind: String,
    amount: String,
    description: String,
    category: String,
    source: String,
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let month = sub.get_one::<String>("month");
    let kind = sub
        .get_one::<String>("kind")
        .map(|s| s.parse::<TxKind>())
        .transpose()
        .map_err(|e| anyhow!(e))?;
    let category = sub.get_one::<String>("category");
    let limit = sub.get_one::<usize>("limit").copied();

    let mut data: Vec<TxRow> = ledger::load(conn)?
        .into_iter()
        .rev()
        .filter(|t| {
            month
                .map(|m| t.date.format("%Y-%m").to_string() == *m)
                .unwrap_or(true)
                && kind.map(|k| t.kind == k).unwrap_or(true)
                && category
                    .map(|c| t.category.eq_ignore_ascii_case(c))
                    .unwrap_or(true)
        })
        .map(|t| TxRow {
            id: t.id,
            date: t.date.format("%Y-%m-%d").to_string(),
            kind: t.kind.as_str().to_string(),
            amount: format!("{:.2}", t.amount),
            description: t.description,
            category: t.category,
            source: t.source.unwrap_or_default(),
        })
        .collect();
    if let Some(n) = limit {
        data.truncate(n);
    }

    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .into_iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.date,
                    r.kind,
                    r.amount,
                    r.description,
                    r.category,
                    r.source,
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Date", "Kind", "Amount", "Description", "Category", "Source"],
                rows
            )
        );
    }
    Ok(())
}

fn edit(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("id").unwrap();
    let edit = TransactionEdit {
        date: sub
            .get_one::<String>("date")
            .map(|s| parse_date(s))
            .transpose()?,
        description: sub.get_one::<String>("description").cloned(),
        amount: sub
            .get_one::<String>("amount")
            .map(|s| parse_decimal(s))
            .transpose()?,
        kind: sub
            .get_one::<String>("kind")
            .map(|s| s.parse::<TxKind>())
            .transpose()
            .map_err(|e| anyhow!(e))?,
        category: sub.get_one::<String>("category").cloned(),
    };
    if ledger::update_transaction(conn, id, &edit)? {
        println!("Updated transaction {}", id);
    } else {
        println!("No transaction {}", id);
    }
    Ok(())
}
