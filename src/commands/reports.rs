// Copyright (c) 2025 Ledgerclip Maintainers.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;

use crate::commands::budgets::period_from_args;
use crate::engine::cashflow;
use crate::ledger;
use crate::utils::{maybe_print_json, pretty_table};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("cashflow", sub)) => cashflow_report(conn, sub)?,
        Some(("balances", sub)) => balances(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn cashflow_report(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let period = period_from_args(sub)?;
    let top = *sub.get_one::<usize>("top").unwrap();
    let snapshot = ledger::load(conn)?;
    let budgets = ledger::budgets(conn)?;
    let s = cashflow::aggregate(&snapshot, &period, &budgets, top);

    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &s)? {
        let rows = vec![
            vec!["Income".to_string(), format!("{:.2}", s.income)],
            vec!["Spend".to_string(), format!("{:.2}", s.spend)],
            vec!["Debt payments".to_string(), format!("{:.2}", s.debt_payments)],
            vec!["Savings".to_string(), format!("{:.2}", s.savings)],
            vec!["Cash left".to_string(), format!("{:.2}", s.cash_left)],
            vec!["Savings rate".to_string(), format!("{:.4}", s.savings_rate)],
            vec![
                "Debt payoff rate".to_string(),
                format!("{:.4}", s.debt_payoff_rate),
            ],
        ];
        println!(
            "{}",
            pretty_table(&[&format!("Cashflow {}", period.prefix()), "Amount"], rows)
        );
        if !s.overspent.is_empty() {
            let rows = s
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
                pretty_table(&["Over budget", "Budget", "Actual", "Over"], rows)
            );
        }
    }
    Ok(())
}

fn balances(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    use crate::engine::balance::{asset_balance, debt_balance};
    use serde::Serialize;

    #[derive(Serialize)]
    struct BalanceRow {
        account: String,
        kind: String,
        current: String,
    }

    let snapshot = ledger::load(conn)?;
    let mut data = Vec::new();
    for a in ledger::debt_accounts(conn)? {
        let b = debt_balance(&a, &snapshot);
        data.push(BalanceRow {
            account: a.name,
            kind: "debt".into(),
            current: format!("{:.2}", b.current),
        });
    }
    for a in ledger::asset_accounts(conn)? {
        let b = asset_balance(&a, &snapshot);
        data.push(BalanceRow {
            account: a.name,
            kind: "asset".into(),
            current: format!("{:.2}", b.current),
        });
    }

    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .into_iter()
            .map(|r| vec![r.account, r.kind, r.current])
            .collect();
        println!("{}", pretty_table(&["Account", "Kind", "Current"], rows));
    }
    Ok(())
}
