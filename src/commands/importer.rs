// Copyright (c) 2025 Ledgerclip Maintainers.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::fs;
use std::fs::File;
use std::path::Path;

use crate::engine::{ingest, statement};
use crate::extract::parse_raw_batch;
use crate::ledger;
use crate::models::IngestReport;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("statement", sub)) => import_statement(conn, sub),
        Some(("extracted", sub)) => import_extracted(conn, sub),
        _ => Ok(()),
    }
}

fn import_statement(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let path = sub.get_one::<String>("path").unwrap().trim();
    let file = File::open(path).with_context(|| format!("Open CSV {}", path))?;
    let mut parsed = statement::parse_statement(file)?;

    let label = Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string());
    for t in &mut parsed.transactions {
        if t.source.is_none() {
            t.source = Some(label.clone());
        }
    }

    let report = ledger::append_batch(conn, &parsed.transactions)?;
    for (category, limit) in &parsed.budgets {
        ledger::set_budget(conn, category, *limit)?;
    }

    print_report(&report, path);
    if !parsed.budgets.is_empty() {
        println!("Updated {} budget limit(s)", parsed.budgets.len());
    }
    Ok(())
}

fn import_extracted(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let path = sub.get_one::<String>("path").unwrap().trim();
    let json = fs::read_to_string(path).with_context(|| format!("Read {}", path))?;
    let raw = parse_raw_batch(&json)?;

    let label = sub
        .get_one::<String>("source")
        .cloned()
        .unwrap_or_else(|| {
            Path::new(path)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.to_string())
        });
    let batch = ingest::normalize_extracted(&raw, &label);
    for reason in &batch.rejected {
        eprintln!("rejected {}", reason);
    }

    let report = ledger::append_batch(conn, &batch.accepted)?;
    print_report(&report, path);
    Ok(())
}

fn print_report(report: &IngestReport, path: &str) {
    println!(
        "Imported {} from {} ({} duplicate(s) skipped)",
        report.added, path, report.duplicates
    );
}
