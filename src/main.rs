// Copyright (c) 2025 Ledgerclip Maintainers.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use ledgerclip::{cli, commands, db};

fn main() -> Result<()> {
    let cli = cli::build_cli();
    let matches = cli.get_matches();

    let mut conn = db::open_or_init()?;

    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Database initialized at {}", db::db_path()?.display());
        }
        Some(("debt", sub)) => commands::accounts::handle_debt(&conn, sub)?,
        Some(("asset", sub)) => commands::accounts::handle_asset(&conn, sub)?,
        Some(("tx", sub)) => commands::transactions::handle(&mut conn, sub)?,
        Some(("budget", sub)) => commands::budgets::handle(&conn, sub)?,
        Some(("recurring", sub)) => commands::recurring::handle(&mut conn, sub)?,
        Some(("import", sub)) => commands::importer::handle(&mut conn, sub)?,
        Some(("report", sub)) => commands::reports::handle(&conn, sub)?,
        Some(("sync", sub)) => commands::sync::handle(&mut conn, sub)?,
        Some(("doctor", _)) => commands::doctor::handle(&conn)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
