// Copyright (c) 2025 Ledgerclip Maintainers.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print JSON instead of a table"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .help("Print one JSON object per line"),
    )
}

fn period_args(cmd: Command) -> Command {
    cmd.arg(Arg::new("month").long("month").help("Period month, YYYY-MM"))
        .arg(Arg::new("year").long("year").help("Period year, YYYY"))
}

pub fn build_cli() -> Command {
    Command::new("ledgerclip")
        .about("Multi-source ledger reconciliation, derived balances, and feed sync")
        .subcommand_required(false)
        .subcommand(Command::new("init").about("Initialize the database"))
        .subcommand(
            Command::new("debt")
                .about("Debt accounts (balances are derived, never stored)")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(
                            Arg::new("starting")
                                .long("starting")
                                .default_value("0")
                                .help("Opening balance before any ledger history"),
                        ),
                )
                .subcommand(json_flags(Command::new("list")))
                .subcommand(
                    Command::new("rm").arg(Arg::new("name").long("name").required(true)),
                ),
        )
        .subcommand(
            Command::new("asset")
                .about("Asset accounts (balances are derived, never stored)")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(Arg::new("starting").long("starting").default_value("0")),
                )
                .subcommand(json_flags(Command::new("list")))
                .subcommand(
                    Command::new("rm").arg(Arg::new("name").long("name").required(true)),
                ),
        )
        .subcommand(
            Command::new("tx")
                .about("Ledger transactions")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("date").long("date").required(true))
                        .arg(Arg::new("description").long("desc").required(true))
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(
                            Arg::new("kind")
                                .long("kind")
                                .default_value("expense")
                                .help("income|expense|debt-payment|debt-interest|debt-charge|asset-deposit|asset-growth"),
                        )
                        .arg(Arg::new("category").long("category"))
                        .arg(Arg::new("debt").long("debt").help("Debt account name to link"))
                        .arg(Arg::new("asset").long("asset").help("Asset account name to link")),
                )
                .subcommand(json_flags(
                    Command::new("list")
                        .arg(Arg::new("month").long("month"))
                        .arg(Arg::new("kind").long("kind"))
                        .arg(Arg::new("category").long("category"))
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(value_parser!(usize)),
                        ),
                ))
                .subcommand(
                    Command::new("edit")
                        .arg(
                            Arg::new("id")
                                .long("id")
                                .required(true)
                                .value_parser(value_parser!(i64)),
                        )
                        .arg(Arg::new("date").long("date"))
                        .arg(Arg::new("description").long("desc"))
                        .arg(Arg::new("amount").long("amount"))
                        .arg(Arg::new("kind").long("kind"))
                        .arg(Arg::new("category").long("category")),
                )
                .subcommand(
                    Command::new("rm").arg(
                        Arg::new("id")
                            .long("id")
                            .required(true)
                            .value_parser(value_parser!(i64)),
                    ),
                ),
        )
        .subcommand(
            Command::new("budget")
                .about("Monthly category limits")
                .subcommand(
                    Command::new("set")
                        .arg(Arg::new("category").long("category").required(true))
                        .arg(Arg::new("limit").long("limit").required(true)),
                )
                .subcommand(json_flags(Command::new("list")))
                .subcommand(
                    Command::new("rm").arg(Arg::new("category").long("category").required(true)),
                )
                .subcommand(json_flags(period_args(
                    Command::new("report").arg(
                        Arg::new("top")
                            .long("top")
                            .value_parser(value_parser!(usize))
                            .default_value("5"),
                    ),
                ))),
        )
        .subcommand(
            Command::new("recurring")
                .about("Recurring rules and their projection into the ledger")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("description").long("desc").required(true))
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(Arg::new("kind").long("kind").default_value("expense"))
                        .arg(Arg::new("category").long("category"))
                        .arg(
                            Arg::new("day")
                                .long("day")
                                .required(true)
                                .value_parser(value_parser!(u32).range(1..=31)),
                        )
                        .arg(
                            Arg::new("start-month")
                                .long("start-month")
                                .required(true)
                                .help("First month to project, YYYY-MM"),
                        )
                        .arg(Arg::new("debt").long("debt"))
                        .arg(Arg::new("asset").long("asset")),
                )
                .subcommand(json_flags(Command::new("list")))
                .subcommand(Command::new("enable").arg(
                    Arg::new("id").long("id").required(true).value_parser(value_parser!(i64)),
                ))
                .subcommand(Command::new("disable").arg(
                    Arg::new("id").long("id").required(true).value_parser(value_parser!(i64)),
                ))
                .subcommand(Command::new("rm").arg(
                    Arg::new("id").long("id").required(true).value_parser(value_parser!(i64)),
                ))
                .subcommand(
                    Command::new("apply")
                        .about("Project rules into concrete entries for a month")
                        .arg(Arg::new("month").long("month").required(true)),
                ),
        )
        .subcommand(
            Command::new("import")
                .about("File-based ingestion")
                .subcommand(
                    Command::new("statement")
                        .about("Heuristic CSV statement import")
                        .arg(Arg::new("path").long("path").required(true)),
                )
                .subcommand(
                    Command::new("extracted")
                        .about("Normalize saved AI-extractor output (JSON array)")
                        .arg(Arg::new("path").long("path").required(true))
                        .arg(
                            Arg::new("source")
                                .long("source")
                                .help("Source label when the extractor left none"),
                        ),
                ),
        )
        .subcommand(
            Command::new("report")
                .about("Read-side derivations")
                .subcommand(json_flags(period_args(
                    Command::new("cashflow").arg(
                        Arg::new("top")
                            .long("top")
                            .value_parser(value_parser!(usize))
                            .default_value("5"),
                    ),
                )))
                .subcommand(json_flags(Command::new("balances"))),
        )
        .subcommand(
            Command::new("sync")
                .about("Windowed sync against the bank-aggregation feed")
                .subcommand(
                    Command::new("connect")
                        .arg(Arg::new("token").long("token").required(true)),
                )
                .subcommand(Command::new("disconnect"))
                .subcommand(Command::new("status"))
                .subcommand(
                    Command::new("link")
                        .about("Map a feed account to a local debt or asset account")
                        .arg(Arg::new("feed-account").long("feed-account").required(true))
                        .arg(Arg::new("debt").long("debt"))
                        .arg(Arg::new("asset").long("asset")),
                )
                .subcommand(
                    Command::new("unlink")
                        .arg(Arg::new("feed-account").long("feed-account").required(true)),
                )
                .subcommand(
                    Command::new("run").arg(
                        Arg::new("days")
                            .long("days")
                            .value_parser(value_parser!(i64))
                            .default_value("30")
                            .help("How far back to request"),
                    ),
                ),
        )
        .subcommand(Command::new("doctor").about("Check stored invariants"))
}
