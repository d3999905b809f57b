use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tally_core::{parse_date, read_ledger, Transaction, TxnKind, UNKNOWN_MERCHANT};
use tally_finance::{
    save_with_backup, stats, summarize, transaction_id, AssignMode, AssignSession, IgnoreList,
    SummaryFilter,
};
use tally_ingest::consolidate_to;

mod config;
mod prompt;
mod state;

const LONG_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("TALLY_BUILD_SHA"), ")");

#[derive(Parser, Debug)]
#[command(
    name = "tally",
    version,
    long_version = LONG_VERSION,
    about = "Consolidate credit card exports into one categorized ledger"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Merge every card export in the input directory into the ledger
    Consolidate {
        /// Directory of card CSV exports (default from config)
        #[arg(long)]
        input: Option<PathBuf>,

        /// Ledger CSV to write (default from config)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Fill in missing categories or merchants, one transaction at a time
    Assign {
        #[arg(long, conflicts_with_all = ["merchants", "stats"])]
        categories: bool,

        #[arg(long, conflicts_with = "stats")]
        merchants: bool,

        /// Show what is missing (the default)
        #[arg(long)]
        stats: bool,

        /// Ledger CSV (default from config)
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Manage transactions excluded from totals
    Ignore {
        #[command(subcommand)]
        command: IgnoreCommand,
    },

    /// Spending totals, ignored transactions excluded
    Summary {
        /// First day to include (YYYY-MM-DD or MM/DD/YYYY)
        #[arg(long)]
        from: Option<String>,

        /// Last day to include
        #[arg(long)]
        to: Option<String>,

        /// Only these sources (repeatable)
        #[arg(long = "source")]
        sources: Vec<String>,

        /// Ledger CSV (default from config)
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Config file helpers
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum IgnoreCommand {
    /// Ignore a transaction by date, amount, description and source
    Add {
        #[arg(long)]
        date: String,

        #[arg(long, allow_hyphen_values = true)]
        amount: String,

        #[arg(long)]
        description: String,

        #[arg(long)]
        source: String,
    },

    /// Stop ignoring a transaction
    Remove { id: String },

    /// Show ignored transactions
    List,

    /// Remove every entry
    Clear,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write ~/.tally/config.toml with defaults
    Init,
    /// Print the effective config
    Show,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Command::Consolidate { input, output } => {
            let cfg = config::load_config()?;
            let input = input.unwrap_or(cfg.paths.input_dir.clone());
            let output = output.unwrap_or(cfg.paths.ledger.clone());
            consolidate(&cfg, &input, &output)?;
        }

        Command::Assign {
            categories,
            merchants,
            stats: _,
            file,
        } => {
            let cfg = config::load_config()?;
            let ledger = file.unwrap_or(cfg.paths.ledger.clone());
            let mode = if categories {
                Some(AssignMode::Categories)
            } else if merchants {
                Some(AssignMode::Merchants)
            } else {
                None
            };
            assign(&cfg, &ledger, mode)?;
        }

        Command::Ignore { command } => {
            let cfg = config::load_config()?;
            ignore(&cfg, command)?;
        }

        Command::Summary {
            from,
            to,
            sources,
            file,
        } => {
            let cfg = config::load_config()?;
            let filter = SummaryFilter {
                from: from.as_deref().map(parse_day).transpose()?,
                to: to.as_deref().map(parse_day).transpose()?,
                sources: sources.into_iter().collect::<BTreeSet<_>>(),
            };
            let ledger = file.unwrap_or(cfg.paths.ledger.clone());
            summary(&cfg, &ledger, &filter)?;
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => config::show_config()?,
        },
    }

    Ok(())
}

fn parse_day(s: &str) -> Result<chrono::NaiveDate> {
    parse_date(s).with_context(|| format!("invalid date '{s}' (use YYYY-MM-DD or MM/DD/YYYY)"))
}

fn consolidate(cfg: &config::Config, input: &Path, output: &Path) -> Result<()> {
    let rules = cfg.rule_set()?;
    let result = consolidate_to(input, output, &rules)
        .with_context(|| format!("consolidating {}", input.display()))?;
    let report = &result.report;

    if report.used_examples {
        println!("No real exports found; using the example files.\n");
    }
    for skipped in &report.skipped_examples {
        println!("Skipped example file {}", skipped.display());
    }

    println!("Files:");
    for f in &report.files {
        println!(
            "  {} ({}): {} transactions",
            f.path.display(),
            f.issuer,
            f.rows
        );
    }

    println!("\nBy source:");
    for (source, rows) in report.rows_by_source() {
        println!("  {source}: {rows}");
    }

    println!(
        "\nWrote {} transactions to {}",
        result.transactions.len(),
        output.display()
    );

    if !report.issues.is_empty() {
        println!("\n{} issue(s):", report.issues.len());
        for issue in &report.issues {
            println!("  - {issue}");
        }
    }
    Ok(())
}

fn assign(cfg: &config::Config, ledger_path: &Path, mode: Option<AssignMode>) -> Result<()> {
    let ledger = read_ledger(ledger_path)?;

    let Some(mode) = mode else {
        prompt::print_stats(&stats(&ledger));
        return Ok(());
    };

    let rules = cfg.rule_set()?;
    let session = AssignSession::new(mode, ledger, &rules);
    let outcome = prompt::run_session(session)?;

    if outcome.assigned == 0 {
        println!("Nothing to save.");
        return Ok(());
    }

    let backup = save_with_backup(ledger_path, &cfg.paths.backups_dir, &outcome.ledger)
        .with_context(|| format!("saving {}", ledger_path.display()))?;
    if let Some(b) = backup {
        println!("Backup: {}", b.display());
    }
    println!("Saved {}", ledger_path.display());
    Ok(())
}

fn ignore(cfg: &config::Config, command: IgnoreCommand) -> Result<()> {
    let path = &cfg.paths.ignore_list;
    let mut list = IgnoreList::open(path).with_context(|| format!("opening {}", path.display()))?;

    match command {
        IgnoreCommand::Add {
            date,
            amount,
            description,
            source,
        } => {
            let date = parse_day(&date)?;
            let amount = Decimal::from_str(amount.trim().trim_start_matches('$'))
                .with_context(|| format!("invalid amount '{amount}'"))?;
            let key = Transaction {
                transaction_date: date,
                post_date: None,
                description,
                merchant: UNKNOWN_MERCHANT.to_string(),
                category: String::new(),
                kind: TxnKind::Other,
                amount,
                memo: String::new(),
                source,
            };

            // Prefer the ledger row so merchant and category are recorded too
            let found = match ledger_row(&cfg.paths.ledger, &key) {
                Ok(Some(row)) => Some(row),
                Ok(None) => {
                    log::warn!(
                        "no matching row in {}; ignoring by key only",
                        cfg.paths.ledger.display()
                    );
                    None
                }
                Err(e) => {
                    log::warn!("could not read ledger ({e}); ignoring by key only");
                    None
                }
            };

            let id = list.add(found.as_ref().unwrap_or(&key))?;
            println!("Ignored {id}");
        }

        IgnoreCommand::Remove { id } => {
            if !list.remove(&id)? {
                bail!("no ignored transaction with id {id}");
            }
            println!("Removed {id}");
        }

        IgnoreCommand::List => {
            if list.is_empty() {
                println!("No ignored transactions.");
                return Ok(());
            }
            for (id, e) in list.list() {
                println!(
                    "{id}\n  {} | ${:.2} | {} | {} | ignored {}",
                    e.date, e.amount, e.description, e.source, e.ignored_at
                );
            }
            println!("\n{} ignored transaction(s)", list.len());
        }

        IgnoreCommand::Clear => {
            let n = list.len();
            list.clear()?;
            println!("Cleared {n} ignored transaction(s)");
        }
    }
    Ok(())
}

/// The ledger row with the same ignore id as `key`, if any.
fn ledger_row(ledger: &Path, key: &Transaction) -> tally_core::Result<Option<Transaction>> {
    let id = transaction_id(key);
    Ok(read_ledger(ledger)?
        .into_iter()
        .find(|t| transaction_id(t) == id))
}

fn summary(cfg: &config::Config, ledger_path: &Path, filter: &SummaryFilter) -> Result<()> {
    let ledger = read_ledger(ledger_path)?;
    let ignored = IgnoreList::open(&cfg.paths.ignore_list)
        .with_context(|| format!("opening {}", cfg.paths.ignore_list.display()))?;
    let s = summarize(&ledger, &ignored, filter);

    println!("Transactions: {} ({} ignored)", s.transactions, s.ignored);
    println!("Expenses:     ${:.2}", s.expenses);
    println!("Refunds:      ${:.2}", s.refunds);
    println!("Net expenses: ${:.2}", s.net_expenses());
    println!("Payments:     ${:.2}", s.payments);

    if !s.by_category.is_empty() {
        println!("\nBy category:");
        for (cat, total) in &s.by_category {
            println!("  {cat:<24} ${total:>10.2}");
        }
    }
    if !s.by_source.is_empty() {
        println!("\nBy source:");
        for (source, total) in &s.by_source {
            println!("  {source:<24} ${total:>10.2}");
        }
    }
    Ok(())
}
