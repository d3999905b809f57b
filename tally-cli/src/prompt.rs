//! Terminal front end for the assignment session.

use anyhow::Result;
use std::io::{self, Write};
use tally_core::Transaction;
use tally_finance::{AssignMode, AssignSession, Outcome, Reply, State, Stats};

/// Read one trimmed line. None on end of input.
pub fn prompt(label: &str) -> Result<Option<String>> {
    print!("{}: ", label);
    io::stdout().flush().ok();
    let mut s = String::new();
    if io::stdin().read_line(&mut s)? == 0 {
        return Ok(None);
    }
    Ok(Some(s.trim().to_string()))
}

fn show_transaction(pos: usize, total: usize, txn: &Transaction) {
    println!("\n{}", "=".repeat(60));
    println!("Transaction {} of {}", pos + 1, total);
    println!("{}", "=".repeat(60));
    println!("Date:        {}", txn.transaction_date.format("%Y-%m-%d"));
    println!("Description: {}", txn.description);
    println!("Merchant:    {}", txn.merchant);
    if !txn.category.is_empty() {
        println!("Category:    {}", txn.category);
    }
    println!("Amount:      ${:.2}", txn.amount);
    println!("Type:        {}", txn.kind.as_str());
    println!("Source:      {}", txn.source);
}

fn show_categories(categories: &[String]) {
    println!("\nCategories:");
    for (i, cat) in categories.iter().enumerate() {
        println!("  {:>2}. {}", i + 1, cat);
    }
}

fn show_help(mode: AssignMode) {
    match mode {
        AssignMode::Categories => {
            println!("Enter a number, 'new:Name' for a new category, 'auto' for a suggestion, 'skip', or 'quit'")
        }
        AssignMode::Merchants => {
            println!("Type a merchant name, 'auto' for a suggestion, 'skip', or 'quit'")
        }
    }
}

pub fn run_session(mut session: AssignSession<'_>) -> Result<Outcome> {
    let mode = session.mode();
    let total = session.queue_len();
    if total == 0 {
        match mode {
            AssignMode::Categories => println!("Every transaction already has a category."),
            AssignMode::Merchants => println!("Every transaction already has a merchant."),
        }
        return Ok(session.finish());
    }

    println!("{total} transaction(s) to review, largest amounts first.");
    show_help(mode);

    while !session.is_done() {
        if matches!(session.state(), State::Presenting { .. }) {
            if let Some((pos, txn)) = session.present() {
                show_transaction(pos, total, txn);
            }
            if mode == AssignMode::Categories {
                show_categories(session.categories());
            }
        }

        let label = match session.state() {
            State::AwaitingConfirmation { .. } => "Apply it? (y/n)",
            _ => "Choice",
        };
        let Some(input) = prompt(label)? else {
            println!();
            break;
        };

        match session.submit(&input) {
            Reply::Assigned(v) => println!("Assigned: {v}"),
            Reply::Created(v) => println!("Created and assigned: {v}"),
            Reply::Suggested(v) => println!("Suggestion: {v}"),
            Reply::NoSuggestion => println!("No suggestion for this one."),
            Reply::Declined => show_help(mode),
            Reply::Skipped => println!("Skipped."),
            Reply::Invalid(msg) => println!("{msg}"),
            Reply::Quit => println!("Stopping here."),
            Reply::Ignored => {}
        }
    }

    let pending = session.pending_count();
    println!("\n{pending} assignment(s) made.");
    Ok(session.finish())
}

pub fn print_stats(stats: &Stats) {
    println!("Total transactions: {}", stats.total);
    println!(
        "Missing categories: {} ({:.1}%)",
        stats.missing_categories,
        stats.pct(stats.missing_categories)
    );
    println!(
        "Missing merchants:  {} ({:.1}%)",
        stats.missing_merchants,
        stats.pct(stats.missing_merchants)
    );

    if stats.missing_categories > 0 {
        println!("\nRun `tally assign --categories` to fill in categories.");
    }
    if stats.missing_merchants > 0 {
        println!("Run `tally assign --merchants` to fill in merchants.");
    }
    if stats.missing_categories == 0 && stats.missing_merchants == 0 {
        println!("\nEverything is categorized.");
    }
}
