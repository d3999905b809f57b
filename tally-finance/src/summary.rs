//! Spending summary over the ledger, skipping ignored transactions.

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tally_core::{Transaction, TxnKind};

use crate::ignore_list::IgnoreList;

/// Row filter for a summary run. Empty `sources` means every source.
#[derive(Debug, Clone, Default)]
pub struct SummaryFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub sources: BTreeSet<String>,
}

impl SummaryFilter {
    pub fn matches(&self, txn: &Transaction) -> bool {
        if self.from.is_some_and(|d| txn.transaction_date < d) {
            return false;
        }
        if self.to.is_some_and(|d| txn.transaction_date > d) {
            return false;
        }
        self.sources.is_empty() || self.sources.contains(&txn.source)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub expenses: Decimal,
    /// Negative (credits back to the card)
    pub refunds: Decimal,
    pub payments: Decimal,
    pub transactions: usize,
    pub ignored: usize,
    pub by_category: Vec<(String, Decimal)>,
    pub by_source: Vec<(String, Decimal)>,
}

impl Summary {
    /// Expenses net of refunds.
    pub fn net_expenses(&self) -> Decimal {
        self.expenses + self.refunds
    }
}

pub const UNCATEGORIZED_LABEL: &str = "Uncategorized";

fn sorted_desc(groups: HashMap<String, Decimal>) -> Vec<(String, Decimal)> {
    let mut out: Vec<(String, Decimal)> = groups.into_iter().collect();
    out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    out
}

pub fn summarize(ledger: &[Transaction], ignored: &IgnoreList, filter: &SummaryFilter) -> Summary {
    let mut expenses = Decimal::ZERO;
    let mut refunds = Decimal::ZERO;
    let mut payments = Decimal::ZERO;
    let mut transactions = 0;
    let mut ignored_count = 0;
    let mut by_category: HashMap<String, Decimal> = HashMap::new();
    let mut by_source: HashMap<String, Decimal> = HashMap::new();

    for txn in ledger.iter().filter(|t| filter.matches(t)) {
        if ignored.contains(txn) {
            ignored_count += 1;
            continue;
        }
        transactions += 1;
        match txn.kind {
            TxnKind::Expense => {
                expenses += txn.amount;
                let category = if txn.is_uncategorized() {
                    UNCATEGORIZED_LABEL.to_string()
                } else {
                    txn.category.clone()
                };
                *by_category.entry(category).or_default() += txn.amount;
                *by_source.entry(txn.source.clone()).or_default() += txn.amount;
            }
            TxnKind::Refund => refunds += txn.amount,
            TxnKind::Payment => payments += txn.amount,
            TxnKind::Other => {}
        }
    }

    log::debug!("summarized {transactions} transaction(s), {ignored_count} ignored");

    Summary {
        expenses,
        refunds,
        payments,
        transactions,
        ignored: ignored_count,
        by_category: sorted_desc(by_category),
        by_source: sorted_desc(by_source),
    }
}
