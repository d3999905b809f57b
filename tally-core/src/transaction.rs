//! The unified ledger: one row per card transaction, every issuer on the same sign convention.

use std::io;
use std::path::Path;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::dates::{deserialize_date, deserialize_opt_date};
use crate::error::{Error, Result};

/// Column order of the unified ledger file.
pub const LEDGER_HEADER: [&str; 9] = [
    "Transaction Date",
    "Post Date",
    "Description",
    "Merchant",
    "Category",
    "Type",
    "Amount",
    "Memo",
    "Source",
];

/// Placeholder merchant for rows the normalizer could not name.
pub const UNKNOWN_MERCHANT: &str = "Unknown";

/// Unified transaction kinds
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TxnKind {
    Expense,
    Refund,
    Payment,
    #[serde(other)]
    Other,
}

impl TxnKind {
    /// Kinds that must carry a negative amount in the ledger.
    pub fn is_credit(&self) -> bool {
        matches!(self, TxnKind::Refund | TxnKind::Payment)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TxnKind::Expense => "Expense",
            TxnKind::Refund => "Refund",
            TxnKind::Payment => "Payment",
            TxnKind::Other => "Other",
        }
    }
}

/// A single row of the unified ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "Transaction Date", deserialize_with = "deserialize_date")]
    pub transaction_date: NaiveDate,
    #[serde(rename = "Post Date", default, deserialize_with = "deserialize_opt_date")]
    pub post_date: Option<NaiveDate>,
    /// Issuer text, never rewritten after load
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Merchant", default)]
    pub merchant: String,
    #[serde(rename = "Category", default)]
    pub category: String,
    #[serde(rename = "Type")]
    pub kind: TxnKind,
    /// Positive = expense, negative = refund/payment
    #[serde(rename = "Amount", with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    #[serde(rename = "Memo", default)]
    pub memo: String,
    /// Card the row was loaded from
    #[serde(rename = "Source")]
    pub source: String,
}

impl Transaction {
    pub fn abs_amount(&self) -> Decimal {
        self.amount.abs()
    }

    pub fn is_uncategorized(&self) -> bool {
        self.category.trim().is_empty()
    }

    pub fn has_unknown_merchant(&self) -> bool {
        let m = self.merchant.trim();
        m.is_empty() || m == UNKNOWN_MERCHANT
    }
}

/// Round an amount to cents with a fixed scale so `10` and `10.0` both print as `10.00`.
pub fn to_cents(amount: Decimal) -> Decimal {
    let mut amount = amount.round_dp(2);
    amount.rescale(2);
    amount
}

pub fn read_ledger(path: &Path) -> Result<Vec<Transaction>> {
    if !path.exists() {
        return Err(Error::LedgerNotFound(path.to_path_buf()));
    }
    let rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;
    read_ledger_from(rdr)
}

pub fn read_ledger_from<R: io::Read>(mut rdr: csv::Reader<R>) -> Result<Vec<Transaction>> {
    let mut txns = Vec::new();
    for record in rdr.deserialize() {
        txns.push(record?);
    }
    Ok(txns)
}

/// Full overwrite of the ledger file.
pub fn write_ledger(path: &Path, txns: &[Transaction]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = std::fs::File::create(path)?;
    write_ledger_to(file, txns)?;
    log::debug!("wrote {} rows to {}", txns.len(), path.display());
    Ok(())
}

pub fn write_ledger_to<W: io::Write>(writer: W, txns: &[Transaction]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(LEDGER_HEADER)?;
    for txn in txns {
        wtr.serialize(txn)?;
    }
    wtr.flush()?;
    Ok(())
}
