//! Header-driven CSV loader shared by all issuers.
//!
//! Each issuer module only declares an [`IssuerProfile`]: which headers hold
//! which field, how amounts are signed, and how type labels map to kinds.

pub mod apple_card;
pub mod chase;

use std::io;
use std::path::Path;

use rust_decimal::Decimal;
use tally_core::{parse_date, to_cents, Error, Result, RuleSet, Transaction};

use crate::normalize::{normalize, Warning};
use crate::types::{ColumnMap, IssuerProfile};

/// Profiles in detection order. Bilt comes before Chase so its `Posted Date`
/// shape is tried before the more general Chase one.
pub static PROFILES: [&IssuerProfile; 3] = [&apple_card::APPLE_CARD, &chase::BILT, &chase::CHASE];

/// Rows from one file plus everything that went wrong along the way.
#[derive(Debug, Default)]
pub struct Loaded {
    pub transactions: Vec<Transaction>,
    pub issues: Vec<Error>,
}

/// Parse a money string: `$`, thousands separators, and `(12.00)` negatives.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let s: String = raw
        .chars()
        .filter(|c| !matches!(c, ',' | '$' | '"' | ' '))
        .collect();
    if s.is_empty() {
        return None;
    }
    if let Some(inner) = s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        return inner.parse::<Decimal>().ok().map(|d| -d);
    }
    s.parse::<Decimal>().ok()
}

/// Pick a profile for a file: by name first, then by header shape.
pub fn detect_issuer(path: &Path) -> Result<Option<&'static IssuerProfile>> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    if let Some(profile) = PROFILES.iter().find(|p| p.matches_file_name(&file_name)) {
        return Ok(Some(*profile));
    }

    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)?;
    let headers = rdr.headers()?;
    Ok(PROFILES.iter().find(|p| p.matches_headers(headers)).copied())
}

pub fn load_file(
    path: &Path,
    profile: &IssuerProfile,
    source: &str,
    rules: &RuleSet,
) -> Result<Loaded> {
    let rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)?;
    load_from_reader(rdr, path, profile, source, rules)
}

pub fn load_from_reader<R: io::Read>(
    mut rdr: csv::Reader<R>,
    path: &Path,
    profile: &IssuerProfile,
    source: &str,
    rules: &RuleSet,
) -> Result<Loaded> {
    let headers = rdr.headers()?.clone();
    let cols = Columns::resolve(&headers, &profile.columns, path)?;

    let mut loaded = Loaded::default();

    for (i, record) in rdr.records().enumerate() {
        let fallback_line = i + 2;
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                let line = e.position().map(|p| p.line() as usize).unwrap_or(fallback_line);
                loaded.issues.push(malformed(path, line, e.to_string()));
                continue;
            }
        };
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(fallback_line);

        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }

        match parse_row(&record, &cols, profile, source, rules) {
            Ok((txn, warning)) => {
                if let Some(w) = warning {
                    loaded.issues.push(warning_issue(path, line, w));
                }
                loaded.transactions.push(txn);
            }
            Err(reason) => loaded.issues.push(malformed(path, line, reason)),
        }
    }

    for issue in &loaded.issues {
        log::warn!("{issue}");
    }

    Ok(loaded)
}

/// Column indexes resolved against one file's header row.
struct Columns {
    transaction_date: usize,
    post_date: Option<usize>,
    description: usize,
    merchant: Option<usize>,
    category: Option<usize>,
    kind: Option<usize>,
    amount: usize,
    memo: Option<usize>,
}

impl Columns {
    fn resolve(headers: &csv::StringRecord, map: &ColumnMap, path: &Path) -> Result<Self> {
        let find = |aliases: &[&str]| -> Option<usize> {
            aliases.iter().find_map(|alias| {
                headers
                    .iter()
                    .position(|h| h.trim().eq_ignore_ascii_case(alias))
            })
        };
        let require = |aliases: &[&str]| -> Result<usize> {
            find(aliases).ok_or_else(|| Error::MissingColumn {
                file: path.to_path_buf(),
                column: aliases.first().copied().unwrap_or_default().to_string(),
            })
        };

        Ok(Self {
            transaction_date: require(map.transaction_date)?,
            post_date: find(map.post_date),
            description: require(map.description)?,
            merchant: find(map.merchant),
            category: find(map.category),
            kind: find(map.kind),
            amount: require(map.amount)?,
            memo: find(map.memo),
        })
    }
}

fn field<'r>(record: &'r csv::StringRecord, idx: Option<usize>) -> &'r str {
    idx.and_then(|i| record.get(i)).unwrap_or("").trim()
}

fn parse_row(
    record: &csv::StringRecord,
    cols: &Columns,
    profile: &IssuerProfile,
    source: &str,
    rules: &RuleSet,
) -> std::result::Result<(Transaction, Option<Warning>), String> {
    let raw_date = field(record, Some(cols.transaction_date));
    let transaction_date =
        parse_date(raw_date).ok_or_else(|| format!("unparseable transaction date '{raw_date}'"))?;

    let raw_post = field(record, cols.post_date);
    let post_date = if raw_post.is_empty() {
        None
    } else {
        Some(parse_date(raw_post).ok_or_else(|| format!("unparseable post date '{raw_post}'"))?)
    };

    let raw_amount = field(record, Some(cols.amount));
    let amount =
        parse_amount(raw_amount).ok_or_else(|| format!("unparseable amount '{raw_amount}'"))?;
    // Round first so a sub-cent amount is seen as zero
    let amount = to_cents(amount);

    let description = field(record, Some(cols.description)).to_string();
    let normalized = normalize(&profile.sign, amount, field(record, cols.kind));

    let merchant_raw = match field(record, cols.merchant) {
        "" => description.as_str(),
        m => m,
    };
    let merchant = rules.merchants.normalize(merchant_raw);

    let category = match field(record, cols.category) {
        "" => rules
            .categories
            .auto_assign(normalized.kind, &description)
            .unwrap_or_default()
            .to_string(),
        c => c.to_string(),
    };

    let txn = Transaction {
        transaction_date,
        post_date,
        description,
        merchant,
        category,
        kind: normalized.kind,
        amount: normalized.amount,
        memo: field(record, cols.memo).to_string(),
        source: source.to_string(),
    };

    Ok((txn, normalized.warning))
}

fn malformed(path: &Path, line: usize, reason: String) -> Error {
    Error::MalformedRow {
        file: path.to_path_buf(),
        line,
        reason,
    }
}

fn warning_issue(path: &Path, line: usize, warning: Warning) -> Error {
    let file = path.to_path_buf();
    match warning {
        Warning::UnknownType(label) => Error::UnknownTransactionType { file, line, label },
        Warning::SignMismatch(label) => Error::SignMismatch { file, line, label },
        Warning::ZeroAmount => Error::ZeroAmount { file, line },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::fs;
    use tally_core::TxnKind;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("-45.67"), Some(dec!(-45.67)));
        assert_eq!(parse_amount("$1,234.56"), Some(dec!(1234.56)));
        assert_eq!(parse_amount("(12.00)"), Some(dec!(-12.00)));
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("n/a"), None);
    }

    #[test]
    fn test_detect_by_file_name_then_header() {
        let dir = tempfile::tempdir().unwrap();

        let named = dir.path().join("chase_freedom.csv");
        fs::write(&named, "whatever\n").unwrap();
        assert_eq!(detect_issuer(&named).unwrap().unwrap().name, "Chase");

        let shaped = dir.path().join("export_2026.csv");
        fs::write(
            &shaped,
            "Transaction Date,Clearing Date,Description,Merchant,Category,Type,Amount (USD),Purchased By\n",
        )
        .unwrap();
        assert_eq!(detect_issuer(&shaped).unwrap().unwrap().name, "Apple Card");

        let unknown = dir.path().join("bank.csv");
        fs::write(&unknown, "Date,Narrative,Debit,Credit\n").unwrap();
        assert!(detect_issuer(&unknown).unwrap().is_none());
    }

    #[test]
    fn test_load_file_stamps_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chase.csv");
        fs::write(
            &path,
            "Transaction Date,Post Date,Description,Category,Type,Amount,Memo\n\
             01/15/2026,01/16/2026,LYFT *RIDE,,Sale,-18.20,\n",
        )
        .unwrap();

        let rules = RuleSet::builtin().unwrap();
        let loaded = load_file(&path, &chase::CHASE, "Chase", &rules).unwrap();
        assert_eq!(loaded.transactions.len(), 1);
        let t = &loaded.transactions[0];
        assert_eq!(t.source, "Chase");
        assert_eq!(t.merchant, "Lyft");
        assert_eq!(t.kind, TxnKind::Expense);
        assert_eq!(t.amount.to_string(), "18.20");
    }

    #[test]
    fn test_unreadable_file_is_an_error() {
        let rules = RuleSet::builtin().unwrap();
        let err = load_file(Path::new("/nonexistent/chase.csv"), &chase::CHASE, "Chase", &rules);
        assert!(err.is_err());
    }
}
