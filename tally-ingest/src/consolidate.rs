//! Consolidator: every card export in a directory → one unified ledger.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tally_core::{write_ledger, Error, Result, RuleSet, Transaction};

use crate::parsers::{detect_issuer, load_file};
use crate::types::Issuer;

/// Demo exports ship with this prefix and are dropped once real exports exist.
pub const EXAMPLE_PREFIX: &str = "example_";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSummary {
    pub path: PathBuf,
    pub source: String,
    pub issuer: Issuer,
    pub rows: usize,
}

#[derive(Debug, Default)]
pub struct ConsolidationReport {
    pub files: Vec<FileSummary>,
    pub skipped_examples: Vec<PathBuf>,
    /// True when only example files were present and they were used.
    pub used_examples: bool,
    /// Row- and file-level problems, in the order they were hit.
    pub issues: Vec<Error>,
}

impl ConsolidationReport {
    pub fn total_rows(&self) -> usize {
        self.files.iter().map(|f| f.rows).sum()
    }

    pub fn rows_by_source(&self) -> BTreeMap<String, usize> {
        let mut out = BTreeMap::new();
        for f in &self.files {
            *out.entry(f.source.clone()).or_insert(0) += f.rows;
        }
        out
    }
}

#[derive(Debug)]
pub struct Consolidation {
    pub transactions: Vec<Transaction>,
    pub report: ConsolidationReport,
}

/// `chase_sapphire_preferred.csv` → `Chase Sapphire Preferred`
pub fn source_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().replace('_', " "))
        .unwrap_or_default();

    let mut out = String::with_capacity(stem.len());
    let mut prev_alpha = false;
    for c in stem.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

pub fn is_example_file(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().to_lowercase().starts_with(EXAMPLE_PREFIX))
        .unwrap_or(false)
}

struct Inputs {
    files: Vec<PathBuf>,
    skipped_examples: Vec<PathBuf>,
    used_examples: bool,
}

fn discover_inputs(input_dir: &Path) -> Result<Inputs> {
    if !input_dir.is_dir() {
        return Err(Error::MissingInputDirectory(input_dir.to_path_buf()));
    }

    let mut all = Vec::new();
    for entry in fs::read_dir(input_dir)? {
        let path = entry?.path();
        let is_csv = path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);
        if path.is_file() && is_csv {
            all.push(path);
        }
    }
    if all.is_empty() {
        return Err(Error::NoInputFiles(input_dir.to_path_buf()));
    }
    all.sort();

    let (examples, real): (Vec<_>, Vec<_>) = all.into_iter().partition(|p| is_example_file(p));
    if real.is_empty() {
        Ok(Inputs {
            files: examples,
            skipped_examples: Vec::new(),
            used_examples: true,
        })
    } else {
        Ok(Inputs {
            files: real,
            skipped_examples: examples,
            used_examples: false,
        })
    }
}

/// Load every recognized export under `input_dir`, ordered by transaction date.
///
/// Per-row and per-file failures land in the report; only a missing or empty
/// input directory is fatal.
pub fn consolidate(input_dir: &Path, rules: &RuleSet) -> Result<Consolidation> {
    let inputs = discover_inputs(input_dir)?;

    let mut report = ConsolidationReport {
        skipped_examples: inputs.skipped_examples,
        used_examples: inputs.used_examples,
        ..Default::default()
    };
    if report.used_examples {
        log::warn!("no real exports found, using example files");
    } else if !report.skipped_examples.is_empty() {
        log::info!("skipping {} example file(s)", report.skipped_examples.len());
    }

    let mut transactions = Vec::new();

    for path in inputs.files {
        let profile = match detect_issuer(&path) {
            Ok(Some(p)) => p,
            Ok(None) => {
                let err = Error::UnrecognizedIssuerFormat(path.clone());
                log::warn!("{err}");
                report.issues.push(err);
                continue;
            }
            Err(e) => {
                log::warn!("{}: {e}", path.display());
                report.issues.push(e);
                continue;
            }
        };

        let source = source_name(&path);
        log::info!("loading {} as {} (source: {source})", path.display(), profile.name);

        match load_file(&path, profile, &source, rules) {
            Ok(loaded) => {
                log::info!("loaded {} rows from {}", loaded.transactions.len(), path.display());
                report.files.push(FileSummary {
                    path: path.clone(),
                    source,
                    issuer: profile.issuer,
                    rows: loaded.transactions.len(),
                });
                report.issues.extend(loaded.issues);
                transactions.extend(loaded.transactions);
            }
            Err(e) => {
                log::warn!("{}: {e}", path.display());
                report.issues.push(e);
            }
        }
    }

    // Stable: ties keep file order, then row order
    transactions.sort_by_key(|t| t.transaction_date);

    Ok(Consolidation {
        transactions,
        report,
    })
}

/// Consolidate and overwrite the ledger at `output`.
pub fn consolidate_to(input_dir: &Path, output: &Path, rules: &RuleSet) -> Result<Consolidation> {
    let consolidation = consolidate(input_dir, rules)?;
    write_ledger(output, &consolidation.transactions)?;
    log::info!(
        "wrote {} transactions to {}",
        consolidation.transactions.len(),
        output.display()
    );
    Ok(consolidation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::path::PathBuf;
    use tally_core::{read_ledger, TxnKind};

    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .parent()
            .unwrap()
            .join("fixtures")
    }

    fn copy_fixtures(dest: &Path) {
        for entry in fs::read_dir(fixtures_dir()).unwrap() {
            let path = entry.unwrap().path();
            if path.extension().map(|e| e == "csv").unwrap_or(false) {
                fs::copy(&path, dest.join(path.file_name().unwrap())).unwrap();
            }
        }
    }

    const REAL_CHASE: &str = "\
Transaction Date,Post Date,Description,Category,Type,Amount,Memo
02/06/2026,02/08/2026,BEST WESTERN UNIVERSIT,Travel,Sale,-1233.07,
01/20/2026,01/21/2026,UBER *TRIP,Travel,Sale,-31.40,
";

    #[test]
    fn test_source_name() {
        assert_eq!(source_name(Path::new("chase_sapphire_preferred.csv")), "Chase Sapphire Preferred");
        assert_eq!(source_name(Path::new("/x/APPLE.CSV")), "Apple");
        assert_eq!(source_name(Path::new("bilt-card.csv")), "Bilt-Card");
    }

    #[test]
    fn test_missing_directory_is_fatal() {
        let rules = RuleSet::builtin().unwrap();
        let err = consolidate(Path::new("/nonexistent/input"), &rules).unwrap_err();
        assert!(matches!(err, Error::MissingInputDirectory(_)));
    }

    #[test]
    fn test_empty_directory_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let rules = RuleSet::builtin().unwrap();
        let err = consolidate(dir.path(), &rules).unwrap_err();
        assert!(matches!(err, Error::NoInputFiles(_)));
    }

    #[test]
    fn test_examples_used_when_alone() {
        let dir = tempfile::tempdir().unwrap();
        copy_fixtures(dir.path());
        let rules = RuleSet::builtin().unwrap();

        let c = consolidate(dir.path(), &rules).unwrap();
        assert!(c.report.used_examples);
        assert_eq!(c.report.files.len(), 3);
        assert!(!c.transactions.is_empty());
        assert!(c.report.issues.iter().all(|e| e.is_recoverable()));
    }

    #[test]
    fn test_examples_excluded_when_real_files_exist() {
        let dir = tempfile::tempdir().unwrap();
        copy_fixtures(dir.path());
        fs::write(dir.path().join("chase.csv"), REAL_CHASE).unwrap();
        let rules = RuleSet::builtin().unwrap();

        let c = consolidate(dir.path(), &rules).unwrap();
        assert!(!c.report.used_examples);
        assert_eq!(c.report.skipped_examples.len(), 3);
        assert_eq!(c.report.files.len(), 1);
        assert_eq!(c.transactions.len(), 2);
        assert!(c.transactions.iter().all(|t| t.source == "Chase"));
    }

    #[test]
    fn test_sorted_ascending_and_sign_invariant() {
        let dir = tempfile::tempdir().unwrap();
        copy_fixtures(dir.path());
        let rules = RuleSet::builtin().unwrap();

        let c = consolidate(dir.path(), &rules).unwrap();
        for w in c.transactions.windows(2) {
            assert!(w[0].transaction_date <= w[1].transaction_date);
        }
        for t in &c.transactions {
            match t.kind {
                TxnKind::Expense => assert!(t.amount > Decimal::ZERO, "{t:?}"),
                TxnKind::Refund | TxnKind::Payment => assert!(t.amount < Decimal::ZERO, "{t:?}"),
                TxnKind::Other => {}
            }
        }
    }

    #[test]
    fn test_unrecognized_file_is_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("chase.csv"), REAL_CHASE).unwrap();
        fs::write(dir.path().join("brokerage.csv"), "Symbol,Qty,Price\nAAPL,1,200\n").unwrap();
        let rules = RuleSet::builtin().unwrap();

        let c = consolidate(dir.path(), &rules).unwrap();
        assert_eq!(c.transactions.len(), 2);
        assert_eq!(c.report.issues.len(), 1);
        assert!(matches!(c.report.issues[0], Error::UnrecognizedIssuerFormat(_)));
    }

    #[test]
    fn test_broken_file_does_not_stop_others() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("chase.csv"), REAL_CHASE).unwrap();
        // Named like an Apple export but missing its amount column
        fs::write(dir.path().join("apple.csv"), "Transaction Date,Description\n01/01/2026,X\n").unwrap();
        let rules = RuleSet::builtin().unwrap();

        let c = consolidate(dir.path(), &rules).unwrap();
        assert_eq!(c.transactions.len(), 2);
        assert!(matches!(c.report.issues[0], Error::MissingColumn { .. }));
    }

    #[test]
    fn test_ties_keep_file_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("a_chase.csv"),
            "Transaction Date,Post Date,Description,Category,Type,Amount,Memo\n\
             03/01/2026,03/02/2026,FIRST,,Sale,-1.00,\n\
             03/01/2026,03/02/2026,SECOND,,Sale,-2.00,\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("b_chase.csv"),
            "Transaction Date,Post Date,Description,Category,Type,Amount,Memo\n\
             02/28/2026,03/01/2026,EARLIER,,Sale,-3.00,\n\
             03/01/2026,03/02/2026,THIRD,,Sale,-4.00,\n",
        )
        .unwrap();
        let rules = RuleSet::builtin().unwrap();

        let c = consolidate(dir.path(), &rules).unwrap();
        let order: Vec<_> = c.transactions.iter().map(|t| t.description.as_str()).collect();
        assert_eq!(order, vec!["EARLIER", "FIRST", "SECOND", "THIRD"]);
    }

    #[test]
    fn test_rerun_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input");
        fs::create_dir(&input).unwrap();
        copy_fixtures(&input);
        let out = dir.path().join("processed").join("all_transactions.csv");
        let rules = RuleSet::builtin().unwrap();

        let first = consolidate_to(&input, &out, &rules).unwrap();
        let bytes_first = fs::read(&out).unwrap();
        let second = consolidate_to(&input, &out, &rules).unwrap();
        let bytes_second = fs::read(&out).unwrap();

        assert_eq!(first.transactions, second.transactions);
        assert_eq!(bytes_first, bytes_second);
        assert_eq!(read_ledger(&out).unwrap(), first.transactions);
    }
}
