//! Saving an edited ledger: timestamped backup first, then full overwrite.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use tally_core::{write_ledger, Result, Transaction};

/// Backup file name for `ledger` taken at `stamp`, e.g. `all_transactions-20260216-091500.csv`.
pub fn backup_name(ledger: &Path, stamp: &str) -> String {
    let stem = ledger
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "ledger".to_string());
    let ext = ledger
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .unwrap_or_else(|| "csv".to_string());
    format!("{stem}-{stamp}.{ext}")
}

/// Copy the current ledger into `backups_dir` and overwrite it with `txns`.
///
/// Returns the backup path, or None when there was no ledger to back up.
pub fn save_with_backup(
    ledger: &Path,
    backups_dir: &Path,
    txns: &[Transaction],
) -> Result<Option<PathBuf>> {
    let backup = if ledger.exists() {
        fs::create_dir_all(backups_dir)?;
        let stamp = Local::now().format("%Y%m%d-%H%M%S").to_string();
        let mut dest = backups_dir.join(backup_name(ledger, &stamp));
        // Two saves inside the same second must not clobber each other
        let mut n = 1;
        while dest.exists() {
            dest = backups_dir.join(backup_name(ledger, &format!("{stamp}-{n}")));
            n += 1;
        }
        fs::copy(ledger, &dest)?;
        log::info!("backed up {} to {}", ledger.display(), dest.display());
        Some(dest)
    } else {
        None
    };

    write_ledger(ledger, txns)?;
    Ok(backup)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use tally_core::{read_ledger, TxnKind};

    fn txn(category: &str) -> Transaction {
        Transaction {
            transaction_date: NaiveDate::from_ymd_opt(2026, 1, 3).unwrap(),
            post_date: None,
            description: "STARBUCKS STORE 05512".to_string(),
            merchant: "Starbucks".to_string(),
            category: category.to_string(),
            kind: TxnKind::Expense,
            amount: dec!(6.45),
            memo: String::new(),
            source: "Chase".to_string(),
        }
    }

    #[test]
    fn test_backup_name() {
        assert_eq!(
            backup_name(Path::new("data/processed/all_transactions.csv"), "20260216-091500"),
            "all_transactions-20260216-091500.csv"
        );
    }

    #[test]
    fn test_backup_holds_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = dir.path().join("all.csv");
        let backups = dir.path().join("backups");
        write_ledger(&ledger, &[txn("")]).unwrap();

        let backup = save_with_backup(&ledger, &backups, &[txn("Food & Drink")])
            .unwrap()
            .unwrap();

        assert_eq!(read_ledger(&backup).unwrap()[0].category, "");
        assert_eq!(read_ledger(&ledger).unwrap()[0].category, "Food & Drink");
    }

    #[test]
    fn test_repeated_saves_keep_every_backup() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = dir.path().join("all.csv");
        let backups = dir.path().join("backups");
        write_ledger(&ledger, &[txn("")]).unwrap();

        let a = save_with_backup(&ledger, &backups, &[txn("A")]).unwrap().unwrap();
        let b = save_with_backup(&ledger, &backups, &[txn("B")]).unwrap().unwrap();
        assert_ne!(a, b);
        assert_eq!(fs::read_dir(&backups).unwrap().count(), 2);
    }

    #[test]
    fn test_no_backup_without_existing_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = dir.path().join("all.csv");
        let backup = save_with_backup(&ledger, &dir.path().join("backups"), &[txn("")]).unwrap();
        assert!(backup.is_none());
        assert!(ledger.exists());
    }
}
