//! Persistent ignore list: transactions excluded from every total.
//!
//! Entries are keyed by a hash of (date, amount, description, source), so an
//! ignored transaction stays ignored after the ledger is regenerated. Every
//! mutation rewrites the whole file.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tally_core::{to_cents, Error, Result, Transaction};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IgnoreEntry {
    pub date: String,
    pub description: String,
    #[serde(default)]
    pub merchant: String,
    #[serde(default)]
    pub category: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub source: String,
    pub ignored_at: String,
}

/// Older files stored a plain array; ids and timestamps may be missing.
#[derive(Debug, Deserialize)]
struct LegacyEntry {
    id: Option<String>,
    #[serde(default)]
    date: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    merchant: String,
    #[serde(default)]
    category: String,
    #[serde(default, with = "rust_decimal::serde::float")]
    amount: Decimal,
    #[serde(default)]
    source: String,
    ignored_at: Option<String>,
    ignored_on: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredList {
    Map(BTreeMap<String, IgnoreEntry>),
    Legacy(Vec<LegacyEntry>),
}

/// Stable id for a transaction, independent of its position in the ledger.
pub fn transaction_id(txn: &Transaction) -> String {
    key_id(txn.transaction_date, txn.amount, &txn.description, &txn.source)
}

pub fn key_id(date: NaiveDate, amount: Decimal, description: &str, source: &str) -> String {
    let key = format!(
        "{}|{}|{}|{}",
        date.format("%Y-%m-%d"),
        to_cents(amount),
        description,
        source
    );
    hex::encode(Sha256::digest(key.as_bytes()))
}

fn now_stamp() -> String {
    Local::now().to_rfc3339()
}

#[derive(Debug)]
pub struct IgnoreList {
    path: PathBuf,
    entries: BTreeMap<String, IgnoreEntry>,
}

impl IgnoreList {
    /// Open the list at `path`. A missing file is an empty list.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Ok(Self {
                path,
                entries: BTreeMap::new(),
            });
        }

        let text = fs::read_to_string(&path)?;
        if text.trim().is_empty() {
            return Ok(Self {
                path,
                entries: BTreeMap::new(),
            });
        }

        match serde_json::from_str::<StoredList>(&text)? {
            StoredList::Map(entries) => {
                let stale = entries.keys().filter(|id| !is_current_id(id)).count();
                if stale == 0 {
                    return Ok(Self { path, entries });
                }
                log::info!("re-keying {stale} ignored transaction(s) in {}", path.display());
                let mut list = Self {
                    path,
                    entries: entries.into_iter().map(rekey).collect(),
                };
                list.save()?;
                Ok(list)
            }
            StoredList::Legacy(items) => {
                log::info!("converting legacy ignore list at {}", path.display());
                let mut list = Self {
                    path,
                    entries: items.into_iter().map(convert_legacy).map(rekey).collect(),
                };
                list.save()?;
                Ok(list)
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Add a transaction and return its id. Re-adding is a no-op.
    pub fn add(&mut self, txn: &Transaction) -> Result<String> {
        let id = transaction_id(txn);
        if self.entries.contains_key(&id) {
            return Ok(id);
        }
        self.entries.insert(
            id.clone(),
            IgnoreEntry {
                date: txn.transaction_date.format("%Y-%m-%d").to_string(),
                description: txn.description.clone(),
                merchant: txn.merchant.clone(),
                category: txn.category.clone(),
                amount: to_cents(txn.amount),
                source: txn.source.clone(),
                ignored_at: now_stamp(),
            },
        );
        self.save()?;
        Ok(id)
    }

    /// Returns false when the id was not in the list.
    pub fn remove(&mut self, id: &str) -> Result<bool> {
        if self.entries.remove(id).is_none() {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    pub fn contains(&self, txn: &Transaction) -> bool {
        self.entries.contains_key(&transaction_id(txn))
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn list(&self) -> Vec<(&str, &IgnoreEntry)> {
        self.entries.iter().map(|(id, e)| (id.as_str(), e)).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        self.save()
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(&self.entries)?;

        // Write beside the real file, then swap it in
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| Error::Io(std::io::Error::other("ignore list path has no file name")))?;
        let tmp = self.path.with_file_name(format!("{file_name}.tmp"));
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;

        log::debug!("saved {} ignored transaction(s) to {}", self.entries.len(), self.path.display());
        Ok(())
    }
}

/// Ids written by older tools were md5 hex.
fn is_current_id(id: &str) -> bool {
    id.len() == 64 && id.bytes().all(|b| b.is_ascii_hexdigit())
}

fn rekey((id, entry): (String, IgnoreEntry)) -> (String, IgnoreEntry) {
    if is_current_id(&id) {
        return (id, entry);
    }
    match tally_core::parse_date(&entry.date) {
        Some(date) => (key_id(date, entry.amount, &entry.description, &entry.source), entry),
        // Cannot recompute; keep it so it still shows in `list`
        None => (id, entry),
    }
}

fn convert_legacy(item: LegacyEntry) -> (String, IgnoreEntry) {
    let id = item.id.unwrap_or_else(|| match tally_core::parse_date(&item.date) {
        Some(date) => key_id(date, item.amount, &item.description, &item.source),
        None => hex::encode(Sha256::digest(
            format!("{}|{}|{}|{}", item.date, item.amount, item.description, item.source).as_bytes(),
        )),
    });
    let ignored_at = item.ignored_at.or(item.ignored_on).unwrap_or_else(now_stamp);
    (
        id,
        IgnoreEntry {
            date: item.date,
            description: item.description,
            merchant: item.merchant,
            category: item.category,
            amount: item.amount,
            source: item.source,
            ignored_at,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tally_core::TxnKind;

    fn hotel() -> Transaction {
        Transaction {
            transaction_date: NaiveDate::from_ymd_opt(2026, 2, 6).unwrap(),
            post_date: NaiveDate::from_ymd_opt(2026, 2, 8),
            description: "BEST WESTERN UNIVERSIT".to_string(),
            merchant: "BEST WESTERN UNIVERSIT".to_string(),
            category: "Travel".to_string(),
            kind: TxnKind::Expense,
            amount: dec!(1233.07),
            memo: String::new(),
            source: "Chase".to_string(),
        }
    }

    #[test]
    fn test_add_then_contains() {
        let dir = tempfile::tempdir().unwrap();
        let mut list = IgnoreList::open(dir.path().join("ignored.json")).unwrap();
        let id = list.add(&hotel()).unwrap();
        assert!(list.contains(&hotel()));
        assert!(list.contains_id(&id));
        assert_eq!(id.len(), 64);
    }

    #[test]
    fn test_add_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut list = IgnoreList::open(dir.path().join("ignored.json")).unwrap();
        let a = list.add(&hotel()).unwrap();
        let b = list.add(&hotel()).unwrap();
        assert_eq!(a, b);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_remove_then_not_contains() {
        let dir = tempfile::tempdir().unwrap();
        let mut list = IgnoreList::open(dir.path().join("ignored.json")).unwrap();
        let id = list.add(&hotel()).unwrap();
        assert!(list.remove(&id).unwrap());
        assert!(!list.contains(&hotel()));
        assert!(!list.remove(&id).unwrap());
    }

    #[test]
    fn test_id_ignores_mutable_fields_and_scale() {
        let mut edited = hotel();
        edited.category = "Lodging".to_string();
        edited.merchant = "Best Western".to_string();
        edited.amount = dec!(1233.070);
        assert_eq!(transaction_id(&edited), transaction_id(&hotel()));

        let mut other_card = hotel();
        other_card.source = "Bilt".to_string();
        assert_ne!(transaction_id(&other_card), transaction_id(&hotel()));
    }

    #[test]
    fn test_every_mutation_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config").join("ignored.json");
        let id = {
            let mut list = IgnoreList::open(&path).unwrap();
            list.add(&hotel()).unwrap()
        };

        let reopened = IgnoreList::open(&path).unwrap();
        assert!(reopened.contains(&hotel()));
        let (stored_id, entry) = reopened.list()[0];
        assert_eq!(stored_id, id);
        assert_eq!(entry.date, "2026-02-06");
        assert_eq!(entry.amount, dec!(1233.07));
        assert_eq!(entry.source, "Chase");

        let mut reopened = reopened;
        reopened.clear().unwrap();
        assert!(IgnoreList::open(&path).unwrap().is_empty());
    }

    #[test]
    fn test_file_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ignored.json");
        let mut list = IgnoreList::open(&path).unwrap();
        let id = list.add(&hotel()).unwrap();

        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let entry = &value[&id];
        assert_eq!(entry["description"], "BEST WESTERN UNIVERSIT");
        assert_eq!(entry["amount"].as_f64(), Some(1233.07));
        assert!(entry["ignored_at"].is_string());
    }

    #[test]
    fn test_legacy_array_is_converted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ignored.json");
        fs::write(
            &path,
            r#"[
                {"id": "keep-me", "date": "2026-01-01", "description": "X", "amount": 5.0, "source": "Apple", "ignored_on": "2026-01-02T00:00:00"},
                {"date": "2026-02-06", "description": "BEST WESTERN UNIVERSIT", "amount": 1233.07, "source": "Chase"}
            ]"#,
        )
        .unwrap();

        let list = IgnoreList::open(&path).unwrap();
        assert_eq!(list.len(), 2);
        assert!(list.contains(&hotel()));

        // Old ids are replaced by content hashes
        assert!(!list.contains_id("keep-me"));
        let rekeyed = key_id(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(), dec!(5.0), "X", "Apple");
        let legacy = list.list().into_iter().find(|(id, _)| *id == rekeyed).unwrap().1;
        assert_eq!(legacy.ignored_at, "2026-01-02T00:00:00");

        // Rewritten as a map
        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(value.is_object());
    }

    #[test]
    fn test_md5_keyed_map_is_rekeyed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ignored.json");
        fs::write(
            &path,
            r#"{
                "5d41402abc4b2a76b9719d911017c592": {
                    "date": "2026-02-06",
                    "description": "BEST WESTERN UNIVERSIT",
                    "merchant": "BEST WESTERN UNIVERSIT",
                    "category": "Travel",
                    "amount": 1233.07,
                    "source": "Chase",
                    "ignored_at": "2026-02-10T08:00:00"
                }
            }"#,
        )
        .unwrap();

        let list = IgnoreList::open(&path).unwrap();
        assert_eq!(list.len(), 1);
        assert!(list.contains(&hotel()));
        assert!(!list.contains_id("5d41402abc4b2a76b9719d911017c592"));
        assert_eq!(list.list()[0].1.ignored_at, "2026-02-10T08:00:00");

        // The new key is on disk
        let reopened = IgnoreList::open(&path).unwrap();
        assert!(reopened.contains_id(&transaction_id(&hotel())));
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ignored.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(IgnoreList::open(&path).is_err());
    }
}
