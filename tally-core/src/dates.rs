//! Date parsing shared by the card loaders and the ledger reader.
//!
//! Card exports use `MM/DD/YYYY`; the unified ledger uses `YYYY-MM-DD`.
//! Both are accepted everywhere a date is read.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

pub const LEDGER_DATE_FORMAT: &str = "%Y-%m-%d";

const ACCEPTED_FORMATS: [&str; 2] = [LEDGER_DATE_FORMAT, "%m/%d/%Y"];

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    ACCEPTED_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

pub(crate) fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid date '{raw}'")))
}

pub(crate) fn deserialize_opt_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
    if raw.trim().is_empty() {
        return Ok(None);
    }
    parse_date(&raw)
        .map(Some)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid date '{raw}'")))
}
