use std::fmt;

use tally_core::TxnKind;

/// Card issuers with a known CSV export layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Issuer {
    AppleCard,
    Chase,
    Bilt,
}

impl fmt::Display for Issuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Issuer::AppleCard => "Apple Card",
            Issuer::Chase => "Chase",
            Issuer::Bilt => "Bilt",
        })
    }
}

/// How an issuer signs amounts and labels transaction types.
#[derive(Debug, Clone, Copy)]
pub struct SignPolicy {
    /// True when the issuer reports expenses as negative numbers.
    pub flip_sign: bool,
    /// Case-insensitive raw type label → unified kind.
    pub type_labels: &'static [(&'static str, TxnKind)],
    /// Kind given to a credit (negative unified amount) whose label is blank.
    pub credit_kind: TxnKind,
}

impl SignPolicy {
    pub fn kind_for(&self, label: &str) -> Option<TxnKind> {
        let label = label.trim();
        self.type_labels
            .iter()
            .find(|(l, _)| l.eq_ignore_ascii_case(label))
            .map(|(_, kind)| *kind)
    }
}

/// Accepted header names per unified field. The first alias present wins.
#[derive(Debug, Clone, Copy)]
pub struct ColumnMap {
    pub transaction_date: &'static [&'static str],
    pub post_date: &'static [&'static str],
    pub description: &'static [&'static str],
    pub merchant: &'static [&'static str],
    pub category: &'static [&'static str],
    pub kind: &'static [&'static str],
    pub amount: &'static [&'static str],
    pub memo: &'static [&'static str],
}

#[derive(Debug, Clone, Copy)]
pub struct IssuerProfile {
    pub issuer: Issuer,
    pub name: &'static str,
    pub sign: SignPolicy,
    pub columns: ColumnMap,
    /// Lowercase substrings of a file name that select this issuer.
    pub file_name_hints: &'static [&'static str],
    /// Headers that must all be present to recognize the file by shape.
    pub signature: &'static [&'static str],
}

impl IssuerProfile {
    pub fn matches_file_name(&self, file_name: &str) -> bool {
        let lower = file_name.to_lowercase();
        self.file_name_hints.iter().any(|h| lower.contains(h))
    }

    pub fn matches_headers(&self, headers: &csv::StringRecord) -> bool {
        self.signature.iter().all(|wanted| {
            headers
                .iter()
                .any(|h| h.trim().eq_ignore_ascii_case(wanted))
        })
    }
}
