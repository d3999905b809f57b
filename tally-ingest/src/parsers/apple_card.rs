//! Apple Card CSV export
//!
//! Header:
//!   Transaction Date,Clearing Date,Description,Merchant,Category,Type,Amount (USD),Purchased By
//!
//! Amounts already follow the ledger convention: purchases positive, credits negative.

use tally_core::TxnKind;

use crate::types::{ColumnMap, Issuer, IssuerProfile, SignPolicy};

const APPLE_TYPES: &[(&str, TxnKind)] = &[
    ("Purchase", TxnKind::Expense),
    ("Installment", TxnKind::Expense),
    ("Interest", TxnKind::Expense),
    ("Debit", TxnKind::Expense),
    ("Credit", TxnKind::Refund),
    ("Return", TxnKind::Refund),
    ("Payment", TxnKind::Payment),
];

pub static APPLE_CARD: IssuerProfile = IssuerProfile {
    issuer: Issuer::AppleCard,
    name: "Apple Card",
    sign: SignPolicy {
        flip_sign: false,
        type_labels: APPLE_TYPES,
        credit_kind: TxnKind::Refund,
    },
    columns: ColumnMap {
        transaction_date: &["Transaction Date"],
        post_date: &["Clearing Date"],
        description: &["Description"],
        merchant: &["Merchant"],
        category: &["Category"],
        kind: &["Type"],
        amount: &["Amount (USD)", "Amount"],
        memo: &["Memo"],
    },
    file_name_hints: &["apple"],
    signature: &["Clearing Date", "Amount (USD)"],
};
