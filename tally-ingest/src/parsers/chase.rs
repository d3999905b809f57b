//! Chase credit card CSV export (Sapphire, Freedom) and the Bilt card, which shares its layout.
//!
//! Header:
//!   Transaction Date,Post Date,Description,Category,Type,Amount,Memo
//!
//! Both issuers report purchases as negative numbers; the loader flips them.

use tally_core::TxnKind;

use crate::types::{ColumnMap, Issuer, IssuerProfile, SignPolicy};

const CARD_TYPES: &[(&str, TxnKind)] = &[
    ("Sale", TxnKind::Expense),
    ("Purchase", TxnKind::Expense),
    ("Fee", TxnKind::Expense),
    ("Interest", TxnKind::Expense),
    ("Return", TxnKind::Refund),
    ("Payment", TxnKind::Payment),
    ("Adjustment", TxnKind::Other),
];

const CARD_COLUMNS: ColumnMap = ColumnMap {
    transaction_date: &["Transaction Date", "Trans Date", "Date"],
    post_date: &["Post Date", "Posted Date"],
    description: &["Description"],
    merchant: &["Merchant"],
    category: &["Category"],
    kind: &["Type"],
    amount: &["Amount"],
    memo: &["Memo"],
};

pub static CHASE: IssuerProfile = IssuerProfile {
    issuer: Issuer::Chase,
    name: "Chase",
    sign: SignPolicy {
        flip_sign: true,
        type_labels: CARD_TYPES,
        credit_kind: TxnKind::Refund,
    },
    columns: CARD_COLUMNS,
    file_name_hints: &["chase", "sapphire", "freedom"],
    signature: &["Transaction Date", "Post Date", "Description", "Type", "Amount"],
};

pub static BILT: IssuerProfile = IssuerProfile {
    issuer: Issuer::Bilt,
    name: "Bilt",
    sign: SignPolicy {
        flip_sign: true,
        type_labels: CARD_TYPES,
        credit_kind: TxnKind::Refund,
    },
    columns: CARD_COLUMNS,
    file_name_hints: &["bilt"],
    signature: &["Transaction Date", "Posted Date", "Description", "Amount"],
};
