//! Sign/type normalization: every issuer's convention onto one ledger convention.
//!
//! Ledger convention: positive = expense, negative = refund or payment.
//! Unexpected rows are downgraded and flagged, never rejected.

use rust_decimal::Decimal;
use tally_core::TxnKind;

use crate::types::SignPolicy;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// Label not in the issuer's table; kept as Other with the raw sign.
    UnknownType(String),
    /// Label and sign disagreed; the sign was forced to match the label.
    SignMismatch(String),
    /// A zero amount cannot carry a signed kind.
    ZeroAmount,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub amount: Decimal,
    pub kind: TxnKind,
    pub warning: Option<Warning>,
}

pub fn normalize(policy: &SignPolicy, raw_amount: Decimal, raw_type: &str) -> Normalized {
    let label = raw_type.trim();
    let unified = if policy.flip_sign { -raw_amount } else { raw_amount };

    if label.is_empty() {
        return infer_from_sign(policy, unified);
    }

    let Some(kind) = policy.kind_for(label) else {
        return Normalized {
            amount: raw_amount,
            kind: TxnKind::Other,
            warning: Some(Warning::UnknownType(label.to_string())),
        };
    };

    if unified.is_zero() && kind != TxnKind::Other {
        return zero_amount(unified);
    }

    let amount = match kind {
        TxnKind::Expense => unified.abs(),
        TxnKind::Refund | TxnKind::Payment => -unified.abs(),
        TxnKind::Other => unified,
    };

    let warning = (amount != unified).then(|| Warning::SignMismatch(label.to_string()));

    Normalized {
        amount,
        kind,
        warning,
    }
}

fn infer_from_sign(policy: &SignPolicy, unified: Decimal) -> Normalized {
    if unified.is_zero() {
        return zero_amount(unified);
    }
    let kind = if unified.is_sign_positive() {
        TxnKind::Expense
    } else {
        policy.credit_kind
    };
    Normalized {
        amount: unified,
        kind,
        warning: None,
    }
}

fn zero_amount(amount: Decimal) -> Normalized {
    Normalized {
        // no "-0.00" in the ledger
        amount: amount.abs(),
        kind: TxnKind::Other,
        warning: Some(Warning::ZeroAmount),
    }
}
