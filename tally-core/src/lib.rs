//! tally-core: unified ledger types, merchant normalization and category rules

pub mod categorizer;
pub mod dates;
pub mod error;
pub mod merchant;
pub mod transaction;

pub use categorizer::{CategoryRules, DEFAULT_CATEGORY_KEYWORDS};
pub use dates::parse_date;
pub use error::{Error, Result};
pub use merchant::{MerchantRule, MerchantRules, DEFAULT_MERCHANT_RULES};
pub use transaction::{
    read_ledger, to_cents, write_ledger, Transaction, TxnKind, LEDGER_HEADER, UNKNOWN_MERCHANT,
};

/// The configurable rule tables, passed explicitly to loaders and the assignment tool.
#[derive(Debug, Clone)]
pub struct RuleSet {
    pub merchants: MerchantRules,
    pub categories: CategoryRules,
}

impl RuleSet {
    pub fn builtin() -> Result<Self> {
        Ok(Self {
            merchants: MerchantRules::builtin()?,
            categories: CategoryRules::default(),
        })
    }
}
