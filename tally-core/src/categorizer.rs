//! Keyword-based category rules.

use crate::transaction::TxnKind;

/// Keyword table used by the assignment tool's `auto` suggestion.
/// Earlier entries win.
pub const DEFAULT_CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    ("Rent", &["rent", "bilt rent", "biltprotect"]),
    (
        "Groceries",
        &[
            "trader joe", "safeway", "whole foods", "h mart", "walmart", "target", "grocery",
            "market",
        ],
    ),
    (
        "Food & Drink",
        &[
            "restaurant", "cafe", "coffee", "sushi", "pizza", "burger", "bar", "starbucks",
            "mcdonald",
        ],
    ),
    (
        "Travel",
        &["airline", "southwest", "delta", "alaska", "uber", "lyft", "hotel", "airbnb"],
    ),
    ("Shopping", &["amazon", "uniqlo", "mall", "store"]),
    (
        "Bills & Utilities",
        &["insurance", "wifi", "internet", "utility", "lemonade"],
    ),
];

/// Description keywords applied at load time, uppercase.
const LOAD_RULES: &[(&str, &[&str])] = &[
    ("Payment", &["PAYMENT", "ACH DEPOSIT", "ACH CREDIT"]),
    ("Rent", &["BILT RENT", "BILTPROTECT RENT"]),
    ("Insurance", &["INSURANCE"]),
    ("Payment", &["DAILY CASH REDEMPTION"]),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRules {
    keywords: Vec<(String, Vec<String>)>,
}

impl Default for CategoryRules {
    fn default() -> Self {
        Self::new(
            DEFAULT_CATEGORY_KEYWORDS
                .iter()
                .map(|(cat, kws)| (cat.to_string(), kws.iter().map(|k| k.to_string()).collect()))
                .collect(),
        )
    }
}

impl CategoryRules {
    pub fn new(keywords: Vec<(String, Vec<String>)>) -> Self {
        let keywords = keywords
            .into_iter()
            .map(|(cat, kws)| (cat, kws.into_iter().map(|k| k.to_lowercase()).collect()))
            .collect();
        Self { keywords }
    }

    /// Insert entries ahead of the current table.
    pub fn prepend(&mut self, extra: Vec<(String, Vec<String>)>) {
        let mut merged = Self::new(extra).keywords;
        merged.append(&mut self.keywords);
        self.keywords = merged;
    }

    /// Suggest a category from merchant + description. Never applied without confirmation.
    pub fn suggest(&self, description: &str, merchant: &str) -> Option<&str> {
        let text = format!("{} {}", merchant, description).to_lowercase();
        self.keywords
            .iter()
            .find(|(_, kws)| kws.iter().any(|k| text.contains(k.as_str())))
            .map(|(cat, _)| cat.as_str())
    }

    /// Category filled in while loading, before any manual assignment.
    /// Returns None when the row should be left for the assignment tool.
    pub fn auto_assign(&self, kind: TxnKind, description: &str) -> Option<&'static str> {
        match kind {
            TxnKind::Payment => return Some("Payment"),
            TxnKind::Refund => return Some("Refund"),
            _ => {}
        }

        let desc = description.to_uppercase();
        LOAD_RULES
            .iter()
            .find(|(_, kws)| kws.iter().any(|k| desc.contains(k)))
            .map(|(cat, _)| *cat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggest_groceries() {
        let rules = CategoryRules::default();
        assert_eq!(rules.suggest("TRADER JOE S #131", "Trader Joe's"), Some("Groceries"));
    }

    #[test]
    fn test_suggest_uses_merchant_and_description() {
        let rules = CategoryRules::default();
        assert_eq!(rules.suggest("BPS*BILT RENT", "Bilt Rent Payment"), Some("Rent"));
        assert_eq!(rules.suggest("LEMONADE INSURANCE", ""), Some("Bills & Utilities"));
    }

    #[test]
    fn test_suggest_none() {
        let rules = CategoryRules::default();
        assert_eq!(rules.suggest("ZZZ QQQ", "Zzz"), None);
    }

    #[test]
    fn test_prepend_overrides_defaults() {
        let mut rules = CategoryRules::default();
        rules.prepend(vec![("Commute".to_string(), vec!["UBER".to_string()])]);
        assert_eq!(rules.suggest("UBER *TRIP", "Uber"), Some("Commute"));
    }

    #[test]
    fn test_auto_assign_by_kind() {
        let rules = CategoryRules::default();
        assert_eq!(rules.auto_assign(TxnKind::Payment, "AUTOPAY"), Some("Payment"));
        assert_eq!(rules.auto_assign(TxnKind::Refund, "AMAZON.COM"), Some("Refund"));
    }

    #[test]
    fn test_auto_assign_by_description() {
        let rules = CategoryRules::default();
        assert_eq!(rules.auto_assign(TxnKind::Expense, "BPS*BILT RENT 0123"), Some("Rent"));
        assert_eq!(rules.auto_assign(TxnKind::Expense, "Lemonade Insurance"), Some("Insurance"));
        assert_eq!(rules.auto_assign(TxnKind::Other, "DAILY CASH REDEMPTION"), Some("Payment"));
        assert_eq!(rules.auto_assign(TxnKind::Expense, "STARBUCKS 123"), None);
    }
}
