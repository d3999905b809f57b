//! Merchant normalization: raw card descriptions to canonical display names.
//!
//! Rules are evaluated in order and the first match wins, so the table is
//! curated most-specific-first. Descriptions no rule recognizes go through a
//! cleanup heuristic that strips processor prefixes and location noise.

use regex::{Regex, RegexBuilder};

use crate::error::{Error, Result};
use crate::transaction::UNKNOWN_MERCHANT;

const MAX_MERCHANT_LEN: usize = 50;

/// Default rules, most specific first.
pub const DEFAULT_MERCHANT_RULES: &[(&str, &str)] = &[
    (r"AMAZON|AMZN", "Amazon"),
    (r"TRADER\s*JOE", "Trader Joe's"),
    (r"SAFEWAY", "Safeway"),
    (r"TARGET", "Target"),
    (r"WALMART|WM\s*SUPERCENTER", "Walmart"),
    (r"UBER", "Uber"),
    (r"LYFT", "Lyft"),
    (r"STARBUCKS", "Starbucks"),
    (r"MCDONALD", "McDonald's"),
    (r"WHOLE\s*FOODS|WHOLEFDS", "Whole Foods"),
    (r"H\s*MART|HMART", "H Mart"),
    (r"BILTPROTECT\s*RENT|BPS\*BILT\s*RENT", "Bilt Rent Payment"),
    (r"LEMONADE\s*INSURANCE", "Lemonade Insurance"),
    (r"SOUTHWEST|SOUTHWES", "Southwest Airlines"),
    (r"DELTA\s*AIR", "Delta Airlines"),
    (r"ALASKA\s*AIR", "Alaska Airlines"),
    (r"AIRASIA", "AirAsia"),
    (r"CATHAYPACAIR|CATHAY\s*PACIFIC", "Cathay Pacific"),
    (r"UNIQLO", "Uniqlo"),
    (
        r"PAYMENT\s*THANK\s*YOU|ONLINE\s*ACH\s*PAYMENT|ACH\s*DEPOSIT",
        "Payment/Transfer",
    ),
    (r"IVARS|IVAR'S", "Ivar's"),
    (r"SIZZLE.*CRUNCH", "Sizzle & Crunch"),
    (r"DONT\s*YELL|DON'T\s*YELL", "Don't Yell At Me"),
    (r"LEE.*S\s*KITCHEN", "Lee's Kitchen"),
    (r"FOB\s*SUSHI|FOB\s*POKE", "FOB"),
    (r"\bCHASE\b", "Payment/Transfer"),
    (r"7-ELEVEN|7\s*ELEVEN|FAMILYMART|FAMILY\s*MART", "7-Eleven/FamilyMart"),
    (r"\bKFC\b", "KFC"),
    (r"BURGER\s*KING", "Burger King"),
    (r"CHICK-FIL-A|CHICKFILA", "Chick-fil-A"),
    (r"ALADDIN", "Aladdin"),
    (r"TASTE\s*OF\s*XI.*AN", "Taste of Xi'an"),
    (r"TAIWAN\s*PORRIDGE", "Taiwan Porridge"),
    (r"CHA\s*YAN", "Cha Yan"),
    (r"SL\.NORD|NORD.*VPN", "NordVPN"),
    (r"NOW\s*WIFI", "NOW WiFi"),
    (r"APPLE\s*ONLINE|\bAOS\b", "Apple"),
];

#[derive(Debug, Clone)]
pub struct MerchantRule {
    pub pattern: Regex,
    pub name: String,
}

#[derive(Debug, Clone)]
struct Cleanup {
    prefix: Regex,
    trailing_number: Regex,
    state_usa: Regex,
    zip: Regex,
}

impl Cleanup {
    fn new() -> Result<Self> {
        Ok(Self {
            prefix: compile(r"^(TST\*|SQ\s*\*|BB\*|UEP\*|SP\s+)\s*", true)?,
            trailing_number: compile(r"\s+\d+.*$", false)?,
            state_usa: compile(r"\s+[A-Z]{2}\s+USA$", false)?,
            zip: compile(r"\s+\d{5}(-\d{4})?\s*$", false)?,
        })
    }

    fn strip_prefixes<'a>(&self, mut s: &'a str) -> &'a str {
        while let Some(m) = self.prefix.find(s) {
            if m.end() == 0 {
                break;
            }
            s = &s[m.end()..];
        }
        s
    }

    fn pass(&self, raw: &str) -> String {
        let s = self.strip_prefixes(raw.trim());
        let s = self.trailing_number.replace(s, "");
        let s = self.state_usa.replace(&s, "");
        let s = self.zip.replace(&s, "");
        s.trim().chars().take(MAX_MERCHANT_LEN).collect::<String>().trim().to_string()
    }

    /// Repeat the pass until nothing changes. Every pass only shortens.
    fn apply(&self, raw: &str) -> String {
        let mut current = raw.trim().to_string();
        loop {
            let next = self.pass(&current);
            if next == current {
                return current;
            }
            current = next;
        }
    }
}

/// Ordered pattern → canonical-name table.
#[derive(Debug, Clone)]
pub struct MerchantRules {
    rules: Vec<MerchantRule>,
    cleanup: Cleanup,
}

impl MerchantRules {
    pub fn new(specs: &[(&str, &str)]) -> Result<Self> {
        let rules = specs
            .iter()
            .map(|(pattern, name)| {
                Ok(MerchantRule {
                    pattern: compile(pattern, true)?,
                    name: name.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            rules,
            cleanup: Cleanup::new()?,
        })
    }

    pub fn builtin() -> Result<Self> {
        Self::new(DEFAULT_MERCHANT_RULES)
    }

    /// Insert rules ahead of the existing ones, keeping their relative order.
    pub fn prepend(&mut self, specs: &[(String, String)]) -> Result<()> {
        let mut extra = specs
            .iter()
            .map(|(pattern, name)| {
                Ok(MerchantRule {
                    pattern: compile(pattern, true)?,
                    name: name.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        extra.append(&mut self.rules);
        self.rules = extra;
        Ok(())
    }

    pub fn rules(&self) -> &[MerchantRule] {
        &self.rules
    }

    pub fn normalize(&self, raw: &str) -> String {
        let raw = raw.trim();
        if raw.is_empty() || raw.eq_ignore_ascii_case("nan") {
            return UNKNOWN_MERCHANT.to_string();
        }

        if let Some(name) = self.matching_rule(raw) {
            return name;
        }

        let cleaned = self.cleanup.apply(raw);
        if cleaned.is_empty() || cleaned.eq_ignore_ascii_case("nan") {
            return UNKNOWN_MERCHANT.to_string();
        }
        // Truncation can expose a word-boundary match
        self.matching_rule(&cleaned).unwrap_or(cleaned)
    }

    fn matching_rule(&self, s: &str) -> Option<String> {
        self.rules
            .iter()
            .find(|r| r.pattern.is_match(s))
            .map(|r| r.name.clone())
    }

    /// First three words of the description once processor prefixes are gone.
    pub fn suggest_from_description(&self, description: &str) -> Option<String> {
        let words: Vec<&str> = self
            .cleanup
            .strip_prefixes(description.trim())
            .split_whitespace()
            .take(3)
            .collect();
        if words.is_empty() {
            None
        } else {
            Some(words.join(" "))
        }
    }
}

fn compile(pattern: &str, case_insensitive: bool) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(case_insensitive)
        .build()
        .map_err(|source| Error::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })
}
