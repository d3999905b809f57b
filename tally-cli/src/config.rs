use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tally_core::RuleSet;

use crate::state::ensure_tally_home;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsSection,

    /// Checked before the built-in merchant rules, in file order.
    #[serde(default)]
    pub merchant_rules: Vec<MerchantRuleEntry>,

    /// Category → keywords, checked before the built-in keyword table.
    #[serde(default)]
    pub category_keywords: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsSection {
    pub input_dir: PathBuf,
    pub ledger: PathBuf,
    pub ignore_list: PathBuf,
    pub backups_dir: PathBuf,
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("data/input"),
            ledger: PathBuf::from("data/processed/all_transactions.csv"),
            ignore_list: PathBuf::from("data/config/ignored_transactions.json"),
            backups_dir: PathBuf::from("data/backups"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchantRuleEntry {
    pub pattern: String,
    pub name: String,
}

impl Config {
    /// Built-in rules with this config's extras in front.
    pub fn rule_set(&self) -> Result<RuleSet> {
        let mut rules = RuleSet::builtin().context("compile built-in merchant rules")?;

        let extra: Vec<(String, String)> = self
            .merchant_rules
            .iter()
            .map(|r| (r.pattern.clone(), r.name.clone()))
            .collect();
        rules
            .merchants
            .prepend(&extra)
            .context("invalid [[merchant_rules]] entry")?;

        rules.categories.prepend(
            self.category_keywords
                .iter()
                .map(|(cat, kws)| (cat.clone(), kws.clone()))
                .collect(),
        );
        Ok(rules)
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_tally_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(p: &Path) -> Result<Config> {
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}

pub fn show_config() -> Result<()> {
    let p = config_path()?;
    let cfg = load_config_from(&p)?;
    if p.exists() {
        println!("# {}", p.display());
    } else {
        println!("# {} (not found, showing defaults)", p.display());
    }
    print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
    Ok(())
}
