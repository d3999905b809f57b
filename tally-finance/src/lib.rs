//! tally-finance: ignore list, interactive assignment, ledger saves and spending summaries

pub mod assign;
pub mod ignore_list;
pub mod ledger_store;
pub mod summary;

pub use assign::{
    known_categories, parse_command, stats, work_queue, AssignMode, AssignSession, Command, Outcome,
    Reply, State, Stats,
};
pub use ignore_list::{key_id, transaction_id, IgnoreEntry, IgnoreList};
pub use ledger_store::{backup_name, save_with_backup};
pub use summary::{summarize, Summary, SummaryFilter, UNCATEGORIZED_LABEL};
