use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{}: line {line}: {reason}", file.display())]
    MalformedRow {
        file: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("{}: does not match any known card export format", .0.display())]
    UnrecognizedIssuerFormat(PathBuf),

    #[error(
        "input directory {} not found. Create it and copy your card CSV exports into it",
        .0.display()
    )]
    MissingInputDirectory(PathBuf),

    #[error("no CSV files found in {}", .0.display())]
    NoInputFiles(PathBuf),

    #[error("{}: line {line}: unknown transaction type '{label}', recorded as Other", file.display())]
    UnknownTransactionType {
        file: PathBuf,
        line: usize,
        label: String,
    },

    #[error("{}: line {line}: '{label}' amount had the wrong sign for its type, corrected", file.display())]
    SignMismatch {
        file: PathBuf,
        line: usize,
        label: String,
    },

    #[error("{}: line {line}: zero amount, recorded as Other", file.display())]
    ZeroAmount { file: PathBuf, line: usize },

    #[error("{}: missing column '{column}'", file.display())]
    MissingColumn { file: PathBuf, column: String },

    #[error("ledger not found: {}. Run `tally consolidate` first", .0.display())]
    LedgerNotFound(PathBuf),

    #[error("invalid rule pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Row- and file-level problems that are reported but never stop a run.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::MalformedRow { .. }
                | Error::UnrecognizedIssuerFormat(_)
                | Error::UnknownTransactionType { .. }
                | Error::SignMismatch { .. }
                | Error::ZeroAmount { .. }
                | Error::MissingColumn { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
