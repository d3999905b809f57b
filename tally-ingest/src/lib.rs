//! tally-ingest: card export parsers, sign/type normalization, and consolidation into one ledger.

pub mod consolidate;
pub mod normalize;
pub mod parsers;
pub mod types;

pub use consolidate::{
    consolidate, consolidate_to, is_example_file, source_name, Consolidation, ConsolidationReport,
    FileSummary, EXAMPLE_PREFIX,
};
pub use normalize::{normalize, Normalized, Warning};
pub use parsers::{detect_issuer, load_file, Loaded};
pub use types::{Issuer, IssuerProfile, SignPolicy};
