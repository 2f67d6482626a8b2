//! Engine error taxonomy
//!
//! Validation failures are typed so callers (and tests) can match on them.
//! They convert into `anyhow::Error` at the CLI boundary.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EngineError {
    /// A region's span falls outside the document.
    #[error(
        "region '{name}' is out of range: lines {start}-{end} against a {document_lines}-line document"
    )]
    RegionBounds {
        name: String,
        start: usize,
        end: usize,
        document_lines: usize,
    },

    /// Two regions supplied to the same phase share at least one line.
    #[error("regions '{first}' and '{second}' overlap")]
    RegionOverlap { first: String, second: String },

    /// The extracted body has no declaration line to attach the
    /// visibility marker to.
    #[error("no '{keyword} {name}' declaration found in the body of region '{name}'")]
    MissingDeclaration { name: String, keyword: String },

    /// A patch rule matched in a shape the plan declared suspicious.
    #[error("patch rule [{rule}] matched ambiguously: expected {expected} match(es), found {found}")]
    AmbiguousPatchMatch {
        rule: String,
        expected: usize,
        found: usize,
    },

    /// Region addresses were resolved against a different document
    /// revision than the one being mutated.
    #[error(
        "region addresses are stale: resolved against revision {resolved}, document is at revision {current}"
    )]
    StaleAddresses { resolved: u64, current: u64 },
}
