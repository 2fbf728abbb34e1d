//! Error types for the relation registry

use thiserror::Error;

use crate::relation::RelationKey;

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;

/// A malformed declaration line. Loading stops at the first one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line}: {kind}")]
pub struct ParseError {
    /// 1-based line number within the source
    pub line: usize,
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub fn new(line: usize, kind: ParseErrorKind) -> Self {
        Self { line, kind }
    }
}

/// What was wrong with a declaration line
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    #[error("expected `<` or `>` between two column references: {0:?}")]
    MissingOperator(String),

    #[error("invalid column reference {0:?}, expected `table.column`")]
    BadColumnRef(String),

    #[error("unknown status {0:?}")]
    UnknownStatus(String),

    #[error("relation {0} is already declared with this status")]
    Duplicate(RelationKey),

    #[error("`changed from` references {0}, which is not declared earlier")]
    UnknownSupersedes(RelationKey),
}

/// Relation registry errors
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Parse error in {file}: {source}")]
    ParseInFile {
        file: String,
        #[source]
        source: ParseError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Reference cycle through tables: {}", .0.join(" -> "))]
    Cycle(Vec<String>),

    #[error("Configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),
}
