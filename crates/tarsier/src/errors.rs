use thiserror::Error;

/// Errors produced while building or evaluating query plans.
///
/// Every variant except `Internal` and `SourceError` is raised during plan
/// construction. A chain of builder calls that returns `Ok` will not fail
/// evaluation with anything from this taxonomy.
#[derive(Error, Debug)]
pub enum TarsierError {
    #[error("unknown table: {0}")]
    UnknownTable(String),

    #[error("cannot resolve column in input: {0}")]
    UnresolvedColumn(String),

    #[error("column not found: {0}")]
    ColumnNotFound(String),

    #[error("duplicate column: {0}")]
    DuplicateColumn(String),

    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    #[error("unsupported join predicate: {0}")]
    UnsupportedJoinPredicate(String),

    #[error("ambiguous column: {0}")]
    AmbiguousColumn(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("source error: {0}")]
    SourceError(String),

    #[error("internal: {0}")]
    Internal(String),
}

pub type Result<T, E = TarsierError> = std::result::Result<T, E>;

/// Create an `Internal` error with a formatted message.
macro_rules! internal {
    ($($arg:tt)*) => {
        $crate::errors::TarsierError::Internal(format!($($arg)*))
    };
}

pub(crate) use internal;
