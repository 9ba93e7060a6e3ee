use crate::column::ColumnKind;
use crate::path::ColumnPath;
use crate::types::ValueType;

pub type FrameResult<T> = Result<T, FrameError>;

/// Errors raised by frame construction and frame operations.
///
/// All of them describe a contract violation by the caller (an unknown column, an impossible
/// conversion, a schema mismatch). None are retried or swallowed by the library.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FrameError {
    #[error("column {path} not found")]
    ColumnNotFound { path: ColumnPath },
    #[error("selector {selector} does not match any column")]
    EmptySelection { selector: String },
    #[error("column {path} is not a column group")]
    NotAGroup { path: ColumnPath },
    #[error("column {path} already exists")]
    DuplicateColumn { path: ColumnPath },
    #[error("more than one column is inserted at {path}")]
    AmbiguousInsert { path: ColumnPath },
    #[error("column {column} has {actual} rows, expected {expected}")]
    RowCountMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },
    #[error("duplicate column name {name}")]
    DuplicateName { name: String },
    #[error("no converter from {from} to {to} for column {path}")]
    ConverterNotFound {
        path: ColumnPath,
        from: ValueType,
        to: ValueType,
    },
    #[error("can not convert {value} in column {path} to {to}: {reason}")]
    ConversionFailed {
        path: ColumnPath,
        value: String,
        to: ValueType,
        reason: String,
    },
    #[error("column {path} has nulls but {to} is not nullable")]
    NullsNotAllowed { path: ColumnPath, to: ValueType },
    #[error("can not parse {value:?} in column {path} as {to}")]
    Parse {
        path: ColumnPath,
        value: String,
        to: ValueType,
    },
    #[error("column {path} is not part of the target schema")]
    UnexpectedColumn { path: ColumnPath },
    #[error("missing columns: {}", join_paths(.paths))]
    MissingColumns { paths: Vec<ColumnPath> },
    #[error("column {path} is a {actual} column, expected a {expected} column")]
    IncompatibleKind {
        path: ColumnPath,
        expected: ColumnKind,
        actual: ColumnKind,
    },
    #[error("column {path} has schema {actual}, expected {expected}")]
    SchemaMismatch {
        path: ColumnPath,
        expected: String,
        actual: String,
    },
    #[error("column {path} can not be used as a sort key")]
    UnsortableColumn { path: ColumnPath },
    #[error("record mapping failed: {0}")]
    Record(String),
    #[error("{0}")]
    InvalidArgument(String),
}

fn join_paths(paths: &[ColumnPath]) -> String {
    paths
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
