use std::path::PathBuf;
use thiserror::Error;

use crate::testcase::ModelError;

/// A required column is missing from the CSV header.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SchemaError {
    #[error("required columns not found in the CSV header: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
}

/// A data record that cannot take part in grouping. The record is skipped.
#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum RowShapeError {
    #[error("line {line}: expected {expected} columns as in the header, found {found}; skipped")]
    ColumnCount {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("line {line}: neither a test case ID nor a test case name; skipped")]
    Unlinked { line: usize },
}

/// A row group whose first row lacks a required value. The whole test case
/// is skipped.
#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum GroupDataError {
    #[error("test case {key}: required value \"{field}\" is missing or empty; skipped")]
    MissingValue { key: String, field: String },
}

/// A recoverable problem met while importing. The conversion goes on
/// without the offending record or group.
#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum Diagnostic {
    #[error(transparent)]
    Row(#[from] RowShapeError),
    #[error(transparent)]
    Group(#[from] GroupDataError),
}

/// Errors that abort a conversion.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("cannot access {}: {source}", path.display())]
    SourceAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed TestLink XML: {0}")]
    MalformedMarkup(String),

    #[error("unknown character encoding: {0}")]
    UnknownEncoding(String),

    #[error("the CSV source has no header row")]
    EmptySource,

    #[error("the CSV source has no data rows")]
    NoDataRows,

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Pattern(#[from] regex::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("cannot write {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T, E = ConvertError> = std::result::Result<T, E>;
