//! Error types for the table engine.
//!
//! Two families live here. [`DbError`] covers faults the engine cannot
//! recover from (I/O failures, capacity violations, pager misuse); the
//! driver is expected to report them and terminate. The remaining enums are
//! user-facing rejections: the REPL prints their message and keeps going.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DbError>;

/// Unrecoverable storage faults.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Tried to fetch page number out of bounds. {page_num} >= {max}")]
    PageOutOfBounds { page_num: usize, max: usize },

    #[error("Tried to flush null page {0}")]
    FlushUnloadedPage(usize),
}

/// Rejection of a dot-prefixed line.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum MetaCommandError {
    #[error("Unrecognized command '{0}'")]
    Unrecognized(String),
}

/// Rejection of a data statement before anything touches the table.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PrepareError {
    #[error("ID must be positive.")]
    NegativeId,

    #[error("String is too long.")]
    StringTooLong,

    #[error("Syntax error. Could not parse statement.")]
    SyntaxError,

    #[error("Unrecognized keyword at start of '{0}'.")]
    UnrecognizedStatement(String),
}

/// Failure while executing a prepared statement.
///
/// `TableFull` is reported to the user; `Db` is fatal and must be
/// propagated to the top-level driver.
#[derive(Error, Debug)]
pub enum ExecuteError {
    #[error("Error: Table full.")]
    TableFull,

    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<std::io::Error> for ExecuteError {
    fn from(err: std::io::Error) -> Self {
        ExecuteError::Db(DbError::Io(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_error_messages() {
        assert_eq!(PrepareError::NegativeId.to_string(), "ID must be positive.");
        assert_eq!(PrepareError::StringTooLong.to_string(), "String is too long.");
        assert_eq!(
            PrepareError::SyntaxError.to_string(),
            "Syntax error. Could not parse statement."
        );
        assert_eq!(
            PrepareError::UnrecognizedStatement("frobnicate".into()).to_string(),
            "Unrecognized keyword at start of 'frobnicate'."
        );
    }

    #[test]
    fn test_meta_command_error_message() {
        let err = MetaCommandError::Unrecognized(".tables".into());
        assert_eq!(err.to_string(), "Unrecognized command '.tables'");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ExecuteError = io_err.into();

        match err {
            ExecuteError::Db(DbError::Io(_)) => {}
            other => panic!("Expected Io error, got {other:?}"),
        }
    }

    #[test]
    fn test_table_full_message() {
        assert_eq!(ExecuteError::TableFull.to_string(), "Error: Table full.");
    }
}
