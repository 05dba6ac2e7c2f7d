//! The command pipeline: classify a line, dispatch meta-commands, prepare
//! statements and execute them against a [`Table`].

use std::io;

use tracing::debug;

use crate::error::{ExecuteError, MetaCommandError, PrepareError};
use crate::row::Row;
use crate::table::Table;

// Non-SQL statements like .exit are called "meta-commands".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaCommand {
    Exit,
}

impl MetaCommand {
    pub fn parse(input: &str) -> Result<Self, MetaCommandError> {
        match input {
            ".exit" => Ok(MetaCommand::Exit),
            _ => Err(MetaCommandError::Unrecognized(input.to_string())),
        }
    }
}

/// First-stage classification of a raw input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input<'a> {
    Meta(&'a str),
    Statement(&'a str),
}

impl<'a> Input<'a> {
    pub fn classify(input: &'a str) -> Self {
        if input.starts_with('.') {
            Input::Meta(input)
        } else {
            Input::Statement(input)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Insert(Row),
    Select,
}

impl Statement {
    /// Parse and validate a statement. Nothing is mutated on failure.
    pub fn prepare(input: &str) -> Result<Self, PrepareError> {
        let mut tokens = input.split_whitespace();
        match tokens.next() {
            Some("insert") => prepare_insert(tokens),
            Some("select") if tokens.next().is_none() => Ok(Statement::Select),
            _ => Err(PrepareError::UnrecognizedStatement(input.to_string())),
        }
    }

    /// Run the statement. Rows produced by `select` are handed to `on_row`
    /// one at a time, in storage order.
    pub fn execute<F>(&self, table: &mut Table, mut on_row: F) -> Result<(), ExecuteError>
    where
        F: FnMut(&Row) -> io::Result<()>,
    {
        match self {
            Statement::Insert(row) => {
                table.insert_row(row)?;
                debug!(id = row.id(), num_rows = table.num_rows(), "inserted row");
            }
            Statement::Select => {
                for row in table.rows() {
                    on_row(&row?)?;
                }
            }
        }
        Ok(())
    }
}

fn prepare_insert<'a>(mut tokens: impl Iterator<Item = &'a str>) -> Result<Statement, PrepareError> {
    let (Some(id), Some(username), Some(email), None) =
        (tokens.next(), tokens.next(), tokens.next(), tokens.next())
    else {
        return Err(PrepareError::SyntaxError);
    };

    // Anything that is not a non-negative integer in id range is rejected as an invalid id.
    let id: u32 = id.parse().map_err(|_| PrepareError::NegativeId)?;

    Row::new(id, username, email).map(Statement::Insert)
}
