use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use rust_sqlite::{DbError, ExecuteError, Input, MetaCommand, Statement, Table};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "rust-sqlite", about = "A tiny single-table database")]
struct Cli {
    /// Database file, created if it does not exist.
    db_path: PathBuf,

    /// Log filter for diagnostics written to stderr.
    #[arg(long, default_value = "warn")]
    log_level: String,
}

struct InputBuffer {
    bytes: Vec<u8>,
    buffer: String,
}

impl InputBuffer {
    fn new() -> Self {
        Self {
            bytes: Vec::new(),
            buffer: String::new(),
        }
    }

    /// Read the next line. Returns `false` once stdin is exhausted.
    ///
    /// Lines are decoded lossily so a stray non-UTF-8 byte is just part of
    /// the command text.
    fn read_input(&mut self, stdin: &mut impl BufRead) -> io::Result<bool> {
        self.bytes.clear();
        if stdin.read_until(b'\n', &mut self.bytes)? == 0 {
            return Ok(false);
        }
        self.buffer = String::from_utf8_lossy(&self.bytes).trim().to_string();
        Ok(true)
    }
}

fn init_logging(level: &str) -> Result<(), String> {
    let filter = EnvFilter::try_new(level).map_err(|e| format!("Invalid log level: {e}"))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .try_init()
        .map_err(|_| "Logging already initialized".to_string())
}

fn print_prompt(out: &mut impl Write) -> io::Result<()> {
    write!(out, "db > ")?;
    out.flush()
}

fn run(table: &mut Table) -> Result<(), DbError> {
    let stdin = io::stdin();
    let mut stdin = stdin.lock();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut input_buffer = InputBuffer::new();

    loop {
        print_prompt(&mut out)?;
        match input_buffer.read_input(&mut stdin) {
            Ok(true) => {}
            Ok(false) => {
                info!("end of input");
                return Ok(());
            }
            Err(err) => {
                warn!(%err, "failed to read input, shutting down");
                return Ok(());
            }
        }

        let statement = match Input::classify(&input_buffer.buffer) {
            Input::Meta(command) => match MetaCommand::parse(command) {
                Ok(MetaCommand::Exit) => return Ok(()),
                Err(err) => {
                    writeln!(out, "{err}")?;
                    continue;
                }
            },
            Input::Statement(text) => match Statement::prepare(text) {
                Ok(statement) => statement,
                Err(err) => {
                    writeln!(out, "{err}")?;
                    continue;
                }
            },
        };

        match statement.execute(table, |row| writeln!(out, "{row}")) {
            Ok(()) => writeln!(out, "Executed.")?,
            Err(ExecuteError::TableFull) => writeln!(out, "{}", ExecuteError::TableFull)?,
            Err(ExecuteError::Db(err)) => return Err(err),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = init_logging(&cli.log_level) {
        eprintln!("{err}");
        return ExitCode::FAILURE;
    }

    let mut table = match Table::open(&cli.db_path) {
        Ok(table) => table,
        Err(err) => {
            error!(path = %cli.db_path.display(), "unable to open database");
            eprintln!("Unable to open file: {err}");
            return ExitCode::FAILURE;
        }
    };

    let result = run(&mut table).and_then(|()| table.close());
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("fatal error, terminating");
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_input_trims_lines() {
        let mut stdin = Cursor::new(b"  select  \n.exit".to_vec());
        let mut input_buffer = InputBuffer::new();

        assert!(input_buffer.read_input(&mut stdin).unwrap());
        assert_eq!(input_buffer.buffer, "select");
        assert!(input_buffer.read_input(&mut stdin).unwrap());
        assert_eq!(input_buffer.buffer, ".exit");
        assert!(!input_buffer.read_input(&mut stdin).unwrap());
    }

    #[test]
    fn test_read_input_accepts_invalid_utf8() {
        let mut stdin = Cursor::new(b"insert 2 b\xffb bob@x.com\n".to_vec());
        let mut input_buffer = InputBuffer::new();

        assert!(input_buffer.read_input(&mut stdin).unwrap());
        assert_eq!(input_buffer.buffer, "insert 2 b\u{FFFD}b bob@x.com");
    }
}
