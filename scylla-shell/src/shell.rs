//! The read-eval-print loop.
//!
//! The loop has two states, [ShellState::AwaitingInput] and
//! [ShellState::Done]. Every statement is sent, awaited and rendered before
//! the next prompt is shown.

use std::io::{self, BufRead, Write};

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::{debug, warn};

use crate::render::{write_no_output, TableWriter};
use crate::session::QueryExecutor;

/// Prompt shown before every line of input.
pub const PROMPT: &str = "CQL> ";
/// Printed once when the loop starts.
pub const BANNER: &str = "Connected to ScyllaDB. Enter your CQL commands, or type 'exit' to quit:";
/// Printed once when the loop ends, however it ends.
pub const FAREWELL: &str = "Exiting ScyllaDB CLI.";
/// Input line (after trimming) that ends the loop.
pub const EXIT_COMMAND: &str = "exit";

/// Source of input lines.
pub trait LineReader {
    /// Shows `prompt` and reads one line.
    ///
    /// Returns `Ok(None)` at end of input. A line that could not be decoded
    /// is reported as [io::ErrorKind::InvalidData]; the reader must be able
    /// to go on with the next line after that.
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>>;
}

impl<L: LineReader + ?Sized> LineReader for Box<L> {
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        (**self).read_line(prompt)
    }
}

/// Reads lines from any buffered reader, writing the prompt to `prompt_out`.
///
/// Used when standard input is not a terminal, and in tests.
pub struct PlainLines<R, W> {
    input: R,
    prompt_out: W,
}

impl<R: BufRead, W: Write> PlainLines<R, W> {
    /// Creates a reader over `input` showing prompts on `prompt_out`.
    pub fn new(input: R, prompt_out: W) -> Self {
        Self { input, prompt_out }
    }

    /// Gives back the prompt writer.
    pub fn into_prompt_out(self) -> W {
        self.prompt_out
    }
}

impl<R: BufRead, W: Write> LineReader for PlainLines<R, W> {
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.prompt_out, "{prompt}")?;
        self.prompt_out.flush()?;

        let mut buf = Vec::new();
        if self.input.read_until(b'\n', &mut buf)? == 0 {
            return Ok(None);
        }
        // The whole line is consumed either way, so a bad line never
        // blocks the ones after it.
        String::from_utf8(buf)
            .map(Some)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
    }
}

/// Interactive line editor with in-memory history.
pub struct EditorLines {
    editor: DefaultEditor,
}

impl EditorLines {
    /// Sets up the editor on the controlling terminal.
    pub fn new() -> Result<Self, ReadlineError> {
        Ok(Self {
            editor: DefaultEditor::new()?,
        })
    }
}

impl LineReader for EditorLines {
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    if let Err(err) = self.editor.add_history_entry(line.as_str()) {
                        warn!("Could not add line to history: {err}");
                    }
                }
                Ok(Some(line))
            }
            // Ctrl-C drops the line being typed.
            Err(ReadlineError::Interrupted) => Ok(Some(String::new())),
            Err(ReadlineError::Eof) => Ok(None),
            Err(ReadlineError::Io(err)) => Err(err),
            Err(err) => Err(io::Error::other(err)),
        }
    }
}

/// What a line of input asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input<'a> {
    /// Leave the shell.
    Exit,
    /// Nothing to do.
    Blank,
    /// Statement text to send, trimmed.
    Statement(&'a str),
}

/// Interprets one raw line of input.
pub fn classify(line: &str) -> Input<'_> {
    match line.trim() {
        EXIT_COMMAND => Input::Exit,
        "" => Input::Blank,
        statement => Input::Statement(statement),
    }
}

/// State of the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellState {
    /// Waiting for the next line.
    AwaitingInput,
    /// The loop has ended.
    Done,
}

/// Why the loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// The user typed `exit`.
    ExitCommand,
    /// Input was closed.
    EndOfInput,
}

/// The shell: an executor plus the streams results and errors go to.
pub struct Shell<E, O, W> {
    executor: E,
    out: O,
    err: W,
    state: ShellState,
}

impl<E, O, W> Shell<E, O, W>
where
    E: QueryExecutor,
    O: Write,
    W: Write,
{
    /// Creates a shell printing results to `out` and per-statement errors to `err`.
    pub fn new(executor: E, out: O, err: W) -> Self {
        Self {
            executor,
            out,
            err,
            state: ShellState::AwaitingInput,
        }
    }

    /// Current state of the loop.
    pub fn state(&self) -> ShellState {
        self.state
    }

    /// Gives back the executor and both output streams.
    pub fn into_parts(self) -> (E, O, W) {
        (self.executor, self.out, self.err)
    }

    /// Runs the loop until `exit` or end of input.
    ///
    /// Only I/O errors on the shell's own streams end the loop early;
    /// statement errors and undecodable input lines are reported to the
    /// error stream and the loop goes on.
    pub async fn run(&mut self, input: &mut impl LineReader) -> io::Result<ExitReason> {
        writeln!(self.out, "{BANNER}")?;
        let reason = loop {
            if let Some(reason) = self.step(input).await? {
                break reason;
            }
        };
        writeln!(self.out, "{FAREWELL}")?;
        self.out.flush()?;
        Ok(reason)
    }

    /// Reads and handles a single line.
    ///
    /// Returns the reason the loop ended, if it did.
    pub async fn step(&mut self, input: &mut impl LineReader) -> io::Result<Option<ExitReason>> {
        if self.state == ShellState::Done {
            return Ok(Some(ExitReason::EndOfInput));
        }

        let line = match input.read_line(PROMPT) {
            Ok(Some(line)) => line,
            Ok(None) => {
                debug!("End of input");
                self.state = ShellState::Done;
                return Ok(Some(ExitReason::EndOfInput));
            }
            Err(err) if err.kind() == io::ErrorKind::InvalidData => {
                report(&mut self.err, "Error reading input", &err)?;
                return Ok(None);
            }
            Err(err) => return Err(err),
        };

        match classify(&line) {
            Input::Exit => {
                self.state = ShellState::Done;
                Ok(Some(ExitReason::ExitCommand))
            }
            Input::Blank => Ok(None),
            Input::Statement(statement) => {
                self.execute(statement).await?;
                Ok(None)
            }
        }
    }

    /// Sends `statement` once and prints its result.
    ///
    /// A result set becomes a table, streamed page by page; anything else
    /// becomes the "no output" status line.
    pub async fn execute(&mut self, statement: &str) -> io::Result<()> {
        debug!("Executing: {statement}");
        let mut page = match self.executor.query_page(statement, None).await {
            Ok(page) => page,
            Err(err) => {
                report(&mut self.err, "Error executing query", &err)?;
                return Ok(());
            }
        };

        let columns = match page.columns.take() {
            Some(columns) if !columns.is_empty() => columns,
            _ => {
                write_no_output(&mut self.out)?;
                return self.out.flush();
            }
        };

        let mut table = TableWriter::begin(&mut self.out, &columns)?;
        loop {
            for row in &page.rows {
                table.write_row(row)?;
            }
            let Some(cursor) = page.next.take() else {
                break;
            };
            match self.executor.query_page(statement, Some(cursor)).await {
                Ok(next) => page = next,
                Err(err) => {
                    table.finish()?;
                    self.out.flush()?;
                    return report(&mut self.err, "Error fetching next page of results", &err);
                }
            }
        }
        debug!("Printed {} row(s)", table.rows_written());
        table.finish()?;
        self.out.flush()
    }
}

fn report(err_out: &mut impl Write, context: &str, err: &dyn std::error::Error) -> io::Result<()> {
    debug!("{context}: {err}");
    writeln!(err_out, "{context}: {err}")?;
    err_out.flush()
}
