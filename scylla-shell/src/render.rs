//! Fixed-width table output.
//!
//! A result with N columns and M rows is printed as:
//!
//! ```text
//! ----------------------------------------
//! col_1               col_2               ...
//! ----------------------------------------
//! value               value               ...   (M lines)
//! ----------------------------------------
//! ```
//!
//! Every field is left-justified and padded to [COLUMN_WIDTH] characters.
//! Longer values are not truncated, they simply push the next field right.

use std::io::{self, Write};

use crate::value::CellValue;

/// Number of dashes in a separator line.
pub const SEPARATOR_WIDTH: usize = 40;
/// Width every header and value field is padded to.
pub const COLUMN_WIDTH: usize = 20;
/// Printed instead of a table when a statement yields no result set.
pub const NO_OUTPUT_MESSAGE: &str = "Query executed successfully (no output to display).";

/// Writes one separator line.
pub fn write_separator(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "{}", "-".repeat(SEPARATOR_WIDTH))
}

/// Writes the status line of a statement without a result set.
pub fn write_no_output(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "{NO_OUTPUT_MESSAGE}")
}

/// A table being written row by row.
///
/// Created by [TableWriter::begin], which prints the header. Rows may arrive
/// across several result pages; [TableWriter::finish] prints the closing
/// separator.
pub struct TableWriter<'a, W: Write> {
    out: &'a mut W,
    column_count: usize,
    rows_written: usize,
}

impl<'a, W: Write> TableWriter<'a, W> {
    /// Writes the opening separator, the header line and the second separator.
    pub fn begin(out: &'a mut W, columns: &[String]) -> io::Result<Self> {
        write_separator(out)?;
        for name in columns {
            write!(out, "{name:<COLUMN_WIDTH$}")?;
        }
        writeln!(out)?;
        write_separator(out)?;
        Ok(Self {
            out,
            column_count: columns.len(),
            rows_written: 0,
        })
    }

    /// Writes one data line.
    ///
    /// Values are matched to columns by position. Missing trailing values
    /// are shown as null, extra ones are dropped.
    pub fn write_row(&mut self, row: &[CellValue]) -> io::Result<()> {
        for i in 0..self.column_count {
            let cell = row.get(i).unwrap_or(&CellValue::Null).to_string();
            write!(self.out, "{cell:<COLUMN_WIDTH$}")?;
        }
        writeln!(self.out)?;
        self.rows_written += 1;
        Ok(())
    }

    /// Number of data lines written so far.
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Writes the closing separator.
    pub fn finish(self) -> io::Result<()> {
        write_separator(self.out)
    }
}
