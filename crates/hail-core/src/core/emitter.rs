//! Incremental transcript printing.

use std::io::{self, Write};

/// Writes only the newly appended suffix of a growing text.
///
/// Snapshots are cumulative, so each one carries the full text so far.
/// The printer tracks what has already been written and emits the rest.
/// A snapshot whose text does not extend the emitted prefix produces
/// nothing: engines may resend unchanged state or replace content
/// entirely, and neither is an error.
pub struct StreamPrinter<'a, W: Write> {
    out: &'a mut W,
    label: &'a str,
    emitted: String,
    label_written: bool,
}

impl<'a, W: Write> StreamPrinter<'a, W> {
    pub fn new(out: &'a mut W, label: &'a str) -> Self {
        Self {
            out,
            label,
            emitted: String::new(),
            label_written: false,
        }
    }

    /// Returns the suffix `full_text` would add, if any.
    pub fn delta<'t>(&self, full_text: &'t str) -> Option<&'t str> {
        let suffix = full_text.strip_prefix(self.emitted.as_str())?;
        (!suffix.is_empty()).then_some(suffix)
    }

    /// Writes the new suffix of `full_text`. Returns whether anything was
    /// written. The label prefix goes out once, ahead of the first suffix.
    pub fn emit(&mut self, full_text: &str) -> io::Result<bool> {
        let Some(suffix) = self.delta(full_text) else {
            return Ok(false);
        };

        if !self.label_written {
            write!(self.out, "{}", self.label)?;
            self.label_written = true;
        }
        write!(self.out, "{suffix}")?;
        self.out.flush()?;

        self.emitted = full_text.to_string();
        Ok(true)
    }

    /// Whether any suffix has been written.
    pub fn emitted_any(&self) -> bool {
        self.label_written
    }

    /// The text written so far, label excluded.
    pub fn emitted(&self) -> &str {
        &self.emitted
    }

    /// Ends the stream's output with a newline if anything was written.
    pub fn finish(&mut self) -> io::Result<()> {
        if self.label_written {
            writeln!(self.out)?;
            self.out.flush()?;
        }
        Ok(())
    }
}
