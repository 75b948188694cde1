//! Rendering of compiler diagnostics
//!
//! With the original source text at hand, diagnostics are drawn as
//! `ariadne` reports pointing into the source; without it they fall
//! back to one `file:line:col: message` line each.

use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use pylang_ast::{CompilerError, Errors, Span};
use std::io::{self, IsTerminal, Write};
use std::ops::Range;

pub const SYNTAX_ERROR_CODE: &str = "E0001";
pub const SEMANTIC_ERROR_CODE: &str = "E0100";

/// Maps 1-based line/column positions to character offsets
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Character offset of each line start
    starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut starts = vec![0];
        let mut len = 0;
        for (i, ch) in source.chars().enumerate() {
            if ch == '\n' {
                starts.push(i + 1);
            }
            len = i + 1;
        }
        Self { starts, len }
    }

    /// Offset of `line:col`, clamped to the text.
    pub fn offset(&self, line: u32, col: u32) -> usize {
        let line = (line.max(1) - 1) as usize;
        let start = match self.starts.get(line) {
            Some(start) => *start,
            None => return self.len,
        };
        (start + col.max(1) as usize - 1).min(self.len)
    }

    /// Character range covered by a span; end columns are inclusive.
    pub fn range(&self, span: &Span) -> Range<usize> {
        if span.is_synthetic() {
            return 0..0;
        }
        let start = self.offset(span.start_line, span.start_col);
        let end = (self.offset(span.end_line, span.end_col) + 1).min(self.len);
        start..end.max(start)
    }
}

fn error_code(error: &CompilerError) -> &'static str {
    if error.syntax {
        SYNTAX_ERROR_CODE
    } else {
        SEMANTIC_ERROR_CODE
    }
}

/// Write one ariadne report for `error`.
pub fn write_report<W: Write>(
    error: &CompilerError,
    filename: &str,
    source: &str,
    index: &LineIndex,
    color: bool,
    out: W,
) -> io::Result<()> {
    let span = (filename, index.range(&error.span));
    let title = if error.syntax { "Syntax error" } else { "Semantic error" };
    Report::build(ReportKind::Error, span.clone())
        .with_config(Config::default().with_color(color))
        .with_code(error_code(error))
        .with_message(title)
        .with_label(Label::new(span).with_message(&error.message).with_color(Color::Red))
        .finish()
        .write((filename, Source::from(source)), out)
}

/// `file:line:col: message`, one line per error.
pub fn format_plain(errors: &Errors, filename: &str) -> String {
    errors
        .iter()
        .map(|error| format!("{}:{}: {}\n", filename, error.span, error.message))
        .collect()
}

/// Print every diagnostic to stderr.
pub fn render_errors(errors: &Errors, filename: &str, source: Option<&str>) {
    let Some(source) = source else {
        eprint!("{}", format_plain(errors, filename));
        return;
    };
    let index = LineIndex::new(source);
    let color = io::stderr().is_terminal();
    for error in errors.iter() {
        if let Err(e) = write_report(error, filename, source, &index, color, io::stderr()) {
            tracing::warn!("cannot render diagnostic: {}", e);
            eprintln!("{}:{}: {}", filename, error.span, error.message);
        }
    }
}
