//! # Pylang AST
//!
//! Abstract Syntax Tree definitions for the pylang compiler.
//!
//! The tree mirrors the JSON interchange format produced by the external
//! parser: every node carries a `"kind"` tag and a `"location"` array of
//! `[start_line, start_col, end_line, end_col]`.

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Core Types (kept in lib.rs - used by all modules)
// =============================================================================

/// Source location information, 1-based lines and columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(from = "[u32; 4]", into = "[u32; 4]")]
pub struct Span {
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

impl Span {
    pub fn new(start_line: u32, start_col: u32, end_line: u32, end_col: u32) -> Self {
        Self {
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }

    pub fn merge(&self, other: &Span) -> Span {
        let (start_line, start_col) =
            (self.start_line, self.start_col).min((other.start_line, other.start_col));
        let (end_line, end_col) = (self.end_line, self.end_col).max((other.end_line, other.end_col));
        Span::new(start_line, start_col, end_line, end_col)
    }

    /// Spans synthesized without source text start at line 0.
    pub fn is_synthetic(&self) -> bool {
        self.start_line == 0
    }
}

impl From<[u32; 4]> for Span {
    fn from(loc: [u32; 4]) -> Self {
        Span::new(loc[0], loc[1], loc[2], loc[3])
    }
}

impl From<Span> for [u32; 4] {
    fn from(span: Span) -> Self {
        [span.start_line, span.start_col, span.end_line, span.end_col]
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start_line, self.start_col)
    }
}

/// AST node wrapper that includes span information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node<T> {
    #[serde(rename = "location")]
    pub span: Span,
    #[serde(flatten)]
    pub value: T,
}

impl<T> Node<T> {
    pub fn new(value: T, span: Span) -> Self {
        Self { span, value }
    }
}

/// Identifier in declaring position (names of variables, functions, classes)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub struct Identifier {
    #[serde(rename = "location")]
    pub span: Span,
    pub name: String,
}

impl Identifier {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            span,
            name: name.into(),
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

// =============================================================================
// Module Declarations
// =============================================================================

pub mod types;
pub mod expr;
pub mod stmt;
pub mod decl;
pub mod module;
pub mod errors;
pub mod build;

// =============================================================================
// Re-exports
// =============================================================================

pub use types::*;
pub use expr::*;
pub use stmt::*;
pub use decl::*;
pub use module::*;
pub use errors::*;

// =============================================================================
// Tests
// =============================================================================
