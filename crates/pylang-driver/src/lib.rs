//! Pylang Compiler Driver Library
//!
//! Pipeline glue for the pylang compiler: load a parsed AST, run the
//! analysis passes, and either stop with a JSON snapshot or go on to
//! generate RISC-V assembly.

pub mod batch;
pub mod diagnostics;

pub use batch::{compile_dir, FileOutcome};
pub use diagnostics::{render_errors, LineIndex};

use clap::ValueEnum;
use pylang_analysis::analyze;
use pylang_ast::{Errors, Program};
use pylang_codegen::{generate, CodegenError, CodegenOptions};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Last pipeline stage to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Pass {
    /// Stop after loading the parser output
    Parse,
    /// Stop after semantic analysis; emit the typed AST
    Analyze,
    /// Generate assembly
    Codegen,
}

/// What a unit produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// Untyped AST snapshot
    Ast,
    /// AST annotated with inferred types
    TypedAst,
    Assembly,
}

impl OutputKind {
    /// File suffix for batch output.
    pub fn extension(self) -> &'static str {
        match self {
            OutputKind::Ast => "ast.json",
            OutputKind::TypedAst => "typed.json",
            OutputKind::Assembly => "s",
        }
    }
}

/// Result of running the pipeline over one unit
#[derive(Debug, Clone)]
pub struct UnitOutput {
    pub kind: OutputKind,
    pub text: String,
    /// Syntax and semantic diagnostics; non-empty output is still produced
    pub errors: Errors,
}

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("cannot read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("cannot write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error("malformed AST in {}: {source}", path.display())]
    Parse { path: PathBuf, source: serde_json::Error },
    #[error("cannot serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error(transparent)]
    Codegen(#[from] CodegenError),
    #[error("worker compiling {} panicked", .0.display())]
    Panicked(PathBuf),
}

/// Run the pipeline over `program` up to and including `stop`.
///
/// Analysis diagnostics never make this fail: a program with errors
/// yields its typed snapshot instead of assembly.
pub fn compile_unit(mut program: Program, stop: Pass, options: &CodegenOptions) -> Result<UnitOutput, DriverError> {
    if stop == Pass::Parse {
        return Ok(UnitOutput {
            kind: OutputKind::Ast,
            text: program.to_json()?,
            errors: program.errors.clone(),
        });
    }

    let mut errors = std::mem::take(&mut program.errors);
    let analysis = analyze(&program, &mut errors);
    program.errors = errors;
    tracing::debug!(errors = program.errors.len(), "analysis finished");

    if stop == Pass::Analyze || program.has_errors() {
        return Ok(UnitOutput {
            kind: OutputKind::TypedAst,
            text: analysis.annotated_json(&program)?,
            errors: program.errors.clone(),
        });
    }

    let text = generate(&program, &analysis, options)?;
    Ok(UnitOutput {
        kind: OutputKind::Assembly,
        text,
        errors: program.errors,
    })
}

/// Read an AST file as produced by the parser.
pub fn load_program(path: &Path) -> Result<Program, DriverError> {
    let text = std::fs::read_to_string(path).map_err(|source| DriverError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Program::from_json(&text).map_err(|source| DriverError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn compile_file(path: &Path, stop: Pass, options: &CodegenOptions) -> Result<UnitOutput, DriverError> {
    tracing::debug!(path = %path.display(), ?stop, "compiling unit");
    compile_unit(load_program(path)?, stop, options)
}

pub fn write_output(path: &Path, text: &str) -> Result<(), DriverError> {
    std::fs::write(path, text).map_err(|source| DriverError::Write {
        path: path.to_path_buf(),
        source,
    })
}
