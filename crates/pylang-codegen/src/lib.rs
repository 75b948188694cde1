//! # Pylang Code Generator
//!
//! Lowers a type-checked program to RISC-V (RV32IM) assembly text.
//!
//! Every value is a boxed heap object: integers, booleans and strings
//! included, with `None` as the null pointer. Each declared function and
//! method becomes one routine; nested functions are flattened into
//! independent routines that reach enclosing frames through a static
//! link. Run-time faults (operation on `None`, division by zero, index
//! out of bounds) jump to shared routines that print a message and exit
//! with a distinct code.

mod backend;
mod constants;
mod error;
mod expr;
mod runtime;
mod symbols;
mod translator;

pub use backend::{Label, Register, RiscVBackend};
pub use error::CodegenError;

use pylang_analysis::Analysis;
use pylang_ast::Program;

use crate::constants::Constants;
use crate::runtime::{emit_runtime, RuntimeLabels};
use crate::symbols::{list_prototype_label, Symbols, LIST_TAG};
use crate::translator::FunctionTranslator;

/// Knobs for the generated program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodegenOptions {
    /// Heap reserved at startup, in 32-bit words
    pub heap_words: u32,
    /// Annotate instructions with `#` comments
    pub comments: bool,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        Self {
            heap_words: 8192,
            comments: true,
        }
    }
}

/// Generate assembly for a program that passed analysis without errors.
pub fn generate(
    program: &Program,
    analysis: &Analysis,
    options: &CodegenOptions,
) -> Result<String, CodegenError> {
    CodeGenerator::new(options.clone()).compile_program(program, analysis)
}

/// Translates one program into one assembly unit
pub struct CodeGenerator {
    /// Assembly output
    backend: RiscVBackend,
    /// Pooled literal objects, emitted last
    constants: Constants,
    /// Runtime routine labels
    runtime: RuntimeLabels,
    options: CodegenOptions,
}

impl CodeGenerator {
    pub fn new(options: CodegenOptions) -> Self {
        Self {
            backend: RiscVBackend::new(options.comments),
            constants: Constants::new(),
            runtime: RuntimeLabels::new(),
            options,
        }
    }

    /// Compile the whole program to assembly text.
    pub fn compile_program(mut self, program: &Program, analysis: &Analysis) -> Result<String, CodegenError> {
        if program.has_errors() {
            return Err(CodegenError::ProgramHasErrors(program.errors.len()));
        }
        if analysis.has_errors() {
            return Err(CodegenError::ProgramHasErrors(analysis.error_count));
        }
        let heap_bytes = self
            .options
            .heap_words
            .checked_mul(4)
            .and_then(|bytes| i32::try_from(bytes).ok())
            .ok_or_else(|| CodegenError::Backend(format!("heap of {} words is too large", self.options.heap_words)))?;

        let symbols = Symbols::collect(program)?;

        self.backend.emit_text_section();
        {
            let mut translator = FunctionTranslator::new(
                &mut self.backend,
                &mut self.constants,
                &symbols,
                &analysis.types,
                &self.runtime,
            );
            translator.translate_main(&program.statements, heap_bytes)?;
            for func in symbols.user_functions() {
                translator.translate_function(func)?;
            }
        }
        emit_runtime(&mut self.backend, &mut self.constants, &self.runtime)?;

        self.backend.emit_data_section();
        self.emit_prototypes(&symbols)?;
        self.emit_dispatch_tables(&symbols)?;
        self.emit_globals(&symbols)?;
        self.constants.emit(&mut self.backend)?;

        tracing::debug!(
            functions = symbols.user_functions().count(),
            constants = self.constants.len(),
            "generated assembly"
        );
        self.backend.finish()
    }

    fn emit_prototypes(&mut self, symbols: &Symbols<'_>) -> Result<(), CodegenError> {
        for class in &symbols.classes {
            self.backend.emit_align(2);
            self.backend.emit_global_label(&class.prototype())?;
            self.backend.emit_word(class.tag, &format!("Type tag for class: {}", class.name));
            self.backend.emit_word(class.size_words(), "Object size");
            self.backend.emit_word_address(&class.dispatch_table(), "Pointer to dispatch table");
            for attr in &class.attributes {
                let init = match attr.init {
                    Some(expr) => self.constants.literal(&expr.kind)?,
                    None => None,
                };
                let comment = format!("Initial value of attribute: {}", attr.name);
                match init {
                    Some(label) => self.backend.emit_word_address(&label, &comment),
                    None => self.backend.emit_word(0, &comment),
                }
            }
        }
        self.backend.emit_align(2);
        self.backend.emit_global_label(&list_prototype_label())?;
        self.backend.emit_word(LIST_TAG, "Type tag for class: .list");
        self.backend.emit_word(4, "Object size");
        self.backend.emit_word(0, "Lists have no methods");
        self.backend.emit_word(0, "Initial length");
        Ok(())
    }

    fn emit_dispatch_tables(&mut self, symbols: &Symbols<'_>) -> Result<(), CodegenError> {
        for class in &symbols.classes {
            self.backend.emit_global_label(&class.dispatch_table())?;
            for (name, label) in &class.methods {
                self.backend
                    .emit_word_address(label, &format!("Implementation for method: {}.{}", class.name, name));
            }
        }
        Ok(())
    }

    fn emit_globals(&mut self, symbols: &Symbols<'_>) -> Result<(), CodegenError> {
        for global in &symbols.globals {
            self.backend.emit_align(2);
            self.backend.emit_global_label(&global.label)?;
            match self.constants.literal(&global.init.kind)? {
                Some(label) => self
                    .backend
                    .emit_word_address(&label, &format!("Initial value of global: {}", global.name)),
                None => self.backend.emit_word(0, &format!("Initial value of global: {}", global.name)),
            }
        }
        Ok(())
    }
}
