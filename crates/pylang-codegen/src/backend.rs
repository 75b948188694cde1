//! RISC-V assembly text emitter
//!
//! Instructions are written in GNU assembler syntax for RV32IM. The
//! emitter tracks every label defined and referenced so that a dangling
//! or doubly-defined label surfaces as an error instead of bad output.

use crate::error::CodegenError;
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::fmt::Write as _;

/// Machine registers by ABI name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    Zero,
    Ra,
    Sp,
    Gp,
    Tp,
    T0,
    T1,
    T2,
    T3,
    T4,
    T5,
    T6,
    /// Frame pointer (s0)
    Fp,
    S1,
    /// Heap limit
    S11,
    A0,
    A1,
    A2,
    A3,
    A4,
    A5,
    A6,
    A7,
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Register::Zero => "zero",
            Register::Ra => "ra",
            Register::Sp => "sp",
            Register::Gp => "gp",
            Register::Tp => "tp",
            Register::T0 => "t0",
            Register::T1 => "t1",
            Register::T2 => "t2",
            Register::T3 => "t3",
            Register::T4 => "t4",
            Register::T5 => "t5",
            Register::T6 => "t6",
            Register::Fp => "fp",
            Register::S1 => "s1",
            Register::S11 => "s11",
            Register::A0 => "a0",
            Register::A1 => "a1",
            Register::A2 => "a2",
            Register::A3 => "a3",
            Register::A4 => "a4",
            Register::A5 => "a5",
            Register::A6 => "a6",
            Register::A7 => "a7",
        };
        write!(f, "{}", name)
    }
}

/// Symbolic code or data address
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label(String);

impl Label {
    pub fn new(name: impl Into<String>) -> Self {
        Label(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

use Register::*;

/// Accumulates assembly text
#[derive(Debug)]
pub struct RiscVBackend {
    out: String,
    comments: bool,
    next_label: usize,
    defined: HashSet<Label>,
    referenced: BTreeSet<Label>,
}

impl RiscVBackend {
    pub fn new(comments: bool) -> Self {
        Self {
            out: String::new(),
            comments,
            next_label: 0,
            defined: HashSet::new(),
            referenced: BTreeSet::new(),
        }
    }

    /// A label no other call has returned.
    pub fn fresh_label(&mut self) -> Label {
        let label = Label(format!("label_{}", self.next_label));
        self.next_label += 1;
        label
    }

    /// Text emitted so far.
    pub fn text(&self) -> &str {
        &self.out
    }

    /// Final text; fails if some referenced label was never defined.
    pub fn finish(self) -> Result<String, CodegenError> {
        if let Some(missing) = self.referenced.iter().find(|l| !self.defined.contains(*l)) {
            return Err(CodegenError::Backend(format!(
                "reference to undefined label `{}`",
                missing
            )));
        }
        Ok(self.out)
    }

    // =========================================================================
    // Layout
    // =========================================================================

    fn line(&mut self, text: &str, comment: &str) {
        if self.comments && !comment.is_empty() {
            let _ = writeln!(self.out, "  {:<40} # {}", text, comment);
        } else {
            let _ = writeln!(self.out, "  {}", text);
        }
    }

    fn uses(&mut self, label: &Label) {
        self.referenced.insert(label.clone());
    }

    pub fn emit_label(&mut self, label: &Label, comment: &str) -> Result<(), CodegenError> {
        if !self.defined.insert(label.clone()) {
            return Err(CodegenError::Backend(format!("label `{}` defined twice", label)));
        }
        if self.comments && !comment.is_empty() {
            let head = format!("{}:", label);
            let _ = writeln!(self.out, "{:<42} # {}", head, comment);
        } else {
            let _ = writeln!(self.out, "{}:", label);
        }
        Ok(())
    }

    pub fn emit_global_label(&mut self, label: &Label) -> Result<(), CodegenError> {
        let _ = writeln!(self.out, ".globl {}", label);
        self.emit_label(label, "")
    }

    pub fn emit_comment(&mut self, text: &str) {
        if self.comments {
            let _ = writeln!(self.out, "# {}", text);
        }
    }

    pub fn emit_text_section(&mut self) {
        let _ = writeln!(self.out, "\n.text");
    }

    pub fn emit_data_section(&mut self) {
        let _ = writeln!(self.out, "\n.data");
    }

    pub fn emit_word(&mut self, value: i32, comment: &str) {
        self.line(&format!(".word {}", value), comment);
    }

    pub fn emit_word_address(&mut self, label: &Label, comment: &str) {
        self.uses(label);
        self.line(&format!(".word {}", label), comment);
    }

    /// NUL-terminated string directive.
    pub fn emit_string(&mut self, value: &str, comment: &str) {
        self.line(&format!(".string \"{}\"", escape(value)), comment);
    }

    pub fn emit_align(&mut self, power: u32) {
        self.line(&format!(".align {}", power), "");
    }

    // =========================================================================
    // Instructions
    // =========================================================================

    pub fn emit_li(&mut self, rd: Register, imm: i32, comment: &str) {
        self.line(&format!("li {}, {}", rd, imm), comment);
    }

    pub fn emit_la(&mut self, rd: Register, label: &Label, comment: &str) {
        self.uses(label);
        self.line(&format!("la {}, {}", rd, label), comment);
    }

    pub fn emit_mv(&mut self, rd: Register, rs: Register, comment: &str) {
        self.line(&format!("mv {}, {}", rd, rs), comment);
    }

    pub fn emit_addi(&mut self, rd: Register, rs: Register, imm: i32, comment: &str) {
        self.line(&format!("addi {}, {}, {}", rd, rs, imm), comment);
    }

    pub fn emit_xori(&mut self, rd: Register, rs: Register, imm: i32, comment: &str) {
        self.line(&format!("xori {}, {}, {}", rd, rs, imm), comment);
    }

    pub fn emit_slli(&mut self, rd: Register, rs: Register, shamt: u32, comment: &str) {
        self.line(&format!("slli {}, {}, {}", rd, rs, shamt), comment);
    }

    pub fn emit_srli(&mut self, rd: Register, rs: Register, shamt: u32, comment: &str) {
        self.line(&format!("srli {}, {}, {}", rd, rs, shamt), comment);
    }

    fn rrr(&mut self, op: &str, rd: Register, rs1: Register, rs2: Register, comment: &str) {
        self.line(&format!("{} {}, {}, {}", op, rd, rs1, rs2), comment);
    }

    pub fn emit_add(&mut self, rd: Register, rs1: Register, rs2: Register, comment: &str) {
        self.rrr("add", rd, rs1, rs2, comment);
    }

    pub fn emit_sub(&mut self, rd: Register, rs1: Register, rs2: Register, comment: &str) {
        self.rrr("sub", rd, rs1, rs2, comment);
    }

    pub fn emit_mul(&mut self, rd: Register, rs1: Register, rs2: Register, comment: &str) {
        self.rrr("mul", rd, rs1, rs2, comment);
    }

    pub fn emit_div(&mut self, rd: Register, rs1: Register, rs2: Register, comment: &str) {
        self.rrr("div", rd, rs1, rs2, comment);
    }

    pub fn emit_rem(&mut self, rd: Register, rs1: Register, rs2: Register, comment: &str) {
        self.rrr("rem", rd, rs1, rs2, comment);
    }

    pub fn emit_xor(&mut self, rd: Register, rs1: Register, rs2: Register, comment: &str) {
        self.rrr("xor", rd, rs1, rs2, comment);
    }

    pub fn emit_slt(&mut self, rd: Register, rs1: Register, rs2: Register, comment: &str) {
        self.rrr("slt", rd, rs1, rs2, comment);
    }

    pub fn emit_seqz(&mut self, rd: Register, rs: Register, comment: &str) {
        self.line(&format!("seqz {}, {}", rd, rs), comment);
    }

    pub fn emit_snez(&mut self, rd: Register, rs: Register, comment: &str) {
        self.line(&format!("snez {}, {}", rd, rs), comment);
    }

    pub fn emit_lw(&mut self, rd: Register, base: Register, offset: i32, comment: &str) {
        self.line(&format!("lw {}, {}({})", rd, offset, base), comment);
    }

    pub fn emit_sw(&mut self, rs: Register, base: Register, offset: i32, comment: &str) {
        self.line(&format!("sw {}, {}({})", rs, offset, base), comment);
    }

    pub fn emit_lbu(&mut self, rd: Register, base: Register, offset: i32, comment: &str) {
        self.line(&format!("lbu {}, {}({})", rd, offset, base), comment);
    }

    pub fn emit_sb(&mut self, rs: Register, base: Register, offset: i32, comment: &str) {
        self.line(&format!("sb {}, {}({})", rs, offset, base), comment);
    }

    /// Load the word stored at a data label.
    pub fn emit_lw_global(&mut self, rd: Register, label: &Label, comment: &str) {
        self.uses(label);
        self.line(&format!("lw {}, {}", rd, label), comment);
    }

    /// Store to a data label, using `tmp` for the address.
    pub fn emit_sw_global(&mut self, rs: Register, label: &Label, tmp: Register, comment: &str) {
        self.uses(label);
        self.line(&format!("sw {}, {}, {}", rs, label, tmp), comment);
    }

    pub fn emit_j(&mut self, label: &Label, comment: &str) {
        self.uses(label);
        self.line(&format!("j {}", label), comment);
    }

    pub fn emit_jal(&mut self, label: &Label, comment: &str) {
        self.uses(label);
        self.line(&format!("jal {}", label), comment);
    }

    pub fn emit_jalr(&mut self, rs: Register, comment: &str) {
        self.line(&format!("jalr {}", rs), comment);
    }

    pub fn emit_jr(&mut self, rs: Register, comment: &str) {
        self.line(&format!("jr {}", rs), comment);
    }

    pub fn emit_beqz(&mut self, rs: Register, label: &Label, comment: &str) {
        self.uses(label);
        self.line(&format!("beqz {}, {}", rs, label), comment);
    }

    pub fn emit_bnez(&mut self, rs: Register, label: &Label, comment: &str) {
        self.uses(label);
        self.line(&format!("bnez {}, {}", rs, label), comment);
    }

    fn branch(&mut self, op: &str, rs1: Register, rs2: Register, label: &Label, comment: &str) {
        self.uses(label);
        self.line(&format!("{} {}, {}, {}", op, rs1, rs2, label), comment);
    }

    pub fn emit_beq(&mut self, rs1: Register, rs2: Register, label: &Label, comment: &str) {
        self.branch("beq", rs1, rs2, label, comment);
    }

    pub fn emit_bne(&mut self, rs1: Register, rs2: Register, label: &Label, comment: &str) {
        self.branch("bne", rs1, rs2, label, comment);
    }

    pub fn emit_blt(&mut self, rs1: Register, rs2: Register, label: &Label, comment: &str) {
        self.branch("blt", rs1, rs2, label, comment);
    }

    pub fn emit_bge(&mut self, rs1: Register, rs2: Register, label: &Label, comment: &str) {
        self.branch("bge", rs1, rs2, label, comment);
    }

    pub fn emit_bgeu(&mut self, rs1: Register, rs2: Register, label: &Label, comment: &str) {
        self.branch("bgeu", rs1, rs2, label, comment);
    }

    pub fn emit_ecall(&mut self, comment: &str) {
        self.line("ecall", comment);
    }

    // =========================================================================
    // Stack helpers
    // =========================================================================

    pub fn emit_push(&mut self, rs: Register, comment: &str) {
        self.emit_addi(Sp, Sp, -4, comment);
        self.emit_sw(rs, Sp, 0, "");
    }
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'"' => out.push_str("\\\""),
            b'\\' => out.push_str("\\\\"),
            b'\n' => out.push_str("\\n"),
            b'\t' => out.push_str("\\t"),
            0x20..=0x7e => out.push(byte as char),
            other => {
                let _ = write!(out, "\\{:03o}", other);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_instructions_with_comments() {
        let mut b = RiscVBackend::new(true);
        b.emit_addi(Sp, Sp, -8, "reserve frame");
        b.emit_lw(A0, Fp, -12, "");
        let text = b.finish().unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("  addi sp, sp, -8"));
        assert!(lines[0].ends_with("# reserve frame"));
        assert_eq!(lines[1], "  lw a0, -12(fp)");
    }

    #[test]
    fn comments_can_be_disabled() {
        let mut b = RiscVBackend::new(false);
        b.emit_li(A0, 10, "exit");
        b.emit_comment("hidden");
        assert_eq!(b.finish().unwrap(), "  li a0, 10\n");
    }

    #[test]
    fn undefined_label_is_an_error() {
        let mut b = RiscVBackend::new(true);
        b.emit_j(&Label::new("nowhere"), "");
        assert!(matches!(b.finish(), Err(CodegenError::Backend(_))));
    }

    #[test]
    fn duplicate_label_is_an_error() {
        let mut b = RiscVBackend::new(true);
        let l = Label::new("$f");
        b.emit_label(&l, "").unwrap();
        assert!(b.emit_label(&l, "").is_err());
    }

    #[test]
    fn forward_references_resolve() {
        let mut b = RiscVBackend::new(true);
        let l = b.fresh_label();
        b.emit_beqz(T0, &l, "");
        b.emit_label(&l, "").unwrap();
        assert!(b.finish().is_ok());
    }

    #[test]
    fn strings_are_escaped() {
        assert_eq!(escape("a\"b\\c\n"), "a\\\"b\\\\c\\n");
        assert_eq!(escape("\u{1}"), "\\001");
    }

    #[test]
    fn fresh_labels_are_distinct() {
        let mut b = RiscVBackend::new(true);
        assert_ne!(b.fresh_label(), b.fresh_label());
    }
}
