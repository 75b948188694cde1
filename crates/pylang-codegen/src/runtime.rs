//! Runtime support routines emitted once per compilation unit
//!
//! Routines follow the same boxed-object conventions as generated code.
//! Arguments to builtins arrive on the stack like any call; internal
//! helpers (`alloc`, `makeint`, `strcat`, ...) take their operands in
//! `a0`/`a1` and may clobber every temporary register.
//!
//! Environment calls use the numbering of the ChocoPy flavour of the Venus
//! simulator, which adds `fill_line_buffer` (18) for console input.

use crate::backend::{Label, Register, Register::*, RiscVBackend};
use crate::constants::Constants;
use crate::error::CodegenError;
use crate::symbols::{
    list_prototype_label, prototype_label, BOOL_TAG, ELEMENTS_OFFSET, INT_TAG, LIST_TAG,
    PAYLOAD_OFFSET, STR_TAG,
};

// Environment calls (ChocoPy Venus)
const ECALL_PRINT_INT: i32 = 1;
const ECALL_PRINT_STRING: i32 = 4;
const ECALL_SBRK: i32 = 9;
pub(crate) const ECALL_EXIT: i32 = 10;
const ECALL_PRINT_CHAR: i32 = 11;
const ECALL_EXIT2: i32 = 17;
/// `fill_line_buffer`: read one line, newline included, into the buffer at
/// `a1` of capacity `a2`; bytes read in `a0`, negative at end of input
const ECALL_READ_LINE: i32 = 18;

// Exit codes
const ERROR_ARG: i32 = 1;
const ERROR_DIV_ZERO: i32 = 2;
const ERROR_OOB: i32 = 3;
const ERROR_NONE: i32 = 4;
const ERROR_OOM: i32 = 5;

/// Words allocated for a line read by `input()`
const INPUT_WORDS: i32 = 68;

/// Labels of every runtime routine
pub(crate) struct RuntimeLabels {
    pub(crate) alloc: Label,
    pub(crate) alloc2: Label,
    pub(crate) abort: Label,
    pub(crate) heap_init: Label,
    pub(crate) makeint: Label,
    pub(crate) makebool: Label,
    pub(crate) strcat: Label,
    pub(crate) streql: Label,
    pub(crate) strneql: Label,
    pub(crate) strchar: Label,
    pub(crate) concat: Label,
    pub(crate) error_none: Label,
    pub(crate) error_div: Label,
    pub(crate) error_oob: Label,
    error_arg: Label,
    error_oom: Label,
}

impl RuntimeLabels {
    pub(crate) fn new() -> Self {
        Self {
            alloc: Label::new("alloc"),
            alloc2: Label::new("alloc2"),
            abort: Label::new("abort"),
            heap_init: Label::new("heap.init"),
            makeint: Label::new("makeint"),
            makebool: Label::new("makebool"),
            strcat: Label::new("strcat"),
            streql: Label::new("streql"),
            strneql: Label::new("strneql"),
            strchar: Label::new("strchar"),
            concat: Label::new("concat"),
            error_none: Label::new("error.None"),
            error_div: Label::new("error.Div"),
            error_oob: Label::new("error.OOB"),
            error_arg: Label::new("error.Arg"),
            error_oom: Label::new("error.OOM"),
        }
    }
}

pub(crate) fn emit_runtime(
    backend: &mut RiscVBackend,
    constants: &mut Constants,
    rt: &RuntimeLabels,
) -> Result<(), CodegenError> {
    backend.emit_comment("runtime support");
    emit_builtins(backend, constants, rt)?;
    emit_allocation(backend, rt)?;
    emit_boxing(backend, constants, rt)?;
    emit_strings(backend, rt)?;
    emit_lists(backend, rt)?;
    emit_faults(backend, constants, rt)
}

/// Emit a label local to a runtime routine.
fn local(backend: &mut RiscVBackend, name: &str) -> Result<Label, CodegenError> {
    let label = Label::new(name);
    backend.emit_label(&label, "")?;
    Ok(label)
}

// =============================================================================
// Builtin functions
// =============================================================================

fn emit_builtins(
    backend: &mut RiscVBackend,
    constants: &mut Constants,
    rt: &RuntimeLabels,
) -> Result<(), CodegenError> {
    // object.__init__(self)
    backend.emit_label(&Label::new("$object.__init__"), "Implementation for method: object.__init__")?;
    backend.emit_mv(A0, Zero, "`None` constant");
    backend.emit_jr(Ra, "Return to caller");

    // print(arg)
    let print_int = Label::new("print.int");
    let print_bool = Label::new("print.bool");
    let print_str = Label::new("print.str");
    let print_false = Label::new("print.bool.emit");
    let newline = Label::new("print.newline");
    backend.emit_label(&Label::new("$print"), "Implementation for function: print")?;
    backend.emit_lw(A0, Sp, 0, "Load arg");
    backend.emit_beqz(A0, &rt.error_none, "None is an illegal argument");
    backend.emit_lw(T0, A0, 0, "Get type tag of arg");
    backend.emit_li(T1, INT_TAG, "");
    backend.emit_beq(T0, T1, &print_int, "Go to print(int)");
    backend.emit_li(T1, BOOL_TAG, "");
    backend.emit_beq(T0, T1, &print_bool, "Go to print(bool)");
    backend.emit_li(T1, STR_TAG, "");
    backend.emit_beq(T0, T1, &print_str, "Go to print(str)");
    backend.emit_j(&rt.error_arg, "Unprintable object");
    backend.emit_label(&print_int, "")?;
    backend.emit_lw(A1, A0, PAYLOAD_OFFSET, "Load integer literal");
    backend.emit_li(A0, ECALL_PRINT_INT, "");
    backend.emit_ecall("");
    backend.emit_j(&newline, "");
    backend.emit_label(&print_bool, "")?;
    let false_text = constants.str("False");
    let true_text = constants.str("True");
    backend.emit_lw(T0, A0, PAYLOAD_OFFSET, "Load boolean literal");
    backend.emit_la(A1, &false_text, "");
    backend.emit_beqz(T0, &print_false, "");
    backend.emit_la(A1, &true_text, "");
    backend.emit_label(&print_false, "")?;
    backend.emit_addi(A1, A1, ELEMENTS_OFFSET, "Address of its characters");
    backend.emit_li(A0, ECALL_PRINT_STRING, "");
    backend.emit_ecall("");
    backend.emit_j(&newline, "");
    backend.emit_label(&print_str, "")?;
    backend.emit_addi(A1, A0, ELEMENTS_OFFSET, "Address of string characters");
    backend.emit_li(A0, ECALL_PRINT_STRING, "");
    backend.emit_ecall("");
    backend.emit_label(&newline, "")?;
    backend.emit_li(A1, 10, "Newline character");
    backend.emit_li(A0, ECALL_PRINT_CHAR, "");
    backend.emit_ecall("");
    backend.emit_mv(A0, Zero, "Load None");
    backend.emit_jr(Ra, "Return to caller");

    // len(arg)
    let len_ok = Label::new("len.ok");
    backend.emit_label(&Label::new("$len"), "Implementation for function: len")?;
    backend.emit_lw(A0, Sp, 0, "Load arg");
    backend.emit_beqz(A0, &rt.error_none, "None is an illegal argument");
    backend.emit_lw(T0, A0, 0, "Get type tag of arg");
    backend.emit_li(T1, STR_TAG, "");
    backend.emit_beq(T0, T1, &len_ok, "");
    backend.emit_li(T1, LIST_TAG, "");
    backend.emit_beq(T0, T1, &len_ok, "");
    backend.emit_j(&rt.error_arg, "No length");
    backend.emit_label(&len_ok, "")?;
    backend.emit_lw(A0, A0, PAYLOAD_OFFSET, "Load attribute: __len__");
    backend.emit_j(&rt.makeint, "Box and return");

    // input()
    backend.emit_label(&Label::new("$input"), "Implementation for function: input")?;
    backend.emit_addi(Sp, Sp, -8, "");
    backend.emit_sw(Ra, Sp, 4, "");
    backend.emit_la(A0, &prototype_label("str"), "");
    backend.emit_li(A1, INPUT_WORDS, "Line buffer size");
    backend.emit_jal(&rt.alloc2, "");
    backend.emit_sw(A0, Sp, 0, "Save new string");
    backend.emit_addi(A1, A0, ELEMENTS_OFFSET, "Buffer");
    backend.emit_li(A2, 4 * (INPUT_WORDS - 4) - 1, "Capacity, leaving room for NUL");
    backend.emit_li(A0, ECALL_READ_LINE, "");
    backend.emit_ecall("");
    let counted = Label::new("input.counted");
    let trimmed = Label::new("input.trimmed");
    backend.emit_bge(A0, Zero, &counted, "");
    backend.emit_li(A0, 0, "End of input reads as empty");
    backend.emit_label(&counted, "")?;
    backend.emit_lw(T0, Sp, 0, "");
    backend.emit_beqz(A0, &trimmed, "");
    backend.emit_add(T1, T0, A0, "");
    backend.emit_lbu(T2, T1, ELEMENTS_OFFSET - 1, "Last byte read");
    backend.emit_li(T3, i32::from(b'\n'), "");
    backend.emit_bne(T2, T3, &trimmed, "");
    backend.emit_addi(A0, A0, -1, "Drop trailing newline");
    backend.emit_label(&trimmed, "")?;
    backend.emit_add(T1, T0, A0, "");
    backend.emit_sb(Zero, T1, ELEMENTS_OFFSET, "NUL terminator");
    backend.emit_sw(A0, T0, PAYLOAD_OFFSET, "Set length");
    backend.emit_mv(A0, T0, "");
    backend.emit_lw(Ra, Sp, 4, "");
    backend.emit_addi(Sp, Sp, 8, "");
    backend.emit_jr(Ra, "");
    Ok(())
}

// =============================================================================
// Heap
// =============================================================================

fn emit_allocation(backend: &mut RiscVBackend, rt: &RuntimeLabels) -> Result<(), CodegenError> {
    // alloc(prototype): object of the prototype's size
    backend.emit_label(&rt.alloc, "Allocate a copy of the prototype in a0")?;
    backend.emit_lw(A1, A0, 4, "Get size of object in words");
    backend.emit_j(&rt.alloc2, "");

    // alloc2(prototype, words)
    backend.emit_label(&rt.alloc2, "Allocate a1 words, initialized from prototype a0")?;
    backend.emit_mv(T6, A0, "Prototype");
    backend.emit_slli(T1, A1, 2, "Size in bytes");
    backend.emit_add(T2, Gp, T1, "New heap top");
    let fits = Label::new("alloc2.fits");
    backend.emit_bgeu(S11, T2, &fits, "Within heap limit");
    backend.emit_j(&rt.error_oom, "");
    backend.emit_label(&fits, "")?;
    backend.emit_mv(A0, Gp, "Address of new object");
    backend.emit_lw(T3, T6, 4, "Prototype size");
    let copy = Label::new("alloc2.copy");
    backend.emit_bge(A1, T3, &copy, "");
    backend.emit_mv(T3, A1, "Copy at most the requested size");
    backend.emit_label(&copy, "")?;
    backend.emit_slli(T3, T3, 2, "");
    backend.emit_li(T4, 0, "");
    let copy_loop = local(backend, "alloc2.loop")?;
    let done = Label::new("alloc2.done");
    backend.emit_bge(T4, T3, &done, "");
    backend.emit_add(T5, T6, T4, "");
    backend.emit_lw(T0, T5, 0, "");
    backend.emit_add(T5, A0, T4, "");
    backend.emit_sw(T0, T5, 0, "");
    backend.emit_addi(T4, T4, 4, "");
    backend.emit_j(&copy_loop, "");
    backend.emit_label(&done, "")?;
    backend.emit_sw(A1, A0, 4, "Set size word");
    backend.emit_mv(Gp, T2, "Bump heap pointer");
    backend.emit_jr(Ra, "");

    // heap.init(bytes)
    backend.emit_label(&rt.heap_init, "Request the initial heap")?;
    backend.emit_mv(A1, A0, "");
    backend.emit_li(A0, ECALL_SBRK, "");
    backend.emit_ecall("");
    backend.emit_jr(Ra, "");

    // abort(code, message)
    backend.emit_label(&rt.abort, "Print message a1 and exit with code a0")?;
    backend.emit_mv(T0, A0, "Save exit code");
    backend.emit_li(A0, ECALL_PRINT_STRING, "");
    backend.emit_ecall("");
    backend.emit_li(A1, 10, "");
    backend.emit_li(A0, ECALL_PRINT_CHAR, "");
    backend.emit_ecall("");
    backend.emit_mv(A1, T0, "");
    backend.emit_li(A0, ECALL_EXIT2, "");
    backend.emit_ecall("");
    Ok(())
}

// =============================================================================
// Boxing
// =============================================================================

fn emit_boxing(
    backend: &mut RiscVBackend,
    constants: &mut Constants,
    rt: &RuntimeLabels,
) -> Result<(), CodegenError> {
    backend.emit_label(&rt.makeint, "Box the integer in a0")?;
    backend.emit_addi(Sp, Sp, -8, "");
    backend.emit_sw(Ra, Sp, 4, "");
    backend.emit_sw(A0, Sp, 0, "");
    backend.emit_la(A0, &prototype_label("int"), "");
    backend.emit_jal(&rt.alloc, "");
    backend.emit_lw(T0, Sp, 0, "");
    backend.emit_sw(T0, A0, PAYLOAD_OFFSET, "");
    backend.emit_lw(Ra, Sp, 4, "");
    backend.emit_addi(Sp, Sp, 8, "");
    backend.emit_jr(Ra, "");

    let truthy = Label::new("makebool.true");
    let false_obj = constants.bool(false);
    let true_obj = constants.bool(true);
    backend.emit_label(&rt.makebool, "Shared boolean object for a0")?;
    backend.emit_bnez(A0, &truthy, "");
    backend.emit_la(A0, &false_obj, "");
    backend.emit_jr(Ra, "");
    backend.emit_label(&truthy, "")?;
    backend.emit_la(A0, &true_obj, "");
    backend.emit_jr(Ra, "");
    Ok(())
}

// =============================================================================
// Strings
// =============================================================================

/// Copy `count` bytes from `src` to `dst`, advancing both.
fn emit_byte_copy(
    backend: &mut RiscVBackend,
    prefix: &str,
    src: Register,
    dst: Register,
    count: Register,
) -> Result<(), CodegenError> {
    let top = local(backend, &format!("{}.loop", prefix))?;
    let done = Label::new(format!("{}.done", prefix));
    backend.emit_beqz(count, &done, "");
    backend.emit_lbu(T5, src, 0, "");
    backend.emit_sb(T5, dst, 0, "");
    backend.emit_addi(src, src, 1, "");
    backend.emit_addi(dst, dst, 1, "");
    backend.emit_addi(count, count, -1, "");
    backend.emit_j(&top, "");
    backend.emit_label(&done, "")
}

fn emit_strings(backend: &mut RiscVBackend, rt: &RuntimeLabels) -> Result<(), CodegenError> {
    let str_proto = prototype_label("str");

    // strcat(left, right)
    backend.emit_label(&rt.strcat, "Concatenate strings a0 and a1")?;
    backend.emit_addi(Sp, Sp, -12, "");
    backend.emit_sw(Ra, Sp, 8, "");
    backend.emit_sw(A0, Sp, 4, "");
    backend.emit_sw(A1, Sp, 0, "");
    backend.emit_lw(T0, A0, PAYLOAD_OFFSET, "");
    backend.emit_lw(T1, A1, PAYLOAD_OFFSET, "");
    backend.emit_add(T0, T0, T1, "Combined length");
    backend.emit_addi(A1, T0, 4, "");
    backend.emit_srli(A1, A1, 2, "Words for characters and NUL");
    backend.emit_addi(A1, A1, 4, "Plus header and length");
    backend.emit_la(A0, &str_proto, "");
    backend.emit_jal(&rt.alloc2, "");
    backend.emit_lw(T1, Sp, 4, "");
    backend.emit_lw(T2, Sp, 0, "");
    backend.emit_lw(T3, T1, PAYLOAD_OFFSET, "");
    backend.emit_lw(T4, T2, PAYLOAD_OFFSET, "");
    backend.emit_add(T0, T3, T4, "");
    backend.emit_sw(T0, A0, PAYLOAD_OFFSET, "Set length");
    backend.emit_addi(T6, A0, ELEMENTS_OFFSET, "Destination");
    backend.emit_addi(T1, T1, ELEMENTS_OFFSET, "");
    emit_byte_copy(backend, "strcat.left", T1, T6, T3)?;
    backend.emit_addi(T2, T2, ELEMENTS_OFFSET, "");
    emit_byte_copy(backend, "strcat.right", T2, T6, T4)?;
    backend.emit_sb(Zero, T6, 0, "NUL terminator");
    backend.emit_lw(Ra, Sp, 8, "");
    backend.emit_addi(Sp, Sp, 12, "");
    backend.emit_jr(Ra, "");

    // streql(left, right) -> 0 / 1
    let differ = Label::new("streql.no");
    let same = Label::new("streql.yes");
    backend.emit_label(&rt.streql, "Compare strings a0 and a1")?;
    backend.emit_lw(T0, A0, PAYLOAD_OFFSET, "");
    backend.emit_lw(T1, A1, PAYLOAD_OFFSET, "");
    backend.emit_bne(T0, T1, &differ, "Lengths differ");
    backend.emit_addi(T2, A0, ELEMENTS_OFFSET, "");
    backend.emit_addi(T3, A1, ELEMENTS_OFFSET, "");
    let top = local(backend, "streql.loop")?;
    backend.emit_beqz(T0, &same, "");
    backend.emit_lbu(T4, T2, 0, "");
    backend.emit_lbu(T5, T3, 0, "");
    backend.emit_bne(T4, T5, &differ, "");
    backend.emit_addi(T2, T2, 1, "");
    backend.emit_addi(T3, T3, 1, "");
    backend.emit_addi(T0, T0, -1, "");
    backend.emit_j(&top, "");
    backend.emit_label(&same, "")?;
    backend.emit_li(A0, 1, "");
    backend.emit_jr(Ra, "");
    backend.emit_label(&differ, "")?;
    backend.emit_li(A0, 0, "");
    backend.emit_jr(Ra, "");

    // strneql(left, right) -> 0 / 1
    backend.emit_label(&rt.strneql, "Negated string comparison")?;
    backend.emit_addi(Sp, Sp, -4, "");
    backend.emit_sw(Ra, Sp, 0, "");
    backend.emit_jal(&rt.streql, "");
    backend.emit_xori(A0, A0, 1, "");
    backend.emit_lw(Ra, Sp, 0, "");
    backend.emit_addi(Sp, Sp, 4, "");
    backend.emit_jr(Ra, "");

    // strchar(string, index) -> one-character string
    backend.emit_label(&rt.strchar, "Character a1 of string a0 as a new string")?;
    backend.emit_addi(Sp, Sp, -12, "");
    backend.emit_sw(Ra, Sp, 8, "");
    backend.emit_sw(A0, Sp, 4, "");
    backend.emit_sw(A1, Sp, 0, "");
    backend.emit_la(A0, &str_proto, "");
    backend.emit_li(A1, 5, "");
    backend.emit_jal(&rt.alloc2, "");
    backend.emit_li(T0, 1, "");
    backend.emit_sw(T0, A0, PAYLOAD_OFFSET, "Length 1");
    backend.emit_lw(T1, Sp, 4, "");
    backend.emit_lw(T2, Sp, 0, "");
    backend.emit_add(T1, T1, T2, "");
    backend.emit_lbu(T0, T1, ELEMENTS_OFFSET, "");
    backend.emit_sb(T0, A0, ELEMENTS_OFFSET, "");
    backend.emit_lw(Ra, Sp, 8, "");
    backend.emit_addi(Sp, Sp, 12, "");
    backend.emit_jr(Ra, "");
    Ok(())
}

// =============================================================================
// Lists
// =============================================================================

fn emit_lists(backend: &mut RiscVBackend, rt: &RuntimeLabels) -> Result<(), CodegenError> {
    backend.emit_label(&rt.concat, "Concatenate lists a0 and a1")?;
    backend.emit_addi(Sp, Sp, -12, "");
    backend.emit_sw(Ra, Sp, 8, "");
    backend.emit_sw(A0, Sp, 4, "");
    backend.emit_sw(A1, Sp, 0, "");
    backend.emit_lw(T0, A0, PAYLOAD_OFFSET, "");
    backend.emit_lw(T1, A1, PAYLOAD_OFFSET, "");
    backend.emit_add(T0, T0, T1, "");
    backend.emit_addi(A1, T0, 4, "Header, length and elements");
    backend.emit_la(A0, &list_prototype_label(), "");
    backend.emit_jal(&rt.alloc2, "");
    backend.emit_lw(T1, Sp, 4, "");
    backend.emit_lw(T2, T1, PAYLOAD_OFFSET, "");
    backend.emit_lw(T3, Sp, 0, "");
    backend.emit_lw(T4, T3, PAYLOAD_OFFSET, "");
    backend.emit_add(T0, T2, T4, "");
    backend.emit_sw(T0, A0, PAYLOAD_OFFSET, "Set length");
    backend.emit_addi(T6, A0, ELEMENTS_OFFSET, "Destination");
    for (name, src, count) in [("concat.left", T1, T2), ("concat.right", T3, T4)] {
        backend.emit_addi(src, src, ELEMENTS_OFFSET, "");
        let top = local(backend, &format!("{}.loop", name))?;
        let done = Label::new(format!("{}.done", name));
        backend.emit_beqz(count, &done, "");
        backend.emit_lw(T5, src, 0, "");
        backend.emit_sw(T5, T6, 0, "");
        backend.emit_addi(src, src, 4, "");
        backend.emit_addi(T6, T6, 4, "");
        backend.emit_addi(count, count, -1, "");
        backend.emit_j(&top, "");
        backend.emit_label(&done, "")?;
    }
    backend.emit_lw(Ra, Sp, 8, "");
    backend.emit_addi(Sp, Sp, 12, "");
    backend.emit_jr(Ra, "");
    Ok(())
}

// =============================================================================
// Faults
// =============================================================================

fn emit_faults(
    backend: &mut RiscVBackend,
    constants: &mut Constants,
    rt: &RuntimeLabels,
) -> Result<(), CodegenError> {
    for (label, code, message) in [
        (&rt.error_arg, ERROR_ARG, "Invalid argument"),
        (&rt.error_div, ERROR_DIV_ZERO, "Division by zero"),
        (&rt.error_oob, ERROR_OOB, "Index out of bounds"),
        (&rt.error_none, ERROR_NONE, "Operation on None"),
        (&rt.error_oom, ERROR_OOM, "Out of memory"),
    ] {
        let text = constants.str(message);
        backend.emit_label(label, &format!("Fault: {}", message))?;
        backend.emit_li(A0, code, "Exit code");
        backend.emit_la(A1, &text, "");
        backend.emit_addi(A1, A1, ELEMENTS_OFFSET, "Address of message characters");
        backend.emit_j(&rt.abort, "");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runtime_text() -> (String, Constants) {
        let mut backend = RiscVBackend::new(true);
        let mut constants = Constants::new();
        emit_runtime(&mut backend, &mut constants, &RuntimeLabels::new()).unwrap();
        (backend.text().to_string(), constants)
    }

    #[test]
    fn every_routine_is_defined() {
        let (text, _) = runtime_text();
        for label in [
            "alloc:", "alloc2:", "abort:", "heap.init:", "makeint:", "makebool:", "strcat:",
            "streql:", "strneql:", "strchar:", "concat:", "$print:", "$len:", "$input:",
            "$object.__init__:", "error.None:", "error.Div:", "error.OOB:",
        ] {
            assert!(
                text.lines().any(|line| line.starts_with(label)),
                "missing {}",
                label
            );
        }
    }

    #[test]
    fn faults_load_distinct_codes() {
        let (text, _) = runtime_text();
        let after = |label: &str| {
            let mut lines = text.lines().skip_while(|l| !l.starts_with(label));
            lines.nth(1).map(|l| l.split('#').next().unwrap_or("").trim().to_string())
        };
        assert_eq!(after("error.None:").as_deref(), Some("li a0, 4"));
        assert_eq!(after("error.Div:").as_deref(), Some("li a0, 2"));
        assert_eq!(after("error.OOB:").as_deref(), Some("li a0, 3"));
    }

    /// Instructions of `routine`, without comments, up to the next routine.
    fn body_of(text: &str, routine: &str) -> Vec<String> {
        text.lines()
            .skip_while(|l| !l.starts_with(routine))
            .skip(1)
            .take_while(|l| l.starts_with(' ') || l.is_empty() || l.starts_with("input."))
            .map(|l| l.split('#').next().unwrap_or("").trim().to_string())
            .filter(|l| !l.is_empty())
            .collect()
    }

    #[test]
    fn input_reads_a_line_and_drops_the_newline() {
        let (text, _) = runtime_text();
        let body = body_of(&text, "$input:");
        let has = |insn: &str| body.iter().any(|l| l == insn);
        assert!(has("li a1, 68"));
        assert!(has("li a2, 255"));
        assert!(has("li a0, 18"));
        assert!(has("ecall"));
        assert!(has("lbu t2, 15(t1)"));
        assert!(has("li t3, 10"));
        assert!(has("addi a0, a0, -1"));
        assert!(has("sb zero, 16(t1)"));
        assert!(has("sw a0, 12(t0)"));
        let ecall = body.iter().position(|l| l == "ecall");
        let trim = body.iter().position(|l| l == "addi a0, a0, -1");
        assert!(ecall < trim);
        assert_eq!(body.last().map(String::as_str), Some("jr ra"));
    }

    #[test]
    fn messages_are_pooled() {
        let (_, constants) = runtime_text();
        // False, True, plus "False", "True" and five messages
        assert_eq!(constants.len(), 9);
    }
}
