//! Thin syntactic layer between the generator and the output writer.
//!
//! Each method writes exactly one line of LLVM-IR in a fixed textual form,
//! parameterized only by the values, labels, and identifiers passed in.
//! Instructions are indented with a single tab; label definitions are not.
//! No validation happens here: the emitter writes what it is told.

use std::io::{self, Write};

use crate::value::{Label, Register, Value};

pub struct Emitter<W: Write> {
    writer: W,
}

impl<W: Write> Emitter<W> {
    pub fn new(writer: W) -> Self {
        Emitter { writer }
    }

    /// The module preamble: source filename, target triple, and the format
    /// string constant used by `print`.
    pub fn emit_preamble(&mut self, source_filename: &str) -> io::Result<()> {
        writeln!(self.writer, "source_filename = \"{source_filename}\"")?;
        writeln!(self.writer, "target triple = \"x86_64-pc-linux-gnu\"")?;
        writeln!(self.writer)?;
        writeln!(
            self.writer,
            "@print_int_fstring = private unnamed_addr constant [4 x i8] c\"%d\\0A\\00\""
        )?;
        writeln!(self.writer)
    }

    /// The module postamble: the external declaration of `printf`.
    pub fn emit_postamble(&mut self) -> io::Result<()> {
        writeln!(self.writer, "declare i32 @printf(i8*, ...)")
    }

    /// `define i32 @name(i32 %0, i32 %1, ...) {`
    pub fn emit_function_start(
        &mut self,
        function: &Register,
        parameters: &[Register],
    ) -> io::Result<()> {
        write!(self.writer, "define i32 {function}(")?;
        for (index, parameter) in parameters.iter().enumerate() {
            if index > 0 {
                write!(self.writer, ", ")?;
            }
            write!(self.writer, "i32 {parameter}")?;
        }
        writeln!(self.writer, ") {{")
    }

    pub fn emit_function_end(&mut self) -> io::Result<()> {
        writeln!(self.writer, "}}")?;
        writeln!(self.writer)
    }

    /// `%pointer = alloca i32`
    pub fn emit_stack_allocation(&mut self, pointer: &Register) -> io::Result<()> {
        writeln!(self.writer, "\t{pointer} = alloca i32")
    }

    /// `store i32 value, i32* %pointer`
    pub fn emit_store(&mut self, value: &Value, pointer: &Register) -> io::Result<()> {
        writeln!(self.writer, "\tstore i32 {value}, i32* {pointer}")
    }

    /// `%result = load i32, i32* %pointer`
    pub fn emit_load(&mut self, result: &Register, pointer: &Register) -> io::Result<()> {
        writeln!(self.writer, "\t{result} = load i32, i32* {pointer}")
    }

    /// `%result = zext i1 value to i32`, widths taken from the operands.
    pub fn emit_zero_extension(&mut self, result: &Register, value: &Value) -> io::Result<()> {
        writeln!(
            self.writer,
            "\t{result} = zext i{} {value} to i{}",
            value.bit_count(),
            result.bit_count()
        )
    }

    /// `%result = add nsw i32 lhs, rhs`
    pub fn emit_addition(&mut self, result: &Register, lhs: &Value, rhs: &Value) -> io::Result<()> {
        writeln!(self.writer, "\t{result} = add nsw i32 {lhs}, {rhs}")
    }

    /// `%result = sub nsw i32 lhs, rhs`
    pub fn emit_subtraction(
        &mut self,
        result: &Register,
        lhs: &Value,
        rhs: &Value,
    ) -> io::Result<()> {
        writeln!(self.writer, "\t{result} = sub nsw i32 {lhs}, {rhs}")
    }

    /// `%result = mul nsw i32 lhs, rhs`
    pub fn emit_multiplication(
        &mut self,
        result: &Register,
        lhs: &Value,
        rhs: &Value,
    ) -> io::Result<()> {
        writeln!(self.writer, "\t{result} = mul nsw i32 {lhs}, {rhs}")
    }

    /// `%result = sdiv i32 lhs, rhs` (signed; no overflow flags)
    pub fn emit_division(&mut self, result: &Register, lhs: &Value, rhs: &Value) -> io::Result<()> {
        writeln!(self.writer, "\t{result} = sdiv i32 {lhs}, {rhs}")
    }

    /// `%result = srem i32 lhs, rhs` (signed; no overflow flags)
    pub fn emit_remainder(
        &mut self,
        result: &Register,
        lhs: &Value,
        rhs: &Value,
    ) -> io::Result<()> {
        writeln!(self.writer, "\t{result} = srem i32 {lhs}, {rhs}")
    }

    /// `%result = icmp <kind> i32 lhs, rhs` where kind is one of
    /// `eq`, `ne`, `slt`, `sgt`, `sle`, `sge`.
    pub fn emit_comparison(
        &mut self,
        result: &Register,
        comparison_kind: &str,
        lhs: &Value,
        rhs: &Value,
    ) -> io::Result<()> {
        writeln!(
            self.writer,
            "\t{result} = icmp {comparison_kind} i32 {lhs}, {rhs}"
        )
    }

    /// `identifier:` (no indentation, no `%` prefix)
    pub fn emit_label(&mut self, label: &Label) -> io::Result<()> {
        writeln!(self.writer, "{}:", label.identifier())
    }

    /// `br label %target`
    pub fn emit_unconditional_branch(&mut self, target: &Label) -> io::Result<()> {
        writeln!(self.writer, "\tbr label {target}")
    }

    /// `br i1 condition, label %true_target, label %false_target`
    pub fn emit_conditional_branch(
        &mut self,
        condition: &Value,
        true_target: &Label,
        false_target: &Label,
    ) -> io::Result<()> {
        writeln!(
            self.writer,
            "\tbr i1 {condition}, label {true_target}, label {false_target}"
        )
    }

    /// `%result = call i32 @function(i32 a0, i32 a1, ...)`
    pub fn emit_function_call(
        &mut self,
        result: &Register,
        function: &Register,
        arguments: &[Value],
    ) -> io::Result<()> {
        write!(self.writer, "\t{result} = call i32 {function}(")?;
        for (index, argument) in arguments.iter().enumerate() {
            if index > 0 {
                write!(self.writer, ", ")?;
            }
            write!(self.writer, "i32 {argument}")?;
        }
        writeln!(self.writer, ")")
    }

    /// `ret i32 value`
    pub fn emit_return(&mut self, value: &Value) -> io::Result<()> {
        writeln!(self.writer, "\tret i32 {value}")
    }

    /// The canonical `printf` call printing an integer and a newline. The
    /// result register receives printf's character count and is discarded
    /// by the generator.
    pub fn emit_print(&mut self, result: &Register, printee: &Value) -> io::Result<()> {
        writeln!(
            self.writer,
            "\t{result} = call i32(i8*, ...) @printf(i8* bitcast ([4 x i8]* @print_int_fstring to i8*), i32 {printee})"
        )
    }
}
