use std::io::Write;

use crate::codegen_llvm::Generator;
use crate::error::CompileError;
use crate::lexer::Scanner;
use crate::parser::Parser;

/// Compile source text, streaming LLVM-IR into `sink` as statements are
/// generated. On failure, IR already written to the sink stays written.
pub fn compile(
    source: &str,
    source_name: &str,
    sink: impl Write,
    debug: bool,
) -> Result<(), CompileError> {
    let scanner = Scanner::new(source);
    let mut parser = Parser::new(scanner)?;
    Generator::generate(sink, &mut parser, source_name, debug)
}

/// Compile source text into an in-memory LLVM-IR string.
pub fn emit_ir(source: &str, source_name: &str) -> Result<String, CompileError> {
    let mut buffer = Vec::new();
    compile(source, source_name, &mut buffer, false)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Numeric `%N` register definitions in emitted order, one Vec per
    /// function body.
    fn register_definitions_per_function(ir: &str) -> Vec<Vec<u32>> {
        let mut functions = Vec::new();
        let mut current: Option<Vec<u32>> = None;
        for line in ir.lines() {
            if line.starts_with("define ") {
                current = Some(Vec::new());
            } else if line == "}" {
                functions.push(current.take().expect("closing brace inside a function"));
            } else if let Some(defined) = line.trim_start().strip_prefix('%') {
                if let Some((identifier, _)) = defined.split_once(" = ") {
                    if let Ok(number) = identifier.parse::<u32>() {
                        if let Some(registers) = current.as_mut() {
                            registers.push(number);
                        }
                    }
                }
            }
        }
        functions
    }

    #[test]
    fn empty_program_is_preamble_and_postamble_only() {
        let ir = emit_ir("", "empty.c").expect("empty program should compile");
        assert_eq!(
            ir,
            "source_filename = \"empty.c\"\n\
             target triple = \"x86_64-pc-linux-gnu\"\n\
             \n\
             @print_int_fstring = private unnamed_addr constant [4 x i8] c\"%d\\0A\\00\"\n\
             \n\
             declare i32 @printf(i8*, ...)\n"
        );
    }

    #[test]
    fn multiplication_is_generated_before_addition() {
        let ir = emit_ir("int main() { print 1 + 2 * 3; return 0; }", "test.c")
            .expect("program should compile");

        let mul_at = ir.find("%0 = mul nsw i32 2, 3").expect("mul missing");
        let add_at = ir.find("%1 = add nsw i32 1, %0").expect("add missing");
        assert!(mul_at < add_at);

        assert_eq!(ir.matches("@printf(").count(), 2); // one call, one declare
        assert!(ir.contains("\tret i32 0"));
    }

    #[test]
    fn comparison_result_is_widened_before_print() {
        let ir = emit_ir("int main() { print 7 == 9; return 0; }", "test.c")
            .expect("program should compile");

        assert!(ir.contains("%0 = icmp eq i32 7, 9"));
        assert!(ir.contains("%1 = zext i1 %0 to i32"));
        assert!(ir.contains("i32 %1)")); // the widened value reaches printf
    }

    #[test]
    fn registers_count_up_from_zero_with_a_skip_after_ret() {
        let source = "int add(int a, int b) { return a + b; } \
                      int main() { print add(2, 3); return 0; }";
        let ir = emit_ir(source, "test.c").expect("program should compile");

        let functions = register_definitions_per_function(&ir);
        // add: params consume %0 %1, the loads are %2 %3, the sum %4, and
        // the ret reserves %5 for LLVM's implicit block.
        // main: the call result is %0, the discarded printf result %1.
        assert_eq!(functions, vec![vec![2, 3, 4], vec![0, 1]]);

        for registers in functions {
            for pair in registers.windows(2) {
                assert!(pair[0] < pair[1], "registers must strictly increase");
            }
        }
    }

    #[test]
    fn while_loop_produces_four_basic_blocks() {
        let source = "int gcd(int a, int b) { \
                        while (b > 1) { int t; t = a % b; a = b; b = t; } \
                        return a; \
                      }";
        let ir = emit_ir(source, "gcd.c").expect("program should compile");

        let labels: Vec<&str> = ir
            .lines()
            .filter(|line| line.ends_with(':'))
            .collect();
        assert_eq!(
            labels,
            vec![".block.0:", ".block.1:", ".block.2:", ".block.3:"]
        );

        // Entry spills both parameters before branching to the header.
        assert!(ir.contains("\t%a = alloca i32\n\tstore i32 %0, i32* %a"));
        assert!(ir.contains("\t%b = alloca i32\n\tstore i32 %1, i32* %b"));
        assert!(ir.contains("\tbr label %.block.1\n.block.1:"));
        // Header tests the condition and picks body or exit.
        assert!(ir.contains("icmp sgt i32"));
        assert!(ir.contains("br i1 %3, label %.block.2, label %.block.3"));
        // Body computes the remainder and loops back.
        assert!(ir.contains("\t%t = alloca i32"));
        assert!(ir.contains("srem i32"));
        // Exit returns the surviving value.
        assert!(ir.contains("\tret i32 %9"));
    }

    #[test]
    fn functions_are_emitted_in_source_order() {
        let source = "int f() { if (1) { print 1; } } int main() { f(); return 0; }";
        let ir = emit_ir(source, "test.c").expect("program should compile");

        let f_at = ir.find("define i32 @f()").expect("f missing");
        let main_at = ir.find("define i32 @main()").expect("main missing");
        assert!(f_at < main_at);
        assert!(ir.contains("call i32 @f()"));
    }

    #[test]
    fn register_and_label_numbering_reset_between_functions() {
        let source = "int f() { print 1; } int g() { print 2; }";
        let ir = emit_ir(source, "test.c").expect("program should compile");

        assert_eq!(ir.matches(".block.0:").count(), 2);
        assert_eq!(ir.matches("\t%0 = call i32(i8*, ...)").count(), 2);
    }

    #[test]
    fn locals_do_not_leak_across_functions() {
        let source = "int f() { int x; x = 1; } int g() { x = 2; }";
        let err = emit_ir(source, "test.c").unwrap_err();
        assert!(matches!(err, CompileError::UndefinedLocalSymbol(name) if name == "x"));
    }

    #[test]
    fn calling_an_undeclared_function_fails() {
        let err = emit_ir("int main() { missing(); }", "test.c").unwrap_err();
        assert!(matches!(
            err,
            CompileError::UndefinedGlobalFunction(name) if name == "missing"
        ));
    }

    #[test]
    fn calling_with_wrong_arity_fails() {
        let source = "int f(int a, int b) { return a; } int main() { f(1); }";
        let err = emit_ir(source, "test.c").unwrap_err();
        assert!(matches!(
            err,
            CompileError::ArityMismatch {
                expected: 2,
                given: 1,
                ..
            }
        ));
    }

    #[test]
    fn recursive_calls_resolve() {
        let source = "int fact(int n) { \
                        if (n < 2) { return 1; } \
                        return n * fact(n - 1); \
                      }";
        let ir = emit_ir(source, "fact.c").expect("program should compile");
        assert!(ir.contains("call i32 @fact("));
    }

    #[test]
    fn sample_expression_statement_compiles() {
        // Evaluates to 17 at runtime: 10 + 8 - 6/6*2 + 8/4 - 1.
        let source = "int main() { print 10 + 8 - 6/6*2 + 8/4 - 1; return 0; }";
        let ir = emit_ir(source, "sample.c").expect("program should compile");

        assert!(ir.contains("sdiv i32 6, 6"));
        assert!(ir.contains("sdiv i32 8, 4"));
        assert!(ir.contains("@printf"));
    }
}
