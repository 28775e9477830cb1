//! LLVM-IR backend: semantic analysis and tree-directed code generation.
//!
//! The generator walks each statement AST once, producing values bottom-up
//! and emitting instructions through the [`Emitter`] as a side effect. It
//! owns the two pieces of state LLVM's textual form couples together:
//!
//! - the numeric virtual-register counter, which LLVM requires to count up
//!   from 0 in definition order within each function body, and
//! - the `.block.N` label counter, which is independent of the register
//!   ordering so labels can be referenced before they are defined.

use std::io::Write;

use crate::ast::{Ast, Operation};
use crate::emitter::Emitter;
use crate::error::CompileError;
use crate::parser::Parser;
use crate::symbol::{Symbol, SymbolKind, SymbolTable};
use crate::value::{Label, Register, Value};

pub struct Generator<W: Write> {
    emitter: Emitter<W>,
    /// Symbols local to the function being generated; cleared when the
    /// function ends.
    local_symbols: SymbolTable,
    /// Function symbols; persists across the whole module.
    global_symbols: SymbolTable,
    next_register_number: u32,
    next_label_number: u32,
}

impl<W: Write> Generator<W> {
    /// Run the back half of the pipeline: emit the preamble, generate each
    /// top-level statement the parser produces, then emit the postamble.
    /// With `debug` set, each parsed statement is traced to stdout before
    /// it is generated.
    pub fn generate(
        writer: W,
        parser: &mut Parser<'_>,
        source_name: &str,
        debug: bool,
    ) -> Result<(), CompileError> {
        let mut emitter = Emitter::new(writer);
        emitter.emit_preamble(source_name)?;

        let mut generator = Generator {
            emitter,
            local_symbols: SymbolTable::new(),
            global_symbols: SymbolTable::new(),
            next_register_number: 0,
            next_label_number: 0,
        };

        while let Some(statement) = parser.parse_top_level_statement()? {
            if debug {
                println!("Parsed statement: {statement}");
            }
            generator.generate_node(&statement)?;
        }

        generator.emitter.emit_postamble()?;
        Ok(())
    }

    /// Allocate the next numeric virtual register. The identifiers must
    /// appear in strictly increasing order starting at 0 within each
    /// function body.
    fn create_register(&mut self, bit_count: u32) -> Register {
        let identifier = self.next_register_number.to_string();
        self.next_register_number += 1;
        Register::local(identifier, bit_count)
    }

    /// Allocate the next `.block.N` label. Labels get their own numbering
    /// because the generator needs their identifiers before they are
    /// defined, when their position in the register order is unknown.
    fn create_label(&mut self) -> Label {
        let label = Label::new(format!(".block.{}", self.next_label_number));
        self.next_label_number += 1;
        label
    }

    fn local_symbol(&self, name: &str) -> Result<&Symbol, CompileError> {
        self.local_symbols
            .find(name)
            .ok_or_else(|| CompileError::UndefinedLocalSymbol(name.to_string()))
    }

    fn global_function(&self, name: &str) -> Result<(Register, usize), CompileError> {
        let symbol = self
            .global_symbols
            .find(name)
            .ok_or_else(|| CompileError::UndefinedGlobalFunction(name.to_string()))?;

        match symbol.kind {
            SymbolKind::Function { parameter_count } => {
                Ok((symbol.register.clone(), parameter_count))
            }
            SymbolKind::Variable => Err(CompileError::SymbolIsNotAFunction(name.to_string())),
        }
    }

    /// Convert a value to the target width, emitting the conversion
    /// instruction if one is needed. Booleans widen with `zext` so the bit
    /// is not treated as a sign; integers narrow to boolean by comparing
    /// against zero rather than truncating.
    fn convert_value_type(
        &mut self,
        value: Value,
        target_bit_count: u32,
    ) -> Result<Value, CompileError> {
        if value.bit_count() == target_bit_count {
            return Ok(value);
        }

        let result = self.create_register(target_bit_count);
        if value.bit_count() == 1 {
            self.emitter.emit_zero_extension(&result, &value)?;
        } else if target_bit_count == 1 {
            self.emitter
                .emit_comparison(&result, "ne", &value, &Value::ImmediateInt32(0))?;
        } else {
            return Err(CompileError::UnsupportedConversion {
                from: value.bit_count(),
                to: target_bit_count,
            });
        }

        Ok(Value::Register(result))
    }

    /// Generate a node that must produce a value (an expression operand).
    fn generate_operand(&mut self, node: &Ast) -> Result<Value, CompileError> {
        self.generate_node(node)?
            .ok_or_else(|| CompileError::ExpectedOperand(node.to_string()))
    }

    /// Recursively generate and emit the code for an AST subtree using a
    /// postorder traversal, returning the subtree's value if it has one.
    fn generate_node(&mut self, node: &Ast) -> Result<Option<Value>, CompileError> {
        match node {
            Ast::IntegerLiteral(value) => Ok(Some(Value::ImmediateInt32(*value))),

            Ast::Identifier(name) => {
                // The symbol's register is the pointer to the variable's
                // stack slot; load it into a fresh 32-bit register.
                let pointer = self.local_symbol(name)?.register.clone();
                let result = self.create_register(32);
                self.emitter.emit_load(&result, &pointer)?;
                Ok(Some(Value::Register(result)))
            }

            Ast::Operator {
                operation,
                operands,
            } => {
                if *operation == Operation::Assignment {
                    let rhs = self.generate_operand(&operands[1])?;
                    let rhs = self.convert_value_type(rhs, 32)?;

                    // The parser only builds assignments whose first
                    // operand is an identifier.
                    let Ast::Identifier(name) = &operands[0] else {
                        return Err(CompileError::ExpectedIdentifier(operands[0].to_string()));
                    };
                    let pointer = self.local_symbol(name)?.register.clone();
                    self.emitter.emit_store(&rhs, &pointer)?;
                    Ok(None)
                } else {
                    let lhs = self.generate_operand(&operands[0])?;
                    let lhs = self.convert_value_type(lhs, 32)?;
                    let rhs = self.generate_operand(&operands[1])?;
                    let rhs = self.convert_value_type(rhs, 32)?;
                    self.generate_binary_operation(*operation, lhs, rhs)
                        .map(Some)
                }
            }

            Ast::FunctionCall { callee, arguments } => {
                let (function, parameter_count) = self.global_function(callee)?;
                if arguments.len() != parameter_count {
                    return Err(CompileError::ArityMismatch {
                        name: callee.clone(),
                        expected: parameter_count,
                        given: arguments.len(),
                    });
                }

                let mut argument_values = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    argument_values.push(self.generate_operand(argument)?);
                }

                let result = self.create_register(32);
                self.emitter
                    .emit_function_call(&result, &function, &argument_values)?;
                Ok(Some(Value::Register(result)))
            }

            Ast::Block(statements) => {
                for statement in statements {
                    self.generate_node(statement)?;
                }
                Ok(None)
            }

            Ast::VariableDeclaration { name } => {
                let pointer = Register::local(name.clone(), 32);
                self.emitter.emit_stack_allocation(&pointer)?;
                self.local_symbols.insert(Symbol::variable(name.clone(), pointer));
                Ok(None)
            }

            Ast::Print(printee) => {
                let printee = self.generate_operand(printee)?;
                let printee = self.convert_value_type(printee, 32)?;

                // printf returns its character count; the register exists
                // only to satisfy the call syntax.
                let discarded = self.create_register(32);
                self.emitter.emit_print(&discarded, &printee)?;
                Ok(None)
            }

            Ast::Conditional {
                condition,
                consequent,
                alternative,
            } => {
                let condition = self.generate_operand(condition)?;
                let condition = self.convert_value_type(condition, 1)?;

                match alternative {
                    None => {
                        let consequent_label = self.create_label();
                        let tail_label = self.create_label();
                        self.emitter.emit_conditional_branch(
                            &condition,
                            &consequent_label,
                            &tail_label,
                        )?;

                        self.emitter.emit_label(&consequent_label)?;
                        self.generate_node(consequent)?;
                        self.emitter.emit_unconditional_branch(&tail_label)?;

                        self.emitter.emit_label(&tail_label)?;
                    }
                    Some(alternative) => {
                        let consequent_label = self.create_label();
                        let alternative_label = self.create_label();
                        let tail_label = self.create_label();
                        self.emitter.emit_conditional_branch(
                            &condition,
                            &consequent_label,
                            &alternative_label,
                        )?;

                        self.emitter.emit_label(&consequent_label)?;
                        self.generate_node(consequent)?;
                        self.emitter.emit_unconditional_branch(&tail_label)?;

                        self.emitter.emit_label(&alternative_label)?;
                        self.generate_node(alternative)?;
                        self.emitter.emit_unconditional_branch(&tail_label)?;

                        self.emitter.emit_label(&tail_label)?;
                    }
                }
                Ok(None)
            }

            Ast::WhileLoop { condition, body } => {
                // The condition re-evaluates every iteration, so it starts
                // its own basic block.
                let continue_label = self.create_label();
                self.emitter.emit_unconditional_branch(&continue_label)?;
                self.emitter.emit_label(&continue_label)?;

                let condition = self.generate_operand(condition)?;
                let condition = self.convert_value_type(condition, 1)?;

                let body_label = self.create_label();
                let break_label = self.create_label();
                self.emitter
                    .emit_conditional_branch(&condition, &body_label, &break_label)?;

                self.emitter.emit_label(&body_label)?;
                self.generate_node(body)?;
                self.emitter.emit_unconditional_branch(&continue_label)?;

                self.emitter.emit_label(&break_label)?;
                Ok(None)
            }

            Ast::Return(value) => {
                let value = self.generate_operand(value)?;
                self.emitter.emit_return(&value)?;

                // `ret` is a terminator, so LLVM implicitly opens a new
                // block after it; reserve the register number that block's
                // implicit label consumes.
                self.next_register_number += 1;
                Ok(None)
            }

            Ast::FunctionDefinition {
                name,
                parameters,
                body,
            } => {
                // Parameter value registers consume the numbers 0..k-1.
                let parameter_values: Vec<Register> = parameters
                    .iter()
                    .map(|_| self.create_register(32))
                    .collect();

                // Registering the function before its body generates makes
                // recursive calls resolve.
                let function = Register::global(name.clone());
                self.global_symbols.insert(Symbol::function(
                    name.clone(),
                    function.clone(),
                    parameters.len(),
                ));

                self.emitter
                    .emit_function_start(&function, &parameter_values)?;

                // Explicitly label the first basic block, which suppresses
                // LLVM's implicit label zero.
                let entry = self.create_label();
                self.emitter.emit_label(&entry)?;

                // Spill each parameter to the stack so it behaves like any
                // other local variable.
                for (parameter_name, parameter_value) in parameters.iter().zip(&parameter_values) {
                    let pointer = Register::local(parameter_name.clone(), 32);
                    self.emitter.emit_stack_allocation(&pointer)?;
                    self.emitter
                        .emit_store(&Value::Register(parameter_value.clone()), &pointer)?;
                    self.local_symbols
                        .insert(Symbol::variable(parameter_name.clone(), pointer));
                }

                self.generate_node(body)?;
                self.emitter.emit_function_end()?;

                self.local_symbols.clear();
                self.next_register_number = 0;
                self.next_label_number = 0;
                Ok(None)
            }
        }
    }

    /// Emit the instruction for a non-assignment binary operation with both
    /// operands already widened to 32 bits. Arithmetic produces a 32-bit
    /// register; comparisons produce a 1-bit register.
    fn generate_binary_operation(
        &mut self,
        operation: Operation,
        lhs: Value,
        rhs: Value,
    ) -> Result<Value, CompileError> {
        let result = match operation {
            Operation::Addition => {
                let result = self.create_register(32);
                self.emitter.emit_addition(&result, &lhs, &rhs)?;
                result
            }
            Operation::Subtraction => {
                let result = self.create_register(32);
                self.emitter.emit_subtraction(&result, &lhs, &rhs)?;
                result
            }
            Operation::Multiplication => {
                let result = self.create_register(32);
                self.emitter.emit_multiplication(&result, &lhs, &rhs)?;
                result
            }
            Operation::Division => {
                let result = self.create_register(32);
                self.emitter.emit_division(&result, &lhs, &rhs)?;
                result
            }
            Operation::Remainder => {
                let result = self.create_register(32);
                self.emitter.emit_remainder(&result, &lhs, &rhs)?;
                result
            }
            Operation::Equal => {
                let result = self.create_register(1);
                self.emitter.emit_comparison(&result, "eq", &lhs, &rhs)?;
                result
            }
            Operation::NotEqual => {
                let result = self.create_register(1);
                self.emitter.emit_comparison(&result, "ne", &lhs, &rhs)?;
                result
            }
            Operation::LessThan => {
                let result = self.create_register(1);
                self.emitter.emit_comparison(&result, "slt", &lhs, &rhs)?;
                result
            }
            Operation::GreaterThan => {
                let result = self.create_register(1);
                self.emitter.emit_comparison(&result, "sgt", &lhs, &rhs)?;
                result
            }
            Operation::LessEqual => {
                let result = self.create_register(1);
                self.emitter.emit_comparison(&result, "sle", &lhs, &rhs)?;
                result
            }
            Operation::GreaterEqual => {
                let result = self.create_register(1);
                self.emitter.emit_comparison(&result, "sge", &lhs, &rhs)?;
                result
            }
            Operation::Assignment => {
                return Err(CompileError::OperationNotImplemented(
                    operation.token().content().to_string(),
                ));
            }
        };

        Ok(Value::Register(result))
    }
}
