use std::fmt;

use crate::lexer::{BasicToken, Token};

/// Precedence classes for binary operations, ordered lowest to highest.
/// Derived `Ord` follows declaration order, so comparisons between levels
/// work directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    Assignment,
    Equality,
    Inequality,
    Additive,
    Multiplicative,
}

/// The binary operations an `Ast::Operator` node can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Assignment,
    Equal,
    NotEqual,
    LessThan,
    GreaterThan,
    LessEqual,
    GreaterEqual,
    Addition,
    Subtraction,
    Multiplication,
    Division,
    Remainder,
}

impl Operation {
    pub fn precedence(self) -> Precedence {
        match self {
            Operation::Assignment => Precedence::Assignment,
            Operation::Equal | Operation::NotEqual => Precedence::Equality,
            Operation::LessThan
            | Operation::GreaterThan
            | Operation::LessEqual
            | Operation::GreaterEqual => Precedence::Inequality,
            Operation::Addition | Operation::Subtraction => Precedence::Additive,
            Operation::Multiplication | Operation::Division | Operation::Remainder => {
                Precedence::Multiplicative
            }
        }
    }

    /// The token denoting this operation.
    pub fn token(self) -> BasicToken {
        match self {
            Operation::Assignment => BasicToken::Equal,
            Operation::Equal => BasicToken::DoubleEqual,
            Operation::NotEqual => BasicToken::NotEqual,
            Operation::LessThan => BasicToken::Less,
            Operation::GreaterThan => BasicToken::Greater,
            Operation::LessEqual => BasicToken::LessEqual,
            Operation::GreaterEqual => BasicToken::GreaterEqual,
            Operation::Addition => BasicToken::Plus,
            Operation::Subtraction => BasicToken::Minus,
            Operation::Multiplication => BasicToken::Star,
            Operation::Division => BasicToken::Slash,
            Operation::Remainder => BasicToken::Percent,
        }
    }

    /// The operation denoted by a token, if any. Note that `=` has no
    /// mapping: assignment is recognized by the statement parser only, so
    /// the expression parser never produces it.
    pub fn from_token(token: &Token) -> Option<Operation> {
        let Token::Basic(basic) = token else {
            return None;
        };
        match basic {
            BasicToken::DoubleEqual => Some(Operation::Equal),
            BasicToken::NotEqual => Some(Operation::NotEqual),
            BasicToken::Less => Some(Operation::LessThan),
            BasicToken::Greater => Some(Operation::GreaterThan),
            BasicToken::LessEqual => Some(Operation::LessEqual),
            BasicToken::GreaterEqual => Some(Operation::GreaterEqual),
            BasicToken::Plus => Some(Operation::Addition),
            BasicToken::Minus => Some(Operation::Subtraction),
            BasicToken::Star => Some(Operation::Multiplication),
            BasicToken::Slash => Some(Operation::Division),
            BasicToken::Percent => Some(Operation::Remainder),
            _ => None,
        }
    }
}

/// A node of the abstract syntax tree. The integer-literal and identifier
/// leaves carry the same payloads as their tokens, so the parser can pass
/// the current token straight into the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ast {
    IntegerLiteral(i32),
    Identifier(String),
    Operator {
        operation: Operation,
        operands: Box<[Ast; 2]>,
    },
    FunctionCall {
        callee: String,
        arguments: Vec<Ast>,
    },
    Block(Vec<Ast>),
    VariableDeclaration {
        name: String,
    },
    Print(Box<Ast>),
    Conditional {
        condition: Box<Ast>,
        consequent: Box<Ast>,
        alternative: Option<Box<Ast>>,
    },
    WhileLoop {
        condition: Box<Ast>,
        body: Box<Ast>,
    },
    Return(Box<Ast>),
    FunctionDefinition {
        name: String,
        parameters: Vec<String>,
        body: Box<Ast>,
    },
}

/// Renders the syntax that produced each node, used by the per-statement
/// debug trace.
impl fmt::Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ast::IntegerLiteral(value) => write!(f, "(integer {value})"),
            Ast::Identifier(name) => write!(f, "{name}"),
            Ast::Operator {
                operation,
                operands,
            } => write!(
                f,
                "({} {} {})",
                operands[0],
                operation.token().content(),
                operands[1]
            ),
            Ast::FunctionCall { callee, arguments } => {
                write!(f, "({callee}(")?;
                for argument in arguments {
                    write!(f, "{argument}, ")?;
                }
                write!(f, "))")
            }
            Ast::Block(statements) => {
                write!(f, "{{ ")?;
                for statement in statements {
                    write!(f, "{statement}; ")?;
                }
                write!(f, "}}")
            }
            Ast::VariableDeclaration { name } => write!(f, "(int {name})"),
            Ast::Print(printee) => write!(f, "(print {printee})"),
            Ast::Conditional {
                condition,
                consequent,
                alternative,
            } => {
                write!(f, "(if {condition} {consequent}")?;
                if let Some(alternative) = alternative {
                    write!(f, " {alternative}")?;
                }
                write!(f, ")")
            }
            Ast::WhileLoop { condition, body } => write!(f, "(while {condition} {body})"),
            Ast::Return(value) => write!(f, "(return {value})"),
            Ast::FunctionDefinition {
                name,
                parameters,
                body,
            } => {
                write!(f, "(int {name}(")?;
                for parameter in parameters {
                    write!(f, "(int {parameter}), ")?;
                }
                write!(f, ") {body})")
            }
        }
    }
}
