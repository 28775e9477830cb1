use crate::ast::{Ast, Operation, Precedence};
use crate::error::CompileError;
use crate::lexer::{BasicToken, Scanner, Token};

/// Parses the scanner's token stream into abstract syntax trees, one
/// top-level statement at a time. Statements use recursive descent;
/// expressions use Pratt parsing over the C precedence levels.
pub struct Parser<'src> {
    scanner: Scanner<'src>,
}

impl<'src> Parser<'src> {
    /// Scans the first token so every parse method can rely on the scanner
    /// holding a valid current token.
    pub fn new(mut scanner: Scanner<'src>) -> Result<Self, CompileError> {
        scanner.scan_token()?;
        Ok(Parser { scanner })
    }

    /// Parse the next top-level statement, or return `None` once the end of
    /// the input has been reached. Only function definitions are allowed at
    /// the top level.
    pub fn parse_top_level_statement(&mut self) -> Result<Option<Ast>, CompileError> {
        if self.scanner.token().is_none() {
            return Ok(None);
        }
        self.parse_function_definition().map(Some)
    }

    /// `int NAME '(' (int NAME (',' int NAME)*)? ')' BLOCK`
    fn parse_function_definition(&mut self) -> Result<Ast, CompileError> {
        self.expect_basic(BasicToken::Int)?;
        self.scanner.scan_token()?;
        let name = self.expect_identifier()?;
        self.scanner.scan_token()?;
        self.expect_basic(BasicToken::ParenLeft)?;
        self.scanner.scan_token()?;

        let mut parameters = Vec::new();
        if self.scanner.expect_token()?.is_basic(BasicToken::Int) {
            loop {
                self.expect_basic(BasicToken::Int)?;
                self.scanner.scan_token()?;
                parameters.push(self.expect_identifier()?);
                self.scanner.scan_token()?;
                if self.scanner.expect_token()?.is_basic(BasicToken::Comma) {
                    self.scanner.scan_token()?;
                } else {
                    break;
                }
            }
        }

        self.expect_basic(BasicToken::ParenRight)?;
        self.scanner.scan_token()?;

        // The function body must be a block statement.
        if !self.scanner.expect_token()?.is_basic(BasicToken::CurlyLeft) {
            return Err(CompileError::UnexpectedToken(
                self.scanner.expect_token()?.to_string(),
            ));
        }
        let body = self.parse_statement()?;

        Ok(Ast::FunctionDefinition {
            name,
            parameters,
            body: Box::new(body),
        })
    }

    /// Parse a single statement. The current token must be the statement's
    /// first token; afterward the current token is the first token of the
    /// next statement.
    pub fn parse_statement(&mut self) -> Result<Ast, CompileError> {
        let first = self.scanner.expect_token()?.clone();

        match first {
            Token::Basic(BasicToken::CurlyLeft) => {
                self.scanner.scan_token()?;
                let mut statements = Vec::new();
                while !self.scanner.expect_token()?.is_basic(BasicToken::CurlyRight) {
                    statements.push(self.parse_statement()?);
                }
                self.scanner.scan_token()?;
                Ok(Ast::Block(statements))
            }
            Token::Basic(BasicToken::Int) => {
                self.scanner.scan_token()?;
                let name = self.expect_identifier()?;
                self.scanner.scan_token()?;
                self.expect_basic(BasicToken::Semicolon)?;
                self.scanner.scan_token()?;
                Ok(Ast::VariableDeclaration { name })
            }
            Token::Basic(BasicToken::Print) => {
                self.scanner.scan_token()?;
                let printee = self.parse_expression(None)?;
                self.expect_basic(BasicToken::Semicolon)?;
                self.scanner.scan_token()?;
                Ok(Ast::Print(Box::new(printee)))
            }
            Token::Basic(BasicToken::If) => {
                self.scanner.scan_token()?;
                self.expect_basic(BasicToken::ParenLeft)?;
                self.scanner.scan_token()?;
                let condition = self.parse_expression(None)?;
                self.expect_basic(BasicToken::ParenRight)?;
                self.scanner.scan_token()?;
                let consequent = self.parse_statement()?;

                // Greedily take an `else`, binding it to the nearest `if`.
                let alternative = match self.scanner.token() {
                    Some(token) if token.is_basic(BasicToken::Else) => {
                        self.scanner.scan_token()?;
                        Some(Box::new(self.parse_statement()?))
                    }
                    _ => None,
                };

                Ok(Ast::Conditional {
                    condition: Box::new(condition),
                    consequent: Box::new(consequent),
                    alternative,
                })
            }
            Token::Basic(BasicToken::While) => {
                self.scanner.scan_token()?;
                self.expect_basic(BasicToken::ParenLeft)?;
                self.scanner.scan_token()?;
                let condition = self.parse_expression(None)?;
                self.expect_basic(BasicToken::ParenRight)?;
                self.scanner.scan_token()?;
                let body = self.parse_statement()?;

                Ok(Ast::WhileLoop {
                    condition: Box::new(condition),
                    body: Box::new(body),
                })
            }
            Token::Basic(BasicToken::Return) => {
                self.scanner.scan_token()?;
                let value = self.parse_expression(None)?;
                self.expect_basic(BasicToken::Semicolon)?;
                self.scanner.scan_token()?;
                Ok(Ast::Return(Box::new(value)))
            }
            Token::Identifier(name) => {
                // The token after the identifier decides between an
                // assignment and a function-call statement.
                self.scanner.scan_token()?;
                let following = self.scanner.expect_token()?;

                if following.is_basic(BasicToken::ParenLeft) {
                    let call = self.parse_function_call(name)?;
                    self.expect_basic(BasicToken::Semicolon)?;
                    self.scanner.scan_token()?;
                    Ok(call)
                } else if following.is_basic(BasicToken::Equal) {
                    self.scanner.scan_token()?;
                    let right_hand_side = self.parse_expression(None)?;
                    self.expect_basic(BasicToken::Semicolon)?;
                    self.scanner.scan_token()?;
                    Ok(Ast::Operator {
                        operation: Operation::Assignment,
                        operands: Box::new([Ast::Identifier(name), right_hand_side]),
                    })
                } else {
                    Err(CompileError::ExpectedEqualsSign(following.to_string()))
                }
            }
            other => Err(CompileError::UnexpectedToken(other.to_string())),
        }
    }

    /// Parse an expression by precedence climbing. Operators are folded as
    /// long as their precedence strictly exceeds the parent's, which makes
    /// every binary operator left-associative. Afterward the current token
    /// is the expression's terminator.
    pub fn parse_expression(
        &mut self,
        parent_precedence: Option<Precedence>,
    ) -> Result<Ast, CompileError> {
        let mut subtree = self.parse_operand()?;

        while let Some(operation) = Operation::from_token(self.scanner.expect_token()?) {
            let current_precedence = operation.precedence();
            if parent_precedence.is_some_and(|parent| parent >= current_precedence) {
                break;
            }

            self.scanner.scan_token()?;
            let right_hand_side = self.parse_expression(Some(current_precedence))?;
            subtree = Ast::Operator {
                operation,
                operands: Box::new([subtree, right_hand_side]),
            };
        }

        Ok(subtree)
    }

    /// An operand is an integer literal, an identifier, or a function call
    /// introduced by an identifier followed by `(`.
    fn parse_operand(&mut self) -> Result<Ast, CompileError> {
        match self.scanner.expect_token()?.clone() {
            Token::IntegerLiteral(value) => {
                self.scanner.scan_token()?;
                Ok(Ast::IntegerLiteral(value))
            }
            Token::Identifier(name) => {
                self.scanner.scan_token()?;
                let is_call = self
                    .scanner
                    .token()
                    .is_some_and(|token| token.is_basic(BasicToken::ParenLeft));
                if is_call {
                    self.parse_function_call(name)
                } else {
                    Ok(Ast::Identifier(name))
                }
            }
            other => Err(CompileError::ExpectedOperand(other.to_string())),
        }
    }

    /// `'(' (expr (',' expr)*)? ')'` after the callee identifier has been
    /// consumed. Afterward the current token is the one following `)`.
    fn parse_function_call(&mut self, callee: String) -> Result<Ast, CompileError> {
        self.expect_basic(BasicToken::ParenLeft)?;
        self.scanner.scan_token()?;

        let mut arguments = Vec::new();
        if !self.scanner.expect_token()?.is_basic(BasicToken::ParenRight) {
            loop {
                arguments.push(self.parse_expression(None)?);
                if self.scanner.expect_token()?.is_basic(BasicToken::Comma) {
                    self.scanner.scan_token()?;
                } else {
                    break;
                }
            }
        }

        self.expect_basic(BasicToken::ParenRight)?;
        self.scanner.scan_token()?;

        Ok(Ast::FunctionCall { callee, arguments })
    }

    fn expect_identifier(&self) -> Result<String, CompileError> {
        match self.scanner.expect_token()? {
            Token::Identifier(name) => Ok(name.clone()),
            other => Err(CompileError::ExpectedIdentifier(other.to_string())),
        }
    }

    /// Require the current token to be a specific basic token, reporting a
    /// failure matched to what was expected.
    fn expect_basic(&self, expected: BasicToken) -> Result<(), CompileError> {
        let token = self.scanner.expect_token()?;
        if token.is_basic(expected) {
            return Ok(());
        }

        Err(match expected {
            BasicToken::Semicolon => CompileError::ExpectedSemicolon(token.to_string()),
            BasicToken::ParenLeft | BasicToken::ParenRight => CompileError::ExpectedParen {
                expected: expected.content().to_string(),
                found: token.to_string(),
            },
            _ => CompileError::UnexpectedToken(token.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_expr(source: &str) -> Ast {
        let mut parser = Parser::new(Scanner::new(source)).expect("parser should prime");
        parser.parse_expression(None).expect("expression should parse")
    }

    fn parse_stmt(source: &str) -> Ast {
        let mut parser = Parser::new(Scanner::new(source)).expect("parser should prime");
        parser.parse_statement().expect("statement should parse")
    }

    fn binary(operation: Operation, lhs: Ast, rhs: Ast) -> Ast {
        Ast::Operator {
            operation,
            operands: Box::new([lhs, rhs]),
        }
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        // a + b * c => (a + (b * c))
        let expected = binary(
            Operation::Addition,
            Ast::Identifier("a".to_string()),
            binary(
                Operation::Multiplication,
                Ast::Identifier("b".to_string()),
                Ast::Identifier("c".to_string()),
            ),
        );
        assert_eq!(parse_expr("a + b * c;"), expected);
    }

    #[test]
    fn subtraction_is_left_associative() {
        // a - b - c => ((a - b) - c)
        let expected = binary(
            Operation::Subtraction,
            binary(
                Operation::Subtraction,
                Ast::Identifier("a".to_string()),
                Ast::Identifier("b".to_string()),
            ),
            Ast::Identifier("c".to_string()),
        );
        assert_eq!(parse_expr("a - b - c;"), expected);
    }

    #[test]
    fn addition_binds_tighter_than_comparison() {
        // a + b == c => ((a + b) == c)
        let expected = binary(
            Operation::Equal,
            binary(
                Operation::Addition,
                Ast::Identifier("a".to_string()),
                Ast::Identifier("b".to_string()),
            ),
            Ast::Identifier("c".to_string()),
        );
        assert_eq!(parse_expr("a + b == c;"), expected);
    }

    #[test]
    fn equals_sign_terminates_an_expression() {
        // The expression parser has no mapping for `=`, so it stops there.
        assert_eq!(parse_expr("x = 1;"), Ast::Identifier("x".to_string()));
    }

    #[test]
    fn parses_call_operand_inside_expression() {
        let expected = binary(
            Operation::Addition,
            Ast::FunctionCall {
                callee: "f".to_string(),
                arguments: vec![Ast::IntegerLiteral(1)],
            },
            Ast::IntegerLiteral(2),
        );
        assert_eq!(parse_expr("f(1) + 2;"), expected);
    }

    #[test]
    fn dangling_else_binds_to_nearest_if() {
        let statement = parse_stmt("if (x) if (y) print 1; else print 2;");
        let Ast::Conditional {
            alternative: outer_alternative,
            consequent,
            ..
        } = statement
        else {
            panic!("expected a conditional");
        };
        assert!(outer_alternative.is_none());

        let Ast::Conditional {
            alternative: inner_alternative,
            ..
        } = *consequent
        else {
            panic!("expected a nested conditional");
        };
        assert!(inner_alternative.is_some());
    }

    #[test]
    fn statement_dispatch_distinguishes_assignment_from_call() {
        let assignment = parse_stmt("x = y + 1;");
        assert!(matches!(
            assignment,
            Ast::Operator {
                operation: Operation::Assignment,
                ..
            }
        ));

        let call = parse_stmt("f(1, 2);");
        assert_eq!(
            call,
            Ast::FunctionCall {
                callee: "f".to_string(),
                arguments: vec![Ast::IntegerLiteral(1), Ast::IntegerLiteral(2)],
            }
        );
    }

    #[test]
    fn assignment_right_hand_side_takes_full_expression() {
        let statement = parse_stmt("x = 1 == 2;");
        let Ast::Operator {
            operation: Operation::Assignment,
            operands,
        } = statement
        else {
            panic!("expected an assignment");
        };
        assert!(matches!(
            operands[1],
            Ast::Operator {
                operation: Operation::Equal,
                ..
            }
        ));
    }

    #[test]
    fn parses_function_definition_with_parameters() {
        let source = "int max(int a, int b) { if (a < b) { return b; } return a; }";
        let mut parser = Parser::new(Scanner::new(source)).expect("parser should prime");
        let definition = parser
            .parse_top_level_statement()
            .expect("definition should parse")
            .expect("input should not be empty");

        let Ast::FunctionDefinition {
            name,
            parameters,
            body,
        } = definition
        else {
            panic!("expected a function definition");
        };
        assert_eq!(name, "max");
        assert_eq!(parameters, vec!["a".to_string(), "b".to_string()]);
        assert!(matches!(*body, Ast::Block(_)));

        assert!(parser
            .parse_top_level_statement()
            .expect("end of input")
            .is_none());
    }

    #[test]
    fn empty_input_has_no_top_level_statements() {
        let mut parser = Parser::new(Scanner::new("")).expect("parser should prime");
        assert!(parser
            .parse_top_level_statement()
            .expect("end of input")
            .is_none());
    }

    #[test]
    fn reports_missing_semicolon() {
        let mut parser = Parser::new(Scanner::new("print 1 }")).expect("parser should prime");
        let err = parser.parse_statement().unwrap_err();
        assert!(matches!(err, CompileError::ExpectedSemicolon(_)));
    }

    #[test]
    fn reports_missing_operand() {
        let mut parser = Parser::new(Scanner::new("print ;")).expect("parser should prime");
        let err = parser.parse_statement().unwrap_err();
        assert!(matches!(err, CompileError::ExpectedOperand(_)));
    }

    #[test]
    fn reports_unexpected_end_of_file_mid_expression() {
        let mut parser = Parser::new(Scanner::new("print 1 +")).expect("parser should prime");
        let err = parser.parse_statement().unwrap_err();
        assert!(matches!(err, CompileError::UnexpectedEof));
    }

    #[test]
    fn reports_non_function_at_top_level() {
        let mut parser = Parser::new(Scanner::new("print 1;")).expect("parser should prime");
        let err = parser.parse_top_level_statement().unwrap_err();
        assert!(matches!(err, CompileError::UnexpectedToken(_)));
    }
}
