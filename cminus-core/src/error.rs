use thiserror::Error;

/// Every way the pipeline can fail, from character input through code
/// generation. Errors are fatal: the driver reports the first one and
/// abandons the current input file.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("error while reading or writing: {0}")]
    Io(#[from] std::io::Error),

    // Scan errors
    #[error("unexpected character: '{0}' ({code})", code = char_code(_0))]
    UnexpectedCharacter(char),
    #[error("conflicting token matches for '{0}'")]
    ConflictingTokenMatches(String),

    // Parse errors
    #[error("unexpected end of file")]
    UnexpectedEof,
    #[error("unexpected token '{0}'")]
    UnexpectedToken(String),
    #[error("expected an operand, got '{0}'")]
    ExpectedOperand(String),
    #[error("expected an identifier, got '{0}'")]
    ExpectedIdentifier(String),
    #[error("expected a semicolon, got '{0}'")]
    ExpectedSemicolon(String),
    #[error("expected an equals sign for assignment, got '{0}'")]
    ExpectedEqualsSign(String),
    #[error("expected '{expected}', got '{found}'")]
    ExpectedParen { expected: String, found: String },

    // Semantic errors
    #[error("undefined local symbol '{0}'")]
    UndefinedLocalSymbol(String),
    #[error("undefined global function symbol '{0}'")]
    UndefinedGlobalFunction(String),
    #[error("global symbol '{0}' is not a function")]
    SymbolIsNotAFunction(String),
    #[error("function '{name}' expects {expected} arguments but {given} were given")]
    ArityMismatch {
        name: String,
        expected: usize,
        given: usize,
    },
    #[error("unsupported conversion from i{from} to i{to}")]
    UnsupportedConversion { from: u32, to: u32 },
    #[error("operation '{0}' not implemented")]
    OperationNotImplemented(String),
}

fn char_code(character: &char) -> u32 {
    *character as u32
}

