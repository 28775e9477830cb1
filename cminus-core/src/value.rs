use std::fmt;

/// A virtual register, usable as an instruction result or operand.
/// Local registers print as `%identifier`, globals as `@identifier`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Register {
    identifier: String,
    bit_count: u32,
    global: bool,
}

impl Register {
    pub fn local(identifier: impl Into<String>, bit_count: u32) -> Self {
        Register {
            identifier: identifier.into(),
            bit_count,
            global: false,
        }
    }

    /// A global register, as used for function addresses. These carry no
    /// meaningful integer width.
    pub fn global(identifier: impl Into<String>) -> Self {
        Register {
            identifier: identifier.into(),
            bit_count: 0,
            global: true,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn bit_count(&self) -> u32 {
        self.bit_count
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = if self.global { '@' } else { '%' };
        write!(f, "{prefix}{}", self.identifier)
    }
}

/// An operand of an emitted instruction. Every value carries an integer
/// width of either 1 or 32 bits, which drives the implicit conversions in
/// the generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Register(Register),
    ImmediateInt32(i32),
    ImmediateBool(bool),
}

impl Value {
    pub fn bit_count(&self) -> u32 {
        match self {
            Value::Register(register) => register.bit_count(),
            Value::ImmediateInt32(_) => 32,
            Value::ImmediateBool(_) => 1,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Register(register) => write!(f, "{register}"),
            Value::ImmediateInt32(value) => write!(f, "{value}"),
            Value::ImmediateBool(value) => write!(f, "{value}"),
        }
    }
}

/// A basic-block label. Labels are kept apart from registers because the
/// generator references them before they are defined, but they still print
/// as `%identifier` when used as a branch target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    identifier: String,
}

impl Label {
    pub fn new(identifier: impl Into<String>) -> Self {
        Label {
            identifier: identifier.into(),
        }
    }

    /// The bare identifier, without the `%` reference prefix. This is what
    /// a label definition line uses.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.identifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_print_with_scope_prefix() {
        assert_eq!(Register::local("0", 32).to_string(), "%0");
        assert_eq!(Register::local("count", 32).to_string(), "%count");
        assert_eq!(Register::global("main").to_string(), "@main");
    }

    #[test]
    fn values_report_their_width() {
        assert_eq!(Value::ImmediateInt32(7).bit_count(), 32);
        assert_eq!(Value::ImmediateBool(true).bit_count(), 1);
        assert_eq!(Value::Register(Register::local("3", 1)).bit_count(), 1);
    }

    #[test]
    fn immediates_print_their_constant() {
        assert_eq!(Value::ImmediateInt32(-5).to_string(), "-5");
        assert_eq!(Value::ImmediateBool(false).to_string(), "false");
    }

    #[test]
    fn labels_print_as_references() {
        let label = Label::new(".block.2");
        assert_eq!(label.to_string(), "%.block.2");
        assert_eq!(label.identifier(), ".block.2");
    }
}
