use crate::backends::php::routine_emitter::RoutineEmitter;
use crate::compiler_messages::compiler_errors::CompilerError;
use crate::program::ast_nodes::{Address, Ae, ArithOp, RelOp};
use std::fmt::Write as _;

impl<'prog> RoutineEmitter<'prog> {
    pub(crate) fn lower_ae(&self, ae: &Ae) -> Result<String, CompilerError> {
        let lowered = match ae {
            Ae::Name(name) => self.varref(*name)?,
            Ae::Number(number) => number.to_string(),
            Ae::MaxInt => String::from("PHP_INT_MAX"),
            Ae::MinInt => String::from("PHP_INT_MIN"),

            Ae::Neg(inner) => {
                let inner = self.lower_ae(inner)?;
                // `--x` would be a decrement
                if inner.starts_with('-') {
                    format!("-({})", inner)
                } else {
                    format!("-{}", inner)
                }
            }

            Ae::Binary { op, left, right } => {
                let left = self.lower_ae(left)?;
                let right = self.lower_ae(right)?;
                match op {
                    ArithOp::Plus => format!("({} + {})", left, right),
                    ArithOp::Minus => format!("({} - {})", left, right),
                    ArithOp::Multiply => format!("({} * {})", left, right),
                    // Truncating division, same as `/` on C integers
                    ArithOp::Divide => format!("intdiv({}, {})", left, right),
                }
            }

            Ae::Cursor => String::from("$this->cursor"),
            Ae::Limit(mode) => {
                if mode.is_forward() {
                    String::from("$this->limit")
                } else {
                    String::from("$this->limit_backward")
                }
            }

            // Lengths count characters rather than bytes
            Ae::LenOf(name) | Ae::SizeOf(name) => {
                format!("parent::lengthOf({})", self.varref(*name)?)
            }
            Ae::Len | Ae::Size => String::from("$this->currentLength()"),
        };

        Ok(lowered)
    }

    pub(crate) fn lower_address(&self, address: &Address) -> Result<String, CompilerError> {
        match address {
            Address::Literal(text) => Ok(php_string_literal(text)),
            Address::Variable(name) => self.varref(*name),
        }
    }
}

pub(crate) fn php_relop(op: RelOp) -> &'static str {
    match op {
        RelOp::Eq => " === ",
        RelOp::Ne => " !== ",
        RelOp::Gt => " > ",
        RelOp::Ge => " >= ",
        RelOp::Lt => " < ",
        RelOp::Le => " <= ",
    }
}

/// Double quoted PHP string. Anything outside printable ASCII becomes a `\u{...}` escape,
/// and `$` is escaped so nothing is ever interpolated.
pub fn php_string_literal(text: &str) -> String {
    let mut literal = String::with_capacity(text.len() + 2);
    literal.push('"');

    for ch in text.chars() {
        match ch {
            '"' | '\\' | '$' => {
                literal.push('\\');
                literal.push(ch);
            }
            ' '..='~' => literal.push(ch),
            _ => {
                let _ = write!(literal, "\\u{{{:04X}}}", ch as u32);
            }
        }
    }

    literal.push('"');
    literal
}
