//! Sieve values as JavaScript expressions.

use super::buffer::js_string;
use super::CodeGen;
use crate::sieve::error::CompileError;
use crate::sieve::program::{Envelope, Value, VariableType};

impl CodeGen<'_> {
    /// Render a value as a JavaScript string expression.
    ///
    /// Constants become string literals; an interpolated string becomes a
    /// concatenation whose variable parts read the `variables` object.
    pub(crate) fn value(&mut self, value: &Value) -> Result<String, CompileError> {
        match value {
            Value::Text(text) | Value::Regex(text) => Ok(js_string(text)),
            Value::Number(n) => Ok(js_string(&n.to_string())),
            Value::Variable(variable) => self.variable(variable),
            Value::List(parts) => {
                let rendered = parts
                    .iter()
                    .map(|p| self.value(p))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(match rendered.len() {
                    0 => js_string(""),
                    // A lone reference still has to be a string.
                    1 if matches!(parts[0], Value::Variable(_)) => format!("\"\" + {}", rendered[0]),
                    1 => rendered.concat(),
                    _ => format!("({})", rendered.join(" + ")),
                })
            }
        }
    }

    fn variable(&mut self, variable: &VariableType) -> Result<String, CompileError> {
        match variable {
            VariableType::Local(_) | VariableType::Global(_) => {
                self.needs.variables = true;
                Ok(format!("(variables[{}] ?? \"\")", variable_key(variable)?))
            }
            VariableType::Envelope(Envelope::From) => Ok("text(message.from)".to_string()),
            VariableType::Envelope(Envelope::To) => Ok("text(message.to)".to_string()),
            VariableType::Envelope(other) => Err(CompileError::unsupported(format!(
                "envelope variable {other:?} is not available to workers"
            ))),
            VariableType::Match(n) => Err(CompileError::unsupported(format!(
                "match variable ${{{n}}} is not available to workers"
            ))),
            VariableType::Environment(name) => Err(CompileError::unsupported(format!(
                "environment variable \"{name}\" is not available to workers"
            ))),
        }
    }
}

/// The `variables` key a `set` target is stored under.
pub(crate) fn variable_key(variable: &VariableType) -> Result<String, CompileError> {
    match variable {
        VariableType::Local(slot) => Ok(js_string(&format!("local{slot}"))),
        VariableType::Global(name) => Ok(js_string(&format!("global.{}", name.to_ascii_lowercase()))),
        other => Err(CompileError::unsupported(format!(
            "cannot assign to {other:?}"
        ))),
    }
}

/// True when the value is not a constant.
pub(crate) fn has_references(value: &Value) -> bool {
    match value {
        Value::Variable(_) => true,
        Value::List(parts) => parts.iter().any(has_references),
        Value::Text(_) | Value::Number(_) | Value::Regex(_) => false,
    }
}

/// Translate a Sieve `:matches` glob into a JavaScript regex literal.
///
/// `*` matches any run of characters, `?` exactly one, and a backslash
/// makes the next character literal.
pub(crate) fn glob_regex(glob: &str, case_insensitive: bool) -> String {
    let mut out = String::from("/^");
    let mut chars = glob.chars();
    while let Some(c) = chars.next() {
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '\\' => {
                if let Some(next) = chars.next() {
                    push_literal(&mut out, next);
                }
            }
            c => push_literal(&mut out, c),
        }
    }
    out.push_str("$/s");
    if case_insensitive {
        out.push('i');
    }
    out
}

fn push_literal(out: &mut String, c: char) {
    match c {
        '\\' | '^' | '$' | '.' | '|' | '+' | '*' | '?' | '(' | ')' | '[' | ']' | '{' | '}'
        | '/' => {
            out.push('\\');
            out.push(c);
        }
        '\n' => out.push_str("\\n"),
        '\r' => out.push_str("\\r"),
        '\t' => out.push_str("\\t"),
        c => out.push(c),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sieve::codegen::GenerateOpts;
    use crate::sieve::program::Number;

    fn render(value: &Value) -> (String, bool) {
        let opts = GenerateOpts::default();
        let mut gen = CodeGen::new(&opts, &[]);
        let js = gen.value(value).unwrap();
        (js, gen.needs.variables)
    }

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    #[test]
    fn constants_are_quoted() {
        assert_eq!(render(&text("Y")), ("\"Y\"".to_string(), false));
        assert_eq!(render(&Value::Number(Number::Integer(37))).0, "\"37\"");
    }

    #[test]
    fn lone_reference_is_coerced_to_string() {
        let value = Value::List(vec![Value::Variable(VariableType::Local(0))]);
        assert_eq!(
            render(&value),
            ("\"\" + (variables[\"local0\"] ?? \"\")".to_string(), true)
        );
    }

    #[test]
    fn interpolation_concatenates() {
        let value = Value::List(vec![
            text("hi "),
            Value::Variable(VariableType::Global("Name".to_string())),
            text("!"),
        ]);
        assert_eq!(
            render(&value).0,
            "(\"hi \" + (variables[\"global.name\"] ?? \"\") + \"!\")"
        );
        assert!(has_references(&value));
        assert!(!has_references(&text("${x}")));
    }

    #[test]
    fn envelope_variables_read_the_message() {
        let value = Value::Variable(VariableType::Envelope(Envelope::From));
        assert_eq!(render(&value), ("text(message.from)".to_string(), false));
    }

    #[test]
    fn match_variables_are_rejected() {
        let opts = GenerateOpts::default();
        let mut gen = CodeGen::new(&opts, &[]);
        let err = gen.value(&Value::Variable(VariableType::Match(1))).unwrap_err();
        assert!(err.message.contains("${1}"), "{}", err.message);
    }

    #[test]
    fn glob_translation() {
        assert_eq!(glob_regex("yes*", true), "/^yes.*$/si");
        assert_eq!(glob_regex("a?c", false), "/^a.c$/s");
        assert_eq!(glob_regex("1.0/2", false), "/^1\\.0\\/2$/s");
        assert_eq!(glob_regex("\\*x", false), "/^\\*x$/s");
    }
}
