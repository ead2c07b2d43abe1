// ABOUTME: Internal failure types raised before a condition object exists
// ABOUTME: (malformed special-operator syntax, reader failures); these are
// ABOUTME: lifted into proper condition instances at the point of signaling.

use thiserror::Error;

use crate::value::Value;

pub const ARITY_ONE: &str = "1";
pub const ARITY_TWO: &str = "2";
pub const ARITY_AT_LEAST_ONE: &str = "at least 1";
pub const ARITY_ZERO_OR_ONE: &str = "0-1";
pub const ARITY_ONE_OR_TWO: &str = "1-2";

#[derive(Error, Debug, Clone)]
pub enum EvalError {
    #[error("{function}: expected {expected}, got {actual} at argument {position}")]
    TypeMismatch {
        function: String,
        expected: String,
        actual: String,
        position: usize,
    },

    #[error("{function}: expected {expected} argument{}, got {actual}", if *.expected == "1" { "" } else { "s" })]
    ArityError {
        function: String,
        expected: String,
        actual: usize,
    },

    #[error("{function}: {message}")]
    RuntimeError { function: String, message: String },

    #[error("malformed special operator form: {0}")]
    MalformedForm(String),

    #[error("undefined symbol: {0}")]
    UndefinedSymbol(String),

    #[error("value is not callable: {0}")]
    NotCallable(String),

    #[error("reader error: {0}")]
    ReadError(String),
}

impl EvalError {
    pub fn type_error(function: &str, expected: &str, actual: &Value, position: usize) -> Self {
        EvalError::TypeMismatch {
            function: function.to_string(),
            expected: expected.to_string(),
            actual: actual.type_name().to_string(),
            position,
        }
    }

    pub fn arity_error(function: &str, expected: impl Into<String>, actual: usize) -> Self {
        EvalError::ArityError {
            function: function.to_string(),
            expected: expected.into(),
            actual,
        }
    }

    pub fn runtime_error(function: &str, message: impl Into<String>) -> Self {
        EvalError::RuntimeError {
            function: function.to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arity_error_message_pluralizes() {
        let err = EvalError::arity_error("car", ARITY_ONE, 2);
        assert_eq!(err.to_string(), "car: expected 1 argument, got 2");
    }

    #[test]
    fn type_error_captures_actual_type_name() {
        let err = EvalError::type_error("car", "cons", &Value::Integer(1), 0);
        match err {
            EvalError::TypeMismatch { actual, .. } => assert_eq!(actual, "integer"),
            _ => panic!("expected TypeMismatch"),
        }
    }
}
