use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    #[error("syntax error at offset {offset}: {message}")]
    Syntax { offset: usize, message: String },

    #[error("name '{0}' is not defined")]
    UnknownName(String),

    #[error("function '{0}' is not available")]
    UnknownFunction(String),

    #[error("{function}() takes {expected} argument(s), got {actual}")]
    Arity {
        function: String,
        expected: &'static str,
        actual: usize,
    },

    #[error("type error: {0}")]
    Type(String),

    #[error("invalid value: {0}")]
    Value(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow")]
    Overflow,

    #[error("expression is longer than {max} bytes")]
    TooLong { max: usize },

    #[error("expression nests deeper than {max} levels")]
    TooDeep { max: usize },

    #[error("result would exceed {max} elements")]
    TooLarge { max: usize },
}

impl ExprError {
    pub(crate) fn syntax(offset: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            offset,
            message: message.into(),
        }
    }
}
