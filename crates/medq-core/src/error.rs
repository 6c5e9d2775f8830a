use thiserror::Error;

use crate::fields::{FieldKind, Model};

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("cannot read '{raw}' as {expected}: {reason}")]
    MalformedAnswer {
        raw: String,
        expected: &'static str,
        reason: String,
    },

    #[error("Field {field} cannot be found on {model}")]
    FieldNotFound { field: String, model: Model },

    #[error("Field {field} on {model} is not a relation")]
    NotARelation { field: String, model: Model },

    #[error("Field {field} on {model} is a relation and cannot receive an answer")]
    RelationNotWritable { field: String, model: Model },

    #[error("Field {field} on {model} expects {expected}, got {actual}")]
    FieldTypeMismatch {
        field: String,
        model: Model,
        expected: FieldKind,
        actual: &'static str,
    },

    #[error("empty destination path")]
    EmptyPath,

    #[error("missing required field: {0}")]
    MissingField(String),
}
