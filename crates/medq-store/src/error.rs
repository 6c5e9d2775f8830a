use medq_core::{Model, RecordId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{model} record {id} does not exist")]
    NotFound { model: Model, id: RecordId },

    #[error("{model}.{field} points to missing {target} record {id}")]
    MissingReference {
        model: Model,
        field: &'static str,
        target: Model,
        id: RecordId,
    },

    #[error("cannot delete {model} record {id}: still referenced by {referenced_by}")]
    RestrictDelete {
        model: Model,
        id: RecordId,
        referenced_by: Model,
    },

    #[error("sequence '{0}' is already defined")]
    DuplicateSequence(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
