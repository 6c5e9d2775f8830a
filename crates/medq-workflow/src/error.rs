use medq_core::{CoreError, EventState};
use medq_expr::ExprError;
use medq_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Questionnaire {response} is not correctly fulfilled")]
    CheckFailed { response: String },

    #[error("completion check of {response} could not be evaluated: {source}")]
    Expression {
        response: String,
        #[source]
        source: ExprError,
    },

    #[error("{response} cannot go from {from} to {to}")]
    InvalidTransition {
        response: String,
        from: EventState,
        to: EventState,
    },

    #[error("{response} is completed and can no longer be changed")]
    Locked { response: String },

    #[error("field {0} of a response item is read-only")]
    ReadonlyField(String),

    #[error("response items have no field {0}")]
    UnknownField(String),

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl WorkflowError {
    /// User-facing errors that block an operation because of what was
    /// entered or configured, as opposed to internal failures.
    pub fn is_validation(&self) -> bool {
        match self {
            Self::CheckFailed { .. }
            | Self::InvalidTransition { .. }
            | Self::Locked { .. }
            | Self::ReadonlyField(_)
            | Self::UnknownField(_)
            | Self::InvalidValue { .. } => true,
            Self::Core(e) => matches!(
                e,
                CoreError::FieldNotFound { .. }
                    | CoreError::NotARelation { .. }
                    | CoreError::RelationNotWritable { .. }
                    | CoreError::FieldTypeMismatch { .. }
                    | CoreError::EmptyPath
            ),
            Self::Expression { .. } | Self::Store(_) | Self::Serialization(_) => false,
        }
    }
}
