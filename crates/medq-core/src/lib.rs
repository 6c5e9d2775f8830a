//! medq-core
//!
//! Pure domain types for questionnaire responses: records, lifecycle states,
//! question types, the answer transform and destination-field resolution
//! tables. No storage or evaluation happens here. This is the shared vocabulary of
//! the medq workspace.

pub mod answer;
pub mod error;
pub mod fields;
pub mod models;
pub mod path;

pub use answer::{AnswerValue, transform_result};
pub use error::CoreError;
pub use fields::{FieldKind, Model, Record};
pub use models::{EventState, RecordId};
pub use path::DestinationPath;
