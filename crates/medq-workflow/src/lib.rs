//! medq-workflow
//!
//! Lifecycle of questionnaire responses.
//!
//! Public API (all on [`Workflow`]):
//! - `create_response()` / `generate_from_request()`: new responses in preparation
//! - `preparation2in_progress()`: materialize one item per question
//! - `in_progress2completed()`: completion check, projection, signing
//! - `back_to_draft()`: drop items and return to preparation
//! - `write_items()` / `read_items()`: guarded item access, typed widget reads
//! - `fill_questionnaire()`: the UI action that opens the fill form

pub mod action;
pub mod check;
pub mod config;
pub mod error;
pub mod items;
pub mod lifecycle;
pub mod projection;
pub mod serializer;
pub mod signing;
pub mod workflow;

pub use crate::action::WindowAction;
pub use crate::config::WorkflowConfig;
pub use crate::error::WorkflowError;
pub use crate::items::{Context, ItemValues, ItemView, WIDGET_FLAG};
pub use crate::lifecycle::EventLifecycle;
pub use crate::serializer::{ItemEntry, ResponseDocument};
pub use crate::signing::{DocumentSigner, Sha256Signer};
pub use crate::workflow::{Workflow, generate_from_request_vals};
