//! medq-audit
//!
//! Structured audit events for record state changes, emitted via `tracing`.

pub mod events;

pub use events::{AuditAction, AuditEvent};
