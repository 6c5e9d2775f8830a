//! medq-store
//!
//! In-memory record store for the medq workspace: typed tables with
//! per-table id counters, reference checks, restrict/cascade deletes,
//! snapshot transactions, named sequences and JSON persistence.

pub mod error;
pub mod persistence;
pub mod sequence;
pub mod store;
pub mod table;

pub use crate::error::StoreError;
pub use crate::persistence::StatePersistence;
pub use crate::sequence::Sequence;
pub use crate::store::{Store, StoreState, Stored};
pub use crate::table::Table;
