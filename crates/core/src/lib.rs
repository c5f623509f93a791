//! Core types and logic for idempotent table loading.
//!
//! No database driver lives here; concrete stores implement the traits in
//! [`store`].

pub mod error;
pub mod importer;
pub mod outcome;
pub mod record;
pub mod report;
pub mod store;
pub mod types;
pub mod validation;

pub use error::{PreconditionProblem, RunError, StoreError};
pub use importer::{execute, Importer};
pub use outcome::{ImportOutcome, ImportRun, RecordOutcome, RunSummary};
pub use record::{FieldValue, ImportRecord, TargetTable};
