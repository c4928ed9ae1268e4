//! Runtime — task table, orchestrator state machine, paper processing.
//!
//! The orchestrator owns the in-memory task table and runs processing jobs
//! in the background. Task state is not persisted; a restart loses it.

pub mod batch;
pub mod orchestrator;
pub mod processor;
pub mod tasks;
pub mod types;

pub use batch::{process_directory, BatchOutcome, BatchReport};
pub use orchestrator::TaskOrchestrator;
pub use processor::{content_hash, PaperProcessor};
pub use tasks::TaskTable;
pub use types::*;
