//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the load/save contract the task store persists through.
//! - Keep the on-disk line format inside the persistence boundary.
//!
//! # Invariants
//! - Saves always rewrite the full task list; there is no incremental append.
//! - Loads never fail because of a malformed line.

pub mod task_file;
