//! Domain model for to-do tasks.
//!
//! # Responsibility
//! - Define the canonical task value shared by store, scanner and FFI.
//! - Own time-of-day parsing rules for user-entered schedule times.
//!
//! # Invariants
//! - A `Task` is an immutable value; state changes produce a new value.

pub mod task;
