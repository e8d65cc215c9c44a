//! Reminder scanning.
//!
//! # Responsibility
//! - Periodically match scheduled tasks against the current minute.
//! - Deliver reminder events to the presentation layer without blocking.

pub mod scanner;
