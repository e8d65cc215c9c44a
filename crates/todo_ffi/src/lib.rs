//! Flutter-facing bindings for the to-do core.

pub mod api;
