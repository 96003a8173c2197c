//! Shared helpers for manifest-gate integration tests.

pub mod builders;

pub use builders::*;
