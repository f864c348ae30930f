//! Deterministic, pure logic shared by the sweep and material layers.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! values (raw responses, node references) and return deterministic outputs
//! suitable for tests.

pub mod node_ref;
pub mod outcome;
pub mod types;
