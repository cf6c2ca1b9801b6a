//! Property and integration test suite for Omni.
//!
//! Exercises coin selection, size estimation and the reachability monitor
//! across crate boundaries, with randomized inputs where the invariants allow.

pub mod helpers;
