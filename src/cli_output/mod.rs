//! Line-oriented terminal output for the `qwatch` commands.
//!
//! Formatting is kept in plain functions returning strings so it can be
//! tested without capturing stdout.

mod boxes;

pub use boxes::*;
