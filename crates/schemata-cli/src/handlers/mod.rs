//! Command handlers.
//!
//! Handlers are thin: they resolve CLI input, call into `schemata-core`
//! and format the result for the terminal. Output is written to the given
//! writer so tests can capture it.

pub mod list;
pub mod sweep;
pub mod target;
