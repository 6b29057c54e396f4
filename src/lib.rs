//! Convert MARBL diagnostics files into MOM6 diag table extensions.
//!
//! A diagnostics file lists one variable per line together with the output
//! frequencies and reduction operators requested for it. This crate groups
//! those variables into per-frequency output streams, one per vertical-grid
//! variant, and writes the result as the JSON document MOM6's I/O layer
//! merges into its diag table.

pub mod cli;
pub mod convert;
pub mod parse;
pub mod table;
