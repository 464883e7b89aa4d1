//! Test fixtures for the tablebuf workspace.
//!
//! The modules below hold hand-written accessors in the shape a schema
//! compiler emits for tablebuf: one `Copy` view per table wrapping a
//! [`tablebuf::Table`], `VT_*` field index constants, `XArgs` structs with
//! `X::create`, and `start`/`add_*`/`end` functions for free-form construction.
//!
//! - [`namespace_a`]: the namespace fixture (`TableInC` and friends)
//! - [`sample`]: a table exercising every field kind, including unions
//! - [`data_gen`]: seeded random contents for the sample table

pub mod data_gen;
pub mod namespace_a;
pub mod sample;
