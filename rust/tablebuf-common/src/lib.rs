//! Core definitions (error taxonomy and contract-check helpers), relied upon by all
//! tablebuf-* crates.

pub mod error;
pub mod result;

pub use result::Result;
