//! Command implementations for tablebuf-cmd

use std::path::Path;

use anyhow::{Context, Result};

pub mod inspect;
pub mod sample;

/// Reads a whole buffer file into memory.
pub fn read_buffer(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}
