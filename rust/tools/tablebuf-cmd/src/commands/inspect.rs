//! Inspect command implementation

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tablebuf::{Table, get_root};

use crate::commands::read_buffer;

#[derive(Debug, Serialize)]
pub struct InspectSummary {
    pub size: usize,
    pub root_position: usize,
    /// Present when the four bytes after the root offset look like an
    /// identifier (ASCII alphanumerics).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_identifier: Option<String>,
    pub root: TableInfo,
}

#[derive(Debug, Serialize)]
pub struct TableInfo {
    pub position: usize,
    pub vtable_position: usize,
    pub table_size: u16,
    pub slot_count: usize,
    pub fields: Vec<FieldInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vtable: Option<Vec<u16>>,
}

#[derive(Debug, Serialize)]
pub struct FieldInfo {
    pub index: usize,
    pub offset: u16,
}

pub fn run(verbose: u8, path: String) -> Result<()> {
    let path = Path::new(&path);
    let buf = read_buffer(path)?;
    log::debug!("read {} bytes from {}", buf.len(), path.display());

    let summary = summarize(&buf, verbose)
        .with_context(|| format!("Failed to inspect {}", path.display()))?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

pub fn summarize(buf: &[u8], verbose: u8) -> Result<InspectSummary> {
    let root = get_root(buf).context("Failed to resolve root table")?;
    let file_identifier = tablebuf::file_identifier(buf)
        .ok()
        .filter(|id| id.iter().all(u8::is_ascii_alphanumeric))
        .map(|id| String::from_utf8_lossy(id).into_owned());

    Ok(InspectSummary {
        size: buf.len(),
        root_position: root.position(),
        file_identifier,
        root: table_info(root, verbose)?,
    })
}

fn table_info(table: Table<'_>, verbose: u8) -> Result<TableInfo> {
    let vtable = table.vtable().context("Failed to read root vtable")?;
    let fields = vtable
        .slots()
        .enumerate()
        .filter(|&(_, offset)| offset != 0)
        .map(|(index, offset)| FieldInfo { index, offset })
        .collect();
    let raw = (verbose > 0).then(|| {
        vtable
            .as_bytes()
            .chunks_exact(2)
            .map(|entry| u16::from_le_bytes([entry[0], entry[1]]))
            .collect()
    });

    Ok(TableInfo {
        position: table.position(),
        vtable_position: vtable.position(),
        table_size: vtable.table_size(),
        slot_count: vtable.field_count(),
        fields,
        vtable: raw,
    })
}
