//! Sample command implementation

use std::path::Path;

use anyhow::{Context, Result};
use tablebuf::Builder;
use tablebuf_testkit::namespace_a::build_table_in_c;

pub fn run(foo: i32, identifier: Option<String>, path: String) -> Result<()> {
    let path = Path::new(&path);
    let size = write_sample(path, foo, identifier.as_deref())?;
    println!("Wrote {size} bytes to {}", path.display());
    Ok(())
}

/// Builds the `TableInC` fixture and writes it to `path`, returning the
/// buffer size.
pub fn write_sample(path: &Path, foo: i32, identifier: Option<&str>) -> Result<usize> {
    let mut builder = Builder::new();
    build_table_in_c(&mut builder, foo, identifier).context("Failed to build sample buffer")?;
    let data = builder.finished_data()?;
    std::fs::write(path, data).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(data.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{inspect::summarize, read_buffer};
    use tablebuf_testkit::namespace_a::TableInC;

    #[test]
    fn test_sample_then_inspect() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table_in_c.bin");
        let size = write_sample(&path, 9, Some("NSTC")).unwrap();

        let buf = read_buffer(&path).unwrap();
        assert_eq!(buf.len(), size);
        let summary = summarize(&buf, 1).unwrap();
        assert_eq!(summary.size, size);
        assert_eq!(summary.file_identifier.as_deref(), Some("NSTC"));
        assert_eq!(summary.root.slot_count, 2);
        assert_eq!(summary.root.fields.len(), 1);
        assert_eq!(summary.root.fields[0].index, TableInC::VT_REFER_TO_A2 as usize);
        assert_eq!(summary.root.vtable.as_ref().map(Vec::len), Some(4));

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["root"]["table_size"], 8);
    }

    #[test]
    fn test_inspect_rejects_truncated_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.bin");
        std::fs::write(&path, [1u8, 0]).unwrap();
        let buf = read_buffer(&path).unwrap();
        assert!(summarize(&buf, 0).is_err());
        assert!(read_buffer(&dir.path().join("missing.bin")).is_err());
    }

    #[test]
    fn test_bad_identifier() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.bin");
        assert!(write_sample(&path, 1, Some("TOO LONG")).is_err());
    }
}
