//! Catalogued source table reader.
use crate::transform::RawRow;
use log::{debug, info, warn};
use serde_json::{Deserializer, Value};
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use trade_common::Result;
use trade_common::catalog::Catalog;

fn is_data_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("json") | Some("jsonl")
    )
}

/// All data files below `dir`, sorted by path.
fn data_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        for entry in fs::read_dir(&current)? {
            let path = entry?.path();
            if path.is_dir() {
                pending.push(path);
            } else if is_data_file(&path) {
                files.push(path);
            }
        }
    }
    files.sort();
    Ok(files)
}

/// Read every JSON object stored under `dir`.
///
/// Lines may hold one object or several concatenated ones. Lines that are not JSON
/// objects are logged and skipped.
pub fn read_json_rows(dir: &Path) -> Result<Vec<RawRow>> {
    if !dir.exists() {
        warn!("Source location {} does not exist, nothing to read", dir.display());
        return Ok(Vec::new());
    }
    let mut rows = Vec::new();
    for file in data_files(dir)? {
        let mut skipped = 0usize;
        let mut reader = BufReader::new(File::open(&file)?);
        let mut buf = Vec::new();
        let mut line_no = 0usize;
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            line_no += 1;
            let line = match std::str::from_utf8(&buf) {
                Ok(line) => line,
                Err(e) => {
                    warn!("{}:{}: {}", file.display(), line_no, e);
                    skipped += 1;
                    continue;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            for value in Deserializer::from_str(line).into_iter::<Value>() {
                match value {
                    Ok(Value::Object(row)) => rows.push(row),
                    Ok(other) => {
                        warn!("{}:{}: not an object: {}", file.display(), line_no, other);
                        skipped += 1;
                    }
                    Err(e) => {
                        warn!("{}:{}: {}", file.display(), line_no, e);
                        skipped += 1;
                        break;
                    }
                }
            }
        }
        debug!("Read {} ({} skipped)", file.display(), skipped);
    }
    Ok(rows)
}

/// Read the rows of a catalogued table.
pub fn read_from_catalog(catalog: &Catalog, database: &str, table: &str) -> Result<Vec<RawRow>> {
    let entry = catalog.table(database, table)?;
    let rows = read_json_rows(&entry.location)?;
    info!(
        "Read {} rows from {}.{} ({})",
        rows.len(),
        database,
        table,
        entry.location.display()
    );
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use trade_common::catalog::TableEntry;

    #[test]
    fn test_reads_nested_files_and_skips_garbage() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("2025").join("03");
        fs::create_dir_all(&nested).unwrap();
        fs::write(tmp.path().join("a.jsonl"), "{\"id\":1}\n\n{\"id\":2}{\"id\":3}\n").unwrap();
        fs::write(nested.join("b.json"), "[1,2]\n{broken\n{\"id\":4}\n").unwrap();
        fs::write(tmp.path().join("ignored.txt"), "{\"id\":99}\n").unwrap();

        let rows = read_json_rows(tmp.path()).unwrap();
        let mut ids: Vec<i64> = rows.iter().map(|r| r["id"].as_i64().unwrap()).collect();
        ids.sort();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_skips_lines_that_are_not_utf8() {
        let tmp = TempDir::new().unwrap();
        let mut body = b"{\"id\":1}\n".to_vec();
        body.extend_from_slice(&[0xff, 0xfe, b'\n']);
        body.extend_from_slice(b"{\"id\":2}\n");
        fs::write(tmp.path().join("mixed.jsonl"), body).unwrap();

        let rows = read_json_rows(tmp.path()).unwrap();
        let ids: Vec<i64> = rows.iter().map(|r| r["id"].as_i64().unwrap()).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_missing_location_is_empty() {
        let tmp = TempDir::new().unwrap();
        assert!(read_json_rows(&tmp.path().join("nope")).unwrap().is_empty());
    }

    #[test]
    fn test_read_from_catalog_requires_table() {
        let tmp = TempDir::new().unwrap();
        let mut catalog = Catalog::default();
        assert!(read_from_catalog(&catalog, "crypto", "crypto_raw").is_err());

        catalog.create_database_if_not_exists("crypto");
        catalog
            .register_table("crypto", "crypto_raw", TableEntry::json_lines(tmp.path()))
            .unwrap();
        fs::write(tmp.path().join("x.jsonl"), "{\"id\":1}\n").unwrap();
        assert_eq!(read_from_catalog(&catalog, "crypto", "crypto_raw").unwrap().len(), 1);
    }
}
