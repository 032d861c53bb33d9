//! Local plumbing around the transform: building envelopes from a change stream file
//! and delivering transformed records into the raw table.
use crate::model::envelope::{InputRecord, RecordResult, TransformEvent, TransformResponse};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use chrono::Utc;
use log::{debug, info};
use serde_json::Value;
use std::fs;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use trade_common::Result;
use trade_common::catalog::{Catalog, TableEntry};
use uuid::Uuid;

/// Wrap each non-empty line of a change stream into an input record.
///
/// The record id is the change's sequence number when present, otherwise the line
/// number. Lines are passed through verbatim, so malformed ones surface as failed
/// records rather than aborting the batch.
pub fn envelope_from_stream<R: BufRead>(mut reader: R) -> Result<TransformEvent> {
    let mut records = Vec::new();
    let mut buf = Vec::new();
    let mut index = 0usize;
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        index += 1;
        let line = buf.trim_ascii();
        if line.is_empty() {
            continue;
        }
        let record_id = serde_json::from_slice::<Value>(line)
            .ok()
            .and_then(|v| {
                v.pointer("/dynamodb/SequenceNumber")
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .unwrap_or_else(|| format!("line-{}", index));
        records.push(InputRecord {
            record_id,
            data: BASE64.encode(line),
            approximate_arrival_timestamp: Some(Utc::now().timestamp_millis()),
        });
    }
    debug!("Built envelope with {} records", records.len());
    Ok(TransformEvent {
        invocation_id: Some(Uuid::new_v4().to_string()),
        records,
    })
}

/// Write the payloads of all `Ok` records as one new JSON-lines object under `dir`.
///
/// Returns the path written, or `None` when there was nothing to deliver.
pub fn deliver(response: &TransformResponse, dir: &Path) -> Result<Option<PathBuf>> {
    let mut body = Vec::new();
    for record in response.records.iter().filter(|r| r.result == RecordResult::Ok) {
        body.extend(BASE64.decode(&record.data)?);
    }
    if body.is_empty() {
        info!("Nothing to deliver");
        return Ok(None);
    }

    fs::create_dir_all(dir)?;
    let name = format!(
        "batch-{}-{}.jsonl",
        Utc::now().format("%Y%m%d%H%M%S"),
        Uuid::new_v4().simple()
    );
    let path = dir.join(name);
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, &body)?;
    fs::rename(&tmp, &path)?;
    info!(
        "Delivered {} records to {}",
        response.count(RecordResult::Ok),
        path.display()
    );
    Ok(Some(path))
}

/// Location of the raw table, registering it at `default_location` when it is not
/// catalogued yet.
pub fn resolve_raw_location(
    catalog_path: &Path,
    database: &str,
    table: &str,
    default_location: &Path,
) -> Result<PathBuf> {
    let mut catalog = Catalog::load(catalog_path)?;
    if let Ok(entry) = catalog.table(database, table) {
        return Ok(entry.location.clone());
    }
    catalog.create_database_if_not_exists(database);
    catalog.register_table(database, table, TableEntry::json_lines(default_location))?;
    catalog.save(catalog_path)?;
    info!(
        "Registered {}.{} at {}",
        database,
        table,
        default_location.display()
    );
    Ok(default_location.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::handle;
    use serde_json::json;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn stream() -> String {
        let insert = json!({
            "eventID": "e1",
            "eventName": "INSERT",
            "dynamodb": {
                "NewImage": {"transaction_id": {"S": "t1"}, "price": {"N": "10.5"}},
                "SequenceNumber": "000000000000000000001"
            }
        });
        let remove = json!({
            "eventID": "e2",
            "eventName": "REMOVE",
            "dynamodb": {"OldImage": {"transaction_id": {"S": "t1"}}, "SequenceNumber": "000000000000000000002"}
        });
        format!("{}\n\n{}\nnot json\n", insert, remove)
    }

    #[test]
    fn test_envelope_uses_sequence_numbers() {
        let event = envelope_from_stream(Cursor::new(stream())).unwrap();
        let ids: Vec<&str> = event.records.iter().map(|r| r.record_id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["000000000000000000001", "000000000000000000002", "line-4"]
        );
    }

    #[test]
    fn test_envelope_keeps_lines_that_are_not_utf8() {
        let mut body = stream().lines().next().unwrap().as_bytes().to_vec();
        body.push(b'\n');
        body.extend_from_slice(&[0xff, 0xfe, b'\n']);

        let event = envelope_from_stream(Cursor::new(body)).unwrap();
        assert_eq!(event.records.len(), 2);
        assert_eq!(event.records[1].record_id, "line-2");

        let response = handle(&event);
        assert_eq!(response.records[0].result, RecordResult::Ok);
        assert_eq!(response.records[1].result, RecordResult::ProcessingFailed);
        assert_eq!(response.records[1].data, event.records[1].data);
    }

    #[test]
    fn test_deliver_writes_only_ok_payloads() {
        let tmp = TempDir::new().unwrap();
        let response = handle(&envelope_from_stream(Cursor::new(stream())).unwrap());

        let path = deliver(&response, tmp.path()).unwrap().unwrap();
        let body = fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 1);
        let row: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(row["transaction_id"], json!("t1"));
        assert_eq!(row["event_name"], json!("INSERT"));
    }

    #[test]
    fn test_deliver_skips_empty_batches() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("raw");
        assert!(deliver(&TransformResponse::default(), &out).unwrap().is_none());
        assert!(!out.exists());
    }

    #[test]
    fn test_resolve_registers_then_reuses_location() {
        let tmp = TempDir::new().unwrap();
        let catalog_path = tmp.path().join("catalog.json");
        let first = resolve_raw_location(&catalog_path, "crypto", "crypto_raw", &tmp.path().join("raw")).unwrap();
        assert_eq!(first, tmp.path().join("raw"));

        let second = resolve_raw_location(&catalog_path, "crypto", "crypto_raw", Path::new("elsewhere")).unwrap();
        assert_eq!(second, first);
    }
}
