//! Change record to flat JSON transform.
//!
//! Each input record carries one base64 change record. When the change has a new item
//! image, the image is flattened to plain JSON, tagged with the event name and id, and
//! re-encoded as one newline-terminated JSON line. Changes without a new image (item
//! removals) are dropped; payloads that cannot be decoded fail individually without
//! affecting the rest of the batch.
use crate::model::envelope::{InputRecord, OutputRecord, RecordResult, TransformEvent, TransformResponse};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use log::{debug, info, warn};
use serde_json::Value;
use trade_common::attribute::item_to_json;
use trade_common::defaults::UNKNOWN;
use trade_common::{PipelineError, Result};

/// Transform every record of `event`, preserving order and record ids.
pub fn handle(event: &TransformEvent) -> TransformResponse {
    let records: Vec<OutputRecord> = event.records.iter().map(transform_record).collect();
    let response = TransformResponse { records };
    info!(
        "Transformed {} records: {} ok, {} dropped, {} failed",
        response.records.len(),
        response.count(RecordResult::Ok),
        response.count(RecordResult::Dropped),
        response.count(RecordResult::ProcessingFailed)
    );
    response
}

/// Transform a single record.
pub fn transform_record(record: &InputRecord) -> OutputRecord {
    let (result, data) = match flatten_change(&record.data) {
        Ok(Some(line)) => (RecordResult::Ok, BASE64.encode(line.as_bytes())),
        Ok(None) => {
            debug!("Record {} has no new image, dropping", record.record_id);
            (RecordResult::Dropped, record.data.clone())
        }
        Err(e) => {
            warn!("Record {} failed: {}", record.record_id, e);
            (RecordResult::ProcessingFailed, record.data.clone())
        }
    };
    OutputRecord {
        record_id: record.record_id.clone(),
        result,
        data,
    }
}

/// Decode a base64 change record and flatten its new image into one JSON line.
///
/// Returns `Ok(None)` when the change carries no new image.
pub fn flatten_change(data: &str) -> Result<Option<String>> {
    let payload = String::from_utf8(BASE64.decode(data.trim())?)?;
    let change: Value = serde_json::from_str(&payload)?;

    let Some(image) = change.get("dynamodb").and_then(|d| d.get("NewImage")) else {
        return Ok(None);
    };
    let image = image
        .as_object()
        .ok_or_else(|| PipelineError::Format("NewImage is not an object".to_string()))?;

    let mut flat = item_to_json(image)?;
    flat.insert("event_name".to_string(), field_or_unknown(&change, "eventName"));
    flat.insert("event_id".to_string(), field_or_unknown(&change, "eventID"));

    let mut line = serde_json::to_string(&flat)?;
    line.push('\n');
    Ok(Some(line))
}

fn field_or_unknown(change: &Value, field: &str) -> Value {
    change
        .get(field)
        .cloned()
        .unwrap_or_else(|| Value::String(UNKNOWN.to_string()))
}
