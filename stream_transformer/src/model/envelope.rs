//! Transform envelope exchanged with the delivery stream.
//!
//! The stream hands over a batch of base64 records keyed by `recordId`; the transform
//! must answer with exactly one record per input, same `recordId`, a `result` status
//! and the (possibly rewritten) base64 `data`.
use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// Batch handed to the transform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformEvent {
    /// Id of this invocation, when the stream provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invocation_id: Option<String>,
    /// Records to transform.
    pub records: Vec<InputRecord>,
}

/// One input record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputRecord {
    /// Identifier to echo back.
    pub record_id: String,
    /// Base64 payload.
    pub data: String,
    /// Arrival time in epoch milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approximate_arrival_timestamp: Option<i64>,
}

/// Outcome of transforming one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum RecordResult {
    /// Transformed; deliver `data`.
    Ok,
    /// Intentionally not delivered.
    Dropped,
    /// Could not be transformed.
    ProcessingFailed,
}

/// One output record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputRecord {
    /// Same id as the input record.
    pub record_id: String,
    /// Transform outcome.
    pub result: RecordResult,
    /// Base64 payload to deliver (the original payload unless `result` is `Ok`).
    pub data: String,
}

/// Answer to a `TransformEvent`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformResponse {
    /// One entry per input record, in input order.
    pub records: Vec<OutputRecord>,
}

impl TransformResponse {
    /// Number of records with the given outcome.
    pub fn count(&self, result: RecordResult) -> usize {
        self.records.iter().filter(|r| r.result == result).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_names() {
        let event: TransformEvent = serde_json::from_value(json!({
            "invocationId": "inv-1",
            "records": [{"recordId": "r1", "data": "e30=", "approximateArrivalTimestamp": 1}]
        }))
        .unwrap();
        assert_eq!(event.records[0].record_id, "r1");

        let response = TransformResponse {
            records: vec![OutputRecord {
                record_id: "r1".into(),
                result: RecordResult::ProcessingFailed,
                data: "e30=".into(),
            }],
        };
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"records": [{"recordId": "r1", "result": "ProcessingFailed", "data": "e30="}]})
        );
    }
}
