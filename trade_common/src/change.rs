//! Change records emitted by the key-value table for every write.
//!
//! Field names follow the stream's wire format (`eventID`, `dynamodb.NewImage`, ...),
//! so records written by the generator are what the stream transformer receives.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::attribute::Item;

/// Event source stamped on every change record.
pub const EVENT_SOURCE: &str = "aws:dynamodb";
/// Format version of the change record.
pub const EVENT_VERSION: &str = "1.1";
/// Both images are captured.
pub const STREAM_VIEW_TYPE: &str = "NEW_AND_OLD_IMAGES";

/// Kind of write that produced a change record.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
pub enum EventName {
    INSERT,
    MODIFY,
    REMOVE,
}

/// One change record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Unique id of the event.
    #[serde(rename = "eventID")]
    pub event_id: String,
    /// What happened to the item.
    #[serde(rename = "eventName")]
    pub event_name: EventName,
    /// Record format version.
    #[serde(rename = "eventVersion")]
    pub event_version: String,
    /// Producer of the event.
    #[serde(rename = "eventSource")]
    pub event_source: String,
    /// Region of the table.
    #[serde(rename = "awsRegion")]
    pub aws_region: String,
    /// Keys and images.
    pub dynamodb: StreamPayload,
}

/// Keys, images and ordering data of a change record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StreamPayload {
    /// Seconds since the epoch when the change was captured.
    pub approximate_creation_date_time: i64,
    /// Key attributes of the item.
    pub keys: Item,
    /// Item after the write; absent on removals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_image: Option<Item>,
    /// Item before the write; absent on inserts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_image: Option<Item>,
    /// Monotonic position in the stream, zero padded.
    pub sequence_number: String,
    /// Approximate size of the images in bytes.
    pub size_bytes: u64,
    /// Which images the stream captures.
    pub stream_view_type: String,
}

/// Render a stream position the way the stream does (21 digits, zero padded).
pub fn sequence_number(position: u64) -> String {
    format!("{:021}", position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::AttributeValue;
    use serde_json::json;

    #[test]
    fn test_wire_field_names() {
        let mut keys = Item::new();
        keys.insert("transaction_id".into(), AttributeValue::S("t1".into()));
        let record = ChangeRecord {
            event_id: "e1".into(),
            event_name: EventName::INSERT,
            event_version: EVENT_VERSION.into(),
            event_source: EVENT_SOURCE.into(),
            aws_region: "ap-south-1".into(),
            dynamodb: StreamPayload {
                approximate_creation_date_time: 1_700_000_000,
                keys: keys.clone(),
                new_image: Some(keys),
                old_image: None,
                sequence_number: sequence_number(7),
                size_bytes: 42,
                stream_view_type: STREAM_VIEW_TYPE.into(),
            },
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["eventID"], json!("e1"));
        assert_eq!(value["eventName"], json!("INSERT"));
        assert_eq!(value["dynamodb"]["NewImage"]["transaction_id"], json!({"S": "t1"}));
        assert_eq!(value["dynamodb"]["SequenceNumber"], json!("000000000000000000007"));
        assert!(value["dynamodb"].get("OldImage").is_none());
    }
}
