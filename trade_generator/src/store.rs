//! Local stand-in for the key-value table the generator writes to.
//!
//! A table is a directory with two append-only files:
//! - `items.jsonl` - every item ever put, one per line; on open the last put per key wins.
//! - `stream.jsonl` - one `ChangeRecord` per put, in write order.
//!
//! Callers only see the `ItemStore` trait, so the generator loop does not care where
//! items end up.

use chrono::Utc;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use trade_common::attribute::{AttributeValue, Item};
use trade_common::change::{
    ChangeRecord, EVENT_SOURCE, EVENT_VERSION, EventName, STREAM_VIEW_TYPE, StreamPayload,
    sequence_number,
};
use trade_common::{PipelineError, Result};
use uuid::Uuid;

/// Item log file name inside a table directory.
pub const ITEMS_FILE: &str = "items.jsonl";
/// Change stream file name inside a table directory.
pub const STREAM_FILE: &str = "stream.jsonl";

/// Whether a put created or replaced an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    /// No item with that key existed.
    Inserted,
    /// An existing item was overwritten.
    Replaced,
}

/// Minimal key-value table contract.
pub trait ItemStore {
    /// Store `item`, replacing any item with the same key.
    fn put_item(&mut self, item: Item) -> Result<PutOutcome>;
    /// Current item for `key`.
    fn get_item(&self, key: &str) -> Option<&Item>;
    /// Number of distinct keys.
    fn len(&self) -> usize;
    /// Whether the table holds no items.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// File-backed table with a change stream.
pub struct LocalTable {
    dir: PathBuf,
    key_attribute: String,
    region: String,
    items: HashMap<String, Item>,
    position: u64,
    items_log: File,
    stream_log: File,
}

impl LocalTable {
    /// Open (or create) the table stored in `dir`.
    pub fn open(dir: &Path, key_attribute: &str, region: &str) -> Result<Self> {
        fs::create_dir_all(dir)?;
        let items_path = dir.join(ITEMS_FILE);
        let stream_path = dir.join(STREAM_FILE);

        let mut items = HashMap::new();
        if items_path.exists() {
            for (line_no, line) in BufReader::new(File::open(&items_path)?).lines().enumerate() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<Item>(&line) {
                    Ok(item) => match key_of(&item, key_attribute) {
                        Ok(key) => {
                            items.insert(key, item);
                        }
                        Err(e) => warn!("{}:{}: {}", items_path.display(), line_no + 1, e),
                    },
                    Err(e) => warn!("{}:{}: skipping bad item: {}", items_path.display(), line_no + 1, e),
                }
            }
        }

        let position = if stream_path.exists() {
            BufReader::new(File::open(&stream_path)?)
                .lines()
                .filter(|line| line.as_ref().map(|l| !l.trim().is_empty()).unwrap_or(false))
                .count() as u64
        } else {
            0
        };

        let items_log = OpenOptions::new().create(true).append(true).open(&items_path)?;
        let stream_log = OpenOptions::new().create(true).append(true).open(&stream_path)?;

        info!(
            "Opened table {} ({} items, stream position {})",
            dir.display(),
            items.len(),
            position
        );
        Ok(Self {
            dir: dir.to_path_buf(),
            key_attribute: key_attribute.to_string(),
            region: region.to_string(),
            items,
            position,
            items_log,
            stream_log,
        })
    }

    /// Directory the table lives in.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn change_record(&mut self, key: &str, new_image: Item, old_image: Option<Item>) -> Result<ChangeRecord> {
        self.position += 1;
        let event_name = if old_image.is_some() {
            EventName::MODIFY
        } else {
            EventName::INSERT
        };
        let mut keys = Item::new();
        keys.insert(self.key_attribute.clone(), AttributeValue::S(key.to_string()));
        let size_bytes = serde_json::to_vec(&new_image)?.len() as u64;
        Ok(ChangeRecord {
            event_id: Uuid::new_v4().simple().to_string(),
            event_name,
            event_version: EVENT_VERSION.to_string(),
            event_source: EVENT_SOURCE.to_string(),
            aws_region: self.region.clone(),
            dynamodb: StreamPayload {
                approximate_creation_date_time: Utc::now().timestamp(),
                keys,
                new_image: Some(new_image),
                old_image,
                sequence_number: sequence_number(self.position),
                size_bytes,
                stream_view_type: STREAM_VIEW_TYPE.to_string(),
            },
        })
    }
}

fn key_of(item: &Item, key_attribute: &str) -> Result<String> {
    match item.get(key_attribute) {
        Some(AttributeValue::S(key)) if !key.is_empty() => Ok(key.clone()),
        Some(other) => Err(PipelineError::Store(format!(
            "key attribute {} must be a non-empty S value, got {:?}",
            key_attribute, other
        ))),
        None => Err(PipelineError::Store(format!(
            "item is missing key attribute {}",
            key_attribute
        ))),
    }
}

impl ItemStore for LocalTable {
    fn put_item(&mut self, item: Item) -> Result<PutOutcome> {
        let key = key_of(&item, &self.key_attribute)?;

        let mut line = serde_json::to_vec(&item)?;
        line.push(b'\n');
        self.items_log.write_all(&line)?;

        let old_image = self.items.insert(key.clone(), item.clone());
        let outcome = if old_image.is_some() {
            PutOutcome::Replaced
        } else {
            PutOutcome::Inserted
        };

        let record = self.change_record(&key, item, old_image)?;
        let mut line = serde_json::to_vec(&record)?;
        line.push(b'\n');
        self.stream_log.write_all(&line)?;
        debug!("{} {} at {}", record.event_name, key, record.dynamodb.sequence_number);
        Ok(outcome)
    }

    fn get_item(&self, key: &str) -> Option<&Item> {
        self.items.get(key)
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn item(id: &str, price: &str) -> Item {
        let mut item = Item::new();
        item.insert("transaction_id".into(), AttributeValue::S(id.into()));
        item.insert("price".into(), AttributeValue::N(price.into()));
        item
    }

    fn stream_lines(dir: &Path) -> Vec<ChangeRecord> {
        fs::read_to_string(dir.join(STREAM_FILE))
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_put_then_replace_emits_insert_and_modify() {
        let tmp = TempDir::new().unwrap();
        let mut table = LocalTable::open(tmp.path(), "transaction_id", "ap-south-1").unwrap();

        assert_eq!(table.put_item(item("a", "1.00")).unwrap(), PutOutcome::Inserted);
        assert_eq!(table.put_item(item("a", "2.00")).unwrap(), PutOutcome::Replaced);
        assert_eq!(table.len(), 1);
        assert_eq!(table.get_item("a").unwrap()["price"], AttributeValue::N("2.00".into()));

        let records = stream_lines(tmp.path());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].event_name, EventName::INSERT);
        assert!(records[0].dynamodb.old_image.is_none());
        assert_eq!(records[1].event_name, EventName::MODIFY);
        assert_eq!(
            records[1].dynamodb.old_image.as_ref().unwrap()["price"],
            AttributeValue::N("1.00".into())
        );
        assert_eq!(records[1].dynamodb.sequence_number, sequence_number(2));
    }

    #[test]
    fn test_reopen_replays_items_and_continues_sequence() {
        let tmp = TempDir::new().unwrap();
        {
            let mut table = LocalTable::open(tmp.path(), "transaction_id", "r").unwrap();
            table.put_item(item("a", "1")).unwrap();
            table.put_item(item("b", "2")).unwrap();
            table.put_item(item("a", "3")).unwrap();
        }
        let mut table = LocalTable::open(tmp.path(), "transaction_id", "r").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get_item("a").unwrap()["price"], AttributeValue::N("3".into()));

        table.put_item(item("c", "4")).unwrap();
        let records = stream_lines(tmp.path());
        assert_eq!(records.last().unwrap().dynamodb.sequence_number, sequence_number(4));
    }

    #[test]
    fn test_item_without_string_key_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let mut table = LocalTable::open(tmp.path(), "transaction_id", "r").unwrap();

        let mut missing = Item::new();
        missing.insert("price".into(), AttributeValue::N("1".into()));
        assert!(matches!(table.put_item(missing), Err(PipelineError::Store(_))));

        let mut numeric = Item::new();
        numeric.insert("transaction_id".into(), AttributeValue::N("1".into()));
        assert!(table.put_item(numeric).is_err());
        assert!(table.is_empty());
    }
}
