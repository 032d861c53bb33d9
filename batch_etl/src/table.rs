//! Keyed, partitioned, copy-on-write table with upsert semantics.
//!
//! Layout under the table path:
//! - `.table.json` - the table's write options, fixed at creation.
//! - `<partition>/data.jsonl` - current rows of a partition, one JSON object per line.
//! - `.commits.jsonl` - one `CommitSummary` per successful upsert.
//!
//! An upsert first collapses incoming rows that share a record key, keeping the row
//! with the greatest precombine value (later rows win ties). Each touched partition
//! is then read, merged and rewritten as a whole: an incoming row replaces the stored
//! one when its precombine value is greater or equal. Partition files are replaced by
//! rename, so readers see either the old or the new file.

use crate::rules::time::parse_timestamp;
use chrono::Utc;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use strum_macros::Display;
use trade_common::{PipelineError, Result};

/// Table properties file name.
pub const PROPERTIES_FILE: &str = ".table.json";
/// Commit log file name.
pub const COMMITS_FILE: &str = ".commits.jsonl";
/// Data file name inside each partition directory.
pub const DATA_FILE: &str = "data.jsonl";

/// A table row.
pub type Row = Map<String, Value>;

/// How a write treats existing rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WriteOperation {
    /// Insert new keys, replace existing ones.
    Upsert,
}

/// Physical write strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum StorageType {
    /// Partitions are rewritten in full on every write.
    CopyOnWrite,
}

/// Write options of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteOptions {
    /// Table name.
    pub table_name: String,
    /// Column identifying a row within its partition.
    pub record_key: String,
    /// Column whose value names the partition.
    pub partition_field: String,
    /// Column ordering versions of the same key.
    pub precombine_field: String,
    /// Write operation.
    pub operation: WriteOperation,
    /// Storage strategy.
    pub storage_type: StorageType,
}

impl WriteOptions {
    /// Trade table defaults: keyed by `transaction_id`, partitioned by `exchange`,
    /// versioned by `timestamp`.
    pub fn trades(table_name: &str) -> Self {
        Self {
            table_name: table_name.to_string(),
            record_key: "transaction_id".to_string(),
            partition_field: "exchange".to_string(),
            precombine_field: "timestamp".to_string(),
            operation: WriteOperation::Upsert,
            storage_type: StorageType::CopyOnWrite,
        }
    }
}

/// Outcome of one upsert.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommitSummary {
    /// Commit time, `yyyyMMddHHmmssSSS`.
    pub instant: String,
    /// New keys written.
    pub inserted: usize,
    /// Existing keys replaced.
    pub updated: usize,
    /// Incoming rows older than the stored version, or collapsed duplicates.
    pub skipped: usize,
    /// Rows without a usable key or partition value.
    pub rejected: usize,
    /// Partitions rewritten.
    pub partitions: BTreeSet<String>,
}

/// An opened table.
#[derive(Debug)]
pub struct UpsertTable {
    path: PathBuf,
    options: WriteOptions,
}

/// Render a key or partition column as text. Only strings and numbers qualify.
fn column_text(row: &Row, column: &str) -> Option<String> {
    match row.get(column)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Order two precombine values. Timestamps compare chronologically, numbers
/// numerically, anything else by its text; null sorts first.
pub fn compare_precombine(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => {
            if let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) {
                return x.partial_cmp(&y).unwrap_or(Ordering::Equal);
            }
            let ts = |v: &Value| v.as_str().and_then(parse_timestamp);
            if let (Some(x), Some(y)) = (ts(a), ts(b)) {
                return x.cmp(&y);
            }
            let text = |v: &Value| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string());
            text(a).cmp(&text(b))
        }
    }
}

/// Directory name of a partition value.
///
/// `%`, path separators, control characters and a leading `.` are percent-encoded,
/// so distinct values get distinct names and none of them leaves the table path.
fn partition_dir(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for (i, c) in value.chars().enumerate() {
        let escape = matches!(c, '%' | '/' | '\\') || c.is_control() || (i == 0 && c == '.');
        if escape {
            let mut bytes = [0u8; 4];
            for b in c.encode_utf8(&mut bytes).bytes() {
                out.push_str(&format!("%{:02X}", b));
            }
        } else {
            out.push(c);
        }
    }
    out
}

impl UpsertTable {
    /// Open the table at `path`, creating it with `options` if it does not exist.
    ///
    /// An existing table must have been created with the same key, partition and
    /// precombine columns.
    pub fn open(path: &Path, options: WriteOptions) -> Result<Self> {
        fs::create_dir_all(path)?;
        let properties = path.join(PROPERTIES_FILE);
        if properties.exists() {
            let existing: WriteOptions = serde_json::from_slice(&fs::read(&properties)?)?;
            if existing.record_key != options.record_key
                || existing.partition_field != options.partition_field
                || existing.precombine_field != options.precombine_field
            {
                return Err(PipelineError::Store(format!(
                    "table {} was created with key={} partition={} precombine={}",
                    path.display(),
                    existing.record_key,
                    existing.partition_field,
                    existing.precombine_field
                )));
            }
        } else {
            fs::write(&properties, serde_json::to_vec_pretty(&options)?)?;
            info!("Created table {} at {}", options.table_name, path.display());
        }
        Ok(Self {
            path: path.to_path_buf(),
            options,
        })
    }

    /// Table location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write options.
    pub fn options(&self) -> &WriteOptions {
        &self.options
    }

    fn partition_file(&self, partition: &str) -> PathBuf {
        self.path.join(partition_dir(partition)).join(DATA_FILE)
    }

    /// Current rows of one partition.
    pub fn read_partition(&self, partition: &str) -> Result<Vec<Row>> {
        let file = self.partition_file(partition);
        if !file.exists() {
            return Ok(Vec::new());
        }
        let mut rows = Vec::new();
        for line in BufReader::new(File::open(&file)?).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            rows.push(serde_json::from_str(&line)?);
        }
        Ok(rows)
    }

    /// Current rows of every partition, partitions in name order.
    pub fn read_all(&self) -> Result<Vec<Row>> {
        let mut dirs: Vec<PathBuf> = fs::read_dir(&self.path)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.join(DATA_FILE).is_file())
            .collect();
        dirs.sort();
        let mut rows = Vec::new();
        for dir in dirs {
            for line in BufReader::new(File::open(dir.join(DATA_FILE))?).lines() {
                let line = line?;
                if !line.trim().is_empty() {
                    rows.push(serde_json::from_str(&line)?);
                }
            }
        }
        Ok(rows)
    }

    /// Committed upserts, oldest first.
    pub fn commits(&self) -> Result<Vec<CommitSummary>> {
        let file = self.path.join(COMMITS_FILE);
        if !file.exists() {
            return Ok(Vec::new());
        }
        let mut commits = Vec::new();
        for line in BufReader::new(File::open(file)?).lines() {
            let line = line?;
            if !line.trim().is_empty() {
                commits.push(serde_json::from_str(&line)?);
            }
        }
        Ok(commits)
    }

    fn newer_or_equal(&self, incoming: &Row, stored: &Row) -> bool {
        let field = self.options.precombine_field.as_str();
        compare_precombine(incoming.get(field), stored.get(field)) != Ordering::Less
    }

    /// Upsert `rows` and record the commit.
    pub fn upsert(&self, rows: Vec<Row>) -> Result<CommitSummary> {
        let mut summary = CommitSummary {
            instant: Utc::now().format("%Y%m%d%H%M%S%3f").to_string(),
            ..CommitSummary::default()
        };

        // partition -> key -> row, first-seen key order kept per partition
        let mut incoming: BTreeMap<String, (Vec<String>, HashMap<String, Row>)> = BTreeMap::new();
        for row in rows {
            let key = column_text(&row, &self.options.record_key);
            let partition = column_text(&row, &self.options.partition_field);
            let (Some(key), Some(partition)) = (key, partition) else {
                warn!(
                    "Rejecting row without {} or {}",
                    self.options.record_key, self.options.partition_field
                );
                summary.rejected += 1;
                continue;
            };
            let (order, by_key) = incoming.entry(partition).or_default();
            let replace = match by_key.get(&key) {
                Some(existing) => {
                    summary.skipped += 1;
                    self.newer_or_equal(&row, existing)
                }
                None => {
                    order.push(key.clone());
                    true
                }
            };
            if replace {
                by_key.insert(key, row);
            }
        }

        let mut staged: Vec<(String, PathBuf, PathBuf)> = Vec::new();
        for (partition, (order, mut by_key)) in incoming {
            let mut stored = match self.read_partition(&partition) {
                Ok(stored) => stored,
                Err(e) => {
                    discard_staged(&staged);
                    return Err(e);
                }
            };
            let mut position: HashMap<String, usize> = HashMap::new();
            for (i, row) in stored.iter().enumerate() {
                if let Some(key) = column_text(row, &self.options.record_key) {
                    position.insert(key, i);
                }
            }

            for key in order {
                let Some(row) = by_key.remove(&key) else { continue };
                match position.get(&key).copied() {
                    Some(i) => {
                        if self.newer_or_equal(&row, &stored[i]) {
                            stored[i] = row;
                            summary.updated += 1;
                        } else {
                            summary.skipped += 1;
                        }
                    }
                    None => {
                        position.insert(key, stored.len());
                        stored.push(row);
                        summary.inserted += 1;
                    }
                }
            }

            match self.stage_partition(&partition, &stored) {
                Ok((tmp, file)) => {
                    debug!("Staged partition {} ({} rows)", partition, stored.len());
                    staged.push((partition, tmp, file));
                }
                Err(e) => {
                    discard_staged(&staged);
                    return Err(e);
                }
            }
        }

        // Nothing is visible until every partition is staged; the commit entry is
        // appended only once all of them are in place.
        for (i, (partition, tmp, file)) in staged.iter().enumerate() {
            if let Err(e) = fs::rename(tmp, file) {
                let applied: Vec<&str> = staged[..i].iter().map(|(p, _, _)| p.as_str()).collect();
                error!(
                    "Commit {} on {} failed at partition {}: {}; partitions already replaced: {:?}",
                    summary.instant, self.options.table_name, partition, e, applied
                );
                discard_staged(&staged[i..]);
                return Err(e.into());
            }
            summary.partitions.insert(partition.clone());
        }

        let mut log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path.join(COMMITS_FILE))?;
        let mut line = serde_json::to_vec(&summary)?;
        line.push(b'\n');
        log.write_all(&line)?;

        info!(
            "Commit {} on {}: {} inserted, {} updated, {} skipped, {} rejected",
            summary.instant,
            self.options.table_name,
            summary.inserted,
            summary.updated,
            summary.skipped,
            summary.rejected
        );
        Ok(summary)
    }

    /// Write the new content of a partition next to its data file. Returns the
    /// staged file and the file it replaces.
    fn stage_partition(&self, partition: &str, rows: &[Row]) -> Result<(PathBuf, PathBuf)> {
        let file = self.partition_file(partition);
        if let Some(dir) = file.parent() {
            fs::create_dir_all(dir)?;
        }
        let tmp = file.with_extension("jsonl.tmp");
        let mut out = File::create(&tmp)?;
        for row in rows {
            let mut line = serde_json::to_vec(row)?;
            line.push(b'\n');
            out.write_all(&line)?;
        }
        out.sync_all()?;
        Ok((tmp, file))
    }
}

fn discard_staged(staged: &[(String, PathBuf, PathBuf)]) {
    for (partition, tmp, _) in staged {
        if let Err(e) = fs::remove_file(tmp) {
            warn!("Could not remove staged file of partition {}: {}", partition, e);
        }
    }
}
