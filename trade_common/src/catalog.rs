//! File-backed table catalog.
//!
//! The catalog maps `database.table` to where the table's files live, how they are
//! laid out, and which partitions have been registered. Both the stream transformer
//! (raw table location) and the batch job (source lookup, target sync) go through it.
//!
//! The whole catalog is a single JSON document. `save` writes a sibling temp file and
//! renames it over the original so a crashed writer never leaves a truncated catalog.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::result::Result;

/// Physical layout of a catalogued table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableFormat {
    /// Newline-delimited JSON objects, append-only.
    JsonLines,
    /// Keyed, partitioned, copy-on-write upsert table.
    Upsert,
}

/// One catalogued table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableEntry {
    /// Directory holding the table's files.
    pub location: PathBuf,
    /// File layout.
    pub format: TableFormat,
    /// Columns the table is partitioned by (may be empty).
    #[serde(default)]
    pub partition_fields: Vec<String>,
    /// Column that uniquely identifies a row, for keyed tables.
    #[serde(default)]
    pub record_key: Option<String>,
    /// Partition values registered so far.
    #[serde(default)]
    pub partitions: BTreeSet<String>,
}

impl TableEntry {
    /// Plain append-only JSON-lines table without partitions.
    pub fn json_lines(location: impl Into<PathBuf>) -> Self {
        Self {
            location: location.into(),
            format: TableFormat::JsonLines,
            partition_fields: Vec::new(),
            record_key: None,
            partitions: BTreeSet::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Database {
    #[serde(default)]
    tables: BTreeMap<String, TableEntry>,
}

/// All databases and their tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    databases: BTreeMap<String, Database>,
}

impl Catalog {
    /// Load the catalog at `path`; a missing file is an empty catalog.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No catalog at {}, starting empty", path.display());
            return Ok(Self::default());
        }
        let raw = fs::read(path)?;
        serde_json::from_slice(&raw).map_err(|e| {
            PipelineError::Catalog(format!("malformed catalog {}: {}", path.display(), e))
        })
    }

    /// Persist the catalog to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(self)?)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Create `name` unless it exists. Returns `true` when it was created.
    pub fn create_database_if_not_exists(&mut self, name: &str) -> bool {
        if self.has_database(name) {
            return false;
        }
        info!("Creating database {}", name);
        self.databases.insert(name.to_string(), Database::default());
        true
    }

    /// Whether `database` exists.
    pub fn has_database(&self, database: &str) -> bool {
        self.databases.contains_key(database)
    }

    /// Look up a table.
    pub fn table(&self, database: &str, table: &str) -> Result<&TableEntry> {
        let db = self
            .databases
            .get(database)
            .ok_or_else(|| PipelineError::Catalog(format!("unknown database: {}", database)))?;
        db.tables
            .get(table)
            .ok_or_else(|| PipelineError::Catalog(format!("unknown table: {}.{}", database, table)))
    }

    /// Register or update a table definition, keeping partitions already recorded.
    ///
    /// The database must exist.
    pub fn register_table(&mut self, database: &str, table: &str, mut entry: TableEntry) -> Result<()> {
        let db = self
            .databases
            .get_mut(database)
            .ok_or_else(|| PipelineError::Catalog(format!("unknown database: {}", database)))?;
        if let Some(existing) = db.tables.get(table) {
            entry.partitions.extend(existing.partitions.iter().cloned());
        }
        db.tables.insert(table.to_string(), entry);
        Ok(())
    }

    /// Record partition values for a table. Returns how many were new.
    pub fn sync_partitions<I, S>(&mut self, database: &str, table: &str, partitions: I) -> Result<usize>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entry = self
            .databases
            .get_mut(database)
            .and_then(|db| db.tables.get_mut(table))
            .ok_or_else(|| PipelineError::Catalog(format!("unknown table: {}.{}", database, table)))?;
        let mut added = 0;
        for partition in partitions {
            if entry.partitions.insert(partition.into()) {
                added += 1;
            }
        }
        Ok(added)
    }
}
