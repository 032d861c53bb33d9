//! End-to-end batch run: read, enrich, upsert, sync the catalog.
use crate::args::Args;
use crate::source::read_from_catalog;
use crate::table::{CommitSummary, Row, UpsertTable, WriteOptions};
use crate::transform::transform_batch;
use chrono::Utc;
use log::info;
use serde_json::Value;
use trade_common::catalog::{Catalog, TableEntry, TableFormat};
use trade_common::{PipelineError, Result};

/// What one run did.
#[derive(Debug, Clone)]
pub struct JobReport {
    /// Rows read from the source.
    pub read: usize,
    /// Rows removed by the filter.
    pub filtered: usize,
    /// The table commit.
    pub commit: CommitSummary,
}

/// Run the job described by `args`.
pub fn run(args: &Args) -> Result<JobReport> {
    let ingestion_time = Utc::now();
    let mut catalog = Catalog::load(&args.catalog)?;

    let raw = read_from_catalog(&catalog, &args.source_database, &args.source_table)?;
    let read = raw.len();
    let outcome = transform_batch(raw, ingestion_time);
    info!("{} rows kept, {} filtered out", outcome.rows.len(), outcome.filtered);

    let rows = outcome
        .rows
        .iter()
        .map(|trade| match serde_json::to_value(trade)? {
            Value::Object(row) => Ok(row),
            _ => Err(PipelineError::Format("processed trade is not an object".to_string())),
        })
        .collect::<Result<Vec<Row>>>()?;

    catalog.create_database_if_not_exists(&args.target_database);
    let options = WriteOptions::trades(&args.target_table);
    let table = UpsertTable::open(&args.target_path, options)?;
    let commit = table.upsert(rows)?;

    sync_catalog(&mut catalog, args, &table, &commit)?;
    catalog.save(&args.catalog)?;

    Ok(JobReport {
        read,
        filtered: outcome.filtered,
        commit,
    })
}

/// Register the target table and the partitions a commit touched.
fn sync_catalog(
    catalog: &mut Catalog,
    args: &Args,
    table: &UpsertTable,
    commit: &CommitSummary,
) -> Result<()> {
    let options = table.options();
    let entry = TableEntry {
        location: table.path().to_path_buf(),
        format: TableFormat::Upsert,
        partition_fields: vec![options.partition_field.clone()],
        record_key: Some(options.record_key.clone()),
        partitions: Default::default(),
    };
    catalog.register_table(&args.target_database, &args.target_table, entry)?;
    let added = catalog.sync_partitions(
        &args.target_database,
        &args.target_table,
        commit.partitions.iter().cloned(),
    )?;
    info!(
        "Synced {}.{} to catalog ({} new partitions)",
        args.target_database, args.target_table, added
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn args(tmp: &TempDir) -> Args {
        Args {
            catalog: tmp.path().join("catalog.json"),
            source_database: "crypto".into(),
            source_table: "crypto_raw".into(),
            target_database: "analytics".into(),
            target_table: "processed_crypto_txn".into(),
            target_path: tmp.path().join("processed"),
        }
    }

    fn seed_source(tmp: &TempDir, rows: &[serde_json::Value]) {
        let raw = tmp.path().join("raw");
        fs::create_dir_all(&raw).unwrap();
        let body: String = rows.iter().map(|r| format!("{}\n", r)).collect();
        fs::write(raw.join("batch-1.jsonl"), body).unwrap();

        let mut catalog = Catalog::default();
        catalog.create_database_if_not_exists("crypto");
        catalog
            .register_table("crypto", "crypto_raw", TableEntry::json_lines(&raw))
            .unwrap();
        catalog.save(&tmp.path().join("catalog.json")).unwrap();
    }

    fn trade(id: &str, exchange: &str, status: &str, ts: &str) -> serde_json::Value {
        json!({
            "transaction_id": id,
            "timestamp": ts,
            "exchange": exchange,
            "price": 1000.0,
            "quantity": 1.5,
            "trade_fee": 0.25,
            "trade_status": status,
            "event_name": "INSERT",
            "event_id": "e"
        })
    }

    #[test]
    fn test_run_upserts_and_syncs_catalog() {
        let tmp = TempDir::new().unwrap();
        seed_source(
            &tmp,
            &[
                trade("a", "Binance", "SUCCESS", "2025-03-01T10:15:00"),
                trade("b", "Kraken", "PENDING", "2025-03-01T10:20:00"),
                trade("c", "Kraken", "FAILED", "2025-03-01T10:25:00"),
            ],
        );
        let args = args(&tmp);

        let report = run(&args).unwrap();
        assert_eq!(report.read, 3);
        assert_eq!(report.filtered, 1);
        assert_eq!(report.commit.inserted, 2);

        let catalog = Catalog::load(&args.catalog).unwrap();
        let entry = catalog.table("analytics", "processed_crypto_txn").unwrap();
        assert_eq!(entry.format, TableFormat::Upsert);
        assert_eq!(entry.record_key.as_deref(), Some("transaction_id"));
        assert!(entry.partitions.contains("Binance"));
        assert!(entry.partitions.contains("Kraken"));

        let table = UpsertTable::open(&args.target_path, WriteOptions::trades("processed_crypto_txn")).unwrap();
        let kraken = table.read_partition("Kraken").unwrap();
        assert_eq!(kraken.len(), 1);
        assert_eq!(kraken[0]["normalized_price"], json!("980.00"));
        assert_eq!(kraken[0]["hour_bucket"], json!("2025-03-01 10:00:00"));
        assert_eq!(kraken[0]["user_category"], json!("Active Trader"));
    }

    #[test]
    fn test_rerun_is_idempotent_per_key() {
        let tmp = TempDir::new().unwrap();
        seed_source(&tmp, &[trade("a", "OKX", "SUCCESS", "2025-03-01T10:15:00")]);
        let args = args(&tmp);

        run(&args).unwrap();
        let second = run(&args).unwrap();
        assert_eq!(second.commit.inserted, 0);
        assert_eq!(second.commit.updated, 1);

        let table = UpsertTable::open(&args.target_path, WriteOptions::trades("processed_crypto_txn")).unwrap();
        assert_eq!(table.read_all().unwrap().len(), 1);
        assert_eq!(table.commits().unwrap().len(), 2);
    }

    #[test]
    fn test_unknown_source_fails() {
        let tmp = TempDir::new().unwrap();
        let err = run(&args(&tmp)).unwrap_err();
        assert!(matches!(err, PipelineError::Catalog(_)));
    }
}
