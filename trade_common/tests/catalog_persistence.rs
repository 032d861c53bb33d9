use std::path::PathBuf;

use tempfile::TempDir;
use trade_common::catalog::{Catalog, TableEntry, TableFormat};
use trade_common::PipelineError;

#[test]
fn missing_catalog_file_loads_empty() {
    let dir = TempDir::new().unwrap();
    let catalog = Catalog::load(&dir.path().join("catalog.json")).unwrap();
    assert!(!catalog.has_database("crypto"));
}

#[test]
fn catalog_survives_save_and_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("catalog.json");

    let mut catalog = Catalog::default();
    catalog.create_database_if_not_exists("crypto");
    let entry = TableEntry {
        location: PathBuf::from("/tmp/processed"),
        format: TableFormat::Upsert,
        partition_fields: vec!["exchange".into()],
        record_key: Some("transaction_id".into()),
        partitions: Default::default(),
    };
    catalog.register_table("crypto", "processed_crypto_txn", entry).unwrap();
    catalog
        .sync_partitions("crypto", "processed_crypto_txn", ["Kraken"])
        .unwrap();
    catalog.save(&path).unwrap();

    let reloaded = Catalog::load(&path).unwrap();
    assert_eq!(reloaded, catalog);
    let table = reloaded.table("crypto", "processed_crypto_txn").unwrap();
    assert_eq!(table.format, TableFormat::Upsert);
    assert!(table.partitions.contains("Kraken"));
    assert!(!path.with_extension("json.tmp").exists());
}

#[test]
fn malformed_catalog_is_a_catalog_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("catalog.json");
    std::fs::write(&path, b"{not json").unwrap();
    assert!(matches!(Catalog::load(&path), Err(PipelineError::Catalog(_))));
}
