//! Default names and locations shared by the pipeline binaries.

/// Catalog file used when `--catalog` is not given.
pub const CATALOG_PATH: &str = "data/catalog.json";

/// Key-value table written by the generator.
pub const KV_TABLE_NAME: &str = "CryptoDataProcessing";
/// Directory holding the local key-value tables.
pub const KV_STORE_DIR: &str = "data/kv";
/// Region label stamped on change records.
pub const KV_REGION: &str = "ap-south-1";
/// Partition key attribute of the key-value table.
pub const KV_KEY_ATTRIBUTE: &str = "transaction_id";

/// Database of the raw and processed tables.
pub const SOURCE_DATABASE: &str = "crypto";
/// Raw table the stream delivers into and the batch job reads from.
pub const SOURCE_TABLE: &str = "crypto_raw";
/// Location of the raw table when it is not yet catalogued.
pub const SOURCE_PATH: &str = "data/crypto_raw";

/// Database of the processed table.
pub const TARGET_DATABASE: &str = "crypto";
/// Processed table written by the batch job.
pub const TARGET_TABLE: &str = "processed_crypto_txn";
/// Location of the processed table.
pub const TARGET_PATH: &str = "data/crypto_processed";

/// Lower bound of the generator's pause between trades, in seconds.
pub const MIN_DELAY_SECS: u64 = 1;
/// Upper bound (inclusive) of the generator's pause between trades, in seconds.
pub const MAX_DELAY_SECS: u64 = 5;

/// Placeholder used when a change record lacks an event name or id.
pub const UNKNOWN: &str = "UNKNOWN";
