//! Remote entry points shared by the proxy layer and engine implementations.
//!
//! These names are opaque to the proxy: it passes them through the bridge and never
//! interprets them. Keeping them in one place keeps both sides of the bridge in step.

// ═══════════════════════════════════════════════════════════════════════
// Classes
// ═══════════════════════════════════════════════════════════════════════

/// Session catalog (temporary view namespace)
pub const CATALOG_CLASS: &str = "tessera.Catalog";

/// Storage level factory
pub const STORAGE_LEVEL_CLASS: &str = "org.apache.spark.storage.StorageLevel";

/// Column functions
pub const FUNCTIONS_CLASS: &str = "org.apache.spark.sql.functions";

/// Engine-side helpers shipped with the bridge
pub const UTILS_CLASS: &str = "tessera.Utils";

/// Column transformers; the method name is the transformer name
pub const TRANSFORMERS_CLASS: &str = "tessera.Transformers";

// ═══════════════════════════════════════════════════════════════════════
// Static methods
// ═══════════════════════════════════════════════════════════════════════

pub const DROP_TEMP_VIEW: &str = "dropTempView";
pub const STORAGE_LEVEL_FROM_STRING: &str = "fromString";
pub const BROADCAST: &str = "broadcast";
pub const MONOTONICALLY_INCREASING_ID: &str = "monotonically_increasing_id";
pub const ADD_SEQUENTIAL_INDEX: &str = "addSequentialIndex";
pub const GET_LAST_INDEX: &str = "getLastIndex";
pub const SET_CHECKPOINT_DIR: &str = "setCheckpointDir";

// ═══════════════════════════════════════════════════════════════════════
// Table methods
// ═══════════════════════════════════════════════════════════════════════

pub const CREATE_OR_REPLACE_TEMP_VIEW: &str = "createOrReplaceTempView";
pub const CACHE: &str = "cache";
pub const PERSIST: &str = "persist";
pub const UNPERSIST: &str = "unpersist";
pub const CHECKPOINT: &str = "checkpoint";
pub const REPARTITION: &str = "repartition";
pub const COALESCE: &str = "coalesce";
pub const SORT: &str = "sort";
pub const SAMPLE: &str = "sample";
pub const RANDOM_SPLIT: &str = "randomSplit";
pub const WITH_COLUMN: &str = "withColumn";
pub const COL: &str = "col";
pub const COLUMNS: &str = "columns";
pub const DTYPES: &str = "dtypes";
pub const COUNT: &str = "count";
pub const COLLECT_COLUMN: &str = "collectColumn";
pub const STAT: &str = "stat";
pub const DESCRIBE: &str = "describe";
pub const GET_NUM_PARTITIONS: &str = "getNumPartitions";

// ═══════════════════════════════════════════════════════════════════════
// Column and statistics methods
// ═══════════════════════════════════════════════════════════════════════

pub const CAST: &str = "cast";
pub const APPROX_QUANTILE: &str = "approxQuantile";
