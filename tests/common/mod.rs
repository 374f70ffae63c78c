//! Shared setup for integration tests

#![allow(dead_code)]

use std::sync::Arc;
use tessera::{Connection, EngineVersion, ImportOptions, LocalTable, SequentialNameGenerator, TableReference, TesseraConfig, Value};
use tessera_sim::SimEngine;

pub fn engine(version: EngineVersion) -> Arc<SimEngine> {
    Arc::new(SimEngine::new(version))
}

pub fn connect(engine: &Arc<SimEngine>) -> Connection {
    connect_with(engine, TesseraConfig::default())
}

pub fn connect_with(engine: &Arc<SimEngine>, config: TesseraConfig) -> Connection {
    Connection::with_name_generator(engine.clone(), config, SequentialNameGenerator::new())
        .unwrap()
}

/// Engine at 2.4 with `partitions` default partitions, plus a connection to it
pub fn setup(partitions: usize) -> (Arc<SimEngine>, Connection) {
    let engine = Arc::new(SimEngine::new(EngineVersion::new(2, 4, 0)).with_default_partitions(partitions));
    let connection = connect(&engine);
    (engine, connection)
}

/// Single column `x` holding `values`
pub fn numbers(values: impl IntoIterator<Item = i64>) -> LocalTable {
    LocalTable::from_columns([("x", values.into_iter().map(Value::Int).collect())]).unwrap()
}

/// Columns `a` (int) and `b` (string)
pub fn pairs(rows: &[(i64, &str)]) -> LocalTable {
    LocalTable::from_rows(
        vec!["a".to_string(), "b".to_string()],
        rows.iter()
            .map(|(a, b)| vec![Value::Int(*a), Value::from(*b)])
            .collect(),
    )
    .unwrap()
}

pub fn import(connection: &Connection, table: LocalTable, name: &str) -> TableReference {
    connection
        .copy_to(table, &ImportOptions::default().target(name).memory(false))
        .unwrap()
}

pub fn doubles(values: Vec<Value>) -> Vec<f64> {
    values.iter().map(|v| v.as_f64().unwrap()).collect()
}
