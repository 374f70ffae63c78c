/*!
 * Integration tests for persistence, partitioning, sorting and sampling
 */

mod common;

use common::{connect, engine, import, numbers, pairs, setup};
use tessera::{entry, EngineVersion, PartitionSpec, StorageLevel, TesseraError, Value};

#[test]
fn test_persist_sets_storage_level() {
    let (engine, connection) = setup(2);
    let source = import(&connection, numbers(1..=4), "source");

    let persisted = source.persist(&StorageLevel::memory_only()).unwrap();
    assert_ne!(persisted.name(), source.name());
    assert!(connection.registry().exists(persisted.name().unwrap()));
    assert_eq!(engine.storage_level(persisted.handle()).as_deref(), Some("MEMORY_ONLY"));
}

#[test]
fn test_persist_default_uses_config() {
    let (engine, connection) = setup(2);
    let source = import(&connection, numbers(1..=4), "source");

    let persisted = source.persist_default().unwrap();
    assert_eq!(engine.storage_level(persisted.handle()).as_deref(), Some("MEMORY_AND_DISK"));
}

#[test]
fn test_persist_unknown_level_is_engine_error() {
    let (_engine, connection) = setup(2);
    let source = import(&connection, numbers(1..=4), "source");

    let err = source
        .persist(&StorageLevel::new("MEMORY_SOMETIMES").unwrap())
        .unwrap_err();
    match err {
        TesseraError::Invocation(message) => assert!(message.contains("Invalid StorageLevel")),
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_unpersist_clears_storage() {
    let (engine, connection) = setup(2);
    let source = import(&connection, numbers(1..=4), "source");
    let persisted = source.persist(&StorageLevel::disk_only()).unwrap();

    let released = persisted.unpersist(true).unwrap();
    assert_eq!(engine.storage_level(released.handle()), None);
}

#[test]
fn test_checkpoint_requires_directory() {
    let (engine, connection) = setup(2);
    let source = import(&connection, numbers(1..=4), "source");

    assert!(matches!(
        source.checkpoint(true),
        Err(TesseraError::Invocation(_))
    ));

    connection.set_checkpoint_dir("/tmp/tessera-checkpoints").unwrap();
    let checkpointed = source.checkpoint(true).unwrap();
    assert!(engine.is_checkpointed(checkpointed.handle()));
    assert_eq!(checkpointed.count().unwrap(), 4);
}

#[test]
fn test_repartition_by_count() {
    let (engine, connection) = setup(2);
    let source = import(&connection, numbers(1..=20), "source");

    let repartitioned = source.repartition(&PartitionSpec::count(4)).unwrap();
    assert_eq!(repartitioned.num_partitions().unwrap(), 4);
    assert_eq!(
        engine.partition_sizes(repartitioned.handle()).unwrap().iter().sum::<usize>(),
        20
    );
}

#[test]
fn test_repartition_count_zero_without_columns_rejected() {
    let (_engine, connection) = setup(2);
    let source = import(&connection, numbers(1..=4), "source");

    assert!(matches!(
        source.repartition(&PartitionSpec::count(0)),
        Err(TesseraError::InvalidArgument(_))
    ));
}

#[test]
fn test_repartition_by_columns_needs_engine_2() {
    let old = engine(EngineVersion::new(1, 6, 3));
    let connection = connect(&old);
    let source = import(&connection, pairs(&[(1, "a"), (2, "b")]), "source");
    old.clear_calls();

    let err = source
        .repartition(&PartitionSpec::by_columns(["a"]))
        .unwrap_err();
    match err {
        TesseraError::UnsupportedVersion {
            required, actual, ..
        } => {
            assert_eq!(required, EngineVersion::new(2, 0, 0));
            assert_eq!(actual, EngineVersion::new(1, 6, 3));
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert!(!old.calls().iter().any(|c| c == entry::REPARTITION));

    // Count-only partitioning still works on old engines
    assert!(source.repartition(&PartitionSpec::count(2)).is_ok());
}

#[test]
fn test_repartition_by_columns_on_engine_2() {
    let new = engine(EngineVersion::new(2, 0, 0));
    let connection = connect(&new);
    let source = import(
        &connection,
        pairs(&[(1, "a"), (2, "b"), (1, "c"), (3, "d")]),
        "source",
    );

    let repartitioned = source
        .repartition(&PartitionSpec::by_columns(["a"]).with_count(3))
        .unwrap();
    assert_eq!(repartitioned.num_partitions().unwrap(), 3);
    assert_eq!(repartitioned.count().unwrap(), 4);
}

#[test]
fn test_coalesce() {
    let (_engine, connection) = setup(4);
    let source = import(&connection, numbers(1..=8), "source");

    let merged = source.coalesce(1).unwrap();
    assert_eq!(merged.num_partitions().unwrap(), 1);
    assert!(matches!(source.coalesce(0), Err(TesseraError::InvalidArgument(_))));
}

#[test]
fn test_broadcast_is_a_hint() {
    let (engine, connection) = setup(2);
    let source = import(&connection, numbers(1..=3), "source");

    let hinted = source.broadcast().unwrap();
    assert!(engine.is_broadcast(hinted.handle()));
    assert!(!engine.is_broadcast(source.handle()));
    assert_eq!(hinted.count().unwrap(), 3);
}

#[test]
fn test_sort_requires_columns() {
    let (engine, connection) = setup(2);
    let source = import(&connection, numbers([3, 1, 2]), "source");
    engine.clear_calls();

    let err = source.sort(&[]).unwrap_err();
    assert!(matches!(err, TesseraError::InvalidArgument(_)));
    assert_eq!(err.to_string(), "must supply one or more column names");
    assert!(engine.calls().is_empty());
}

#[test]
fn test_sort_single_column() {
    let (_engine, connection) = setup(3);
    let source = import(&connection, numbers([3, 1, 2, 5, 4]), "source");

    let sorted = source.sort(&["x"]).unwrap();
    assert_eq!(
        sorted.collect_column("x").unwrap(),
        (1..=5).map(Value::Int).collect::<Vec<_>>()
    );
}

#[test]
fn test_sort_multiple_columns() {
    let (_engine, connection) = setup(2);
    let source = import(
        &connection,
        pairs(&[(2, "b"), (1, "z"), (2, "a"), (1, "c")]),
        "source",
    );

    let sorted = source.sort(&["a", "b"]).unwrap();
    assert_eq!(
        sorted.collect_column("a").unwrap(),
        vec![Value::Int(1), Value::Int(1), Value::Int(2), Value::Int(2)]
    );
    assert_eq!(
        sorted.collect_column("b").unwrap(),
        vec![Value::from("c"), Value::from("z"), Value::from("a"), Value::from("b")]
    );
}

#[test]
fn test_sort_unknown_column_is_engine_error() {
    let (_engine, connection) = setup(2);
    let source = import(&connection, numbers([1]), "source");

    match source.sort(&["nope"]).unwrap_err() {
        TesseraError::Invocation(message) => assert!(message.contains("cannot resolve 'nope'")),
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_sample_validates_fraction() {
    let (_engine, connection) = setup(2);
    let source = import(&connection, numbers(1..=10), "source");

    for fraction in [-0.1, f64::NAN, f64::INFINITY] {
        assert!(matches!(
            source.sample(fraction, false, None),
            Err(TesseraError::InvalidArgument(_))
        ));
    }
    assert!(matches!(
        source.sample(1.5, false, None),
        Err(TesseraError::InvalidArgument(_))
    ));
    assert!(source.sample(1.5, true, Some(1)).is_ok());
}

#[test]
fn test_seeded_sample_is_reproducible() {
    let (_engine, connection) = setup(3);
    let source = import(&connection, numbers(0..100), "source");

    let a = source.sample(0.3, false, Some(42)).unwrap();
    let b = source.sample(0.3, false, Some(42)).unwrap();
    assert_ne!(a.name(), b.name());
    assert_eq!(a.collect_column("x").unwrap(), b.collect_column("x").unwrap());
    assert!(a.count().unwrap() <= 100);
}

#[test]
fn test_random_split() {
    let (_engine, connection) = setup(2);
    let source = import(&connection, numbers(0..50), "source");

    let parts = source
        .random_split(&[("train", 0.8), ("test", 0.2)], Some(7))
        .unwrap();
    let labels: Vec<&str> = parts.iter().map(|(label, _)| label.as_str()).collect();
    assert_eq!(labels, vec!["train", "test"]);

    let total: u64 = parts.iter().map(|(_, t)| t.count().unwrap()).sum();
    assert_eq!(total, 50);
    for (_, table) in &parts {
        assert!(connection.registry().exists(table.name().unwrap()));
    }
}

#[test]
fn test_random_split_validates_weights() {
    let (_engine, connection) = setup(2);
    let source = import(&connection, numbers(0..5), "source");

    assert!(source.random_split(&[], None).is_err());
    assert!(source.random_split(&[("a", -1.0), ("b", 2.0)], None).is_err());
    assert!(source.random_split(&[("a", 0.0), ("b", 0.0)], None).is_err());
}
