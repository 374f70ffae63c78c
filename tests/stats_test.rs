/*!
 * Integration tests for quantiles and column summaries
 */

mod common;

use common::{import, numbers, pairs, setup};
use tessera::{entry, Probabilities, TesseraError, Value};

#[test]
fn test_quantile_labels_follow_input_order() {
    let (_engine, connection) = setup(3);
    let source = import(&connection, numbers(1..=100), "source");

    let quantiles = source.quantile("x", [0.0, 0.5, 1.0], Some(1e-5)).unwrap();
    let labels: Vec<&str> = quantiles.iter().map(|(l, _)| l.as_str()).collect();
    assert_eq!(labels, vec!["0%", "50%", "100%"]);
    assert_eq!(quantiles[0].1, 1.0);
    assert_eq!(quantiles[1].1, 50.0);
    assert_eq!(quantiles[2].1, 100.0);

    let reversed = source.quantile("x", [0.75, 0.25], None).unwrap();
    assert_eq!(reversed[0], ("75%".to_string(), 75.0));
    assert_eq!(reversed[1], ("25%".to_string(), 25.0));
}

#[test]
fn test_quantile_named_probabilities() {
    let (_engine, connection) = setup(2);
    let source = import(&connection, numbers(1..=10), "source");

    let quantiles = source
        .quantile("x", [("median", 0.5), ("low", 0.1)], None)
        .unwrap();
    assert_eq!(
        quantiles,
        vec![("median".to_string(), 5.0), ("low".to_string(), 1.0)]
    );
}

#[test]
fn test_quantile_rejects_bad_arguments() {
    let (engine, connection) = setup(2);
    let source = import(&connection, numbers(1..=10), "source");
    engine.clear_calls();

    assert!(matches!(
        source.quantile("x", [1.2], None),
        Err(TesseraError::InvalidArgument(_))
    ));
    assert!(matches!(
        source.quantile("x", [0.5], Some(-0.01)),
        Err(TesseraError::InvalidArgument(_))
    ));
    assert!(engine.calls().is_empty());
}

#[test]
fn test_quantile_unknown_column() {
    let (_engine, connection) = setup(2);
    let source = import(&connection, numbers(1..=10), "source");

    match source.quantile("nope", [0.5], None).unwrap_err() {
        TesseraError::UnknownColumn { columns, .. } => assert_eq!(columns, vec!["nope"]),
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_quantile_without_probabilities_skips_engine() {
    let (engine, connection) = setup(2);
    let source = import(&connection, numbers(1..=10), "source");
    engine.clear_calls();

    let quantiles = source
        .quantile("x", Probabilities::Unnamed(Vec::new()), None)
        .unwrap();
    assert!(quantiles.is_empty());
    assert!(!engine.calls().iter().any(|c| c == entry::STAT));
}

#[test]
fn test_quantile_over_non_numeric_column_is_empty() {
    let (_engine, connection) = setup(2);
    let source = import(&connection, pairs(&[(1, "a"), (2, "b")]), "source");

    let quantiles = source.quantile("b", [0.25, 0.5], None).unwrap();
    assert!(quantiles.is_empty());
}

#[test]
fn test_quantile_without_probabilities_still_checks_column() {
    let (_engine, connection) = setup(2);
    let source = import(&connection, numbers(1..=10), "source");

    match source
        .quantile("nope", Probabilities::Unnamed(Vec::new()), None)
        .unwrap_err()
    {
        TesseraError::UnknownColumn { columns, .. } => assert_eq!(columns, vec!["nope"]),
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_describe_reports_every_missing_column() {
    let (engine, connection) = setup(2);
    let source = import(&connection, pairs(&[(1, "a")]), "source");
    engine.clear_calls();

    let err = source.describe(&["a", "nope", "zip"]).unwrap_err();
    match &err {
        TesseraError::UnknownColumn { table, columns } => {
            assert_eq!(table.as_deref(), Some("source"));
            assert_eq!(columns, &vec!["nope".to_string(), "zip".to_string()]);
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert!(err.to_string().contains("nope, zip"));
    assert!(!engine.calls().iter().any(|c| c == entry::DESCRIBE));
}

#[test]
fn test_describe_selected_columns() {
    let (_engine, connection) = setup(2);
    let source = import(&connection, numbers([2, 4, 6]), "source");

    let summary = source.describe(&["x"]).unwrap();
    assert!(connection.registry().exists(summary.name().unwrap()));
    assert_eq!(summary.columns().unwrap(), vec!["summary", "x"]);
    assert_eq!(
        summary.collect_column("summary").unwrap(),
        ["count", "mean", "stddev", "min", "max"]
            .iter()
            .map(|s| Value::from(*s))
            .collect::<Vec<_>>()
    );
    let stats = summary.collect_column("x").unwrap();
    assert_eq!(stats[0], Value::from("3"));
    assert_eq!(stats[1], Value::from("4"));
}

#[test]
fn test_describe_all_columns() {
    let (_engine, connection) = setup(2);
    let source = import(&connection, pairs(&[(1, "a"), (2, "b")]), "source");

    let summary = source.describe(&[]).unwrap();
    assert_eq!(summary.columns().unwrap(), vec!["summary", "a", "b"]);
}

#[test]
fn test_schema_and_count() {
    let (_engine, connection) = setup(2);
    let source = import(&connection, pairs(&[(1, "a"), (2, "b"), (3, "c")]), "source");

    assert_eq!(
        source.schema().unwrap(),
        vec![
            ("a".to_string(), "bigint".to_string()),
            ("b".to_string(), "string".to_string())
        ]
    );
    assert_eq!(source.count().unwrap(), 3);
    assert!(matches!(
        source.collect_column("missing"),
        Err(TesseraError::UnknownColumn { .. })
    ));
}
