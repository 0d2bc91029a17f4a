//! Tests for `column_statistics` module

use crate::column_statistics::{ColumnStatistics, PayloadHeader, StatisticsFileVersion};
use crate::config::StatsConfig;
use crate::description::{ColumnSummaryDescription, SingleSummaryDescriptor};
use crate::error::Error;
use crate::registry::StatisticsRegistry;
use crate::summary::SummaryKind;
use crate::value::{DataType, Value};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn registry() -> StatisticsRegistry {
    StatisticsRegistry::with_builtin_kinds(&StatsConfig::default()).expect("builtin kinds")
}

fn build(kinds: &[&str]) -> ColumnStatistics {
    let description =
        ColumnSummaryDescription::from_kind_names("x", DataType::Int64, kinds).expect("kinds");
    registry().get(&description).expect("container")
}

fn uniform_batch(rows: usize, domain: i64, seed: u64) -> Vec<Value> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..rows)
        .map(|_| Value::from(rng.gen_range(0..domain)))
        .collect()
}

fn ints(values: impl IntoIterator<Item = i64>) -> Vec<Value> {
    values.into_iter().map(Value::from).collect()
}

// -------------------------------------------------------------------------
// Estimation
// -------------------------------------------------------------------------

#[test]
fn test_uniform_small_domain_uses_histogram_for_equality() {
    // Arrange
    let mut stats = build(&["tdigest", "uniq"]);

    // Act
    stats.update(&uniform_batch(10_000, 100, 42));

    // Assert
    assert_eq!(stats.row_count(), 10_000);
    let cardinality = stats.estimate_cardinality().unwrap().unwrap();
    assert!((95..=105).contains(&cardinality), "got {cardinality}");

    let equal = stats.estimate_equal(&Value::from(50)).unwrap();
    assert!((60.0..=140.0).contains(&equal), "got {equal}");

    let less = stats.estimate_less(&Value::from(50)).unwrap();
    assert!((4_500.0..=5_500.0).contains(&less), "got {less}");
}

#[test]
fn test_no_statistics_uses_default_factors() {
    // Arrange
    let mut stats = build(&[]);
    stats.update(&ints(0..1000));

    // Act & Assert
    assert_eq!(stats.estimate_less(&Value::from(7)).unwrap(), 500.0);
    assert_eq!(stats.estimate_greater(&Value::from(7)).unwrap(), 500.0);
    // typical range, boundary included: good factor
    assert_eq!(stats.estimate_equal(&Value::from(2)).unwrap(), 100.0);
    assert_eq!(stats.estimate_equal(&Value::from(-1.5)).unwrap(), 100.0);
    // outside the typical range: normal factor
    assert_eq!(stats.estimate_equal(&Value::from(100)).unwrap(), 500.0);
    // non-numeric literals are never in the typical range
    assert_eq!(stats.estimate_equal(&Value::from("abc")).unwrap(), 500.0);
    assert_eq!(stats.estimate_equal(&Value::Null).unwrap(), 500.0);
    assert_eq!(stats.estimate_cardinality().unwrap(), None);
}

#[test]
fn test_non_numeric_literal_on_histogram_uses_default() {
    let mut stats = build(&["tdigest"]);
    stats.update(&ints(0..100));

    let less = stats.estimate_less(&Value::from("50")).unwrap();

    assert_eq!(less, 50.0);
}

#[test]
fn test_greater_complements_less() {
    let mut stats = build(&["tdigest"]);
    stats.update(&uniform_batch(5_000, 1_000, 7));

    for literal in [-10_i64, 0, 1, 250, 999, 5_000] {
        let v = Value::from(literal);
        let less = stats.estimate_less(&v).unwrap();
        let greater = stats.estimate_greater(&v).unwrap();
        assert!((less + greater - 5_000.0).abs() < 1e-6, "literal {literal}");
        assert!((0.0..=5_000.0).contains(&less));
    }
}

#[test]
fn test_high_cardinality_skips_histogram_equality() {
    // Arrange - threshold below the number of distinct values
    let mut config = StatsConfig::default();
    config.estimation.equality_cardinality_threshold = 10;
    let registry = StatisticsRegistry::with_builtin_kinds(&config).unwrap();
    let description =
        ColumnSummaryDescription::from_kind_names("x", DataType::Int64, &["tdigest", "uniq"])
            .unwrap();
    let mut stats = registry.get(&description).unwrap();
    stats.update(&ints(0..1000));

    // Act
    let equal = stats.estimate_equal(&Value::from(500)).unwrap();

    // Assert - falls back to rows * normal
    assert_eq!(equal, 500.0);
}

#[test]
fn test_small_histogram_budget_skips_histogram_equality() {
    // Arrange - 100 distinct values but only 16 centroids
    let histogram =
        SingleSummaryDescriptor::new(SummaryKind::Histogram).with_param("max_centroids", 16);
    let description = ColumnSummaryDescription::new("x", DataType::Int64)
        .with_kind(histogram)
        .with_kind(SingleSummaryDescriptor::new(SummaryKind::DistinctCount));
    let registry = registry();
    registry.validate(&description, description.data_type()).unwrap();
    let mut stats = registry.get(&description).unwrap();
    stats.update(&ints((0..10_000).map(|i| i % 100)));

    // Act & Assert - compressed centroids do not answer equality
    assert_eq!(stats.estimate_equal(&Value::from(50)).unwrap(), 5_000.0);
    assert_eq!(stats.estimate_equal(&Value::from(1)).unwrap(), 1_000.0);
    let zero_answers = (0..100)
        .filter(|&v| stats.estimate_equal(&Value::from(v)).unwrap() == 0.0)
        .count();
    assert_eq!(zero_answers, 0);
}

#[test]
fn test_bool_column_feeds_histogram() {
    // Arrange
    let description =
        ColumnSummaryDescription::from_kind_names("flag", DataType::Bool, &["tdigest", "uniq"])
            .unwrap();
    let registry = registry();
    registry.validate(&description, description.data_type()).unwrap();
    let mut stats = registry.get(&description).unwrap();

    // Act
    stats.update(&vec![Value::Bool(false); 1_000]);

    // Assert - false sits at 0, true at 1
    assert_eq!(stats.estimate_cardinality().unwrap(), Some(1));
    assert_eq!(stats.estimate_less(&Value::from(1)).unwrap(), 1_000.0);
    assert_eq!(stats.estimate_less(&Value::Bool(true)).unwrap(), 1_000.0);
    assert_eq!(stats.estimate_equal(&Value::from(0)).unwrap(), 1_000.0);
    assert_eq!(stats.estimate_equal(&Value::Bool(false)).unwrap(), 1_000.0);
    assert_eq!(stats.estimate_equal(&Value::Bool(true)).unwrap(), 0.0);
}

#[test]
fn test_empty_range_estimate_is_positive_zero() {
    let mut stats = build(&["tdigest"]);
    stats.update(&ints(10..20));

    let less = stats.estimate_less(&Value::from(0)).unwrap();

    assert_eq!(less, 0.0);
    assert!(less.is_sign_positive());
    assert_eq!(format!("{less}"), "0");
}

#[cfg(feature = "count-min-sketch")]
#[test]
fn test_frequency_sketch_answers_equality() {
    // Arrange - 10 distinct values, 100 rows each
    let mut stats = build(&["count_min"]);
    let batch = ints((0..1000).map(|i| i % 10));

    // Act
    stats.update(&batch);

    // Assert - count-min never underestimates
    let equal = stats.estimate_equal(&Value::from(3)).unwrap();
    assert!((100.0..=200.0).contains(&equal), "got {equal}");
    let absent = stats.estimate_equal(&Value::from(12_345)).unwrap();
    assert!(absent <= 100.0, "got {absent}");
}

#[cfg(feature = "count-min-sketch")]
#[test]
fn test_frequency_sketch_used_when_cardinality_is_high() {
    let mut config = StatsConfig::default();
    config.estimation.equality_cardinality_threshold = 10;
    let registry = StatisticsRegistry::with_builtin_kinds(&config).unwrap();
    let description = ColumnSummaryDescription::from_kind_names(
        "x",
        DataType::Int64,
        &["tdigest", "uniq", "count_min"],
    )
    .unwrap();
    let mut stats = registry.get(&description).unwrap();
    stats.update(&ints((0..2000).map(|i| i % 100)));

    let equal = stats.estimate_equal(&Value::from(42)).unwrap();

    assert!((20.0..=60.0).contains(&equal), "got {equal}");
}

#[cfg(feature = "count-min-sketch")]
#[test]
fn test_frequency_sketch_on_strings() {
    let description =
        ColumnSummaryDescription::from_kind_names("s", DataType::String, &["count_min", "uniq"])
            .unwrap();
    let mut stats = registry().get(&description).unwrap();
    let batch: Vec<Value> = ["a", "b", "a", "c", "a"].into_iter().map(Value::from).collect();

    stats.update(&batch);

    assert_eq!(stats.estimate_equal(&Value::from("a")).unwrap(), 3.0);
    assert_eq!(stats.estimate_cardinality().unwrap(), Some(3));
}

// -------------------------------------------------------------------------
// Persistence
// -------------------------------------------------------------------------

#[test]
fn test_serialize_roundtrip_preserves_estimates() {
    // Arrange
    let mut stats = build(&["tdigest", "uniq"]);
    stats.update(&uniform_batch(2_000, 300, 3));
    let bytes = stats.to_bytes().unwrap();

    // Act
    let mut restored = build(&["tdigest", "uniq"]);
    restored.deserialize_from_slice(&bytes).unwrap();

    // Assert
    assert_eq!(restored.row_count(), 2_000);
    for literal in [0_i64, 17, 150, 299] {
        let v = Value::from(literal);
        assert_eq!(
            restored.estimate_less(&v).unwrap(),
            stats.estimate_less(&v).unwrap()
        );
        assert_eq!(
            restored.estimate_equal(&v).unwrap(),
            stats.estimate_equal(&v).unwrap()
        );
    }
    assert_eq!(
        restored.estimate_cardinality().unwrap(),
        stats.estimate_cardinality().unwrap()
    );
}

#[test]
fn test_header_layout() {
    let mut stats = build(&["uniq"]);
    stats.update(&ints(0..5));

    let bytes = stats.to_bytes().unwrap();
    let header = PayloadHeader::read(&mut &bytes[..]).unwrap();

    assert_eq!(&bytes[..2], &[0, 0]);
    assert_eq!(header.version, StatisticsFileVersion::V0);
    assert_eq!(header.presence_mask, SummaryKind::DistinctCount.bit());
    assert_eq!(header.row_count, 5);
    assert_eq!(
        header.kinds().collect::<Vec<_>>(),
        vec![SummaryKind::DistinctCount]
    );
}

#[test]
fn test_unknown_version_leaves_state_unchanged() {
    // Arrange
    let mut stats = build(&["tdigest"]);
    stats.update(&ints(0..10));
    let mut bytes = stats.to_bytes().unwrap().to_vec();
    bytes[0] = 255;

    let mut target = build(&["tdigest"]);
    target.update(&ints(0..4));

    // Act
    let err = target.deserialize_from_slice(&bytes).unwrap_err();

    // Assert
    assert!(matches!(err, Error::UnknownFormatVersion(255)));
    assert_eq!(err.code(), "STATS-006");
    assert_eq!(target.row_count(), 4);
    assert_eq!(target.estimate_less(&Value::from(100)).unwrap(), 4.0);
}

#[test]
fn test_truncated_payload_is_corrupted_and_state_unchanged() {
    // Arrange
    let mut stats = build(&["tdigest", "uniq"]);
    stats.update(&ints(0..100));
    let bytes = stats.to_bytes().unwrap();

    let mut target = build(&["tdigest", "uniq"]);
    target.update(&ints(0..3));

    for cut in [1, PayloadHeader::SIZE - 1, PayloadHeader::SIZE + 3, bytes.len() - 1] {
        // Act
        let err = target.deserialize_from_slice(&bytes[..cut]).unwrap_err();

        // Assert
        assert!(matches!(err, Error::Corrupted(_)), "cut {cut}: {err}");
        assert_eq!(target.row_count(), 3);
        assert_eq!(target.estimate_cardinality().unwrap(), Some(3));
    }
}

#[cfg(feature = "count-min-sketch")]
#[test]
fn test_schema_shrink_drops_higher_kind() {
    // Arrange - written with all three kinds
    let mut stats = build(&["tdigest", "uniq", "count_min"]);
    stats.update(&ints(0..500));
    let bytes = stats.to_bytes().unwrap();

    // Act - reopened after count_min was removed from the column
    let mut restored = build(&["tdigest", "uniq"]);
    restored.deserialize_from_slice(&bytes).unwrap();

    // Assert
    assert_eq!(
        restored.kinds().collect::<Vec<_>>(),
        vec![SummaryKind::Histogram, SummaryKind::DistinctCount]
    );
    assert_eq!(restored.row_count(), 500);
    assert_eq!(restored.estimate_less(&Value::from(250)).unwrap(), 250.0);
}

#[cfg(feature = "count-min-sketch")]
#[test]
fn test_schema_shrink_drops_lower_kind() {
    // Arrange
    let mut stats = build(&["tdigest", "uniq", "count_min"]);
    stats.update(&ints((0..600).map(|i| i % 6)));
    let bytes = stats.to_bytes().unwrap();

    // Act - reopened after tdigest was removed: later payloads stay aligned
    let mut restored = build(&["uniq", "count_min"]);
    restored.deserialize_from_slice(&bytes).unwrap();

    // Assert
    assert!(!restored.has_kind(SummaryKind::Histogram));
    assert_eq!(restored.estimate_cardinality().unwrap(), Some(6));
    assert_eq!(restored.estimate_equal(&Value::from(4)).unwrap(), 100.0);
}

#[test]
fn test_declared_kind_missing_from_payload_is_dropped() {
    // Arrange - written before tdigest was added
    let mut stats = build(&["uniq"]);
    stats.update(&ints(0..50));
    let bytes = stats.to_bytes().unwrap();

    // Act
    let mut restored = build(&["tdigest", "uniq"]);
    restored.deserialize_from_slice(&bytes).unwrap();

    // Assert - no histogram, less falls back to the default
    assert!(!restored.has_kind(SummaryKind::Histogram));
    assert_eq!(restored.estimate_less(&Value::from(10)).unwrap(), 25.0);
    assert_eq!(restored.row_count(), 50);
}

#[test]
fn test_file_name_uses_prefix() {
    let description =
        ColumnSummaryDescription::from_kind_names("price", DataType::Float64, &["tdigest"])
            .unwrap();
    let stats = registry().get(&description).unwrap();

    assert_eq!(stats.file_name(), "statistics_price");
}

// -------------------------------------------------------------------------
// Concurrency
// -------------------------------------------------------------------------

#[test]
fn test_concurrent_readers_agree() {
    let mut stats = build(&["tdigest", "uniq"]);
    stats.update(&uniform_batch(4_000, 50, 11));
    let expected = stats.estimate_equal(&Value::from(25)).unwrap();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| stats.estimate_equal(&Value::from(25)).unwrap()))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}
