use std::fs;
use std::io::{Read, Write};

use tempfile::{NamedTempFile, tempdir};
use transaction_analyzer::{
    Analysis, AnalysisConfig, ErrorKind, Stage, Value,
    processor::{
        counter::{AggregatorConfig, count_occurrences, parallel_count},
        filter::filter_greater_than,
        statistics::calculate_statistics,
        table::Table,
    },
};

fn csv_file(csv: &str) -> NamedTempFile {
    let mut tmp = NamedTempFile::new().unwrap();
    write!(tmp, "{}", csv).unwrap();
    tmp
}

#[test]
fn test_counts_from_csv() {
    let tmp = csv_file("cat\nA\nB\nA\nA\n");
    let table = Table::load_csv(tmp.path()).unwrap();

    let counts = parallel_count(&table, "cat", &AggregatorConfig::new(2, 2)).unwrap();
    assert_eq!(counts.get(&Value::from("A")), 3);
    assert_eq!(counts.get(&Value::from("B")), 1);
    assert_eq!(counts.len(), 2);
}

#[test]
fn test_parallel_matches_direct_on_loaded_file() {
    let mut csv = String::from("store,amount,when\n");
    for i in 0..5_000 {
        let store = if i % 7 == 0 { String::new() } else { format!("s{}", i % 13) };
        csv.push_str(&format!("{},{}.25,2019-12-{:02}\n", store, i % 40, i % 28 + 1));
    }
    let tmp = csv_file(&csv);
    let table = Table::load_csv(tmp.path()).unwrap();
    assert_eq!(table.row_count(), 5_000);

    for column in ["store", "amount", "when"] {
        let direct = count_occurrences(&table, column, 0..table.row_count()).unwrap();
        for partitions in [1, 4, 9] {
            let parallel =
                parallel_count(&table, column, &AggregatorConfig::new(partitions, 4)).unwrap();
            assert_eq!(parallel, direct, "column={} partitions={}", column, partitions);
        }
    }

    let missing_stores = count_occurrences(&table, "store", 0..table.row_count())
        .unwrap()
        .get(&Value::Null);
    assert_eq!(missing_stores, (0..5_000).filter(|i| i % 7 == 0).count() as u64);
}

#[test]
fn test_statistics_and_filter_from_csv() {
    let tmp = csv_file("id,value\n1,5\n2,15\n3,10\n4,20\n");
    let table = Table::load_csv(tmp.path()).unwrap();

    let stats = calculate_statistics(&table, "value").unwrap();
    assert_eq!(stats.mean, 12.5);
    assert_eq!(stats.median, 12.5);

    let rows = filter_greater_than(&table, "value", &Value::Int(10)).unwrap();
    assert_eq!(
        rows.values("value").unwrap(),
        vec![Value::Int(15), Value::Int(20)]
    );
    assert_eq!(
        rows.values("id").unwrap(),
        vec![Value::Int(2), Value::Int(4)]
    );
}

#[test]
fn test_date_column_uses_date_threshold() {
    let tmp = csv_file("store,date\nA,2019-12-10\nB,2019-12-11\nC,2019-12-12 08:30:00\n");
    let dir = tempdir().unwrap();
    let config = AnalysisConfig::default()
        .with_input(tmp.path())
        .with_report_path(dir.path().join("r.pdf"))
        .with_slides_path(dir.path().join("s.pptx"));

    let analysis = Analysis::load(config).unwrap();
    let filtered = analysis.filtered().unwrap();
    assert_eq!(filtered.indices(), &[2]);

    // datetime column has no numeric statistics
    let stats = analysis.statistics().unwrap();
    assert!(stats.mean.is_nan());
}

#[test]
fn test_end_to_end_run() {
    let tmp = csv_file("store,amount\nA,5\nB,15\nA,10\nA,20\nC,\n");
    let dir = tempdir().unwrap();
    let report = dir.path().join("report.pdf");
    let slides = dir.path().join("presentation.pptx");
    let config = AnalysisConfig::default()
        .with_input(tmp.path())
        .with_report_path(&report)
        .with_slides_path(&slides);

    let analysis = Analysis::load(config).unwrap();
    let result = analysis.run().unwrap();

    assert_eq!(result.occurrences.to_string(), "{A: 3, B: 1, C: 1}");
    assert_eq!(result.statistics.mean, 12.5);
    assert_eq!(result.filtered.len(), 2);

    assert!(fs::read(&report).unwrap().starts_with(b"%PDF"));

    let mut archive = zip::ZipArchive::new(fs::File::open(&slides).unwrap()).unwrap();
    let mut slide = String::new();
    archive
        .by_name("ppt/slides/slide1.xml")
        .unwrap()
        .read_to_string(&mut slide)
        .unwrap();
    assert!(slide.contains("Mean: 12.5"));
    assert!(slide.contains("Median: 12.5"));
}

#[test]
fn test_header_only_file() {
    let tmp = csv_file("cat,value\n");
    let dir = tempdir().unwrap();
    let config = AnalysisConfig::default()
        .with_input(tmp.path())
        .with_report_path(dir.path().join("r.pdf"))
        .with_slides_path(dir.path().join("s.pptx"));

    let analysis = Analysis::load(config).unwrap();
    let result = analysis.run().unwrap();
    assert!(result.occurrences.is_empty());
    assert!(result.statistics.mean.is_nan());
    assert!(result.statistics.median.is_nan());
    assert!(result.statistics.std_dev.is_nan());
    assert!(result.filtered.is_empty());
}

#[test]
fn test_missing_input_file() {
    let dir = tempdir().unwrap();
    let config = AnalysisConfig::default().with_input(dir.path().join("absent.csv"));
    let err = Analysis::load(config).unwrap_err();
    assert_eq!(err.stage, Stage::Load);
    assert_eq!(err.kind(), ErrorKind::InputNotFound);
}

#[test]
fn test_late_float_row_keeps_statistics_exact() {
    let mut csv = String::from("store,amount\n");
    for _ in 0..1000 {
        csv.push_str("A,10\n");
    }
    csv.push_str("B,1000000.5\n");
    let tmp = csv_file(&csv);
    let table = Table::load_csv(tmp.path()).unwrap();
    assert!(table.parse_errors().is_empty());

    let stats = calculate_statistics(&table, "amount").unwrap();
    let expected_mean = (1000.0 * 10.0 + 1_000_000.5) / 1001.0;
    assert!((stats.mean - expected_mean).abs() < 1e-9);
    assert_eq!(stats.median, 10.0);

    let counts = parallel_count(&table, "amount", &AggregatorConfig::new(4, 2)).unwrap();
    assert_eq!(counts.get(&Value::Float(10.0)), 1000);
    assert_eq!(counts.get(&Value::Float(1_000_000.5)), 1);
    assert_eq!(counts.get(&Value::Null), 0);
}

#[test]
fn test_signed_zeros_count_as_one_value() {
    let tmp = csv_file("amount\n0.0\n-0.0\n1.5\n");
    let table = Table::load_csv(tmp.path()).unwrap();

    let counts = parallel_count(&table, "amount", &AggregatorConfig::new(2, 2)).unwrap();
    assert_eq!(counts.len(), 2);
    assert_eq!(counts.get(&Value::Float(0.0)), 2);
    assert_eq!(counts.to_string(), "{0: 2, 1.5: 1}");
}
