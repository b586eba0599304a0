//! Stage-by-stage analysis run.
//!
//! Every stage returns its own result tagged with the [`Stage`] it failed in,
//! so the caller decides how to present failures.

use std::fmt;
use std::path::Path;

use thiserror::Error;
use tracing::info_span;

use crate::config::AnalysisConfig;
use crate::processor::{
    ProcessorError,
    counter::{CountMapping, parallel_count},
    filter::{RowSelection, filter_greater_than},
    statistics::{StatisticsRecord, calculate_statistics},
    table::Table,
};
use crate::report::{DocumentRenderer, PdfReport, SlideDeck};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Load,
    Count,
    Statistics,
    Filter,
    Report,
    Slides,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Load => "load",
            Stage::Count => "count",
            Stage::Statistics => "statistics",
            Stage::Filter => "filter",
            Stage::Report => "report",
            Stage::Slides => "slides",
        };
        f.write_str(name)
    }
}

/// How a failure should be surfaced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InputNotFound,
    Processing,
}

#[derive(Debug, Error)]
#[error("{stage}: {source}")]
pub struct AnalysisError {
    pub stage: Stage,
    pub source: ProcessorError,
}

impl AnalysisError {
    pub fn kind(&self) -> ErrorKind {
        match (&self.stage, &self.source) {
            (Stage::Load, ProcessorError::NotFound(_)) => ErrorKind::InputNotFound,
            _ => ErrorKind::Processing,
        }
    }

    /// One-line console message for a failed run over `input`
    pub fn console_message(&self, input: &Path) -> String {
        match self.kind() {
            ErrorKind::InputNotFound => format!("Error: file {} was not found.", input.display()),
            ErrorKind::Processing => format!("Error processing file: {}", self),
        }
    }
}

trait StageResult<T> {
    fn at(self, stage: Stage) -> Result<T, AnalysisError>;
}

impl<T> StageResult<T> for Result<T, ProcessorError> {
    fn at(self, stage: Stage) -> Result<T, AnalysisError> {
        self.map_err(|source| AnalysisError { stage, source })
    }
}

/// Everything a full run produces
#[derive(Debug)]
pub struct AnalysisReport<'a> {
    pub occurrences: CountMapping,
    pub statistics: StatisticsRecord,
    pub filtered: RowSelection<'a>,
}

impl fmt::Display for AnalysisReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Occurrences: {}", self.occurrences)?;
        writeln!(f, "Statistics: {}", self.statistics)?;
        write!(f, "Filtered Data:\n{}", self.filtered)
    }
}

/// A loaded table plus the settings to analyse it with
#[derive(Debug)]
pub struct Analysis {
    config: AnalysisConfig,
    table: Table,
}

impl Analysis {
    /// Validates the config and loads its input file
    pub fn load(config: AnalysisConfig) -> Result<Self, AnalysisError> {
        let _span = info_span!("load", path = %config.input.display()).entered();
        config.validate().at(Stage::Load)?;
        let table = Table::load_csv(&config.input).at(Stage::Load)?;
        Ok(Self { config, table })
    }

    /// Wraps an already built table
    pub fn from_table(config: AnalysisConfig, table: Table) -> Result<Self, AnalysisError> {
        config.validate().at(Stage::Load)?;
        Ok(Self { config, table })
    }

    pub fn occurrences(&self) -> Result<CountMapping, AnalysisError> {
        let _span = info_span!("count").entered();
        let column = self.config.count_column.resolve(&self.table).at(Stage::Count)?;
        parallel_count(&self.table, &column, &self.config.aggregator).at(Stage::Count)
    }

    pub fn statistics(&self) -> Result<StatisticsRecord, AnalysisError> {
        let _span = info_span!("statistics").entered();
        let column = self
            .config
            .stats_column
            .resolve(&self.table)
            .at(Stage::Statistics)?;
        calculate_statistics(&self.table, &column).at(Stage::Statistics)
    }

    /// Rows above the threshold matching the filter column's type
    pub fn filtered(&self) -> Result<RowSelection<'_>, AnalysisError> {
        let _span = info_span!("filter").entered();
        let column = self
            .config
            .filter_column
            .resolve(&self.table)
            .at(Stage::Filter)?;
        let col_type = self.table.column_type(&column).at(Stage::Filter)?;
        let threshold = self.config.threshold_for(col_type);
        filter_greater_than(&self.table, &column, &threshold).at(Stage::Filter)
    }

    pub fn render_report(&self, stats: &StatisticsRecord) -> Result<(), AnalysisError> {
        render(&PdfReport, stats, &self.config.report_path).at(Stage::Report)
    }

    pub fn render_slides(&self, stats: &StatisticsRecord) -> Result<(), AnalysisError> {
        render(&SlideDeck, stats, &self.config.slides_path).at(Stage::Slides)
    }

    /// Runs every stage in order and writes both documents
    pub fn run(&self) -> Result<AnalysisReport<'_>, AnalysisError> {
        let occurrences = self.occurrences()?;
        let statistics = self.statistics()?;
        let filtered = self.filtered()?;
        self.render_report(&statistics)?;
        self.render_slides(&statistics)?;

        Ok(AnalysisReport {
            occurrences,
            statistics,
            filtered,
        })
    }
}

fn render(
    renderer: &dyn DocumentRenderer,
    stats: &StatisticsRecord,
    path: &Path,
) -> Result<(), ProcessorError> {
    let _span = info_span!("render", renderer = renderer.name()).entered();
    renderer.render(stats, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::Value;
    use tempfile::tempdir;

    fn sample_table() -> Table {
        let rows = [("A", 5), ("B", 15), ("A", 10), ("A", 20)]
            .iter()
            .map(|(cat, v)| vec![Value::from(*cat), Value::Int(*v)])
            .collect();
        Table::from_rows(vec!["cat".into(), "value".into()], rows).unwrap()
    }

    #[test]
    fn test_missing_input_is_input_not_found() {
        let config = AnalysisConfig::default().with_input("/no/such/input.csv");
        let err = Analysis::load(config).unwrap_err();
        assert_eq!(err.stage, Stage::Load);
        assert_eq!(err.kind(), ErrorKind::InputNotFound);
    }

    #[test]
    fn test_bad_selector_is_processing_error() {
        let config = AnalysisConfig::default().with_count_column("nope");
        let analysis = Analysis::from_table(config, sample_table()).unwrap();
        let err = analysis.occurrences().unwrap_err();
        assert_eq!(err.stage, Stage::Count);
        assert_eq!(err.kind(), ErrorKind::Processing);
        assert_eq!(err.to_string(), "count: Missing column: nope");
    }

    #[test]
    fn test_filter_type_mismatch_is_tagged() {
        let config = AnalysisConfig::default().with_filter_column("cat");
        let analysis = Analysis::from_table(config, sample_table()).unwrap();
        let err = analysis.filtered().unwrap_err();
        assert_eq!(err.stage, Stage::Filter);
        assert!(matches!(err.source, ProcessorError::TypeMismatch { .. }));
    }

    #[test]
    fn test_full_run_writes_documents() {
        let dir = tempdir().unwrap();
        let config = AnalysisConfig::default()
            .with_report_path(dir.path().join("report.pdf"))
            .with_slides_path(dir.path().join("presentation.pptx"));
        let analysis = Analysis::from_table(config, sample_table()).unwrap();

        let report = analysis.run().unwrap();
        assert_eq!(report.occurrences.get(&Value::from("A")), 3);
        assert_eq!(report.occurrences.get(&Value::from("B")), 1);
        assert_eq!(report.statistics.mean, 12.5);
        assert_eq!(report.statistics.median, 12.5);
        assert_eq!(report.filtered.indices(), &[1, 3]);

        assert!(dir.path().join("report.pdf").exists());
        assert!(dir.path().join("presentation.pptx").exists());
    }

    #[test]
    fn test_report_prints_every_result() {
        let dir = tempdir().unwrap();
        let config = AnalysisConfig::default()
            .with_report_path(dir.path().join("report.pdf"))
            .with_slides_path(dir.path().join("presentation.pptx"));
        let analysis = Analysis::from_table(config, sample_table()).unwrap();

        let printed = analysis.run().unwrap().to_string();
        let lines: Vec<&str> = printed.lines().collect();
        assert_eq!(lines[0], "Occurrences: {A: 3, B: 1}");
        assert!(lines[1].starts_with("Statistics: {mean: 12.5, median: 12.5, std_dev: "));
        assert_eq!(lines[2], "Filtered Data:");
        assert_eq!(lines[3], "row,cat,value");
        assert_eq!(lines[4], "1,B,15");
        assert_eq!(lines[5], "3,A,20");
        assert_eq!(lines[6], "[2 rows x 2 columns]");
    }

    #[test]
    fn test_console_messages() {
        let input = Path::new("/no/such/input.csv");
        let err = Analysis::load(AnalysisConfig::default().with_input(input)).unwrap_err();
        assert_eq!(
            err.console_message(input),
            "Error: file /no/such/input.csv was not found."
        );

        let config = AnalysisConfig::default().with_count_column("nope");
        let analysis = Analysis::from_table(config, sample_table()).unwrap();
        let err = analysis.occurrences().unwrap_err();
        assert_eq!(
            err.console_message(input),
            "Error processing file: count: Missing column: nope"
        );
    }

    #[test]
    fn test_render_failure_is_tagged() {
        let dir = tempdir().unwrap();
        let config = AnalysisConfig::default()
            .with_report_path(dir.path().join("missing").join("report.pdf"));
        let analysis = Analysis::from_table(config, sample_table()).unwrap();
        let stats = analysis.statistics().unwrap();
        let err = analysis.render_report(&stats).unwrap_err();
        assert_eq!(err.stage, Stage::Report);
        assert_eq!(err.kind(), ErrorKind::Processing);
    }
}
