use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime};

use crate::logging::LoggingConfig;
use crate::processor::{
    ProcessorError, Value, column::ColumnType, counter::AggregatorConfig, table::Table,
};

/// Column chosen by header position or by name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnRef {
    Index(usize),
    Name(String),
}

impl ColumnRef {
    /// Header name this reference points at in `table`
    pub fn resolve(&self, table: &Table) -> Result<String, ProcessorError> {
        match self {
            ColumnRef::Index(idx) => table.column_name(*idx).map(str::to_string),
            ColumnRef::Name(name) => {
                table.get_col(name)?;
                Ok(name.clone())
            }
        }
    }
}

impl From<&str> for ColumnRef {
    fn from(name: &str) -> Self {
        ColumnRef::Name(name.to_string())
    }
}

impl From<usize> for ColumnRef {
    fn from(idx: usize) -> Self {
        ColumnRef::Index(idx)
    }
}

/// Settings for one analysis run
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub input: PathBuf,
    pub report_path: PathBuf,
    pub slides_path: PathBuf,
    /// Column whose values are counted
    pub count_column: ColumnRef,
    /// Column summarised by mean/median/standard deviation
    pub stats_column: ColumnRef,
    /// Column compared against the threshold
    pub filter_column: ColumnRef,
    /// Threshold used when the filter column is numeric
    pub numeric_threshold: Value,
    /// Threshold used when the filter column holds datetimes
    pub date_threshold: NaiveDateTime,
    pub aggregator: AggregatorConfig,
    pub logging: LoggingConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("transactions.csv"),
            report_path: PathBuf::from("report.pdf"),
            slides_path: PathBuf::from("presentation.pptx"),
            count_column: ColumnRef::Index(0),
            stats_column: ColumnRef::Index(1),
            filter_column: ColumnRef::Index(1),
            numeric_threshold: Value::Int(10),
            date_threshold: NaiveDate::from_ymd_opt(2019, 12, 11)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .unwrap_or_default(),
            aggregator: AggregatorConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn with_input(mut self, input: impl Into<PathBuf>) -> Self {
        self.input = input.into();
        self
    }

    pub fn with_report_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.report_path = path.into();
        self
    }

    pub fn with_slides_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.slides_path = path.into();
        self
    }

    pub fn with_count_column(mut self, column: impl Into<ColumnRef>) -> Self {
        self.count_column = column.into();
        self
    }

    pub fn with_filter_column(mut self, column: impl Into<ColumnRef>) -> Self {
        self.filter_column = column.into();
        self
    }

    pub fn with_numeric_threshold(mut self, threshold: impl Into<Value>) -> Self {
        self.numeric_threshold = threshold.into();
        self
    }

    pub fn with_aggregator(mut self, aggregator: AggregatorConfig) -> Self {
        self.aggregator = aggregator;
        self
    }

    pub fn with_logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = logging;
        self
    }

    /// Threshold matching the filter column's type
    pub fn threshold_for(&self, col_type: ColumnType) -> Value {
        match col_type {
            ColumnType::DateTime => Value::DateTime(self.date_threshold),
            _ => self.numeric_threshold.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), ProcessorError> {
        self.aggregator.validate()?;
        if self.numeric_threshold.as_f64().is_none() {
            return Err(ProcessorError::InvalidConfig(format!(
                "numeric threshold must be int or float, got {}",
                self.numeric_threshold.type_name()
            )));
        }
        Ok(())
    }
}
