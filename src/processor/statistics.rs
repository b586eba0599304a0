use std::fmt;

use tracing::debug;

use crate::helpers::simd_helpers::{sum_f64, sum_squared_deviations};
use crate::processor::{ProcessorError, column::Column, table::Table};

/// Mean, median and sample standard deviation of one column
///
/// A statistic that is undefined for the input (empty column, fewer than two
/// values for the deviation, non-numeric column) is `NaN`.
#[derive(Debug, Clone, Copy)]
pub struct StatisticsRecord {
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
}

impl StatisticsRecord {
    pub fn undefined() -> Self {
        Self {
            mean: f64::NAN,
            median: f64::NAN,
            std_dev: f64::NAN,
        }
    }

    /// Computes the record from plain values; NaNs are skipped
    pub fn from_values(values: &[f64]) -> Self {
        let mut values: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        let n = values.len();
        if n == 0 {
            return Self::undefined();
        }

        let mean = sum_f64(&values) / n as f64;

        let std_dev = if n < 2 {
            f64::NAN
        } else {
            (sum_squared_deviations(&values, mean) / (n - 1) as f64).sqrt()
        };

        values.sort_unstable_by(|a, b| a.total_cmp(b));
        let mid = n / 2;
        let median = if n % 2 == 0 {
            (values[mid - 1] + values[mid]) / 2.0
        } else {
            values[mid]
        };

        Self {
            mean,
            median,
            std_dev,
        }
    }
}

impl PartialEq for StatisticsRecord {
    // NaN == NaN here so undefined records compare equal
    fn eq(&self, other: &Self) -> bool {
        self.mean.to_bits() == other.mean.to_bits()
            && self.median.to_bits() == other.median.to_bits()
            && self.std_dev.to_bits() == other.std_dev.to_bits()
    }
}

impl fmt::Display for StatisticsRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{mean: {}, median: {}, std_dev: {}}}",
            self.mean, self.median, self.std_dev
        )
    }
}

/// Computes a [`StatisticsRecord`] over one column
///
/// Missing cells are skipped. Text and datetime columns have no numeric
/// statistics and produce [`StatisticsRecord::undefined`].
///
/// # Errors
/// [`ProcessorError::MissingColumn`] if `column` is not in the table.
pub fn calculate_statistics(
    table: &Table,
    column: &str,
) -> Result<StatisticsRecord, ProcessorError> {
    let col = table.get_col(column)?;
    let rows = 0..table.row_count();

    let values: Vec<f64> = match col {
        Column::Int64(_) => col.iter_i64(rows).flatten().map(|v| v as f64).collect(),
        Column::Float64(_) => col.iter_f64(rows).flatten().collect(),
        Column::DateTime(_) | Column::Str(_) => {
            debug!(column, column_type = %col.column_type(), "non-numeric column");
            return Ok(StatisticsRecord::undefined());
        }
    };

    let record = StatisticsRecord::from_values(&values);
    debug!(column, values = values.len(), %record, "computed statistics");
    Ok(record)
}
