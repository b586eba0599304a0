use std::cmp::Ordering;
use std::fmt;

use tracing::debug;

use crate::processor::{ProcessorError, Value, column::ColumnType, table::Table};

/// Rows of a table picked by a filter, in original order
#[derive(Debug, Clone)]
pub struct RowSelection<'a> {
    table: &'a Table,
    rows: Vec<usize>,
}

impl<'a> RowSelection<'a> {
    pub fn new(table: &'a Table, rows: Vec<usize>) -> Self {
        Self { table, rows }
    }

    /// Positions of the selected rows in the table
    pub fn indices(&self) -> &[usize] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Selected cells of one column
    pub fn values(&self, column: &str) -> Result<Vec<Value>, ProcessorError> {
        let col = self.table.get_col(column)?;
        Ok(self
            .rows
            .iter()
            .map(|&row| self.table.value(col, row))
            .collect())
    }
}

impl fmt::Display for RowSelection<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "row,{}", self.table.headers().join(","))?;
        for &row in &self.rows {
            let cells: Vec<String> = self
                .table
                .row(row)
                .iter()
                .map(|v| v.to_string())
                .collect();
            writeln!(f, "{},{}", row, cells.join(","))?;
        }
        write!(
            f,
            "[{} rows x {} columns]",
            self.rows.len(),
            self.table.headers().len()
        )
    }
}

/// Rows whose `column` value is strictly greater than `threshold`
///
/// Numeric columns take an int or float threshold, datetime columns a
/// datetime threshold. Missing cells never match.
///
/// # Errors
/// - [`ProcessorError::MissingColumn`] if `column` is not in the table
/// - [`ProcessorError::TypeMismatch`] if the threshold cannot be compared
///   with the column's values
pub fn filter_greater_than<'a>(
    table: &'a Table,
    column: &str,
    threshold: &Value,
) -> Result<RowSelection<'a>, ProcessorError> {
    let col = table.get_col(column)?;

    match (col.column_type(), threshold) {
        (ColumnType::Int64 | ColumnType::Float64, Value::Int(_) | Value::Float(_))
        | (ColumnType::DateTime, Value::DateTime(_)) => {}
        (col_type, value) => {
            return Err(ProcessorError::TypeMismatch {
                column: column.to_string(),
                expected: col_type.to_string(),
                found: value.type_name().to_string(),
            });
        }
    }

    let rows: Vec<usize> = table
        .values(col, 0..table.row_count())
        .enumerate()
        .filter(|(_, v)| v.compare(threshold) == Some(Ordering::Greater))
        .map(|(i, _)| i)
        .collect();

    debug!(column, %threshold, matched = rows.len(), "filtered rows");
    Ok(RowSelection::new(table, rows))
}
