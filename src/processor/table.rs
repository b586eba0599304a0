use chrono::{NaiveDate, NaiveDateTime};
use memchr::memchr_iter;
use memmap2::Mmap;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use std::{fs::File, io::ErrorKind, ops::Range, path::Path, str};
use tracing::{debug, info, warn};

use crate::processor::{
    ParseError, ProcessorError, Value,
    column::{Column, ColumnType, StrSpan},
};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];

/// Bytes backing the string cells of a table
#[derive(Debug)]
enum Buffer {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl Buffer {
    fn as_bytes(&self) -> &[u8] {
        match self {
            Buffer::Mapped(mmap) => &mmap[..],
            Buffer::Owned(bytes) => bytes,
        }
    }
}

/// What the non-empty cells of one column could all be parsed as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TypeFlags {
    seen: bool,
    int: bool,
    numeric: bool,
    datetime: bool,
}

impl Default for TypeFlags {
    fn default() -> Self {
        Self {
            seen: false,
            int: true,
            numeric: true,
            datetime: true,
        }
    }
}

impl TypeFlags {
    fn observe(&mut self, field: &[u8]) {
        self.seen = true;
        if self.int {
            self.int = atoi_simd::parse::<i64>(field).is_ok();
        }
        if self.numeric && !self.int {
            self.numeric = fast_float::parse::<f64, _>(field).is_ok();
        }
        if self.datetime {
            self.datetime = str::from_utf8(field)
                .ok()
                .and_then(parse_datetime)
                .is_some();
        }
    }

    fn merge(self, other: Self) -> Self {
        Self {
            seen: self.seen || other.seen,
            int: self.int && other.int,
            numeric: self.numeric && other.numeric,
            datetime: self.datetime && other.datetime,
        }
    }

    /// Narrowest type holding every observed cell
    fn column_type(self) -> ColumnType {
        match self {
            // nothing observed: an all-missing numeric column
            TypeFlags { seen: false, .. } => ColumnType::Float64,
            TypeFlags { int: true, .. } => ColumnType::Int64,
            TypeFlags { numeric: true, .. } => ColumnType::Float64,
            TypeFlags { datetime: true, .. } => ColumnType::DateTime,
            _ => ColumnType::Str,
        }
    }
}

/// Parsed output of one newline-aligned chunk
struct BatchResult {
    columns: Vec<Column>,
    row_count: usize,
    line_count: usize,
    errors: Vec<ParseError>,
}

/// Immutable, column-oriented table of typed cells
///
/// Rows keep the order of the source. Once built the table is never mutated,
/// so it can be shared by reference across worker threads.
///
/// # Examples
///
/// ```rust,no_run
/// # use transaction_analyzer::processor::table::Table;
/// let table = Table::load_csv("transactions.csv".as_ref()).unwrap();
/// println!("{} rows, columns {:?}", table.row_count(), table.headers());
/// ```
#[derive(Debug)]
pub struct Table {
    buffer: Buffer,
    columns: Vec<Column>,
    headers: Vec<String>,
    row_count: usize,
    parse_errors: Vec<ParseError>,
}

impl Table {
    /// Loads a CSV file using memory mapping
    ///
    /// Column types (int, float, datetime, string) are inferred from every
    /// data row, so a column widens to the narrowest type that holds all of
    /// its cells. Empty fields become missing cells. Rows with the wrong
    /// number of fields are skipped and recorded in [`Table::parse_errors`].
    ///
    /// # Errors
    /// Returns a [`ProcessorError`] if:
    /// - the file does not exist ([`ProcessorError::NotFound`])
    /// - the file cannot be opened or mapped
    /// - the file has no header line
    pub fn load_csv(path: &Path) -> Result<Self, ProcessorError> {
        let file = File::open(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ProcessorError::NotFound(path.to_path_buf()),
            _ => ProcessorError::Io(e),
        })?;

        if file.metadata()?.len() == 0 {
            return Err(ProcessorError::Parse("Missing header line".into()));
        }

        let mmap = unsafe { Mmap::map(&file)? };
        let buf: &[u8] = &mmap[..];

        // Parse header
        let header_end = memchr::memchr(b'\n', buf).unwrap_or(buf.len());
        let header_line = trim_cr(&buf[..header_end]);
        let header_line = header_line.strip_prefix(UTF8_BOM).unwrap_or(header_line);
        if header_line.iter().all(|b| b.is_ascii_whitespace()) {
            return Err(ProcessorError::Parse("Missing header line".into()));
        }
        let headers: Vec<String> = header_line
            .split(|&b| b == b',')
            .map(|s| String::from_utf8_lossy(s).trim().to_string())
            .collect();

        let data_start = (header_end + 1).min(buf.len());
        let data = &buf[data_start..];

        // Find chunk boundaries (split by newlines)
        let num_threads = rayon::current_num_threads();
        let chunks = Self::find_chunk_boundaries(data, num_threads);

        let schema = Self::infer_schema(data, &chunks, headers.len());

        let estimated_rows_per_chunk = data.len() / num_threads.max(1) / 16 + 16;

        let batch_results: Vec<BatchResult> = chunks
            .par_iter()
            .map(|(start, end)| {
                Self::parse_chunk(
                    &data[*start..*end],
                    &schema,
                    &headers,
                    estimated_rows_per_chunk,
                    data_start + start, // Absolute offset in file
                )
            })
            .collect();

        // Merge batch results into chunked columns
        let mut columns: Vec<Column> = schema.iter().map(|t| Column::new(*t)).collect();
        let mut row_count = 0;
        let mut lines_before = 0;
        let mut parse_errors = Vec::new();

        for batch in batch_results {
            row_count += batch.row_count;
            // header line + 1-based numbering
            parse_errors.extend(batch.errors.into_iter().map(|mut e| {
                e.row += lines_before + 2;
                e
            }));
            lines_before += batch.line_count;

            for (col, part) in columns.iter_mut().zip(batch.columns) {
                append_column(col, part);
            }
        }

        for col in columns.iter_mut() {
            col.flatten_in_place();
        }

        for err in &parse_errors {
            warn!(
                row = err.row,
                column = %err.column,
                value = %err.value,
                "skipped unparsable cell"
            );
        }
        info!(
            path = %path.display(),
            rows = row_count,
            columns = headers.len(),
            chunks = chunks.len(),
            parse_errors = parse_errors.len(),
            "loaded table"
        );

        Ok(Table {
            buffer: Buffer::Mapped(mmap),
            columns,
            headers,
            row_count,
            parse_errors,
        })
    }

    /// Builds a table from in-memory rows
    ///
    /// Each column's type is taken from its non-missing values. Ints and floats
    /// may mix (the column becomes float); any other mix is a
    /// [`ProcessorError::TypeMismatch`]. A column with no values is float.
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self, ProcessorError> {
        if let Some((idx, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != headers.len())
        {
            return Err(ProcessorError::Parse(format!(
                "Row {} has {} fields, expected {}",
                idx,
                row.len(),
                headers.len()
            )));
        }

        let mut schema = Vec::with_capacity(headers.len());
        for (col_idx, name) in headers.iter().enumerate() {
            schema.push(Self::column_type_of(name, rows.iter().map(|r| &r[col_idx]))?);
        }

        let mut bytes = Vec::new();
        let mut columns = Vec::with_capacity(headers.len());

        for (col_idx, col_type) in schema.iter().enumerate() {
            let cells = rows.iter().map(|r| &r[col_idx]);
            let column = match col_type {
                ColumnType::Int64 => Column::Int64(vec![
                    cells
                        .map(|v| match v {
                            Value::Int(i) => Some(*i),
                            _ => None,
                        })
                        .collect(),
                ]),
                ColumnType::Float64 => Column::Float64(vec![cells.map(|v| v.as_f64()).collect()]),
                ColumnType::DateTime => Column::DateTime(vec![
                    cells
                        .map(|v| match v {
                            Value::DateTime(d) => Some(*d),
                            _ => None,
                        })
                        .collect(),
                ]),
                ColumnType::Str => Column::Str(vec![
                    cells
                        .map(|v| match v {
                            Value::Str(s) => {
                                let start = bytes.len();
                                bytes.extend_from_slice(s.as_bytes());
                                Some((start, bytes.len()))
                            }
                            _ => None,
                        })
                        .collect(),
                ]),
            };
            columns.push(column);
        }

        Ok(Table {
            buffer: Buffer::Owned(bytes),
            columns,
            headers,
            row_count: rows.len(),
            parse_errors: Vec::new(),
        })
    }

    fn column_type_of<'a>(
        name: &str,
        values: impl Iterator<Item = &'a Value>,
    ) -> Result<ColumnType, ProcessorError> {
        let mut current: Option<ColumnType> = None;

        for value in values {
            let seen = match value {
                Value::Null => continue,
                Value::Int(_) => ColumnType::Int64,
                Value::Float(_) => ColumnType::Float64,
                Value::DateTime(_) => ColumnType::DateTime,
                Value::Str(_) => ColumnType::Str,
            };
            current = match (current, seen) {
                (None, t) => Some(t),
                (Some(a), b) if a == b => Some(a),
                (Some(ColumnType::Int64), ColumnType::Float64)
                | (Some(ColumnType::Float64), ColumnType::Int64) => Some(ColumnType::Float64),
                (Some(a), b) => {
                    return Err(ProcessorError::TypeMismatch {
                        column: name.to_string(),
                        expected: a.to_string(),
                        found: b.to_string(),
                    });
                }
            };
        }

        Ok(current.unwrap_or(ColumnType::Float64))
    }

    fn infer_schema(data: &[u8], chunks: &[(usize, usize)], num_cols: usize) -> Vec<ColumnType> {
        chunks
            .par_iter()
            .map(|(start, end)| Self::infer_chunk(&data[*start..*end], num_cols))
            .reduce(
                || vec![TypeFlags::default(); num_cols],
                |a, b| a.into_iter().zip(b).map(|(x, y)| x.merge(y)).collect(),
            )
            .into_iter()
            .map(TypeFlags::column_type)
            .collect()
    }

    fn infer_chunk(chunk: &[u8], num_cols: usize) -> Vec<TypeFlags> {
        let mut flags = vec![TypeFlags::default(); num_cols];
        let mut fields: Vec<&[u8]> = Vec::with_capacity(num_cols);

        for line in chunk.split(|&b| b == b'\n').map(trim_cr) {
            if line.is_empty() {
                continue;
            }
            fields.clear();
            fields.extend(line.split(|&b| b == b','));
            // malformed rows are skipped when parsing too
            if fields.len() != num_cols {
                continue;
            }
            for (flag, field) in flags.iter_mut().zip(&fields) {
                let field = trim_ascii(field);
                if !field.is_empty() {
                    flag.observe(field);
                }
            }
        }

        flags
    }

    fn find_chunk_boundaries(data: &[u8], num_chunks: usize) -> Vec<(usize, usize)> {
        if data.is_empty() {
            return vec![];
        }

        let num_chunks = num_chunks.max(1);
        let chunk_size = data.len() / num_chunks;
        let mut boundaries = Vec::with_capacity(num_chunks);
        let mut start = 0;

        for i in 0..num_chunks - 1 {
            let mut end = ((i + 1) * chunk_size).max(start);

            // Find next newline
            while end < data.len() && data[end] != b'\n' {
                end += 1;
            }

            if end < data.len() {
                end += 1; // Include the newline
            }

            if start < end {
                boundaries.push((start, end));
            }
            start = end;
        }

        // Last chunk gets everything remaining
        if start < data.len() {
            boundaries.push((start, data.len()));
        }

        boundaries
    }

    fn parse_chunk(
        chunk: &[u8],
        schema: &[ColumnType],
        headers: &[String],
        estimated_rows: usize,
        chunk_offset: usize, // Absolute offset of this chunk in the file
    ) -> BatchResult {
        let num_cols = schema.len();

        let mut int64_cols: Vec<Vec<Option<i64>>> = vec![Vec::new(); num_cols];
        let mut float64_cols: Vec<Vec<Option<f64>>> = vec![Vec::new(); num_cols];
        let mut datetime_cols: Vec<Vec<Option<NaiveDateTime>>> = vec![Vec::new(); num_cols];
        let mut str_cols: Vec<Vec<StrSpan>> = vec![Vec::new(); num_cols];
        for (i, col_type) in schema.iter().enumerate() {
            match col_type {
                ColumnType::Int64 => int64_cols[i].reserve(estimated_rows),
                ColumnType::Float64 => float64_cols[i].reserve(estimated_rows),
                ColumnType::DateTime => datetime_cols[i].reserve(estimated_rows),
                ColumnType::Str => str_cols[i].reserve(estimated_rows),
            }
        }

        let mut errors = Vec::new();
        let mut row_count = 0;
        let mut line_count = 0;
        let mut fields = Vec::with_capacity(num_cols);

        // Every line, including a final one without a trailing newline
        let mut line_bounds = Vec::new();
        let mut start = 0;
        for newline_pos in memchr_iter(b'\n', chunk) {
            line_bounds.push((start, newline_pos));
            start = newline_pos + 1;
        }
        if start < chunk.len() {
            line_bounds.push((start, chunk.len()));
        }

        for (line_start, line_end) in line_bounds {
            let line_idx = line_count;
            line_count += 1;

            let line = trim_cr(&chunk[line_start..line_end]);
            if line.is_empty() {
                continue;
            }

            let absolute_line_offset = chunk_offset + line_start;

            // Split line into fields
            fields.clear();
            let mut field_start = 0;
            for comma_pos in memchr_iter(b',', line) {
                fields.push((field_start, comma_pos));
                field_start = comma_pos + 1;
            }
            fields.push((field_start, line.len()));

            if fields.len() != num_cols {
                errors.push(ParseError {
                    row: line_idx,
                    column: "".to_string(),
                    value: format!("Expected {} fields, got {}", num_cols, fields.len()),
                    error: None,
                });
                continue;
            }

            for col_idx in 0..num_cols {
                let (fs, fe) = fields[col_idx];
                let (fs, fe) = trim_span(line, fs, fe);
                let raw = &line[fs..fe];

                let mut record = |error: String| {
                    errors.push(ParseError {
                        row: line_idx,
                        column: headers[col_idx].clone(),
                        value: String::from_utf8_lossy(raw).to_string(),
                        error: Some(error),
                    })
                };

                match schema[col_idx] {
                    ColumnType::Int64 => {
                        let cell = if raw.is_empty() {
                            None
                        } else {
                            match atoi_simd::parse::<i64>(raw) {
                                Ok(value) => Some(value),
                                Err(e) => {
                                    record(e.to_string());
                                    None
                                }
                            }
                        };
                        int64_cols[col_idx].push(cell);
                    }
                    ColumnType::Float64 => {
                        let cell = if raw.is_empty() {
                            None
                        } else {
                            match fast_float::parse::<f64, _>(raw) {
                                Ok(value) => Some(value),
                                Err(e) => {
                                    record(e.to_string());
                                    None
                                }
                            }
                        };
                        float64_cols[col_idx].push(cell);
                    }
                    ColumnType::DateTime => {
                        let cell = if raw.is_empty() {
                            None
                        } else {
                            let parsed = str::from_utf8(raw).ok().and_then(parse_datetime);
                            if parsed.is_none() {
                                record("invalid datetime".to_string());
                            }
                            parsed
                        };
                        datetime_cols[col_idx].push(cell);
                    }
                    ColumnType::Str => {
                        // Store absolute offset into the buffer
                        let cell = if raw.is_empty() {
                            None
                        } else {
                            Some((absolute_line_offset + fs, absolute_line_offset + fe))
                        };
                        str_cols[col_idx].push(cell);
                    }
                }
            }

            row_count += 1;
        }

        let columns = schema
            .iter()
            .enumerate()
            .map(|(i, col_type)| match col_type {
                ColumnType::Int64 => Column::Int64(vec![std::mem::take(&mut int64_cols[i])]),
                ColumnType::Float64 => Column::Float64(vec![std::mem::take(&mut float64_cols[i])]),
                ColumnType::DateTime => {
                    Column::DateTime(vec![std::mem::take(&mut datetime_cols[i])])
                }
                ColumnType::Str => Column::Str(vec![std::mem::take(&mut str_cols[i])]),
            })
            .collect();

        debug!(rows = row_count, lines = line_count, "parsed chunk");

        BatchResult {
            columns,
            row_count,
            line_count,
            errors,
        }
    }

    /// String cell contents from its byte span
    pub fn get_string(&self, span: (usize, usize)) -> &str {
        let (start, end) = span;
        self.buffer
            .as_bytes()
            .get(start..end)
            .and_then(|bytes| str::from_utf8(bytes).ok())
            .unwrap_or("")
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn parse_errors(&self) -> &[ParseError] {
        &self.parse_errors
    }

    /// Header name at a position
    pub fn column_name(&self, idx: usize) -> Result<&str, ProcessorError> {
        self.headers
            .get(idx)
            .map(String::as_str)
            .ok_or(ProcessorError::ColumnIndex(idx))
    }

    pub fn get_col(&self, col_name: &str) -> Result<&Column, ProcessorError> {
        let col_pos = self
            .headers
            .iter()
            .position(|cn| cn == col_name)
            .ok_or_else(|| ProcessorError::MissingColumn(col_name.to_string()))?;

        self.columns
            .get(col_pos)
            .ok_or_else(|| ProcessorError::MissingColumn(col_name.to_string()))
    }

    pub fn column_type(&self, col_name: &str) -> Result<ColumnType, ProcessorError> {
        self.get_col(col_name).map(Column::column_type)
    }

    /// Cells of one column over a row range, as owned [`Value`]s
    pub fn values<'a>(
        &'a self,
        col: &'a Column,
        rows: Range<usize>,
    ) -> Box<dyn Iterator<Item = Value> + 'a> {
        match col {
            Column::Int64(_) => Box::new(col.iter_i64(rows).map(|c| c.map_or(Value::Null, Value::Int))),
            Column::Float64(_) => {
                Box::new(col.iter_f64(rows).map(|c| c.map_or(Value::Null, Value::Float)))
            }
            Column::DateTime(_) => Box::new(
                col.iter_datetime(rows)
                    .map(|c| c.map_or(Value::Null, Value::DateTime)),
            ),
            Column::Str(_) => Box::new(col.iter_str(rows).map(move |c| {
                c.map_or(Value::Null, |span| {
                    Value::Str(self.get_string(span).to_string())
                })
            })),
        }
    }

    /// Single cell as an owned [`Value`]
    pub fn value(&self, col: &Column, row: usize) -> Value {
        self.values(col, row..row + 1).next().unwrap_or(Value::Null)
    }

    /// All cells of one row, in header order
    pub fn row(&self, row: usize) -> Vec<Value> {
        self.columns.iter().map(|col| self.value(col, row)).collect()
    }
}

fn append_column(target: &mut Column, part: Column) {
    match (target, part) {
        (Column::Int64(dst), Column::Int64(src)) => dst.extend(src),
        (Column::Float64(dst), Column::Float64(src)) => dst.extend(src),
        (Column::DateTime(dst), Column::DateTime(src)) => dst.extend(src),
        (Column::Str(dst), Column::Str(src)) => dst.extend(src),
        // batches are built from the same schema
        _ => unreachable!("column batch type mismatch"),
    }
}

/// Parses the datetime and date layouts accepted in CSV input
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn trim_cr(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r").unwrap_or(line)
}

fn trim_ascii(field: &[u8]) -> &[u8] {
    let (s, e) = trim_span(field, 0, field.len());
    &field[s..e]
}

fn trim_span(line: &[u8], mut start: usize, mut end: usize) -> (usize, usize) {
    while start < end && line[start].is_ascii_whitespace() {
        start += 1;
    }
    while end > start && line[end - 1].is_ascii_whitespace() {
        end -= 1;
    }
    (start, end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn load_from_str(csv: &str) -> Table {
        let mut tmp = NamedTempFile::new().unwrap();
        write!(tmp, "{}", csv).unwrap();
        Table::load_csv(tmp.path()).unwrap()
    }

    #[test]
    fn test_row_count() {
        let table = load_from_str("id,value\n1,10\n2,20\n3,30\n");
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.headers(), &["id".to_string(), "value".to_string()]);
    }

    #[test]
    fn test_schema_inference() {
        let table = load_from_str(
            "store,amount,when,qty\nA,10.5,2019-12-10 10:00:00,1\nB,3,2019-12-12,2\n",
        );
        assert_eq!(table.column_type("store").unwrap(), ColumnType::Str);
        assert_eq!(table.column_type("amount").unwrap(), ColumnType::Float64);
        assert_eq!(table.column_type("when").unwrap(), ColumnType::DateTime);
        assert_eq!(table.column_type("qty").unwrap(), ColumnType::Int64);
    }

    #[test]
    fn test_last_line_without_newline_is_loaded() {
        let table = load_from_str("cat,value\nA,1\nB,2");
        assert_eq!(table.row_count(), 2);
        let col = table.get_col("cat").unwrap();
        assert_eq!(table.value(col, 1), Value::from("B"));
    }

    #[test]
    fn test_crlf_and_missing_cells() {
        let table = load_from_str("cat,value\r\nA,1\r\n,\r\nC,3\r\n");
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.row(1), vec![Value::Null, Value::Null]);
        assert_eq!(table.row(2), vec![Value::from("C"), Value::Int(3)]);
    }

    #[test]
    fn test_malformed_rows_are_recorded() {
        let table = load_from_str("cat,value\nA,1\nD\nB,2\n");

        assert_eq!(table.row_count(), 2);
        assert_eq!(table.row(1), vec![Value::from("B"), Value::Int(2)]);

        let errors = table.parse_errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].row, 3);
        assert!(errors[0].column.is_empty());
    }

    #[test]
    fn test_late_float_widens_int_column() {
        let mut csv = String::from("cat,value\n");
        for _ in 0..1000 {
            csv.push_str("A,10\n");
        }
        csv.push_str("B,1000000.5\n");
        let table = load_from_str(&csv);

        assert_eq!(table.column_type("value").unwrap(), ColumnType::Float64);
        assert!(table.parse_errors().is_empty());
        let col = table.get_col("value").unwrap();
        assert_eq!(table.value(col, 1000), Value::Float(1_000_000.5));
        assert_eq!(table.value(col, 0), Value::Float(10.0));
    }

    #[test]
    fn test_late_text_widens_to_string() {
        let mut csv = String::from("when,value\n");
        for _ in 0..1500 {
            csv.push_str("2019-12-10,1\n");
        }
        csv.push_str("unknown,n/a\n");
        let table = load_from_str(&csv);

        assert_eq!(table.column_type("when").unwrap(), ColumnType::Str);
        assert_eq!(table.column_type("value").unwrap(), ColumnType::Str);
        assert_eq!(
            table.row(1500),
            vec![Value::from("unknown"), Value::from("n/a")]
        );
    }

    #[test]
    fn test_type_flags_merge() {
        let mut ints = TypeFlags::default();
        ints.observe(b"3");
        let mut floats = TypeFlags::default();
        floats.observe(b"2.5");

        assert_eq!(ints.column_type(), ColumnType::Int64);
        assert_eq!(ints.merge(floats).column_type(), ColumnType::Float64);
        assert_eq!(
            ints.merge(TypeFlags::default()).column_type(),
            ColumnType::Int64
        );
        assert_eq!(TypeFlags::default().column_type(), ColumnType::Float64);
    }

    #[test]
    fn test_header_bom_is_stripped() {
        let table = load_from_str("\u{feff}store,amount\nA,1\n");
        assert_eq!(table.headers()[0], "store");
        assert_eq!(table.column_type("store").unwrap(), ColumnType::Str);
    }

    #[test]
    fn test_inference_falls_back_to_string() {
        let table = load_from_str("cat,value\nA,1\nB,oops\n");
        assert_eq!(table.column_type("value").unwrap(), ColumnType::Str);
        assert!(table.parse_errors().is_empty());
    }

    #[test]
    fn test_header_only_is_empty_table() {
        let table = load_from_str("cat,value\n");
        assert!(table.is_empty());
        assert_eq!(table.headers().len(), 2);
        assert_eq!(table.column_type("cat").unwrap(), ColumnType::Float64);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let err = Table::load_csv(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, ProcessorError::NotFound(_)));
    }

    #[test]
    fn test_empty_file_is_parse_error() {
        let tmp = NamedTempFile::new().unwrap();
        let err = Table::load_csv(tmp.path()).unwrap_err();
        assert!(matches!(err, ProcessorError::Parse(_)));
    }

    #[test]
    fn test_chunk_boundaries_cover_data() {
        let data = b"a,1\nb,2\nc,3\nd,4\ne,5\n";
        for n in 1..8 {
            let bounds = Table::find_chunk_boundaries(data, n);
            assert_eq!(bounds.first().map(|b| b.0), Some(0));
            assert_eq!(bounds.last().map(|b| b.1), Some(data.len()));
            for pair in bounds.windows(2) {
                assert_eq!(pair[0].1, pair[1].0);
            }
        }
    }

    #[test]
    fn test_from_rows_mixes_numbers_into_float() {
        let table = Table::from_rows(
            vec!["v".into()],
            vec![vec![Value::Int(1)], vec![Value::Float(2.5)], vec![Value::Null]],
        )
        .unwrap();
        assert_eq!(table.column_type("v").unwrap(), ColumnType::Float64);
        let col = table.get_col("v").unwrap();
        assert_eq!(table.value(col, 0), Value::Float(1.0));
        assert_eq!(table.value(col, 2), Value::Null);
    }

    #[test]
    fn test_from_rows_rejects_mixed_types() {
        let err = Table::from_rows(
            vec!["v".into()],
            vec![vec![Value::Int(1)], vec![Value::from("x")]],
        )
        .unwrap_err();
        assert!(matches!(err, ProcessorError::TypeMismatch { .. }));
    }

    #[test]
    fn test_missing_column() {
        let table = load_from_str("id,value\n1,10\n");
        assert!(matches!(
            table.get_col("nope"),
            Err(ProcessorError::MissingColumn(_))
        ));
        assert!(matches!(
            table.column_name(5),
            Err(ProcessorError::ColumnIndex(5))
        ));
    }
}
