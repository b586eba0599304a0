use std::fmt;
use std::ops::Range;

use chrono::NaiveDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Int64,
    Float64,
    DateTime,
    Str,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Int64 => "int",
            ColumnType::Float64 => "float",
            ColumnType::DateTime => "datetime",
            ColumnType::Str => "string",
        };
        f.write_str(name)
    }
}

/// Byte range of a string cell inside the table buffer; `None` is a missing cell
pub type StrSpan = Option<(usize, usize)>;

#[derive(Debug, Clone)]
pub enum Column {
    Int64(Vec<Vec<Option<i64>>>),
    Float64(Vec<Vec<Option<f64>>>),
    DateTime(Vec<Vec<Option<NaiveDateTime>>>),
    Str(Vec<Vec<StrSpan>>), // Absolute offsets into the table buffer
}

impl Column {
    pub fn new(col_type: ColumnType) -> Self {
        match col_type {
            ColumnType::Int64 => Column::Int64(Vec::new()),
            ColumnType::Float64 => Column::Float64(Vec::new()),
            ColumnType::DateTime => Column::DateTime(Vec::new()),
            ColumnType::Str => Column::Str(Vec::new()),
        }
    }

    pub fn column_type(&self) -> ColumnType {
        match self {
            Column::Int64(_) => ColumnType::Int64,
            Column::Float64(_) => ColumnType::Float64,
            Column::DateTime(_) => ColumnType::DateTime,
            Column::Str(_) => ColumnType::Str,
        }
    }

    // Iteration over a row range; chunks are walked in order so positions stay global
    pub fn iter_i64(&self, rows: Range<usize>) -> impl Iterator<Item = Option<i64>> + '_ {
        let chunks: &[Vec<Option<i64>>] = match self {
            Column::Int64(chunks) => chunks,
            _ => &[],
        };
        range_iter(chunks, rows)
    }

    pub fn iter_f64(&self, rows: Range<usize>) -> impl Iterator<Item = Option<f64>> + '_ {
        let chunks: &[Vec<Option<f64>>] = match self {
            Column::Float64(chunks) => chunks,
            _ => &[],
        };
        range_iter(chunks, rows)
    }

    pub fn iter_datetime(
        &self,
        rows: Range<usize>,
    ) -> impl Iterator<Item = Option<NaiveDateTime>> + '_ {
        let chunks: &[Vec<Option<NaiveDateTime>>] = match self {
            Column::DateTime(chunks) => chunks,
            _ => &[],
        };
        range_iter(chunks, rows)
    }

    pub fn iter_str(&self, rows: Range<usize>) -> impl Iterator<Item = StrSpan> + '_ {
        let chunks: &[Vec<StrSpan>] = match self {
            Column::Str(chunks) => chunks,
            _ => &[],
        };
        range_iter(chunks, rows)
    }

    pub fn total_len(&self) -> usize {
        match self {
            Column::Int64(chunks) => chunks.iter().map(|c| c.len()).sum(),
            Column::Float64(chunks) => chunks.iter().map(|c| c.len()).sum(),
            Column::DateTime(chunks) => chunks.iter().map(|c| c.len()).sum(),
            Column::Str(chunks) => chunks.iter().map(|c| c.len()).sum(),
        }
    }

    pub fn flatten_in_place(&mut self) {
        match self {
            Column::Int64(chunks) => flatten_chunks(chunks),
            Column::Float64(chunks) => flatten_chunks(chunks),
            Column::DateTime(chunks) => flatten_chunks(chunks),
            Column::Str(chunks) => flatten_chunks(chunks),
        }
    }
}

fn range_iter<T: Copy>(chunks: &[Vec<T>], rows: Range<usize>) -> impl Iterator<Item = T> + '_ {
    let mut offset = 0;
    chunks.iter().flat_map(move |chunk| {
        let chunk_start = offset;
        offset += chunk.len();
        // clip the requested range to this chunk
        let lo = rows.start.clamp(chunk_start, offset) - chunk_start;
        let hi = rows.end.clamp(chunk_start, offset) - chunk_start;
        chunk[lo..hi.max(lo)].iter().copied()
    })
}

fn flatten_chunks<T>(chunks: &mut Vec<Vec<T>>) {
    if chunks.len() <= 1 {
        return; // Already flat
    }

    // Take ownership of chunks, leaving empty vec
    let mut owned_chunks = std::mem::take(chunks);
    let mut flattened = std::mem::take(&mut owned_chunks[0]);

    let total: usize = owned_chunks[1..].iter().map(|c| c.len()).sum();
    flattened.reserve(total);

    // Moves data, no copy
    for chunk in owned_chunks.into_iter().skip(1) {
        flattened.extend(chunk);
    }

    chunks.push(flattened);
}
