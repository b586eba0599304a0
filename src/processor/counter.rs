use std::collections::HashMap;
use std::fmt;
use std::ops::Range;

use rayon::ThreadPool;
use rayon::ThreadPoolBuilder;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use tracing::{debug, info};

use crate::processor::{ProcessorError, Value, column::Column, table::Table};

/// Number of partitions the original workload was split into
pub const DEFAULT_PARTITIONS: usize = 4;

/// Value -> number of rows holding it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountMapping {
    counts: HashMap<Value, u64>,
}

impl CountMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `n` to the running total of `value`
    pub fn add(&mut self, value: Value, n: u64) {
        *self.counts.entry(value).or_insert(0) += n;
    }

    pub fn get(&self, value: &Value) -> u64 {
        self.counts.get(value).copied().unwrap_or(0)
    }

    /// Number of distinct values
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Number of counted rows
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, u64)> {
        self.counts.iter().map(|(k, v)| (k, *v))
    }

    /// Folds another mapping into this one
    pub fn merge(&mut self, other: CountMapping) {
        for (value, n) in other.counts {
            self.add(value, n);
        }
    }

    /// Entries by descending count, ties by the value's text
    pub fn sorted(&self) -> Vec<(&Value, u64)> {
        let mut entries: Vec<(&Value, u64)> = self.iter().collect();
        entries.sort_by(|a, b| {
            b.1.cmp(&a.1)
                .then_with(|| a.0.to_string().cmp(&b.0.to_string()))
        });
        entries
    }
}

impl FromIterator<(Value, u64)> for CountMapping {
    fn from_iter<I: IntoIterator<Item = (Value, u64)>>(iter: I) -> Self {
        let mut mapping = CountMapping::new();
        for (value, n) in iter {
            mapping.add(value, n);
        }
        mapping
    }
}

impl fmt::Display for CountMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (value, n)) in self.sorted().into_iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", value, n)?;
        }
        write!(f, "}}")
    }
}

/// Counts each distinct value of `column` over a range of rows
///
/// Missing cells are counted under [`Value::Null`].
///
/// # Errors
/// - [`ProcessorError::MissingColumn`] if `column` is not in the table
/// - [`ProcessorError::InvalidRange`] if `rows` reaches past the table
pub fn count_occurrences(
    table: &Table,
    column: &str,
    rows: Range<usize>,
) -> Result<CountMapping, ProcessorError> {
    let col = table.get_col(column)?;

    if rows.start > rows.end || rows.end > table.row_count() {
        return Err(ProcessorError::InvalidRange {
            start: rows.start,
            end: rows.end,
            rows: table.row_count(),
        });
    }

    let mut counts = CountMapping::new();
    match col {
        Column::Int64(_) => {
            for cell in col.iter_i64(rows) {
                counts.add(cell.map_or(Value::Null, Value::Int), 1);
            }
        }
        Column::Float64(_) => {
            for cell in col.iter_f64(rows) {
                counts.add(cell.map_or(Value::Null, Value::Float), 1);
            }
        }
        Column::DateTime(_) => {
            for cell in col.iter_datetime(rows) {
                counts.add(cell.map_or(Value::Null, Value::DateTime), 1);
            }
        }
        Column::Str(_) => {
            // count borrowed keys first, allocate once per distinct value
            let mut local: HashMap<Option<&str>, u64> = HashMap::new();
            for span in col.iter_str(rows) {
                *local.entry(span.map(|s| table.get_string(s))).or_insert(0) += 1;
            }
            for (key, n) in local {
                counts.add(key.map_or(Value::Null, Value::from), n);
            }
        }
    }

    Ok(counts)
}

/// Splits `0..row_count` into `partitions` contiguous ranges
///
/// Every range holds `row_count / partitions` rows and the last one also
/// takes the remainder, so the ranges concatenate back to `0..row_count`.
pub fn partition_rows(
    row_count: usize,
    partitions: usize,
) -> Result<Vec<Range<usize>>, ProcessorError> {
    if partitions == 0 {
        return Err(ProcessorError::InvalidConfig(
            "partition count must be at least 1".into(),
        ));
    }

    let size = row_count / partitions;
    let ranges = (0..partitions)
        .map(|i| {
            let start = i * size;
            let end = if i + 1 == partitions {
                row_count
            } else {
                start + size
            };
            start..end
        })
        .collect();

    Ok(ranges)
}

/// Adds partial mappings together
pub fn merge_counts<I>(partials: I) -> CountMapping
where
    I: IntoIterator<Item = CountMapping>,
{
    partials
        .into_iter()
        .fold(CountMapping::new(), |mut acc, partial| {
            acc.merge(partial);
            acc
        })
}

/// Partitioning and worker pool settings for [`parallel_count`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregatorConfig {
    /// Number of row partitions
    pub partitions: usize,
    /// Worker threads in the bounded pool
    pub workers: usize,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            partitions: DEFAULT_PARTITIONS,
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(DEFAULT_PARTITIONS),
        }
    }
}

impl AggregatorConfig {
    pub fn new(partitions: usize, workers: usize) -> Self {
        Self {
            partitions,
            workers,
        }
    }

    pub fn validate(&self) -> Result<(), ProcessorError> {
        if self.partitions == 0 {
            return Err(ProcessorError::InvalidConfig(
                "partition count must be at least 1".into(),
            ));
        }
        if self.workers == 0 {
            return Err(ProcessorError::InvalidConfig(
                "worker count must be at least 1".into(),
            ));
        }
        Ok(())
    }

    fn build_pool(&self) -> Result<ThreadPool, ProcessorError> {
        ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("counter-{}", i))
            .build()
            .map_err(|e| ProcessorError::WorkerPool(e.to_string()))
    }
}

/// Counts `column` over the whole table on a bounded worker pool
///
/// The table is split into `config.partitions` ranges, each counted by one
/// pool task, and the partial mappings are merged on the calling thread.
/// If any partition fails the first error is returned and no mapping is
/// produced.
///
/// # Example
/// ```rust,no_run
/// # use transaction_analyzer::processor::{table::Table, counter::{parallel_count, AggregatorConfig}};
/// let table = Table::load_csv("transactions.csv".as_ref()).unwrap();
/// let counts = parallel_count(&table, "store", &AggregatorConfig::default()).unwrap();
/// println!("{}", counts);
/// ```
pub fn parallel_count(
    table: &Table,
    column: &str,
    config: &AggregatorConfig,
) -> Result<CountMapping, ProcessorError> {
    config.validate()?;
    let partitions = partition_rows(table.row_count(), config.partitions)?;
    let pool = config.build_pool()?;

    debug!(
        column,
        workers = config.workers,
        sizes = ?partitions.iter().map(|r| r.len()).collect::<Vec<_>>(),
        "dispatching partitions"
    );

    let partials: Vec<CountMapping> = pool.install(|| {
        partitions
            .par_iter()
            .map(|rows| count_occurrences(table, column, rows.clone()))
            .collect::<Result<Vec<_>, _>>()
    })?;

    let merged = merge_counts(partials);
    info!(
        column,
        partitions = config.partitions,
        distinct = merged.len(),
        "counted occurrences"
    );

    Ok(merged)
}
