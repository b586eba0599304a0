//! # transaction-analyzer
//!
//! `transaction-analyzer` loads a table of transactional records, summarises
//! it and writes the summary as a PDF report and a slide deck. It supports:
//!
//! - Memory-mapped CSV loading with parallel chunk parsing
//! - Column type inference (int, float, datetime, string) with missing cells
//! - Parallel categorical counting over fixed row partitions on a bounded
//!   Rayon pool, merged into one value -> count mapping
//! - Mean / median / sample standard deviation (AVX2-accelerated sums)
//! - Strictly-greater-than row filtering on numeric or datetime columns
//! - PDF (printpdf) and PPTX (zip) rendering of the statistics
//!
//! # Example
//!
//! ```rust,no_run
//! use transaction_analyzer::processor::{
//!     Value,
//!     counter::{AggregatorConfig, parallel_count},
//!     filter::filter_greater_than,
//!     statistics::calculate_statistics,
//!     table::Table,
//! };
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let table = Table::load_csv(Path::new("transactions.csv"))?;
//!
//!     // Count stores over 4 partitions
//!     let counts = parallel_count(&table, "store", &AggregatorConfig::new(4, 4))?;
//!     println!("Occurrences: {}", counts);
//!
//!     let stats = calculate_statistics(&table, "amount")?;
//!     println!("Statistics: {}", stats);
//!
//!     // Rows with amount > 10
//!     let rows = filter_greater_than(&table, "amount", &Value::Int(10))?;
//!     println!("{}", rows);
//!
//!     Ok(())
//! }
//! ```

mod helpers;

pub mod analysis;
pub mod config;
pub mod logging;
pub mod processor;
pub mod report;

pub use analysis::{Analysis, AnalysisError, ErrorKind, Stage};
pub use config::{AnalysisConfig, ColumnRef};
pub use processor::{ProcessorError, Value};
