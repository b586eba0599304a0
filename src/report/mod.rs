use std::path::Path;

use crate::processor::{ProcessorError, statistics::StatisticsRecord};

pub mod pdf;
pub mod slides;

pub use pdf::PdfReport;
pub use slides::SlideDeck;

/// Title line shared by every output document
pub const REPORT_TITLE: &str = "Data Analysis Report";

/// Writes a document summarising a [`StatisticsRecord`]
pub trait DocumentRenderer {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    fn render(&self, stats: &StatisticsRecord, path: &Path) -> Result<(), ProcessorError>;
}

/// The three body lines, in document order
pub fn report_lines(stats: &StatisticsRecord) -> [String; 3] {
    [
        format!("Mean: {}", stats.mean),
        format!("Median: {}", stats.median),
        format!("Standard Deviation: {}", stats.std_dev),
    ]
}
