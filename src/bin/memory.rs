use std::path::PathBuf;

use transaction_analyzer::processor::{
    counter::{AggregatorConfig, parallel_count},
    table::Table,
};

#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _profiler = dhat::Profiler::new_heap();

    let path: PathBuf = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("transactions.csv"));
    let table = Table::load_csv(&path)?;

    let column = table.column_name(0)?.to_string();
    let counts = parallel_count(&table, &column, &AggregatorConfig::default())?;

    println!(
        "Counted {} distinct values. See dhat-heap.json for details",
        counts.len()
    );
    Ok(())
}
