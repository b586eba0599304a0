use clap::Parser;
use rand::Rng;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

/// Writes a synthetic transactions CSV for trying out the analyzer
#[derive(Parser, Debug)]
#[command(name = "data_generator")]
struct Args {
    #[arg(default_value = "transactions.csv")]
    path: PathBuf,

    #[arg(default_value_t = 1_000_000)]
    rows: usize,
}

fn main() -> std::io::Result<()> {
    let args = Args::parse();
    let file = File::create(&args.path)?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "store,amount,date,payment")?;

    let stores = ["Centauro", "Renner", "C&A", "Riachuelo", "Americanas", "Kalunga"];
    let payments = ["credit", "debit", "cash", "pix"];

    let mut rng = rand::rng();
    for _ in 0..args.rows {
        let store = stores[rng.random_range(0..stores.len())];
        let amount: f64 = rng.random_range(1.0..500.0);
        let day = rng.random_range(1..=31);
        // a few missing amounts, like a real export
        if rng.random_range(0..100) == 0 {
            writeln!(writer, "{},,2019-12-{:02},{}", store, day, payments[rng.random_range(0..4)])?;
        } else {
            writeln!(
                writer,
                "{},{:.2},2019-12-{:02},{}",
                store,
                amount,
                day,
                payments[rng.random_range(0..4)]
            )?;
        }
    }

    writer.flush()?;
    println!("Sample CSV generated: {}", args.path.display());
    Ok(())
}
