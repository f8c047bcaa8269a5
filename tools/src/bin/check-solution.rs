//! # `check-solution`
//!
//! A small tool for checking a result record against a multiple courier
//! routing instance.

use std::{fs::File, io, path::PathBuf};

use anyhow::Context;
use clap::Parser;
use mcrsat::instance::Instance;
use mcrsat_tools::utils;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The instance to check the solution against
    instance: PathBuf,
    /// The JSON result record. If not specified, will be read from `stdin`.
    record: Option<PathBuf>,
    /// Accept couriers that deliver nothing
    #[arg(long)]
    allow_empty_routes: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let inst = Instance::from_path(&args.instance)
        .with_context(|| format!("error parsing instance {}", args.instance.display()))?;

    let record = if let Some(path) = args.record {
        let file =
            File::open(&path).with_context(|| format!("failed to open {}", path.display()))?;
        utils::read_record(io::BufReader::new(file))?
    } else {
        utils::read_record(io::stdin().lock())?
    };

    match utils::check_record(&inst, &record, args.allow_empty_routes) {
        Ok(sol) => {
            println!("objective value: {}", sol.objective);
            if !record.optimal {
                println!("not claimed optimal");
            }
            Ok(())
        }
        Err(err) => {
            println!("invalid solution: {err:#}");
            std::process::exit(1);
        }
    }
}
