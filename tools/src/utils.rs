//! # Shared Helpers of the Tools

use std::{
    fs::File,
    io::{self, Write},
    path::Path,
};

use anyhow::Context;
use log::LevelFilter;
use mcrsat::{
    decode::{check_routes, Solution},
    instance::Instance,
    solve::ResultRecord,
};

/// Sets up `env_logger`: warnings by default, `info` with one `-v`, `debug`
/// with two and `trace` beyond. `RUST_LOG` still overrides this.
pub fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp_millis()
        .init();
}

/// Reads a result record in JSON
///
/// # Errors
///
/// If reading fails or the input is not a result record.
pub fn read_record<R: io::Read>(reader: R) -> anyhow::Result<ResultRecord> {
    serde_json::from_reader(reader).context("error parsing the result record")
}

/// Writes a result record as pretty JSON to a file, or to `stdout` if no
/// path is given
///
/// # Errors
///
/// If the file cannot be created or writing fails.
pub fn write_record(record: &ResultRecord, path: Option<&Path>) -> anyhow::Result<()> {
    let mut writer: Box<dyn Write> = match path {
        Some(path) => Box::new(io::BufWriter::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    };
    serde_json::to_writer_pretty(&mut writer, record)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// Checks a result record against an instance and returns the solution it
/// describes
///
/// # Errors
///
/// If the record has no solution, uses item number zero or the solution
/// violates the instance.
pub fn check_record(
    inst: &Instance,
    record: &ResultRecord,
    allow_empty_routes: bool,
) -> anyhow::Result<Solution> {
    let objective = record
        .objective
        .context("the result record holds no solution")?;
    let routes = record
        .routes()
        .context("item numbers in result records start at 1")?;
    let (loads, distances) = check_routes(inst, &routes)?;
    let sol = Solution {
        objective,
        distances,
        loads,
        routes,
    };
    sol.check(inst, allow_empty_routes)?;
    Ok(sol)
}
