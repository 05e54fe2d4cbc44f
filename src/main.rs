//! CLI entry point: a thin wrapper around the `row_stream` library.

use std::io::{self, Write};
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use row_stream::config::{Command, Config};
use row_stream::logger::init_logger_with;
use row_stream::{BatchFilter, MalformedAge, RecordFormat, SqliteStore, UserTable};

fn main() {
    let config = Config::parse();

    if let Err(e) = init_logger_with(config.log_level.into(), config.log_format) {
        eprintln!("row_stream error: failed to initialize logger: {e}");
        process::exit(1);
    }

    if let Err(e) = run(config) {
        eprintln!("row_stream error: {e:#}");
        process::exit(1);
    }
}

fn run(config: Config) -> Result<()> {
    let store = SqliteStore::new(config.sqlite_config());
    let users = UserTable::new(&store, config.table.clone());
    info!(
        "reading table {} from {}",
        users.name(),
        config.db.display()
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match config.command {
        Command::Stream { limit } => {
            let records = users.stream_records().take(limit.unwrap_or(usize::MAX));
            for record in records {
                let record = record.context("streaming records failed")?;
                writeln!(out, "{record}")?;
            }
        }
        Command::Batches {
            batch_size,
            skip_malformed,
            json,
        } => {
            let filter = BatchFilter::new(batch_size)
                .with_malformed_age(if skip_malformed {
                    MalformedAge::Skip
                } else {
                    MalformedAge::Fail
                })
                .with_format(if json {
                    RecordFormat::Json
                } else {
                    RecordFormat::Plain
                });
            let written = users
                .process_batches_with(filter, &mut out)
                .context("batch processing failed")?;
            info!("{written} users older than 25");
        }
        Command::Paginate {
            page_size,
            max_pages,
        } => {
            let pages = users
                .lazy_paginate(page_size)?
                .take(max_pages.unwrap_or(usize::MAX));
            for (index, page) in pages.enumerate() {
                let page = page.with_context(|| format!("fetching page {index} failed"))?;
                info!("page {index}: {} users", page.len());
                for record in page {
                    writeln!(out, "{record}")?;
                }
            }
        }
        Command::Average => {
            let average = users
                .print_average()
                .context("computing average age failed")?;
            info!("{average:?}");
        }
    }

    out.flush()?;
    Ok(())
}
