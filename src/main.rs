//! symfind - symbol reference search
//!
//! Command-line usage:
//!   symfind [query]          - Symbol search (whole word, literal)
//!   symfind /[query]         - Regex search
//!   symfind -r tag [query]   - Definitions enclosing each hit

use anyhow::Context;
use clap::Parser;
use std::process::ExitCode;
use symfind::cli::{render, Cli};
use symfind::{BufferStore, ReferenceFinder, TreeSitterLocator};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match run(&cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::from(2)
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<ExitCode> {
    let request = cli.request()?;
    let context = cli.context();
    let config = cli.load_config().context("Failed to load configuration")?;

    let finder = ReferenceFinder::new(config);
    let Some(result) = finder.find(&request, &context)? else {
        eprintln!("No matches for `{}`", request.query());
        return Ok(ExitCode::from(1));
    };

    let locator = TreeSitterLocator::new();
    let buffers = BufferStore::new();
    let entries = render(&result, request.result_kind(), &locator, &buffers, cli.json)?;
    if entries.is_empty() {
        eprintln!("No definitions found for `{}`", request.query());
        return Ok(ExitCode::from(1));
    }
    for entry in entries {
        println!("{}", entry);
    }
    Ok(ExitCode::SUCCESS)
}
