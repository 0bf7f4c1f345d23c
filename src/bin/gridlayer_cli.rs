//! CLI tool for gridlayer - loads CSV data and prints the visible body grid
//!
//! Usage:
//!   gridlayer_cli <input.csv>                      # Print the grid
//!   gridlayer_cli <input.csv> -c config.json       # With a JSON GridConfig
//!   gridlayer_cli <input.csv> -s state.json        # Restore persisted layer state
//!   gridlayer_cli <input.csv> -o state.json        # Write the layer state after loading
//!
//! Logging goes to stderr and follows `RUST_LOG` (e.g. `RUST_LOG=gridlayer=debug`).

#![allow(clippy::exit)]
#![allow(clippy::indexing_slicing)]

use std::env;
use std::fs;
use std::io::{self, Write};

use gridlayer::{body_stack_from_csv, BodyLayerStack, GridConfig, Layer, Properties};
use tracing_subscriber::EnvFilter;

struct Args {
    input: String,
    config: Option<String>,
    state: Option<String>,
    output: Option<String>,
}

fn parse_args() -> Option<Args> {
    let args: Vec<String> = env::args().skip(1).collect();
    let input = args.first()?.clone();
    let mut parsed = Args {
        input,
        config: None,
        state: None,
        output: None,
    };
    let mut rest = args.iter().skip(1);
    while let Some(flag) = rest.next() {
        let value = rest.next()?.clone();
        match flag.as_str() {
            "-c" | "--config" => parsed.config = Some(value),
            "-s" | "--state" => parsed.state = Some(value),
            "-o" | "--output" => parsed.output = Some(value),
            _ => return None,
        }
    }
    Some(parsed)
}

fn read(path: &str) -> String {
    match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading {}: {}", path, e);
            std::process::exit(1);
        }
    }
}

fn print_grid(body: &BodyLayerStack, out: &mut impl Write) -> io::Result<()> {
    let columns = body.column_count();
    let header: Vec<String> = (0..columns)
        .map(|c| match body.column_index_by_position(c) {
            Some(index) => format!("[{index}]"),
            None => "[?]".to_string(),
        })
        .collect();
    writeln!(out, "\t{}", header.join("\t"))?;
    for row in 0..body.row_count() {
        let index = body
            .row_index_by_position(row)
            .map_or_else(|| "?".to_string(), |i| i.to_string());
        let cells: Vec<String> = (0..columns)
            .map(|c| body.data_value(c, row).unwrap_or_default().to_string())
            .collect();
        writeln!(out, "{index}\t{}", cells.join("\t"))?;
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let Some(args) = parse_args() else {
        eprintln!("Usage: gridlayer_cli <input.csv> [-c config.json] [-s state.json] [-o state.json]");
        std::process::exit(1);
    };

    let config = match args.config.as_deref().map(|path| GridConfig::from_json(&read(path))) {
        None => GridConfig::default(),
        Some(Ok(config)) => config,
        Some(Err(e)) => {
            eprintln!("Error in configuration: {}", e);
            std::process::exit(1);
        }
    };

    let mut body = match body_stack_from_csv(&read(&args.input), &config) {
        Ok(body) => body,
        Err(e) => {
            eprintln!("Error building grid: {}", e);
            std::process::exit(1);
        }
    };

    if let Some(path) = &args.state {
        match Properties::read_file(path) {
            Ok(properties) => {
                let _ = body.load(&properties);
            }
            Err(e) => {
                eprintln!("Error in state {}: {}", path, e);
                std::process::exit(1);
            }
        }
    }

    let stdout = io::stdout();
    if let Err(e) = print_grid(&body, &mut stdout.lock()) {
        eprintln!("Error writing grid: {}", e);
        std::process::exit(1);
    }

    if let Some(path) = &args.output {
        if let Err(e) = body.save().write_file(path) {
            eprintln!("Error writing {}: {}", path, e);
            std::process::exit(1);
        }
        eprintln!("Written: {}", path);
    }
}
