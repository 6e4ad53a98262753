// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

// CLI entrypoint for slotfill.

use std::fs;
use std::path::PathBuf;
use std::process;

use clap::Parser;

use slotfill::core::error::{ErrorKind, SourceError};
use slotfill::core::report::{format_with_context, use_color};
use slotfill::optimizer;
use slotfill::syntax::{parser, printer, resolve};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const USAGE: &str = "usage: slotfill <file.s>";

#[derive(Parser, Debug)]
#[command(
    name = "slotfill",
    version = VERSION,
    about = "SPARC assembly delay-slot optimizer: replaces delay-slot nops with safe instructions"
)]
struct Cli {
    /// Input SPARC assembly source file
    input: Vec<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    if cli.input.len() != 1 {
        println!("{USAGE}");
        process::exit(1);
    }
    let path = &cli.input[0];
    let name = path.display().to_string();

    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            let err = SourceError::new(ErrorKind::Io, format!("cannot open {name}: {err}"));
            eprintln!("{}", format_with_context(&err, &[], use_color()));
            process::exit(1);
        }
    };

    match run(&name, &source) {
        Ok(text) => print!("{text}"),
        Err(err) => {
            let lines: Vec<String> = source.lines().map(str::to_string).collect();
            eprintln!("{}", format_with_context(&err, &lines, use_color()));
            process::exit(1);
        }
    }
}

fn run(name: &str, source: &str) -> Result<String, SourceError> {
    let mut unit = parser::parse(Some(name), source)?;
    resolve::resolve_labels(&unit);
    optimizer::run(&mut unit)?;
    Ok(printer::render(&unit))
}
