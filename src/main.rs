// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Command-line interface for bru2md.
//!
//! This binary provides the `bru2md` command for turning a Bruno collection
//! directory into a tree of Markdown documentation.

use bru2md::{collection, emitter, renderer};
use lexopt::prelude::*;
use snafu::prelude::*;
use std::path::PathBuf;

const DEFAULT_OUTPUT: &str = "bruno-docs";

struct Cli {
    input: PathBuf,
    output: PathBuf,
    show_disabled: bool,
    heading_offset: u8,
    quiet: bool,
    dry_run: bool,
}

#[derive(Debug, Snafu)]
enum Error {
    #[snafu(display("failed to parse arguments: {source}"))]
    ParseArgs { source: lexopt::Error },

    #[snafu(display("failed to load collection"))]
    Load { source: collection::Error },

    #[snafu(display("failed to write documentation"))]
    Emit { source: emitter::Error },
}

fn print_help() {
    println!(
        "\
{name} {version}
Convert a Bruno API collection to Markdown documentation

Usage: {name} [OPTIONS] <COLLECTION>

Arguments:
  <COLLECTION>  Path to the root directory of the Bruno collection

Options:
  -o, --output <DIR>        Output directory (default: {default_output})
      --heading-offset <N>  Shift heading levels by N (0-5, default: 0)
      --show-disabled       Include disabled params and headers (default: off)
      --hide-disabled       Hide disabled params and headers

Other options:
  -q, --quiet               Suppress progress messages (including --dry-run output)
  -n, --dry-run             Show what would be written without writing
  -h, --help                Print help
  -V, --version             Print version",
        name = env!("CARGO_PKG_NAME"),
        version = env!("CARGO_PKG_VERSION"),
        default_output = DEFAULT_OUTPUT,
    );
}

fn parse_args() -> Result<Cli, lexopt::Error> {
    // Show help if no arguments provided
    if std::env::args().len() == 1 {
        print_help();
        std::process::exit(0);
    }

    let mut input: Option<PathBuf> = None;
    let mut output = PathBuf::from(DEFAULT_OUTPUT);
    let mut show_disabled = false;
    let mut heading_offset: u8 = 0;
    let mut quiet = false;
    let mut dry_run = false;

    let mut parser = lexopt::Parser::from_env();
    while let Some(arg) = parser.next()? {
        match arg {
            Short('o') | Long("output") => output = parser.value()?.parse()?,
            // Show/hide flags - last one wins
            Long("show-disabled") => show_disabled = true,
            Long("hide-disabled") => show_disabled = false,
            Long("heading-offset") => {
                let val: u8 = parser
                    .value()?
                    .parse()
                    .map_err(|_| "heading-offset must be a number 0-5")?;
                if val > 5 {
                    return Err("heading-offset must be 0-5".into());
                }
                heading_offset = val;
            }
            Short('q') | Long("quiet") => quiet = true,
            Short('n') | Long("dry-run") => dry_run = true,
            Short('h') | Long("help") => {
                print_help();
                std::process::exit(0);
            }
            Short('V') | Long("version") => {
                println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            Value(val) if input.is_none() => input = Some(val.parse()?),
            _ => return Err(arg.unexpected()),
        }
    }

    Ok(Cli {
        input: input.ok_or("missing required argument: <COLLECTION>")?,
        output,
        show_disabled,
        heading_offset,
        quiet,
        dry_run,
    })
}

#[snafu::report]
fn main() -> Result<(), Error> {
    let cli = parse_args().context(ParseArgsSnafu)?;

    let collection = collection::load_collection(&cli.input).context(LoadSnafu)?;
    if !cli.quiet {
        eprintln!(
            "Converting collection '{}' into {}",
            collection.name,
            cli.output.display()
        );
    }

    let opts = renderer::RenderOptions {
        heading_offset: cli.heading_offset,
        show_disabled: cli.show_disabled,
    };

    let mut count = 0usize;
    for page in emitter::render_collection(&collection, &opts) {
        if cli.dry_run {
            if !cli.quiet {
                eprintln!("Would write {}", cli.output.join(&page.path).display());
            }
        } else {
            let path = emitter::write_output(&cli.output, &page).context(EmitSnafu)?;
            if !cli.quiet {
                eprintln!("Wrote {}", path.display());
            }
        }
        count += 1;
    }

    if !cli.quiet {
        if cli.dry_run {
            eprintln!("Would write {count} files");
        } else {
            eprintln!("Wrote {count} files");
        }
    }
    Ok(())
}
