//! `icalview [-f text|remind] FILE...`
//!
//! Prints the event of each iCalendar file, in the order given. A file that cannot be read
//! or parsed is reported on stderr and the next one is processed; the exit code is then 1.
use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Parser, ValueEnum};

use almanac::{
    calendar::{extract_file, render_reminder, render_text},
    logging,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Readable block with start, end, summary, location and description
    Text,
    /// One line for remind(1)
    Remind,
}

#[derive(Parser, Debug)]
#[command(name = "icalview", version, about = "Show the event of iCalendar files")]
struct Cli {
    /// Output format
    #[arg(short = 'f', long = "format", value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Input .ics files
    #[arg(required = true)]
    files: Vec<Utf8PathBuf>,

    /// Log debug information on stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };
    logging::init_tracing(cli.verbose);

    let mut failed = false;
    for path in &cli.files {
        match extract_file(path) {
            Ok(event) => match cli.format {
                Format::Text => print!("{}", render_text(&event)),
                Format::Remind => println!("{}", render_reminder(&event)),
            },
            Err(e) => {
                eprintln!("icalview: {path}: {e}");
                failed = true;
            }
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
