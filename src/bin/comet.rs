//! `comet NAME [-t TIME] [-c LAT LON [-e ELEV]] [-d DAYS]`
//!
//! Prints the designation and instant, the RA/DEC of the comet, its altitude/azimuth when an
//! observer is given, and with `-d` a rise/set table in the local zone.
use std::process::ExitCode;

use chrono::{DateTime, Local, SecondsFormat, Utc};
use clap::{CommandFactory, Parser};
use tracing::warn;

use almanac::{
    almanac::Almanac,
    almanac_errors::AlmanacError,
    logging,
    observers::ObserverLocation,
    position::compute_position,
    riseset::{format_schedule, schedule},
    time::{parse_datetime, utc_to_epoch},
};

#[derive(Parser, Debug)]
#[command(
    name = "comet",
    version,
    about = "Sky position and rise/set times of a comet",
    after_help = "COMET_NAME may be partial, e.g. '2020 F3'. Every designation containing it is \
                  listed when it matches several comets."
)]
struct Cli {
    /// Comet name or part of it (case-sensitive)
    comet_name: Option<String>,

    /// Instant of the position; zone-less values are local time [default: now]
    #[arg(short = 't', long = "time", value_name = "TIME")]
    time: Option<String>,

    /// Observer latitude and longitude in degrees (east positive)
    #[arg(
        short = 'c',
        long = "coords",
        num_args = 2,
        value_names = ["LAT", "LON"],
        allow_negative_numbers = true
    )]
    coords: Option<Vec<f64>>,

    /// Observer elevation in meters, used with --coords
    #[arg(short = 'e', long = "elevation", value_name = "ELEV", default_value_t = 0.0)]
    elevation: f64,

    /// Number of days of rise/set times, needs --coords
    #[arg(short = 'd', long = "days", value_name = "NUMDAYS", default_value_t = 0)]
    days: u32,

    /// Catalog source: "mpc" or "file:<path to CometEls.txt>"
    #[arg(long, default_value = "mpc")]
    catalog: String,

    /// Log debug information on stderr
    #[arg(short, long)]
    verbose: bool,
}

fn observer_from(cli: &Cli) -> Result<Option<ObserverLocation>, AlmanacError> {
    match cli.coords.as_deref() {
        None => Ok(None),
        Some(&[latitude, longitude]) => {
            ObserverLocation::new(latitude, longitude, cli.elevation).map(Some)
        }
        Some(other) => Err(AlmanacError::InvalidObserver(format!(
            "expected LAT LON, got {other:?}"
        ))),
    }
}

fn run(cli: &Cli, comet_name: &str) -> Result<(), AlmanacError> {
    let almanac = Almanac::new(&cli.catalog)?;

    let instant: DateTime<Utc> = match &cli.time {
        Some(text) => parse_datetime(text, &Local)?,
        None => Utc::now(),
    };
    let observer = observer_from(cli)?;
    if cli.days > 0 && observer.is_none() {
        warn!("--days ignored without --coords");
    }

    let Some(record) = almanac.lookup(comet_name)? else {
        return Ok(());
    };

    let epoch = utc_to_epoch(&instant);
    println!(
        "{}    {}",
        record.designation,
        instant.to_rfc3339_opts(SecondsFormat::Secs, true)
    );

    let position = compute_position(almanac.ephemeris(), record, &epoch, observer.as_ref())?;
    println!("{position}");

    if let Some(observer) = observer.as_ref().filter(|_| cli.days > 0) {
        let rows = schedule(
            almanac.ephemeris(),
            record,
            observer,
            &epoch,
            cli.days,
            &Local,
        )?;
        println!();
        println!("Rise and set times from {observer}");
        print!("{}", format_schedule(&rows));
    }
    Ok(())
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

    let Some(comet_name) = cli.comet_name.as_deref() else {
        let _ = Cli::command().print_help();
        return ExitCode::FAILURE;
    };

    match run(&cli, comet_name) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("comet: {e}");
            ExitCode::FAILURE
        }
    }
}
