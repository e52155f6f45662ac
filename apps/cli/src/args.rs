use std::env;
use std::path::PathBuf;

use chart_core::ChartKind;

#[derive(Debug, Default, PartialEq)]
pub struct CliArgs {
    pub tables: Vec<ChartKind>,
    pub config: Option<PathBuf>,
    pub db: Option<PathBuf>,
}

pub fn parse_args() -> Result<CliArgs, String> {
    parse_args_from(env::args().skip(1))
}

pub fn parse_args_from(args: impl IntoIterator<Item = String>) -> Result<CliArgs, String> {
    let mut args = args.into_iter();
    let mut parsed = CliArgs::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--table" => {
                let value = args
                    .next()
                    .ok_or_else(|| "missing value for --table".to_string())?;
                let kind = value.parse::<ChartKind>()?;
                if !parsed.tables.contains(&kind) {
                    parsed.tables.push(kind);
                }
            }
            "--config" => {
                let value = args
                    .next()
                    .ok_or_else(|| "missing value for --config".to_string())?;
                parsed.config = Some(PathBuf::from(value));
            }
            "--db" => {
                let value = args
                    .next()
                    .ok_or_else(|| "missing value for --db".to_string())?;
                parsed.db = Some(PathBuf::from(value));
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            _ => {
                return Err(format!("unknown argument: {arg}"));
            }
        }
    }

    Ok(parsed)
}

pub fn print_help() {
    println!(
        "Last.fm chart ETL\n\n\
Usage:\n  lastfm-etl [--table <top_artists|top_tracks>]... [--config <path>] [--db <path>]\n\n\
Options:\n  --table <name>   Load only this chart table (repeatable; default: tables from config)\n  --config <path>  Read configuration from this file instead of the default location\n  --db <path>      Override the destination database file for this run only\n  -h, --help       Show this help message\n"
    );
}
