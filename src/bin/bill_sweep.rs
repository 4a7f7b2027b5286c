use std::error::Error;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Date, OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description};

use tracing_subscriber::EnvFilter;

use tallybook::bill::generate_bill_instances;

const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// The scheduled sweep that generates pending instances for bills due this month.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// The reference date for the sweep as YYYY-MM-DD. Defaults to today.
    #[arg(long)]
    date: Option<String>,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();

    let reference = match args.date {
        Some(raw_date) => match Date::parse(&raw_date, DATE_FORMAT) {
            Ok(date) => date,
            Err(error) => {
                eprintln!("'{raw_date}' is not a valid YYYY-MM-DD date: {error}");
                exit(1);
            }
        },
        None => OffsetDateTime::now_local()
            .unwrap_or_else(|_| OffsetDateTime::now_utc())
            .date(),
    };

    let connection = Connection::open(&args.db_path)?;

    generate_bill_instances(reference, &connection)?;

    Ok(())
}
