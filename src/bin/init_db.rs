use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;

use tallybook::{
    category::{
        CategoryKind, FUEL_CATEGORY, RECONCILE_EXPENSE_CATEGORY, RECONCILE_INCOME_CATEGORY,
        create_category,
    },
    db::initialize,
};

/// A utility for creating an empty tallybook database with the fixed system
/// categories seeded.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize(&conn)?;

    println!("Seeding system categories...");

    create_category(FUEL_CATEGORY, CategoryKind::Expense, &conn)?;
    create_category(RECONCILE_INCOME_CATEGORY, CategoryKind::Income, &conn)?;
    create_category(RECONCILE_EXPENSE_CATEGORY, CategoryKind::Expense, &conn)?;

    println!("Success!");

    Ok(())
}
