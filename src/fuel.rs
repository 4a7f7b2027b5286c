//! Fuel entry recording: a fuel purchase, an odometer update, and the
//! matching expense transaction in one unit of work.

use rusqlite::{Connection, Row};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    category::{FUEL_CATEGORY, SystemCategories, get_category},
    database_id::{AccountId, FuelEntryId, UserId, VehicleId},
    money,
    transaction::{NewTransaction, create_transaction_in},
    vehicle::{get_vehicle, set_kilometers},
};

/// A recorded fuel purchase for a vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuelEntry {
    /// The ID of the fuel entry.
    pub id: FuelEntryId,
    /// The user that owns the entry.
    pub user_id: UserId,
    /// The vehicle that was fuelled.
    pub vehicle_id: VehicleId,
    /// The account the purchase was paid from.
    pub account_id: AccountId,
    /// When the purchase happened.
    pub date: Date,
    /// The odometer reading at the time of the purchase, in kilometers.
    pub odometer_reading: i64,
    /// The amount of fuel purchased, in liters.
    pub fuel_quantity: Decimal,
    /// The cost of the purchase.
    pub amount: Decimal,
    /// The name of the fuel station.
    pub station: String,
}

/// The fields needed to record a [FuelEntry].
#[derive(Debug, Clone, PartialEq)]
pub struct NewFuelEntry {
    /// The user that owns the entry.
    pub user_id: UserId,
    /// The vehicle that was fuelled. Ownership checks are a caller concern.
    pub vehicle_id: VehicleId,
    /// The account to pay the purchase from.
    pub account_id: AccountId,
    /// When the purchase happened.
    pub date: Date,
    /// The odometer reading at the time of the purchase. Callers validate
    /// that this exceeds the vehicle's current reading.
    pub odometer_reading: i64,
    /// The amount of fuel purchased, in liters.
    pub fuel_quantity: Decimal,
    /// The cost of the purchase. Rounded to 2 decimal places on entry.
    pub amount: Decimal,
    /// The name of the fuel station.
    pub station: String,
}

/// Record a fuel purchase: the fuel entry row, the vehicle's new odometer
/// reading, and the expense transaction against the paying account, all in
/// one atomic unit.
///
/// The expense transaction goes through the ordinary creation path with the
/// fixed "Fuel" category and the description "Fuel for {vehicle name}", so a
/// credit-card account routes to the credit-limit path exactly as a manual
/// entry would.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the vehicle or account does not exist,
/// - [Error::MissingCategory] if the "Fuel" category is absent,
/// - or [Error::SqlError] if there is some other SQL error.
///
/// On any error none of the four effects persist.
pub fn record_fuel_entry(
    new: NewFuelEntry,
    categories: &SystemCategories,
    connection: &Connection,
) -> Result<FuelEntry, Error> {
    let sql_transaction = connection.unchecked_transaction()?;

    let vehicle = get_vehicle(new.vehicle_id, &sql_transaction)?;
    let fuel_category = match get_category(categories.fuel, &sql_transaction) {
        Err(Error::NotFound) => Err(Error::MissingCategory(FUEL_CATEGORY.to_owned())),
        other => other,
    }?;

    let amount_cents = money::to_cents(new.amount)?;

    // The expense entry runs first so a missing account fails the whole unit
    // before any fuel-specific rows are written.
    create_transaction_in(
        NewTransaction {
            user_id: new.user_id,
            account_id: new.account_id,
            category_id: fuel_category.id,
            amount: new.amount,
            date: new.date,
            description: format!("Fuel for {}", vehicle.name),
            source: None,
        },
        &sql_transaction,
    )?;

    sql_transaction.execute(
        "INSERT INTO fuel_entry
            (user_id, vehicle_id, account_id, date, odometer_reading, fuel_quantity, amount, station)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        (
            new.user_id,
            new.vehicle_id,
            new.account_id,
            new.date,
            new.odometer_reading,
            new.fuel_quantity.to_string(),
            amount_cents,
            &new.station,
        ),
    )?;
    let id = sql_transaction.last_insert_rowid();

    set_kilometers(vehicle.id, new.odometer_reading, &sql_transaction)?;

    sql_transaction.commit()?;

    Ok(FuelEntry {
        id,
        user_id: new.user_id,
        vehicle_id: new.vehicle_id,
        account_id: new.account_id,
        date: new.date,
        odometer_reading: new.odometer_reading,
        fuel_quantity: new.fuel_quantity,
        amount: money::from_cents(amount_cents),
        station: new.station,
    })
}

/// Retrieve a single fuel entry by ID.
pub fn get_fuel_entry(id: FuelEntryId, connection: &Connection) -> Result<FuelEntry, Error> {
    connection
        .prepare(
            "SELECT id, user_id, vehicle_id, account_id, date, odometer_reading,
                    fuel_quantity, amount, station
             FROM fuel_entry WHERE id = :id;",
        )?
        .query_row(&[(":id", &id)], map_row)
        .map_err(|error| error.into())
}

/// Create the fuel entry table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_fuel_entry_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS fuel_entry (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            vehicle_id INTEGER NOT NULL,
            account_id INTEGER NOT NULL,
            date TEXT NOT NULL,
            odometer_reading INTEGER NOT NULL,
            fuel_quantity TEXT NOT NULL,
            amount INTEGER NOT NULL,
            station TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY(vehicle_id) REFERENCES vehicle(id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY(account_id) REFERENCES account(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<FuelEntry, rusqlite::Error> {
    let id = row.get(0)?;
    let user_id = row.get(1)?;
    let vehicle_id = row.get(2)?;
    let account_id = row.get(3)?;
    let date = row.get(4)?;
    let odometer_reading = row.get(5)?;
    let raw_quantity: String = row.get(6)?;
    let amount_cents: i64 = row.get(7)?;
    let station = row.get(8)?;

    let fuel_quantity = raw_quantity.parse::<Decimal>().map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(
            6,
            rusqlite::types::Type::Text,
            Box::new(error),
        )
    })?;

    Ok(FuelEntry {
        id,
        user_id,
        vehicle_id,
        account_id,
        date,
        odometer_reading,
        fuel_quantity,
        amount: money::from_cents(amount_cents),
        station,
    })
}
