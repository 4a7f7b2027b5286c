//! The vehicle model: an odometer reading with a name attached.

use rusqlite::{Connection, Row};

use crate::{
    Error,
    database_id::{UserId, VehicleId},
};

/// A vehicle whose fuel economy is being tracked.
#[derive(Debug, Clone, PartialEq)]
pub struct Vehicle {
    /// The ID of the vehicle.
    pub id: VehicleId,
    /// The user that owns the vehicle.
    pub user_id: UserId,
    /// The display name of the vehicle, e.g. "Corolla".
    pub name: String,
    /// The current odometer reading in kilometers. Overwritten by each fuel
    /// entry; monotonicity is enforced by caller-side validation, not here.
    pub kilometers: i64,
}

/// Create a vehicle and return it with its generated ID.
pub fn create_vehicle(
    user_id: UserId,
    name: &str,
    kilometers: i64,
    connection: &Connection,
) -> Result<Vehicle, Error> {
    connection.execute(
        "INSERT INTO vehicle (user_id, name, kilometers) VALUES (?1, ?2, ?3);",
        (user_id, name, kilometers),
    )?;

    let id = connection.last_insert_rowid();

    Ok(Vehicle {
        id,
        user_id,
        name: name.to_owned(),
        kilometers,
    })
}

/// Retrieve a single vehicle by ID.
pub fn get_vehicle(vehicle_id: VehicleId, connection: &Connection) -> Result<Vehicle, Error> {
    connection
        .prepare("SELECT id, user_id, name, kilometers FROM vehicle WHERE id = :id;")?
        .query_row(&[(":id", &vehicle_id)], map_row)
        .map_err(|error| error.into())
}

/// Overwrite a vehicle's odometer reading.
pub(crate) fn set_kilometers(
    vehicle_id: VehicleId,
    kilometers: i64,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE vehicle SET kilometers = ?1 WHERE id = ?2",
        (kilometers, vehicle_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Create the vehicle table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_vehicle_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS vehicle (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            kilometers INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Vehicle, rusqlite::Error> {
    let id = row.get(0)?;
    let user_id = row.get(1)?;
    let name = row.get(2)?;
    let kilometers = row.get(3)?;

    Ok(Vehicle {
        id,
        user_id,
        name,
        kilometers,
    })
}
