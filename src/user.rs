//! The user model: the owner of accounts, transactions, bills and vehicles.
//!
//! Authentication and session handling live outside this crate; the user row
//! only exists so that the ledger tables have an owner to reference.

use rusqlite::{Connection, Row};

use crate::{Error, database_id::UserId};

/// A person that owns ledger records.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The ID of the user.
    pub id: UserId,
    /// The display name of the user.
    pub name: String,
}

/// Create a user and return it with its generated ID.
pub fn create_user(name: &str, connection: &Connection) -> Result<User, Error> {
    connection.execute("INSERT INTO user (name) VALUES (?1);", (name,))?;

    let id = connection.last_insert_rowid();

    Ok(User {
        id,
        name: name.to_owned(),
    })
}

/// Retrieve a single user by ID.
pub fn get_user(user_id: UserId, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, name FROM user WHERE id = :id;")?
        .query_row(&[(":id", &user_id)], map_row)
        .map_err(|error| error.into())
}

/// Create the user table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<User, rusqlite::Error> {
    let id = row.get(0)?;
    let name = row.get(1)?;

    Ok(User { id, name })
}

#[cfg(test)]
mod user_tests {
    use rusqlite::Connection;

    use crate::{Error, db::initialize};

    use super::{create_user, get_user};

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    #[test]
    fn create_and_get_user() {
        let conn = get_test_connection();

        let created = create_user("Ana", &conn).unwrap();
        let got = get_user(created.id, &conn).unwrap();

        assert_eq!(created, got);
    }

    #[test]
    fn get_missing_user_fails() {
        let conn = get_test_connection();

        assert_eq!(get_user(42, &conn), Err(Error::NotFound));
    }
}
