//! Database initialization: schema creation in dependency order.

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{
    Error,
    account::create_account_table,
    bill::{create_bill_instance_table, create_bill_table, create_biller_table},
    category::create_category_table,
    fuel::create_fuel_entry_table,
    transaction::create_transaction_table,
    user::create_user_table,
    vehicle::create_vehicle_table,
};

/// Create the application's tables and enable foreign key enforcement.
///
/// Safe to call on an already initialized database: every table is created
/// with `IF NOT EXISTS`.
///
/// # Errors
/// Returns an error if a table cannot be created or if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let sql_transaction =
        SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&sql_transaction)?;
    create_category_table(&sql_transaction)?;
    create_account_table(&sql_transaction)?;
    create_transaction_table(&sql_transaction)?;
    create_biller_table(&sql_transaction)?;
    create_bill_table(&sql_transaction)?;
    create_bill_instance_table(&sql_transaction)?;
    create_vehicle_table(&sql_transaction)?;
    create_fuel_entry_table(&sql_transaction)?;

    sql_transaction.commit()?;

    Ok(())
}

#[cfg(test)]
mod db_tests {
    use rusqlite::Connection;

    use super::initialize;

    #[test]
    fn initialize_succeeds_on_empty_database() {
        let conn = Connection::open_in_memory().unwrap();

        assert!(initialize(&conn).is_ok());
    }

    #[test]
    fn initialize_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        initialize(&conn).unwrap();

        assert!(initialize(&conn).is_ok());
    }
}
