//! Categories classify transactions as income or expense and sign the balance
//! delta a transaction applies to its account.
//!
//! A handful of fixed-name categories are used for system-generated
//! transactions (fuel purchases and balance reconciliation). Those are an
//! operator precondition: they must exist before the flows that use them run,
//! and they are resolved once into a [SystemCategories] mapping rather than
//! looked up by string on every call.

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};

use crate::{Error, database_id::CategoryId};

/// The name of the category used for fuel purchase transactions.
pub const FUEL_CATEGORY: &str = "Fuel";
/// The name of the category used when reconciliation finds missing income.
pub const RECONCILE_INCOME_CATEGORY: &str = "Reconciliation-Inc";
/// The name of the category used when reconciliation finds missing expenses.
pub const RECONCILE_EXPENSE_CATEGORY: &str = "Reconciliation-Exp";

/// Whether transactions in a category add to or subtract from an account's
/// balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryKind {
    /// Money flowing into the account.
    Income,
    /// Money flowing out of the account.
    Expense,
}

impl CategoryKind {
    fn as_str(self) -> &'static str {
        match self {
            CategoryKind::Income => "income",
            CategoryKind::Expense => "expense",
        }
    }
}

impl ToSql for CategoryKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for CategoryKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "income" => Ok(CategoryKind::Income),
            "expense" => Ok(CategoryKind::Expense),
            other => Err(FromSqlError::Other(
                format!("\"{other}\" is not a valid category kind").into(),
            )),
        }
    }
}

/// A label for grouping transactions, e.g. "Groceries", "Fuel", "Salary".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// The ID of the category.
    pub id: CategoryId,
    /// The name of the category. Unique within the database.
    pub name: String,
    /// Whether the category represents income or an expense.
    pub kind: CategoryKind,
}

/// Create a category and return it with its generated ID.
pub fn create_category(
    name: &str,
    kind: CategoryKind,
    connection: &Connection,
) -> Result<Category, Error> {
    connection.execute(
        "INSERT INTO category (name, kind) VALUES (?1, ?2);",
        (name, kind),
    )?;

    let id = connection.last_insert_rowid();

    Ok(Category {
        id,
        name: name.to_owned(),
        kind,
    })
}

/// Retrieve a single category by ID.
pub fn get_category(category_id: CategoryId, connection: &Connection) -> Result<Category, Error> {
    connection
        .prepare("SELECT id, name, kind FROM category WHERE id = :id;")?
        .query_row(&[(":id", &category_id)], map_row)
        .map_err(|error| error.into())
}

/// Retrieve a single category by its exact name.
///
/// # Errors
/// Returns [Error::MissingCategory] if no category with that name exists.
pub fn get_category_by_name(name: &str, connection: &Connection) -> Result<Category, Error> {
    connection
        .prepare("SELECT id, name, kind FROM category WHERE name = :name;")?
        .query_row(&[(":name", &name)], map_row)
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::MissingCategory(name.to_owned()),
            error => error.into(),
        })
}

/// Create the category table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            kind TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_category_name ON category(name);",
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let id = row.get(0)?;
    let name = row.get(1)?;
    let kind = row.get(2)?;

    Ok(Category { id, name, kind })
}

/// The IDs of the fixed-name categories used by system-generated transactions.
///
/// Resolve this once at startup (or before the first system flow runs) and pass
/// it into [crate::fuel::record_fuel_entry] and
/// [crate::account::reconcile_account].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SystemCategories {
    /// The expense category for fuel purchases.
    pub fuel: CategoryId,
    /// The income category for positive reconciliation adjustments.
    pub reconcile_income: CategoryId,
    /// The expense category for negative reconciliation adjustments.
    pub reconcile_expense: CategoryId,
}

impl SystemCategories {
    /// Look up the fixed-name categories and capture their IDs.
    ///
    /// # Errors
    /// Returns [Error::MissingCategory] naming the first absent category. The
    /// categories are never created here; their existence is an operator
    /// precondition.
    pub fn resolve(connection: &Connection) -> Result<Self, Error> {
        Ok(Self {
            fuel: get_category_by_name(FUEL_CATEGORY, connection)?.id,
            reconcile_income: get_category_by_name(RECONCILE_INCOME_CATEGORY, connection)?.id,
            reconcile_expense: get_category_by_name(RECONCILE_EXPENSE_CATEGORY, connection)?.id,
        })
    }
}

#[cfg(test)]
mod category_tests {
    use rusqlite::Connection;

    use crate::{Error, db::initialize};

    use super::{CategoryKind, create_category, get_category, get_category_by_name};

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    #[test]
    fn create_and_get_category() {
        let conn = get_test_connection();

        let created = create_category("Groceries", CategoryKind::Expense, &conn).unwrap();
        let got = get_category(created.id, &conn).unwrap();

        assert_eq!(created, got);
        assert_eq!(got.kind, CategoryKind::Expense);
    }

    #[test]
    fn get_by_name_finds_exact_match() {
        let conn = get_test_connection();
        let created = create_category("Salary", CategoryKind::Income, &conn).unwrap();

        let got = get_category_by_name("Salary", &conn).unwrap();

        assert_eq!(created, got);
    }

    #[test]
    fn get_by_name_fails_with_missing_category() {
        let conn = get_test_connection();

        let result = get_category_by_name("Fuel", &conn);

        assert_eq!(result, Err(Error::MissingCategory("Fuel".to_owned())));
    }
}
