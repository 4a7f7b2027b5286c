//! The transaction model and its database queries.

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    database_id::{AccountId, CategoryId, TransactionId, UserId},
    money,
};

/// Which mutation path created a transaction, and therefore which account
/// field its effect was applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionSource {
    /// An ordinary income or expense entry against an account's balance.
    Normal,
    /// A credit-card entry; its effect lives on the account's remaining
    /// available credit rather than its balance.
    CreditCard,
    /// An adjustment synthesized by account reconciliation.
    Reconciliation,
}

impl TransactionSource {
    fn as_str(self) -> &'static str {
        match self {
            TransactionSource::Normal => "normal",
            TransactionSource::CreditCard => "credit_card",
            TransactionSource::Reconciliation => "reconciliation",
        }
    }
}

impl ToSql for TransactionSource {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for TransactionSource {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "normal" => Ok(TransactionSource::Normal),
            "credit_card" => Ok(TransactionSource::CreditCard),
            "reconciliation" => Ok(TransactionSource::Reconciliation),
            other => Err(FromSqlError::Other(
                format!("\"{other}\" is not a valid transaction source").into(),
            )),
        }
    }
}

/// An expense or income, i.e. an event where money was either spent or earned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user that owns the transaction.
    pub user_id: UserId,
    /// The account the transaction was applied to.
    pub account_id: AccountId,
    /// The category the transaction belongs to.
    pub category_id: CategoryId,
    /// The amount of money spent or earned. Always positive; the category
    /// kind and source decide the direction of the ledger effect.
    pub amount: Decimal,
    /// When the transaction happened.
    pub date: Date,
    /// A text description of what the transaction was for.
    pub description: String,
    /// The mutation path that created the transaction.
    pub source: TransactionSource,
}

/// The fields needed to create a [Transaction].
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// The user that owns the transaction.
    pub user_id: UserId,
    /// The account to apply the transaction to.
    pub account_id: AccountId,
    /// The category the transaction belongs to.
    pub category_id: CategoryId,
    /// The amount of money spent or earned. Must be positive; validation is a
    /// caller concern. Rounded to 2 decimal places on entry.
    pub amount: Decimal,
    /// When the transaction happened.
    pub date: Date,
    /// A text description of what the transaction was for.
    pub description: String,
    /// Explicit source override. Leave as `None` for the default routing
    /// (`credit_card` for credit-card accounts, `normal` otherwise).
    pub source: Option<TransactionSource>,
}

/// Retrieve a transaction from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_transaction(id: TransactionId, connection: &Connection) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "SELECT id, user_id, account_id, category_id, amount, date, description, source
             FROM \"transaction\" WHERE id = :id",
        )?
        .query_row(&[(":id", &id)], map_transaction_row)?;

    Ok(transaction)
}

/// Insert a transaction row without touching any account field.
///
/// The ledger adjustment is the caller's responsibility; both must happen
/// inside the same SQLite transaction.
pub(crate) fn insert_transaction_row(
    new: &NewTransaction,
    amount_cents: i64,
    source: TransactionSource,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection.execute(
        "INSERT INTO \"transaction\" (user_id, account_id, category_id, amount, date, description, source)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        (
            new.user_id,
            new.account_id,
            new.category_id,
            amount_cents,
            new.date,
            &new.description,
            source,
        ),
    )?;

    let id = connection.last_insert_rowid();

    Ok(Transaction {
        id,
        user_id: new.user_id,
        account_id: new.account_id,
        category_id: new.category_id,
        amount: money::from_cents(amount_cents),
        date: new.date,
        description: new.description.clone(),
        source,
    })
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            account_id INTEGER NOT NULL,
            category_id INTEGER NOT NULL,
            amount INTEGER NOT NULL,
            date TEXT NOT NULL,
            description TEXT NOT NULL,
            source TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY(account_id) REFERENCES account(id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_transaction_account ON \"transaction\"(account_id);
        CREATE INDEX IF NOT EXISTS idx_transaction_date ON \"transaction\"(date);",
    )?;

    Ok(())
}

pub(crate) fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let user_id = row.get(1)?;
    let account_id = row.get(2)?;
    let category_id = row.get(3)?;
    let amount_cents: i64 = row.get(4)?;
    let date = row.get(5)?;
    let description = row.get(6)?;
    let source = row.get(7)?;

    Ok(Transaction {
        id,
        user_id,
        account_id,
        category_id,
        amount: money::from_cents(amount_cents),
        date,
        description,
        source,
    })
}
