//! Tallybook is the ledger core of a personal-finance tracker: accounts,
//! categorized transactions, credit-card balances, recurring bills, and
//! fuel logging for vehicles.
//!
//! This library owns the balance-mutation bookkeeping. Every operation that
//! touches an account's running balance (or a credit card's remaining credit)
//! runs inside a single SQLite transaction and expresses the mutation as a
//! relative update (`SET balance = balance + ?`), so concurrent callers
//! serialize at the database instead of racing at the application layer.
//!
//! HTTP handlers, request validation, and authentication live outside this
//! crate; callers are expected to pass in already-validated, already-authorized
//! input.

#![warn(missing_docs)]

pub mod account;
pub mod bill;
pub mod category;
mod database_id;
pub mod db;
pub mod fuel;
pub mod money;
pub mod transaction;
pub mod user;
pub mod vehicle;

pub use database_id::{
    AccountId, BillId, BillInstanceId, BillerId, CategoryId, DatabaseId, FuelEntryId,
    TransactionId, UserId, VehicleId,
};

/// The errors that may occur in the ledger core.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// A fixed-name system category (e.g. "Fuel") is missing from the database.
    ///
    /// These categories are an operator precondition: they must be created
    /// before the reconciliation and fuel flows run, and are never created
    /// automatically.
    #[error("the required category \"{0}\" is not in the database")]
    MissingCategory(String),

    /// Tried to update a transaction that does not exist.
    #[error("tried to update a transaction that is not in the database")]
    UpdateMissingTransaction,

    /// Tried to delete a transaction that does not exist.
    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction,

    /// A balance adjustment targeted an account that does not exist.
    #[error("tried to update an account that is not in the database")]
    UpdateMissingAccount,

    /// A monetary amount could not be represented as whole cents.
    #[error("the amount {0} cannot be stored as a monetary value")]
    InvalidAmount(String),

    /// A stored frequency code did not match any of the known frequencies.
    ///
    /// Every bill must carry one of the enumerated frequencies; hitting this
    /// error is a programming-contract violation, fatal for that bill only.
    #[error("\"{0}\" is not a valid bill frequency")]
    InvalidFrequency(String),

    /// Date arithmetic produced a date outside the supported calendar range.
    #[error("could not compute date: {0}")]
    InvalidDate(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}
