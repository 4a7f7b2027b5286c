//! Transactions and the ledger bookkeeping for creating, updating, and
//! deleting them.
//!
//! Each operation here runs in one SQLite transaction covering both the row
//! change and the account adjustment, so money is never lost or double-counted
//! if a step fails partway through.

mod core;
mod create;
mod delete;
mod update;

pub use core::{NewTransaction, Transaction, TransactionSource, create_transaction_table,
    get_transaction};
pub(crate) use core::insert_transaction_row;
pub use create::create_transaction;
pub(crate) use create::create_transaction_in;
pub use delete::delete_transaction;
pub use update::{TransactionUpdate, update_transaction};
