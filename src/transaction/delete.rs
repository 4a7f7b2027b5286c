//! Transaction deletion: reverses the original ledger effect before removing
//! the row.

use rusqlite::Connection;

use crate::{
    Error,
    account::{LedgerField, adjust_ledger},
    category::{CategoryKind, get_category},
    database_id::TransactionId,
    money,
    transaction::core::{TransactionSource, get_transaction},
};

/// Reverse a transaction's effect on its account, then delete the row.
///
/// Rows stamped `credit_card` hand their amount back to the account's
/// remaining available credit. All other rows reverse on the balance with the
/// category kind deciding the direction: deleting an expense increments the
/// balance, deleting an income decrements it.
///
/// The reversal is unconditional once invoked; any insufficient-funds
/// pre-check (e.g. refusing to delete an income row that would drive the
/// balance negative) is the caller's responsibility.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingTransaction] if `id` does not refer to a transaction,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_transaction(id: TransactionId, connection: &Connection) -> Result<(), Error> {
    let sql_transaction = connection.unchecked_transaction()?;

    let transaction = match get_transaction(id, &sql_transaction) {
        Err(Error::NotFound) => Err(Error::DeleteMissingTransaction),
        other => other,
    }?;

    let amount_cents = money::to_cents(transaction.amount)?;

    let (field, delta_cents) = match transaction.source {
        TransactionSource::CreditCard => (LedgerField::CreditLimit, amount_cents),
        TransactionSource::Normal | TransactionSource::Reconciliation => {
            let category = get_category(transaction.category_id, &sql_transaction)?;
            let delta_cents = match category.kind {
                CategoryKind::Expense => amount_cents,
                CategoryKind::Income => -amount_cents,
            };

            (LedgerField::Balance, delta_cents)
        }
    };

    adjust_ledger(transaction.account_id, field, delta_cents, &sql_transaction)?;
    sql_transaction.execute("DELETE FROM \"transaction\" WHERE id = ?1", [id])?;

    sql_transaction.commit()?;

    Ok(())
}
