//! Transaction update: reverses the old ledger effect and applies the new one.
//!
//! The existing row is loaded inside the same SQLite transaction as the
//! mutation, so the "old" values can never come from a stale, earlier read.

use rusqlite::Connection;
use rust_decimal::Decimal;
use time::Date;

use crate::{
    Error,
    account::{AccountKind, LedgerField, adjust_ledger, get_account},
    database_id::{AccountId, CategoryId, TransactionId},
    money,
    transaction::core::{Transaction, TransactionSource, get_transaction},
};

/// The replacement field values for an existing transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionUpdate {
    /// The account the transaction should now be applied to.
    pub account_id: AccountId,
    /// The category the transaction should now belong to.
    pub category_id: CategoryId,
    /// The new amount. Rounded to 2 decimal places on entry.
    pub amount: Decimal,
    /// The new date.
    pub date: Date,
    /// The new description.
    pub description: String,
    /// Explicit source override. Leave as `None` for the default routing.
    pub source: Option<TransactionSource>,
}

/// Rewrite a transaction's fields, reversing its old ledger effect and
/// applying the new one.
///
/// Rows stamped `credit_card` take the credit-limit variant: both the reversal
/// and the new effect land on `credit_limit`, and the row stays stamped
/// `credit_card` regardless of any override. All other rows take the balance
/// variant.
///
/// If the account is unchanged the net delta `old − new` is applied once;
/// otherwise the old account gets `+old` and the new account `−new`, each
/// touched exactly once.
///
/// The balance variant deliberately treats every category as expense-shaped:
/// the old amount is added back and the new amount subtracted, with no
/// category-kind sign flip. This mirrors creation only for expense categories
/// and is a known inconsistency for income rows; it is preserved here rather
/// than silently corrected.
///
/// # Errors
/// This function will return a:
/// - [Error::UpdateMissingTransaction] if `id` does not refer to a transaction,
/// - [Error::UpdateMissingAccount] if either account does not exist,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_transaction(
    id: TransactionId,
    update: TransactionUpdate,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let sql_transaction = connection.unchecked_transaction()?;

    let before = match get_transaction(id, &sql_transaction) {
        Err(Error::NotFound) => Err(Error::UpdateMissingTransaction),
        other => other,
    }?;

    let old_cents = money::to_cents(before.amount)?;
    let new_cents = money::to_cents(update.amount)?;

    let source = if before.source == TransactionSource::CreditCard {
        apply_update_deltas(
            &before,
            &update,
            LedgerField::CreditLimit,
            old_cents,
            new_cents,
            &sql_transaction,
        )?;

        TransactionSource::CreditCard
    } else {
        apply_update_deltas(
            &before,
            &update,
            LedgerField::Balance,
            old_cents,
            new_cents,
            &sql_transaction,
        )?;

        match update.source {
            Some(source) => source,
            None => {
                let new_account = get_account(update.account_id, &sql_transaction)?;
                match new_account.kind {
                    AccountKind::CreditCard => TransactionSource::CreditCard,
                    AccountKind::Bank | AccountKind::Cash => TransactionSource::Normal,
                }
            }
        }
    };

    sql_transaction.execute(
        "UPDATE \"transaction\"
        SET \
            account_id = ?1, \
            category_id = ?2, \
            amount = ?3, \
            date = ?4, \
            description = ?5, \
            source = ?6 \
        WHERE id = ?7;",
        (
            update.account_id,
            update.category_id,
            new_cents,
            update.date,
            &update.description,
            source,
            id,
        ),
    )?;

    sql_transaction.commit()?;

    Ok(Transaction {
        id,
        user_id: before.user_id,
        account_id: update.account_id,
        category_id: update.category_id,
        amount: money::from_cents(new_cents),
        date: update.date,
        description: update.description,
        source,
    })
}

/// Undo the old effect and apply the new one on `field`, expense-shaped.
fn apply_update_deltas(
    before: &Transaction,
    update: &TransactionUpdate,
    field: LedgerField,
    old_cents: i64,
    new_cents: i64,
    connection: &Connection,
) -> Result<(), Error> {
    if before.account_id == update.account_id {
        adjust_ledger(update.account_id, field, old_cents - new_cents, connection)
    } else {
        adjust_ledger(before.account_id, field, old_cents, connection)?;
        adjust_ledger(update.account_id, field, -new_cents, connection)
    }
}
