//! Transaction creation: records an entry and applies its effect to the
//! owning account in one atomic unit.

use rusqlite::Connection;

use crate::{
    Error,
    account::{AccountKind, adjust_ledger, get_account},
    category::{CategoryKind, get_category},
    money,
    transaction::core::{NewTransaction, Transaction, TransactionSource, insert_transaction_row},
};

/// Record an income or expense entry and apply its effect to the account.
///
/// For bank and cash accounts the entry is stamped `normal` (unless the caller
/// supplies an explicit source override) and the category kind signs the
/// balance delta: expense entries decrement the balance, income entries
/// increment it. Credit-card accounts route to the credit-card path instead:
/// the entry is stamped `credit_card` and always decrements the account's
/// remaining available credit, regardless of the category kind — there is no
/// credit-card income concept.
///
/// No insufficient-balance check happens here; numeric bounds are a caller
/// concern.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the account or category does not exist,
/// - or [Error::SqlError] if there is some other SQL error.
///
/// On any error, neither the transaction row nor the balance change persists.
pub fn create_transaction(
    new: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let sql_transaction = connection.unchecked_transaction()?;

    let transaction = create_transaction_in(new, &sql_transaction)?;

    sql_transaction.commit()?;

    Ok(transaction)
}

/// The body of [create_transaction], without the enclosing SQLite transaction.
///
/// Compound operations (fuel entries, reconciliation) call this inside their
/// own unit of work so that all of their effects commit or roll back together.
pub(crate) fn create_transaction_in(
    new: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let account = get_account(new.account_id, connection)?;
    let category = get_category(new.category_id, connection)?;
    let amount_cents = money::to_cents(new.amount)?;

    let (source, delta_cents) = match account.kind {
        AccountKind::CreditCard => (TransactionSource::CreditCard, -amount_cents),
        AccountKind::Bank | AccountKind::Cash => {
            let source = new.source.unwrap_or(TransactionSource::Normal);
            let delta_cents = match category.kind {
                CategoryKind::Expense => -amount_cents,
                CategoryKind::Income => amount_cents,
            };

            (source, delta_cents)
        }
    };

    let transaction = insert_transaction_row(&new, amount_cents, source, connection)?;
    adjust_ledger(
        account.id,
        account.kind.ledger_field(),
        delta_cents,
        connection,
    )?;

    Ok(transaction)
}

#[cfg(test)]
mod create_transaction_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        account::{Account, AccountKind, get_account},
        account::test_utils::{create_test_account, get_test_connection},
        category::{Category, CategoryKind, create_category},
        transaction::{NewTransaction, TransactionSource},
    };

    use super::create_transaction;

    fn new_transaction(account: &Account, category: &Category, amount: &str) -> NewTransaction {
        NewTransaction {
            user_id: account.user_id,
            account_id: account.id,
            category_id: category.id,
            amount: amount.parse().unwrap(),
            date: date!(2025 - 10 - 05),
            description: "test".to_owned(),
            source: None,
        }
    }

    #[test]
    fn expense_decrements_balance() {
        let conn = get_test_connection();
        let account = create_test_account(AccountKind::Bank, "1000.00", &conn);
        let category = create_category("Groceries", CategoryKind::Expense, &conn).unwrap();

        let transaction =
            create_transaction(new_transaction(&account, &category, "100.50"), &conn).unwrap();

        assert_eq!(transaction.source, TransactionSource::Normal);
        assert_eq!(transaction.amount.to_string(), "100.50");
        let account = get_account(account.id, &conn).unwrap();
        assert_eq!(account.balance.to_string(), "899.50");
    }

    #[test]
    fn income_increments_balance() {
        let conn = get_test_connection();
        let account = create_test_account(AccountKind::Bank, "1000.00", &conn);
        let category = create_category("Salary", CategoryKind::Income, &conn).unwrap();

        create_transaction(new_transaction(&account, &category, "250.00"), &conn).unwrap();

        let account = get_account(account.id, &conn).unwrap();
        assert_eq!(account.balance.to_string(), "1250.00");
    }

    #[test]
    fn credit_card_account_routes_to_credit_limit() {
        let conn = get_test_connection();
        let account = create_test_account(AccountKind::CreditCard, "10000.00", &conn);
        let category = create_category("Groceries", CategoryKind::Expense, &conn).unwrap();

        let transaction =
            create_transaction(new_transaction(&account, &category, "100.50"), &conn).unwrap();

        assert_eq!(transaction.source, TransactionSource::CreditCard);
        let account = get_account(account.id, &conn).unwrap();
        assert_eq!(account.credit_limit.to_string(), "9899.50");
        assert_eq!(account.balance.to_string(), "0.00");
    }

    #[test]
    fn credit_card_entries_are_always_expenses_against_available_credit() {
        let conn = get_test_connection();
        let account = create_test_account(AccountKind::CreditCard, "10000.00", &conn);
        // Even an income-kind category decrements available credit on a card.
        let category = create_category("Refund", CategoryKind::Income, &conn).unwrap();

        create_transaction(new_transaction(&account, &category, "25.00"), &conn).unwrap();

        let account = get_account(account.id, &conn).unwrap();
        assert_eq!(account.credit_limit.to_string(), "9975.00");
    }

    #[test]
    fn amount_is_rounded_half_up_before_storage() {
        let conn = get_test_connection();
        let account = create_test_account(AccountKind::Bank, "1000.00", &conn);
        let category = create_category("Groceries", CategoryKind::Expense, &conn).unwrap();

        let transaction =
            create_transaction(new_transaction(&account, &category, "123.456"), &conn).unwrap();

        assert_eq!(transaction.amount.to_string(), "123.46");
        let account = get_account(account.id, &conn).unwrap();
        assert_eq!(account.balance.to_string(), "876.54");
    }

    #[test]
    fn explicit_source_override_is_kept() {
        let conn = get_test_connection();
        let account = create_test_account(AccountKind::Bank, "1000.00", &conn);
        let category = create_category("Adjustments", CategoryKind::Income, &conn).unwrap();

        let mut new = new_transaction(&account, &category, "10.00");
        new.source = Some(TransactionSource::Reconciliation);
        let transaction = create_transaction(new, &conn).unwrap();

        assert_eq!(transaction.source, TransactionSource::Reconciliation);
    }

    #[test]
    fn create_fails_on_missing_account_without_partial_writes() {
        let conn = get_test_connection();
        let account = create_test_account(AccountKind::Bank, "1000.00", &conn);
        let category = create_category("Groceries", CategoryKind::Expense, &conn).unwrap();

        let mut new = new_transaction(&account, &category, "10.00");
        new.account_id = account.id + 1;
        let result = create_transaction(new, &conn);

        assert_eq!(result, Err(Error::NotFound));
        let count: i64 = count_transactions(&conn);
        assert_eq!(count, 0);
    }

    #[test]
    fn create_fails_on_missing_category() {
        let conn = get_test_connection();
        let account = create_test_account(AccountKind::Bank, "1000.00", &conn);
        let category = create_category("Groceries", CategoryKind::Expense, &conn).unwrap();

        let mut new = new_transaction(&account, &category, "10.00");
        new.category_id = category.id + 1;
        let result = create_transaction(new, &conn);

        assert_eq!(result, Err(Error::NotFound));
        let account = get_account(account.id, &conn).unwrap();
        assert_eq!(account.balance.to_string(), "1000.00");
    }

    fn count_transactions(conn: &Connection) -> i64 {
        conn.query_row("SELECT COUNT(id) FROM \"transaction\"", [], |row| {
            row.get(0)
        })
        .unwrap()
    }
}
