//! Account reconciliation: aligning the tracked balance with reality.

use rusqlite::Connection;
use rust_decimal::Decimal;
use time::Date;

use crate::{
    Error,
    account::core::{LedgerField, adjust_ledger, get_account},
    category::{SystemCategories, get_category},
    database_id::AccountId,
    money,
    transaction::{NewTransaction, Transaction, TransactionSource, insert_transaction_row},
};

/// Bring an account's tracked balance in line with a user-declared actual
/// balance by synthesizing a single adjustment transaction.
///
/// If the actual balance already matches the tracked balance, nothing is
/// written and `Ok(None)` is returned. Otherwise one transaction for the
/// absolute difference is created, dated `today`, stamped `reconciliation`,
/// against the fixed reconciliation income or expense category depending on
/// the direction of the difference. Afterwards the tracked balance equals
/// `actual` exactly.
///
/// The adjustment is applied to the same field the difference was computed
/// from: `balance`, for every account kind. A credit-card account's available
/// credit is never touched here, and the `reconciliation` stamp means deleting
/// the adjustment later reverses on the balance as well.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the account or a reconciliation category is missing,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn reconcile_account(
    account_id: AccountId,
    actual: Decimal,
    today: Date,
    categories: &SystemCategories,
    connection: &Connection,
) -> Result<Option<Transaction>, Error> {
    let sql_transaction = connection.unchecked_transaction()?;

    let account = get_account(account_id, &sql_transaction)?;

    let actual_cents = money::to_cents(actual)?;
    let tracked_cents = money::to_cents(account.balance)?;
    let difference_cents = actual_cents - tracked_cents;

    if difference_cents == 0 {
        return Ok(None);
    }

    let category_id = if difference_cents > 0 {
        categories.reconcile_income
    } else {
        categories.reconcile_expense
    };

    let category = get_category(category_id, &sql_transaction)?;

    let transaction = insert_transaction_row(
        &NewTransaction {
            user_id: account.user_id,
            account_id,
            category_id: category.id,
            amount: money::from_cents(difference_cents.abs()),
            date: today,
            description: format!(
                "Balance reconciliation: {}",
                money::format_signed(difference_cents)
            ),
            source: Some(TransactionSource::Reconciliation),
        },
        difference_cents.abs(),
        TransactionSource::Reconciliation,
        &sql_transaction,
    )?;
    adjust_ledger(
        account_id,
        LedgerField::Balance,
        difference_cents,
        &sql_transaction,
    )?;

    sql_transaction.commit()?;

    Ok(Some(transaction))
}

#[cfg(test)]
mod reconcile_account_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        account::{AccountKind, get_account},
        account::test_utils::{create_test_account, get_test_connection},
        category::{
            CategoryKind, RECONCILE_EXPENSE_CATEGORY, RECONCILE_INCOME_CATEGORY, SystemCategories,
            create_category,
        },
        transaction::TransactionSource,
    };

    use super::reconcile_account;

    fn create_reconcile_categories(conn: &Connection) -> SystemCategories {
        let income =
            create_category(RECONCILE_INCOME_CATEGORY, CategoryKind::Income, conn).unwrap();
        let expense =
            create_category(RECONCILE_EXPENSE_CATEGORY, CategoryKind::Expense, conn).unwrap();

        SystemCategories {
            // Not used by reconciliation; point it at a real category anyway.
            fuel: expense.id,
            reconcile_income: income.id,
            reconcile_expense: expense.id,
        }
    }

    #[test]
    fn reconciling_upwards_creates_income_adjustment() {
        let conn = get_test_connection();
        let account = create_test_account(AccountKind::Bank, "1000.00", &conn);
        let categories = create_reconcile_categories(&conn);

        let transaction = reconcile_account(
            account.id,
            "1500.00".parse().unwrap(),
            date!(2025 - 10 - 05),
            &categories,
            &conn,
        )
        .unwrap()
        .expect("a difference should create a transaction");

        assert_eq!(transaction.amount.to_string(), "500.00");
        assert_eq!(transaction.category_id, categories.reconcile_income);
        assert_eq!(transaction.source, TransactionSource::Reconciliation);
        assert!(transaction.description.contains("+500.00"));
        let account = get_account(account.id, &conn).unwrap();
        assert_eq!(account.balance.to_string(), "1500.00");
    }

    #[test]
    fn reconciling_downwards_creates_expense_adjustment() {
        let conn = get_test_connection();
        let account = create_test_account(AccountKind::Bank, "1000.00", &conn);
        let categories = create_reconcile_categories(&conn);

        let transaction = reconcile_account(
            account.id,
            "876.55".parse().unwrap(),
            date!(2025 - 10 - 05),
            &categories,
            &conn,
        )
        .unwrap()
        .expect("a difference should create a transaction");

        assert_eq!(transaction.amount.to_string(), "123.45");
        assert_eq!(transaction.category_id, categories.reconcile_expense);
        assert!(transaction.description.contains("-123.45"));
        let account = get_account(account.id, &conn).unwrap();
        assert_eq!(account.balance.to_string(), "876.55");
    }

    #[test]
    fn reconciling_a_credit_card_adjusts_balance_not_available_credit() {
        let conn = get_test_connection();
        let card = create_test_account(AccountKind::CreditCard, "5000.00", &conn);
        let categories = create_reconcile_categories(&conn);

        let transaction = reconcile_account(
            card.id,
            "100.00".parse().unwrap(),
            date!(2025 - 10 - 05),
            &categories,
            &conn,
        )
        .unwrap()
        .expect("a difference should create a transaction");

        assert_eq!(transaction.source, TransactionSource::Reconciliation);
        let card = get_account(card.id, &conn).unwrap();
        assert_eq!(card.balance.to_string(), "100.00");
        assert_eq!(card.credit_limit.to_string(), "5000.00");
    }

    #[test]
    fn reconciling_to_the_current_balance_is_a_no_op() {
        let conn = get_test_connection();
        let account = create_test_account(AccountKind::Bank, "1500.00", &conn);
        let categories = create_reconcile_categories(&conn);

        let result = reconcile_account(
            account.id,
            "1500.00".parse().unwrap(),
            date!(2025 - 10 - 05),
            &categories,
            &conn,
        )
        .unwrap();

        assert_eq!(result, None);
        let count: i64 = conn
            .query_row("SELECT COUNT(id) FROM \"transaction\"", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn reconciling_twice_is_idempotent() {
        let conn = get_test_connection();
        let account = create_test_account(AccountKind::Bank, "1000.00", &conn);
        let categories = create_reconcile_categories(&conn);
        let actual = "1500.00".parse().unwrap();

        let first = reconcile_account(
            account.id,
            actual,
            date!(2025 - 10 - 05),
            &categories,
            &conn,
        )
        .unwrap();
        let second = reconcile_account(
            account.id,
            actual,
            date!(2025 - 10 - 05),
            &categories,
            &conn,
        )
        .unwrap();

        assert!(first.is_some());
        assert_eq!(second, None);
        let account = get_account(account.id, &conn).unwrap();
        assert_eq!(account.balance.to_string(), "1500.00");
    }

    #[test]
    fn reconcile_fails_on_missing_account() {
        let conn = get_test_connection();
        let categories = create_reconcile_categories(&conn);

        let result = reconcile_account(
            42,
            "100.00".parse().unwrap(),
            date!(2025 - 10 - 05),
            &categories,
            &conn,
        );

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn reconcile_fails_on_stale_category_id_without_mutation() {
        let conn = get_test_connection();
        let account = create_test_account(AccountKind::Bank, "1000.00", &conn);
        let mut categories = create_reconcile_categories(&conn);
        categories.reconcile_income += 42;

        let result = reconcile_account(
            account.id,
            "1500.00".parse().unwrap(),
            date!(2025 - 10 - 05),
            &categories,
            &conn,
        );

        assert_eq!(result, Err(Error::NotFound));
        let account = get_account(account.id, &conn).unwrap();
        assert_eq!(account.balance.to_string(), "1000.00");
    }
}
