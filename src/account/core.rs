//! The account model and the single primitive every ledger operation goes
//! through to move money: a relative update of one ledger field.

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    database_id::{AccountId, UserId},
    money,
};

/// The type of an account, which decides the ledger field transactions mutate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    /// A bank account tracked by its running balance.
    Bank,
    /// Physical cash tracked by its running balance.
    Cash,
    /// A credit card tracked by its remaining available credit.
    CreditCard,
}

impl AccountKind {
    fn as_str(self) -> &'static str {
        match self {
            AccountKind::Bank => "bank",
            AccountKind::Cash => "cash",
            AccountKind::CreditCard => "credit_card",
        }
    }

    /// The ledger field that transactions against this kind of account mutate.
    pub fn ledger_field(self) -> LedgerField {
        match self {
            AccountKind::CreditCard => LedgerField::CreditLimit,
            AccountKind::Bank | AccountKind::Cash => LedgerField::Balance,
        }
    }
}

impl ToSql for AccountKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for AccountKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "bank" => Ok(AccountKind::Bank),
            "cash" => Ok(AccountKind::Cash),
            "credit_card" => Ok(AccountKind::CreditCard),
            other => Err(FromSqlError::Other(
                format!("\"{other}\" is not a valid account kind").into(),
            )),
        }
    }
}

/// The account field a transaction's effect is applied to and reversed from.
///
/// `Balance` is the running cash value of a bank or cash account.
/// `CreditLimit` is the remaining available credit on a credit card: it is
/// decremented by spend and incremented by reversals, so it tracks headroom,
/// not the card's nominal limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerField {
    /// The `balance` column.
    Balance,
    /// The `credit_limit` column.
    CreditLimit,
}

impl LedgerField {
    fn column(self) -> &'static str {
        match self {
            LedgerField::Balance => "balance",
            LedgerField::CreditLimit => "credit_limit",
        }
    }
}

/// A bank account, cash wallet, or credit card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// The ID of the account.
    pub id: AccountId,
    /// The user that owns the account.
    pub user_id: UserId,
    /// The display name of the account.
    pub name: String,
    /// The type of the account.
    pub kind: AccountKind,
    /// The running balance. Only meaningful for bank and cash accounts.
    pub balance: Decimal,
    /// The remaining available credit. Only meaningful for credit cards.
    pub credit_limit: Decimal,
    /// The ISO 4217 currency code of the account, e.g. "NZD".
    pub currency: String,
    /// Whether the account is still in use.
    pub active: bool,
}

/// The fields needed to create an [Account].
#[derive(Debug, Clone, PartialEq)]
pub struct NewAccount {
    /// The user that owns the account.
    pub user_id: UserId,
    /// The display name of the account.
    pub name: String,
    /// The type of the account.
    pub kind: AccountKind,
    /// The opening balance for bank and cash accounts.
    pub balance: Decimal,
    /// The opening available credit for credit cards.
    pub credit_limit: Decimal,
    /// The ISO 4217 currency code of the account.
    pub currency: String,
}

/// Create an account and return it with its generated ID.
///
/// The opening balance and credit limit are rounded to 2 decimal places.
pub fn create_account(new: NewAccount, connection: &Connection) -> Result<Account, Error> {
    let balance_cents = money::to_cents(new.balance)?;
    let credit_limit_cents = money::to_cents(new.credit_limit)?;

    connection.execute(
        "INSERT INTO account (user_id, name, kind, balance, credit_limit, currency, active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1)",
        (
            new.user_id,
            &new.name,
            new.kind,
            balance_cents,
            credit_limit_cents,
            &new.currency,
        ),
    )?;

    let id = connection.last_insert_rowid();

    Ok(Account {
        id,
        user_id: new.user_id,
        name: new.name,
        kind: new.kind,
        balance: money::from_cents(balance_cents),
        credit_limit: money::from_cents(credit_limit_cents),
        currency: new.currency,
        active: true,
    })
}

/// Retrieve a single account by ID.
pub fn get_account(account_id: AccountId, connection: &Connection) -> Result<Account, Error> {
    connection
        .prepare(
            "SELECT id, user_id, name, kind, balance, credit_limit, currency, active
             FROM account WHERE id = :id;",
        )?
        .query_row(&[(":id", &account_id)], map_row)
        .map_err(|error| error.into())
}

/// Apply `delta_cents` to one ledger field of an account.
///
/// This is a relative SQL update (`SET balance = balance + ?`), so the final
/// stored value reflects a serializable ordering of concurrent adjustments
/// rather than a lost update. Callers are expected to run this inside the
/// SQLite transaction that covers the rest of their unit of work.
///
/// # Errors
/// Returns [Error::UpdateMissingAccount] if `account_id` does not refer to an
/// account.
pub fn adjust_ledger(
    account_id: AccountId,
    field: LedgerField,
    delta_cents: i64,
    connection: &Connection,
) -> Result<(), Error> {
    let statement = format!(
        "UPDATE account SET {column} = {column} + ?1 WHERE id = ?2",
        column = field.column()
    );

    let rows_affected = connection.execute(&statement, (delta_cents, account_id))?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingAccount);
    }

    Ok(())
}

/// Create the account table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS account (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            kind TEXT NOT NULL,
            balance INTEGER NOT NULL DEFAULT 0,
            credit_limit INTEGER NOT NULL DEFAULT 0,
            currency TEXT NOT NULL,
            active INTEGER NOT NULL DEFAULT 1,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    Ok(())
}

pub(crate) fn map_row(row: &Row) -> Result<Account, rusqlite::Error> {
    let id = row.get(0)?;
    let user_id = row.get(1)?;
    let name = row.get(2)?;
    let kind = row.get(3)?;
    let balance_cents: i64 = row.get(4)?;
    let credit_limit_cents: i64 = row.get(5)?;
    let currency = row.get(6)?;
    let active = row.get(7)?;

    Ok(Account {
        id,
        user_id,
        name,
        kind,
        balance: money::from_cents(balance_cents),
        credit_limit: money::from_cents(credit_limit_cents),
        currency,
        active,
    })
}

#[cfg(test)]
pub(crate) mod test_utils {
    use rusqlite::Connection;
    use rust_decimal::Decimal;

    use crate::{db::initialize, user::create_user};

    use super::{Account, AccountKind, NewAccount, create_account};

    pub fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    pub fn create_test_account(kind: AccountKind, opening: &str, conn: &Connection) -> Account {
        let user = create_user("test user", conn).unwrap();
        let opening: Decimal = opening.parse().unwrap();

        let (balance, credit_limit) = match kind {
            AccountKind::CreditCard => (Decimal::ZERO, opening),
            _ => (opening, Decimal::ZERO),
        };

        create_account(
            NewAccount {
                user_id: user.id,
                name: "test account".to_owned(),
                kind,
                balance,
                credit_limit,
                currency: "NZD".to_owned(),
            },
            conn,
        )
        .unwrap()
    }
}
