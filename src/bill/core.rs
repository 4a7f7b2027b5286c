//! The bill and bill-instance models and their database queries.

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{Date, Duration, Month};

use crate::{
    Error,
    database_id::{BillId, BillInstanceId, BillerId, TransactionId, UserId},
    money,
};

/// How often a bill falls due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    /// Every 7 days.
    Weekly,
    /// Every calendar month.
    Monthly,
    /// Every 3 calendar months.
    Quarterly,
    /// Every 6 calendar months.
    HalfYearly,
    /// Every calendar year.
    Yearly,
    /// Every fixed number of days.
    Custom {
        /// The number of days between due dates.
        interval_days: i64,
    },
}

impl Frequency {
    fn code(self) -> &'static str {
        match self {
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Quarterly => "quarterly",
            Frequency::HalfYearly => "half_yearly",
            Frequency::Yearly => "yearly",
            Frequency::Custom { .. } => "custom",
        }
    }

    fn interval_days(self) -> Option<i64> {
        match self {
            Frequency::Custom { interval_days } => Some(interval_days),
            _ => None,
        }
    }

    fn from_parts(code: &str, interval_days: Option<i64>) -> Result<Self, Error> {
        match (code, interval_days) {
            ("weekly", _) => Ok(Frequency::Weekly),
            ("monthly", _) => Ok(Frequency::Monthly),
            ("quarterly", _) => Ok(Frequency::Quarterly),
            ("half_yearly", _) => Ok(Frequency::HalfYearly),
            ("yearly", _) => Ok(Frequency::Yearly),
            ("custom", Some(interval_days)) => Ok(Frequency::Custom { interval_days }),
            ("custom", None) => Err(Error::InvalidFrequency(
                "custom without interval_days".to_owned(),
            )),
            (other, _) => Err(Error::InvalidFrequency(other.to_owned())),
        }
    }

    /// The due date one period after `date`.
    ///
    /// Month-based frequencies use calendar arithmetic and clamp to the end of
    /// the target month: Jan 31 + 1 month lands on Feb 28 (or Feb 29 in a leap
    /// year).
    pub fn advance(self, date: Date) -> Result<Date, Error> {
        match self {
            Frequency::Weekly => date
                .checked_add(Duration::weeks(1))
                .ok_or_else(|| Error::InvalidDate(format!("{date} + 1 week overflows"))),
            Frequency::Monthly => add_months(date, 1),
            Frequency::Quarterly => add_months(date, 3),
            Frequency::HalfYearly => add_months(date, 6),
            Frequency::Yearly => add_months(date, 12),
            Frequency::Custom { interval_days } => date
                .checked_add(Duration::days(interval_days))
                .ok_or_else(|| {
                    Error::InvalidDate(format!("{date} + {interval_days} days overflows"))
                }),
        }
    }
}

/// Add `months` calendar months to `date`, clamping the day to the length of
/// the target month.
fn add_months(date: Date, months: i32) -> Result<Date, Error> {
    let zero_based = date.year() * 12 + (u8::from(date.month()) as i32 - 1) + months;
    let year = zero_based.div_euclid(12);
    let month = Month::try_from((zero_based.rem_euclid(12) + 1) as u8)
        .map_err(|error| Error::InvalidDate(error.to_string()))?;
    let day = date.day().min(month.length(year));

    Date::from_calendar_date(year, month, day).map_err(|error| Error::InvalidDate(error.to_string()))
}

/// The party a bill is paid to, e.g. a power company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Biller {
    /// The ID of the biller.
    pub id: BillerId,
    /// The user that owns the biller.
    pub user_id: UserId,
    /// The display name of the biller.
    pub name: String,
}

/// A recurring obligation that falls due once per period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bill {
    /// The ID of the bill.
    pub id: BillId,
    /// The user that owns the bill.
    pub user_id: UserId,
    /// The biller the bill is paid to.
    pub biller_id: BillerId,
    /// The expected amount of each instance.
    pub default_amount: Decimal,
    /// How often the bill falls due.
    pub frequency: Frequency,
    /// When the bill next falls due. Advanced by one period each time an
    /// instance is generated.
    pub next_payment_date: Date,
    /// Whether the bill is still in use.
    pub active: bool,
    /// Whether the scheduled sweep should generate instances for this bill.
    pub auto_generate: bool,
}

/// The fields needed to create a [Bill].
#[derive(Debug, Clone, PartialEq)]
pub struct NewBill {
    /// The user that owns the bill.
    pub user_id: UserId,
    /// The biller the bill is paid to.
    pub biller_id: BillerId,
    /// The expected amount of each instance. Rounded to 2 decimal places.
    pub default_amount: Decimal,
    /// How often the bill falls due.
    pub frequency: Frequency,
    /// When the bill first falls due.
    pub next_payment_date: Date,
    /// Whether the bill is active.
    pub active: bool,
    /// Whether the scheduled sweep should generate instances for this bill.
    pub auto_generate: bool,
}

/// The lifecycle state of one due occurrence of a bill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillInstanceStatus {
    /// Generated and awaiting payment.
    Pending,
    /// Settled, normally with a linked transaction.
    Paid,
    /// Skipped for this period.
    Skipped,
    /// Cancelled and no longer expected.
    Cancelled,
}

impl BillInstanceStatus {
    fn as_str(self) -> &'static str {
        match self {
            BillInstanceStatus::Pending => "pending",
            BillInstanceStatus::Paid => "paid",
            BillInstanceStatus::Skipped => "skipped",
            BillInstanceStatus::Cancelled => "cancelled",
        }
    }
}

impl ToSql for BillInstanceStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for BillInstanceStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "pending" => Ok(BillInstanceStatus::Pending),
            "paid" => Ok(BillInstanceStatus::Paid),
            "skipped" => Ok(BillInstanceStatus::Skipped),
            "cancelled" => Ok(BillInstanceStatus::Cancelled),
            other => Err(FromSqlError::Other(
                format!("\"{other}\" is not a valid bill instance status").into(),
            )),
        }
    }
}

/// One due occurrence of a recurring bill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillInstance {
    /// The ID of the instance.
    pub id: BillInstanceId,
    /// The bill the instance was generated for.
    pub bill_id: BillId,
    /// When the instance falls due.
    pub due_date: Date,
    /// The bill's default amount at the moment of generation.
    pub amount: Decimal,
    /// The lifecycle state of the instance.
    pub status: BillInstanceStatus,
    /// The transaction that settled the instance, once paid.
    pub transaction_id: Option<TransactionId>,
}

/// Create a biller and return it with its generated ID.
pub fn create_biller(user_id: UserId, name: &str, connection: &Connection) -> Result<Biller, Error> {
    connection.execute(
        "INSERT INTO biller (user_id, name) VALUES (?1, ?2);",
        (user_id, name),
    )?;

    let id = connection.last_insert_rowid();

    Ok(Biller {
        id,
        user_id,
        name: name.to_owned(),
    })
}

/// Create a bill and return it with its generated ID.
pub fn create_bill(new: NewBill, connection: &Connection) -> Result<Bill, Error> {
    let amount_cents = money::to_cents(new.default_amount)?;

    connection.execute(
        "INSERT INTO bill
            (user_id, biller_id, default_amount, frequency, interval_days,
             next_payment_date, active, auto_generate)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        (
            new.user_id,
            new.biller_id,
            amount_cents,
            new.frequency.code(),
            new.frequency.interval_days(),
            new.next_payment_date,
            new.active,
            new.auto_generate,
        ),
    )?;

    let id = connection.last_insert_rowid();

    Ok(Bill {
        id,
        user_id: new.user_id,
        biller_id: new.biller_id,
        default_amount: money::from_cents(amount_cents),
        frequency: new.frequency,
        next_payment_date: new.next_payment_date,
        active: new.active,
        auto_generate: new.auto_generate,
    })
}

/// Retrieve a single bill by ID.
pub fn get_bill(bill_id: BillId, connection: &Connection) -> Result<Bill, Error> {
    connection
        .prepare(
            "SELECT id, user_id, biller_id, default_amount, frequency, interval_days,
                    next_payment_date, active, auto_generate
             FROM bill WHERE id = :id;",
        )?
        .query_row(&[(":id", &bill_id)], map_bill_row)
        .map_err(|error| error.into())
}

/// Retrieve the instances generated for a bill, ordered by due date.
pub fn get_instances_for_bill(
    bill_id: BillId,
    connection: &Connection,
) -> Result<Vec<BillInstance>, Error> {
    connection
        .prepare(
            "SELECT id, bill_id, due_date, amount, status, transaction_id
             FROM bill_instance WHERE bill_id = :bill_id ORDER BY due_date ASC;",
        )?
        .query_map(&[(":bill_id", &bill_id)], map_instance_row)?
        .map(|maybe_instance| maybe_instance.map_err(|error| error.into()))
        .collect()
}

/// Mark a bill instance as paid and link it to the transaction that settled
/// it.
///
/// # Errors
/// Returns [Error::NotFound] if `instance_id` does not refer to an instance.
pub fn mark_instance_paid(
    instance_id: BillInstanceId,
    transaction_id: TransactionId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE bill_instance SET status = ?1, transaction_id = ?2 WHERE id = ?3",
        (BillInstanceStatus::Paid, transaction_id, instance_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Create the biller table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_biller_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS biller (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    Ok(())
}

/// Create the bill table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_bill_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS bill (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            biller_id INTEGER NOT NULL,
            default_amount INTEGER NOT NULL,
            frequency TEXT NOT NULL,
            interval_days INTEGER,
            next_payment_date TEXT NOT NULL,
            active INTEGER NOT NULL DEFAULT 1,
            auto_generate INTEGER NOT NULL DEFAULT 1,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY(biller_id) REFERENCES biller(id) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_bill_next_payment_date ON bill(next_payment_date);",
    )?;

    Ok(())
}

/// Create the bill instance table in the database.
///
/// The UNIQUE(bill_id, due_date) constraint backs the sweep's idempotency
/// guard: at most one instance per bill per due date.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_bill_instance_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS bill_instance (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            bill_id INTEGER NOT NULL,
            due_date TEXT NOT NULL,
            amount INTEGER NOT NULL,
            status TEXT NOT NULL,
            transaction_id INTEGER,
            FOREIGN KEY(bill_id) REFERENCES bill(id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY(transaction_id) REFERENCES \"transaction\"(id) ON UPDATE CASCADE ON DELETE SET NULL,
            UNIQUE(bill_id, due_date)
        )",
        (),
    )?;

    Ok(())
}

fn map_bill_row(row: &Row) -> Result<Bill, rusqlite::Error> {
    let id = row.get(0)?;
    let user_id = row.get(1)?;
    let biller_id = row.get(2)?;
    let amount_cents: i64 = row.get(3)?;
    let frequency_code: String = row.get(4)?;
    let interval_days: Option<i64> = row.get(5)?;
    let next_payment_date = row.get(6)?;
    let active = row.get(7)?;
    let auto_generate = row.get(8)?;

    let frequency = Frequency::from_parts(&frequency_code, interval_days).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(error))
    })?;

    Ok(Bill {
        id,
        user_id,
        biller_id,
        default_amount: money::from_cents(amount_cents),
        frequency,
        next_payment_date,
        active,
        auto_generate,
    })
}

pub(crate) fn map_instance_row(row: &Row) -> Result<BillInstance, rusqlite::Error> {
    let id = row.get(0)?;
    let bill_id = row.get(1)?;
    let due_date = row.get(2)?;
    let amount_cents: i64 = row.get(3)?;
    let status = row.get(4)?;
    let transaction_id = row.get(5)?;

    Ok(BillInstance {
        id,
        bill_id,
        due_date,
        amount: money::from_cents(amount_cents),
        status,
        transaction_id,
    })
}

#[cfg(test)]
mod frequency_tests {
    use time::macros::date;

    use super::Frequency;

    #[test]
    fn weekly_advances_seven_days() {
        let next = Frequency::Weekly.advance(date!(2025 - 01 - 28)).unwrap();

        assert_eq!(next, date!(2025 - 02 - 04));
    }

    #[test]
    fn monthly_advances_one_calendar_month() {
        let next = Frequency::Monthly.advance(date!(2025 - 03 - 15)).unwrap();

        assert_eq!(next, date!(2025 - 04 - 15));
    }

    #[test]
    fn monthly_clamps_to_end_of_shorter_month() {
        let next = Frequency::Monthly.advance(date!(2025 - 01 - 31)).unwrap();

        assert_eq!(next, date!(2025 - 02 - 28));
    }

    #[test]
    fn monthly_clamps_to_leap_day_in_leap_years() {
        let next = Frequency::Monthly.advance(date!(2024 - 01 - 31)).unwrap();

        assert_eq!(next, date!(2024 - 02 - 29));
    }

    #[test]
    fn quarterly_crosses_year_boundaries() {
        let next = Frequency::Quarterly.advance(date!(2025 - 11 - 30)).unwrap();

        assert_eq!(next, date!(2026 - 02 - 28));
    }

    #[test]
    fn half_yearly_advances_six_months() {
        let next = Frequency::HalfYearly.advance(date!(2025 - 01 - 10)).unwrap();

        assert_eq!(next, date!(2025 - 07 - 10));
    }

    #[test]
    fn yearly_advances_one_year() {
        let next = Frequency::Yearly.advance(date!(2025 - 06 - 01)).unwrap();

        assert_eq!(next, date!(2026 - 06 - 01));
    }

    #[test]
    fn yearly_clamps_leap_day() {
        let next = Frequency::Yearly.advance(date!(2024 - 02 - 29)).unwrap();

        assert_eq!(next, date!(2025 - 02 - 28));
    }

    #[test]
    fn custom_advances_by_interval_days() {
        let frequency = Frequency::Custom { interval_days: 10 };

        let next = frequency.advance(date!(2025 - 12 - 28)).unwrap();

        assert_eq!(next, date!(2026 - 01 - 07));
    }

    #[test]
    fn from_parts_rejects_unknown_codes() {
        let result = Frequency::from_parts("fortnightly", None);

        assert!(matches!(result, Err(crate::Error::InvalidFrequency(_))));
    }

    #[test]
    fn from_parts_rejects_custom_without_interval() {
        let result = Frequency::from_parts("custom", None);

        assert!(matches!(result, Err(crate::Error::InvalidFrequency(_))));
    }
}
