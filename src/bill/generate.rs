//! The scheduled sweep that turns due bills into pending instances.

use rusqlite::Connection;
use time::Date;

use crate::{
    Error,
    bill::core::{BillInstanceStatus, get_bill},
    database_id::BillId,
    money,
};

/// Generate pending instances for every bill due in the reference date's
/// calendar month.
///
/// A bill qualifies when it is active, has auto-generation enabled, and its
/// `next_payment_date` falls within the month of `reference`. For each
/// qualifying bill, at most one instance per (bill, due date) pair is created
/// (re-running the sweep is safe), the instance snapshots the bill's current
/// default amount with status `pending`, and the bill's `next_payment_date`
/// advances by exactly one period.
///
/// Each bill runs in its own SQLite transaction: one bill failing (e.g. a
/// corrupt frequency) is logged and skipped without aborting the rest of the
/// sweep.
///
/// Returns the number of instances actually created; bills skipped by the
/// idempotency guard do not count.
pub fn generate_bill_instances(reference: Date, connection: &Connection) -> Result<u32, Error> {
    let (month_start, month_end) = month_bounds(reference)?;

    let bill_ids: Vec<BillId> = connection
        .prepare(
            "SELECT id FROM bill
             WHERE active = 1 AND auto_generate = 1
               AND next_payment_date BETWEEN :start AND :end",
        )?
        .query_map(
            &[(":start", &month_start), (":end", &month_end)],
            |row| row.get(0),
        )?
        .collect::<Result<_, _>>()?;

    let mut created = 0;
    for bill_id in bill_ids {
        match generate_instance_for(bill_id, connection) {
            Ok(true) => created += 1,
            Ok(false) => {
                tracing::debug!("bill {bill_id} already has an instance for its due date");
            }
            Err(error) => {
                tracing::error!("could not generate an instance for bill {bill_id}: {error}");
            }
        }
    }

    tracing::info!("bill sweep for {reference} created {created} instance(s)");

    Ok(created)
}

/// Generate the pending instance for one bill and advance its due date.
///
/// Returns `Ok(false)` if the idempotency guard found an existing instance.
fn generate_instance_for(bill_id: BillId, connection: &Connection) -> Result<bool, Error> {
    let sql_transaction = connection.unchecked_transaction()?;

    let bill = get_bill(bill_id, &sql_transaction)?;

    let existing: i64 = sql_transaction.query_row(
        "SELECT COUNT(id) FROM bill_instance WHERE bill_id = ?1 AND due_date = ?2",
        (bill_id, bill.next_payment_date),
        |row| row.get(0),
    )?;

    if existing > 0 {
        return Ok(false);
    }

    sql_transaction.execute(
        "INSERT INTO bill_instance (bill_id, due_date, amount, status) VALUES (?1, ?2, ?3, ?4)",
        (
            bill_id,
            bill.next_payment_date,
            money::to_cents(bill.default_amount)?,
            BillInstanceStatus::Pending,
        ),
    )?;

    let next = bill.frequency.advance(bill.next_payment_date)?;
    sql_transaction.execute(
        "UPDATE bill SET next_payment_date = ?1 WHERE id = ?2",
        (next, bill_id),
    )?;

    sql_transaction.commit()?;

    Ok(true)
}

/// The first and last day of `reference`'s calendar month.
fn month_bounds(reference: Date) -> Result<(Date, Date), Error> {
    let month_start = reference
        .replace_day(1)
        .map_err(|error| Error::InvalidDate(error.to_string()))?;
    let month_end = reference
        .replace_day(reference.month().length(reference.year()))
        .map_err(|error| Error::InvalidDate(error.to_string()))?;

    Ok((month_start, month_end))
}
