//! Recurring bills, their generated instances, and the scheduled sweep.

mod core;
mod generate;

pub use core::{
    Bill, BillInstance, BillInstanceStatus, Biller, Frequency, NewBill, create_bill,
    create_bill_instance_table, create_bill_table, create_biller, create_biller_table, get_bill,
    get_instances_for_bill, mark_instance_paid,
};
pub use generate::generate_bill_instances;
