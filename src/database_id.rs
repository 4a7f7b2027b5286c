//! Database ID type definitions.

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseId = i64;
/// The ID of a user row.
pub type UserId = i64;
/// The ID of an account row.
pub type AccountId = i64;
/// The ID of a category row.
pub type CategoryId = i64;
/// The ID of a transaction row.
pub type TransactionId = i64;
/// The ID of a biller row.
pub type BillerId = i64;
/// The ID of a bill row.
pub type BillId = i64;
/// The ID of a bill instance row.
pub type BillInstanceId = i64;
/// The ID of a vehicle row.
pub type VehicleId = i64;
/// The ID of a fuel entry row.
pub type FuelEntryId = i64;
