//! Partner domain module: stock records and purchase-availability policies.
//!
//! Pure, synchronous domain logic (no IO, no HTTP, no storage). Policies are
//! built per product/stock-record pair at query time, borrow their
//! collaborators, and are discarded after use.

pub mod availability;
pub mod stockrecord;

pub use availability::{
    Available, AvailabilityCode, AvailabilityPolicy, DelegateToStockRecord, PurchaseDecision,
    StockRequired, Unavailable,
};
pub use stockrecord::StockRecord;
