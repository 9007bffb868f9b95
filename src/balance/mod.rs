//! Balance module
//!
//! Opening and closing balances per base, equipment type and period,
//! derived on demand from purchases, transfers and assignments.

pub mod aggregator;
pub mod snapshot;

pub use aggregator::{BalanceAggregator, BalanceQuery, UNKNOWN_TYPE_NAME};
pub use snapshot::{percent_change, BalanceSnapshot, Movements};
