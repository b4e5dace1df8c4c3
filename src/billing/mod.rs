//! Billing-period arithmetic for card billing cycles

pub mod period;

pub use period::*;
