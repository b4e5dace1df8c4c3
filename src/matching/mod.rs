//! Reconciliation matching between billing summaries and bank transactions

pub mod calendar;
pub mod matcher;

pub use calendar::*;
pub use matcher::*;
