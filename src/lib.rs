//! # Reconcile Core
//!
//! A reconciliation library matching credit-card billing summaries against
//! externally observed bank-account transactions, and tracking each
//! payment's lifecycle over time.
//!
//! ## Features
//!
//! - **Billing-period arithmetic**: map transaction dates to billing months
//!   and derive closing/payment dates from a card's cycle configuration
//! - **Graded matching**: date-window, exact-amount and description filters
//!   with 0/70/100 confidence and explicit ambiguity detection
//! - **Payment lifecycle**: a transition-validated status machine with
//!   append-only history records
//! - **Daily batch**: time-driven status advancement with bulk lookups and
//!   per-record failure isolation
//! - **Storage abstraction**: persistence-agnostic design with trait-based
//!   collaborators
//!
//! ## Quick Start
//!
//! ```rust
//! use reconcile_core::{BillingCycle, ReconciliationMatcher};
//! use chrono::NaiveDate;
//!
//! let cycle = BillingCycle::new(15, 10);
//! let purchase = NaiveDate::from_ymd_opt(2025, 1, 16).unwrap();
//! assert_eq!(cycle.billing_month_for(purchase).to_string(), "2025-02");
//!
//! // The matcher and engine run against your own store implementations;
//! // see `utils::MemoryStorage` for an in-memory reference.
//! let matcher = ReconciliationMatcher::default();
//! let (start, end) = matcher.search_window(NaiveDate::from_ymd_opt(2025, 2, 27).unwrap());
//! assert!(start < end);
//! ```

pub mod billing;
pub mod matching;
pub mod reconciliation;
pub mod status;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use billing::*;
pub use matching::*;
pub use reconciliation::*;
pub use status::*;
pub use traits::*;
pub use types::*;
