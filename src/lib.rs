//! Per-token rollup of closed trades.
//!
//! A ledger of buy/sell transactions is loaded from CSV ([`ledger`]), folded
//! into one [`TokenSummary`] per token ([`aggregate`]) and written back out as
//! a summary table ([`report`]). Amounts are exact decimals until the final
//! whole-unit rounding of each total.

pub mod aggregate;
pub mod error;
pub mod ledger;
pub mod report;

pub use aggregate::{AggregateOptions, DateSummary, TokenSummary, aggregate_transactions};
pub use error::{DataError, Result};
pub use ledger::{Transaction, load_transactions, read_transactions};
pub use report::{ReportTotals, write_summaries, write_summaries_to};
