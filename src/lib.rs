//! Descriptive statistics over in-memory tables.
//!
//! * [`filter`] keeps the rows matching a predicate expression.
//! * [`describe`] computes count, unique, min, max, mean, std, median and an
//!   optional normal confidence interval for every column.
//! * [`summary`] filters, selects and optionally groups before describing.
//! * [`polyfit`] fits a least-squares polynomial between two columns.
//!
//! Recoverable problems (an unusable filter, a missing or unsupported
//! confidence level, a rank-deficient fit) never fail a call: the result
//! comes back in an [`Outcome`] together with its [`Warning`]s, which are
//! also logged through the `log` facade. Invalid column selections are [`StatsError`]s.
//!
//! ```
//! use tabstat::prelude::*;
//!
//! let table = Table::new(vec![
//!     Column::new("region", ["EU", "US", "EU"]),
//!     Column::new("price", [10.0, 12.0, 8.0]),
//! ])?;
//!
//! let out = summary(
//!     &table,
//!     &SummaryOptions::new().columns("price").groups("region").confidence("95%"),
//! )?;
//! assert!(out.warnings.is_empty());
//! assert_eq!(out.value.height(), 2);
//! # Ok::<(), tabstat::StatsError>(())
//! ```

pub mod data;
pub mod diagnostics;
pub mod error;
pub mod options;
pub mod stats;

pub use data::filter::filter;
pub use data::model::{Column, ColumnKind, Table, Value};
pub use diagnostics::{Outcome, Warning};
pub use error::{Result, StatsError};
pub use options::{PolyfitOptions, Selection, SummaryOptions};
pub use stats::confidence::ConfidenceLevel;
pub use stats::describe::describe;
pub use stats::polyfit::{polyfit, Polynomial};
pub use stats::summary::summary;

pub mod prelude {
    pub use crate::data::filter::filter;
    pub use crate::data::model::{Column, Table, Value};
    pub use crate::diagnostics::{Outcome, Warning};
    pub use crate::error::StatsError;
    pub use crate::options::{PolyfitOptions, Selection, SummaryOptions};
    pub use crate::stats::confidence::ConfidenceLevel;
    pub use crate::stats::describe::describe;
    pub use crate::stats::polyfit::{polyfit, Polynomial};
    pub use crate::stats::summary::summary;
}
