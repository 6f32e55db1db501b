//! Order statistics.
//!
//! Series are computed from line items only, so they are unaffected by an
//! order being received and its aggregate deleted.

pub mod error;
pub mod service;
pub mod window;

pub use error::{Result, StatisticsError};
pub use service::{MONTHS, MonthlySeries, StatisticsService};
pub use window::MonthWindow;
