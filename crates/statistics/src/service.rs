//! Monthly quantity series.

use common::ProductId;
use order_store::OrderStore;

use crate::{MonthWindow, Result, StatisticsError};

/// Months in a series.
pub const MONTHS: usize = 12;

/// Quantity per month, January at index 0.
pub type MonthlySeries = [u64; MONTHS];

const MIN_YEAR: i32 = 1000;
const MAX_YEAR: i32 = 9999;

/// Computes order statistics from line item history.
#[derive(Clone)]
pub struct StatisticsService<S: OrderStore> {
    store: S,
    window: MonthWindow,
}

impl<S: OrderStore> StatisticsService<S> {
    /// Creates a service using calendar month windows.
    pub fn new(store: S) -> Self {
        Self::with_window(store, MonthWindow::default())
    }

    pub fn with_window(store: S, window: MonthWindow) -> Self {
        Self { store, window }
    }

    pub fn window(&self) -> MonthWindow {
        self.window
    }

    /// Sums the ordered quantity of `product_id` for each month of `year`.
    ///
    /// Months without orders are zero. Line items are counted whether or
    /// not their order has since been received.
    #[tracing::instrument(skip(self), fields(window = %self.window))]
    pub async fn monthly_series(&self, product_id: ProductId, year: i32) -> Result<MonthlySeries> {
        if !product_id.is_valid() {
            return Err(StatisticsError::Validation {
                field: "productId",
                message: "must be a positive id".to_string(),
            });
        }
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(StatisticsError::Validation {
                field: "year",
                message: format!("must be a four digit year, got {year}"),
            });
        }

        let mut series = [0u64; MONTHS];
        for (index, slot) in series.iter_mut().enumerate() {
            let (start, end) = self.window.bounds(year, index as u32 + 1)?;
            *slot = self
                .store
                .quantity_between(product_id, start, end)
                .await?;
        }

        tracing::debug!(total = series.iter().sum::<u64>(), "monthly series computed");
        Ok(series)
    }
}
