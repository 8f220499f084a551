//! Dashboard module
//!
//! Turns a user's expense snapshot into the figures shown on the home dashboard:
//! monthly totals, the month-over-month comparison, category totals and the trend series.

mod aggregation;
mod ranking;

pub use aggregation::{
    AggregationResult, CategoryTotal, Comparison, MonthTotal, OUTLIER_CAP, aggregate,
};
pub use ranking::{CategoryShare, TOP_CATEGORY_COUNT};
