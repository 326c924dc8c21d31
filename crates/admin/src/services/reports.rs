//! Dashboard figures.

use chrono::{DateTime, Days, NaiveDate, Utc};
use sqlx::PgPool;

use iranmarket_core::{Toman, tz};

use crate::db::RepositoryError;
use crate::db::reports::{
    DailySales, OrderCounts, ReportRepository, SalesTotals, TopCity, TopProduct,
};

/// Days in the sales chart, today included.
pub const CHART_DAYS: u64 = 7;

/// One bar of the sales chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartDay {
    /// `YYYY-MM-DD`.
    pub label: String,
    pub revenue: Toman,
    pub orders: i64,
    /// Bar width relative to the best day, 0..=100.
    pub bar_percent: i64,
}

/// Everything the dashboard shows.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub counts: OrderCounts,
    pub total_revenue: Toman,
    pub today: SalesTotals,
    pub chart: Vec<ChartDay>,
    pub top_products: Vec<TopProduct>,
    pub top_cities: Vec<TopCity>,
}

/// First day of the chart ending on `today`.
#[must_use]
pub fn chart_start(today: NaiveDate) -> NaiveDate {
    today
        .checked_sub_days(Days::new(CHART_DAYS - 1))
        .unwrap_or(today)
}

/// The last [`CHART_DAYS`] days ending on `today`, oldest first, with days
/// missing from `rows` filled with zero.
#[must_use]
pub fn fill_days(today: NaiveDate, rows: &[DailySales]) -> Vec<ChartDay> {
    let start = chart_start(today);
    let days: Vec<(NaiveDate, Toman, i64)> = start
        .iter_days()
        .take_while(|day| *day <= today)
        .map(|day| {
            rows.iter()
                .find(|row| row.day == day)
                .map_or((day, Toman::ZERO, 0), |row| (day, row.revenue, row.orders))
        })
        .collect();

    let best = days
        .iter()
        .map(|(_, revenue, _)| revenue.amount())
        .max()
        .unwrap_or(0);

    days.into_iter()
        .map(|(day, revenue, orders)| ChartDay {
            label: day.format("%Y-%m-%d").to_string(),
            revenue,
            orders,
            bar_percent: if best > 0 {
                revenue.amount().saturating_mul(100) / best
            } else {
                0
            },
        })
        .collect()
}

/// Load the dashboard as of `now`.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if any query fails.
pub async fn load_dashboard(pool: &PgPool, now: DateTime<Utc>) -> Result<Dashboard, RepositoryError> {
    let reports = ReportRepository::new(pool);
    let today = tz::local_date(now);
    let (today_start, today_end) = tz::local_day_bounds(today);
    let (chart_from, _) = tz::local_day_bounds(chart_start(today));

    let counts = reports.order_counts().await?;
    let total_revenue = reports.sales_between(None, None).await?.revenue;
    let today_sales = reports
        .sales_between(Some(today_start), Some(today_end))
        .await?;
    let daily = reports.daily_sales_since(chart_from).await?;
    let top_products = reports.top_products().await?;
    let top_cities = reports.top_cities().await?;

    Ok(Dashboard {
        counts,
        total_revenue,
        today: today_sales,
        chart: fill_days(today, &daily),
        top_products,
        top_cities,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_fill_days_zero_fills_and_orders_oldest_first() {
        let today = date(2025, 3, 21);
        let rows = [
            DailySales {
                day: date(2025, 3, 16),
                revenue: Toman::new(50_000),
                orders: 1,
            },
            DailySales {
                day: date(2025, 3, 21),
                revenue: Toman::new(200_000),
                orders: 3,
            },
        ];

        let chart = fill_days(today, &rows);
        assert_eq!(chart.len(), 7);
        assert_eq!(chart[0].label, "2025-03-15");
        assert_eq!(chart[0].revenue, Toman::ZERO);
        assert_eq!(chart[1].label, "2025-03-16");
        assert_eq!(chart[1].orders, 1);
        assert_eq!(chart[1].bar_percent, 25);
        assert_eq!(chart[6].label, "2025-03-21");
        assert_eq!(chart[6].bar_percent, 100);
    }

    #[test]
    fn test_fill_days_without_sales() {
        let chart = fill_days(date(2025, 1, 3), &[]);
        assert_eq!(chart.len(), 7);
        assert_eq!(chart[0].label, "2024-12-28");
        assert!(chart.iter().all(|d| d.bar_percent == 0 && d.orders == 0));
    }

    #[test]
    fn test_rows_outside_window_are_ignored() {
        let rows = [DailySales {
            day: date(2025, 3, 1),
            revenue: Toman::new(9_000),
            orders: 2,
        }];
        let chart = fill_days(date(2025, 3, 21), &rows);
        assert!(chart.iter().all(|d| d.revenue == Toman::ZERO));
    }
}
