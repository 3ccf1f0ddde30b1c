// src/services/report_service.rs

use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::{
    common::error::AppError,
    db::{ProductRepository, ReportRepository},
    models::{
        product::Product,
        report::{
            ActiveMonths, DashboardStats, DateWindow, EmailReportResponse, MonthlyReport,
            ProductSales, ReportQuery, SalesAggregateRow, SalesReport, SalesSummary, StockLine,
            TimeFrame, TopSellingProduct,
        },
    },
    services::{
        mail_service::{render_report_html, Mailer},
        weights::to_kilograms,
    },
};

fn month_window(today: NaiveDate) -> DateWindow {
    let start = today.with_day(1).unwrap_or(today);
    let next_month = if start.month() == 12 {
        NaiveDate::from_ymd_opt(start.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(start.year(), start.month() + 1, 1)
    };
    let end = next_month
        .and_then(|d| d.pred_opt())
        .unwrap_or(today);
    DateWindow {
        start_date: start,
        end_date: end,
    }
}

/// Resolve a janela do relatório. O `timeFrame` tem precedência sobre datas
/// avulsas; sem nada (ou com valor desconhecido) vale o mês corrente.
pub fn resolve_window(query: &ReportQuery, today: NaiveDate) -> Result<DateWindow, AppError> {
    match query.time_frame {
        Some(TimeFrame::Today) => Ok(DateWindow {
            start_date: today,
            end_date: today,
        }),
        Some(TimeFrame::ThisWeek) => {
            // Domingo a sábado
            let start = today - Duration::days(today.weekday().num_days_from_sunday() as i64);
            Ok(DateWindow {
                start_date: start,
                end_date: start + Duration::days(6),
            })
        }
        Some(TimeFrame::ThisYear) => {
            let start = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today);
            let end = NaiveDate::from_ymd_opt(today.year(), 12, 31).unwrap_or(today);
            Ok(DateWindow {
                start_date: start,
                end_date: end,
            })
        }
        Some(TimeFrame::ThisMonth) | Some(TimeFrame::Other) => Ok(month_window(today)),
        None => match (query.start_date, query.end_date) {
            (Some(start), Some(end)) if start > end => Err(AppError::BadRequest(
                "startDate must not be after endDate".into(),
            )),
            (Some(start), Some(end)) => Ok(DateWindow {
                start_date: start,
                end_date: end,
            }),
            _ => Ok(month_window(today)),
        },
    }
}

/// Monta o relatório a partir das linhas agregadas por produto.
pub fn build_sales_report(rows: Vec<SalesAggregateRow>, total_invoices: i64, window: DateWindow) -> SalesReport {
    let data: Vec<ProductSales> = rows
        .into_iter()
        .map(|row| ProductSales {
            kilograms: to_kilograms(row.category.as_deref().unwrap_or(""), row.total_quantity),
            product_id: row.product_id,
            product_name: row.product_name,
            category: row.category,
            total_quantity: row.total_quantity,
            total_revenue: row.total_revenue,
            total_invoices: row.total_invoices,
        })
        .collect();

    let summary = SalesSummary {
        total_revenue: data.iter().map(|d| d.total_revenue).sum(),
        total_quantity: data.iter().map(|d| d.total_quantity).sum(),
        total_kilograms: data.iter().map(|d| d.kilograms).sum(),
        total_invoices,
    };

    SalesReport {
        data,
        summary,
        date_range: window,
    }
}

pub fn stock_lines(products: &[Product]) -> (Vec<StockLine>, Decimal) {
    let lines: Vec<StockLine> = products
        .iter()
        .map(|p| StockLine {
            name: p.name.clone(),
            category: p.category.clone(),
            stock: p.stock,
            kilograms: to_kilograms(&p.category, p.stock as i64),
            price: p.price,
            value: Decimal::from(p.stock) * p.price,
        })
        .collect();
    let total = lines.iter().map(|l| l.value).sum();
    (lines, total)
}

/// Receita por quilo, com 2 casas; `None` quando nada foi vendido.
pub fn net_sales_average(summary: &SalesSummary) -> Option<Decimal> {
    if summary.total_kilograms.is_zero() {
        return None;
    }
    summary
        .total_revenue
        .checked_div(summary.total_kilograms)
        .map(|avg| avg.round_dp(2))
}

#[derive(Clone)]
pub struct ReportService {
    repo: ReportRepository,
    product_repo: ProductRepository,
    mailer: Option<Arc<dyn Mailer>>,
    recipients: Vec<String>,
}

impl ReportService {
    pub fn new(
        repo: ReportRepository,
        product_repo: ProductRepository,
        mailer: Option<Arc<dyn Mailer>>,
        recipients: Vec<String>,
    ) -> Self {
        Self {
            repo,
            product_repo,
            mailer,
            recipients,
        }
    }

    fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    pub async fn sales_report(&self, query: &ReportQuery) -> Result<SalesReport, AppError> {
        let window = resolve_window(query, Self::today())?;
        self.sales_for(window, query.include_unpaid).await
    }

    async fn sales_for(&self, window: DateWindow, include_unpaid: bool) -> Result<SalesReport, AppError> {
        let rows = self.repo.sales_by_product(window, include_unpaid).await?;
        let invoices = self.repo.distinct_invoice_count(window, include_unpaid).await?;
        Ok(build_sales_report(rows, invoices, window))
    }

    pub async fn top_selling(&self, limit: Option<i64>) -> Result<Vec<TopSellingProduct>, AppError> {
        let limit = limit.map(|l| l.clamp(1, 100));
        let rows = self.repo.top_selling(limit).await?;
        Ok(rows
            .into_iter()
            .map(|row| TopSellingProduct {
                kilograms: to_kilograms(row.category.as_deref().unwrap_or(""), row.total_quantity),
                product_id: row.product_id,
                product_name: row.product_name,
                category: row.category,
                total_quantity: row.total_quantity,
                total_revenue: row.total_revenue,
            })
            .collect())
    }

    pub async fn working_months(&self, query: &ReportQuery) -> Result<ActiveMonths, AppError> {
        let window = resolve_window(query, Self::today())?;
        let months = self.repo.active_months(window, query.include_unpaid).await?;
        Ok(ActiveMonths {
            count: months.len(),
            months,
            date_range: window,
        })
    }

    pub async fn dashboard_stats(&self) -> Result<DashboardStats, AppError> {
        self.repo.dashboard_stats().await
    }

    /// Relatório do mês corrente (somente faturas pagas) + posição de estoque.
    pub async fn monthly_report(&self) -> Result<MonthlyReport, AppError> {
        let sales = self.sales_for(month_window(Self::today()), false).await?;
        let products = self.product_repo.list_in_stock().await?;
        let (stock, total_stock_value) = stock_lines(&products);

        Ok(MonthlyReport {
            net_sales_average: net_sales_average(&sales.summary),
            sales,
            stock,
            total_stock_value,
        })
    }

    pub async fn send_monthly_report(&self) -> Result<EmailReportResponse, AppError> {
        let mailer = self.mailer.as_ref().ok_or(AppError::MailNotConfigured)?;
        if self.recipients.is_empty() {
            return Err(AppError::MailNotConfigured);
        }

        let report = self.monthly_report().await?;
        let window = report.sales.date_range;
        let subject = format!(
            "Monthly sales report {} - {}",
            window.start_date, window.end_date
        );

        mailer
            .send_html(&self.recipients, &subject, render_report_html(&report))
            .await?;

        tracing::info!("📧 Monthly report sent to {} recipients", self.recipients.len());
        Ok(EmailReportResponse {
            success: true,
            recipients: self.recipients.len(),
            date_range: window,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn frame(time_frame: TimeFrame) -> ReportQuery {
        ReportQuery {
            time_frame: Some(time_frame),
            ..Default::default()
        }
    }

    #[test]
    fn named_windows() {
        // quarta-feira
        let today = date(2025, 3, 12);

        let w = resolve_window(&frame(TimeFrame::Today), today).unwrap();
        assert_eq!((w.start_date, w.end_date), (today, today));

        let w = resolve_window(&frame(TimeFrame::ThisWeek), today).unwrap();
        assert_eq!((w.start_date, w.end_date), (date(2025, 3, 9), date(2025, 3, 15)));

        let w = resolve_window(&frame(TimeFrame::ThisMonth), today).unwrap();
        assert_eq!((w.start_date, w.end_date), (date(2025, 3, 1), date(2025, 3, 31)));

        let w = resolve_window(&frame(TimeFrame::ThisYear), today).unwrap();
        assert_eq!((w.start_date, w.end_date), (date(2025, 1, 1), date(2025, 12, 31)));
    }

    #[test]
    fn week_starting_on_sunday_and_month_edges() {
        let sunday = date(2025, 3, 9);
        let w = resolve_window(&frame(TimeFrame::ThisWeek), sunday).unwrap();
        assert_eq!(w.start_date, sunday);

        let w = month_window(date(2024, 2, 10));
        assert_eq!(w.end_date, date(2024, 2, 29));

        let w = month_window(date(2025, 12, 31));
        assert_eq!((w.start_date, w.end_date), (date(2025, 12, 1), date(2025, 12, 31)));
    }

    #[test]
    fn defaults_and_custom_ranges() {
        let today = date(2025, 6, 20);
        let month = (date(2025, 6, 1), date(2025, 6, 30));

        let w = resolve_window(&ReportQuery::default(), today).unwrap();
        assert_eq!((w.start_date, w.end_date), month);

        let w = resolve_window(&frame(TimeFrame::Other), today).unwrap();
        assert_eq!((w.start_date, w.end_date), month);

        let custom = ReportQuery {
            start_date: Some(date(2025, 1, 5)),
            end_date: Some(date(2025, 2, 5)),
            ..Default::default()
        };
        let w = resolve_window(&custom, today).unwrap();
        assert_eq!((w.start_date, w.end_date), (date(2025, 1, 5), date(2025, 2, 5)));

        // timeFrame vence as datas avulsas
        let both = ReportQuery {
            time_frame: Some(TimeFrame::Today),
            ..custom.clone()
        };
        assert_eq!(resolve_window(&both, today).unwrap().start_date, today);

        let inverted = ReportQuery {
            start_date: Some(date(2025, 2, 5)),
            end_date: Some(date(2025, 1, 5)),
            ..Default::default()
        };
        assert!(matches!(resolve_window(&inverted, today), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn unknown_time_frame_deserializes_to_other() {
        let tf: TimeFrame = serde_json::from_str("\"lastDecade\"").unwrap();
        assert_eq!(tf, TimeFrame::Other);
        let tf: TimeFrame = serde_json::from_str("\"thisWeek\"").unwrap();
        assert_eq!(tf, TimeFrame::ThisWeek);
    }

    fn aggregate(name: &str, category: &str, quantity: i64, revenue: i64, invoices: i64) -> SalesAggregateRow {
        SalesAggregateRow {
            product_id: Uuid::new_v4(),
            product_name: name.into(),
            category: Some(category.into()),
            total_quantity: quantity,
            total_revenue: Decimal::from(revenue),
            total_invoices: invoices,
        }
    }

    #[test]
    fn report_normalises_kilograms_and_sums() {
        let window = month_window(date(2025, 3, 1));
        let report = build_sales_report(
            vec![
                aggregate("BOPF 250g", "250g", 4, 2000, 2),
                aggregate("Dust bulk", "bulk", 2, 1500, 1),
                aggregate("Gift", "XYZ", 3, 300, 1),
            ],
            3,
            window,
        );

        assert_eq!(report.data[0].kilograms, Decimal::from(1));
        assert_eq!(report.data[1].kilograms, Decimal::from(2));
        assert_eq!(report.data[2].kilograms, Decimal::from(3));
        assert_eq!(
            report.summary,
            SalesSummary {
                total_revenue: Decimal::from(3800),
                total_quantity: 9,
                total_kilograms: Decimal::from(6),
                total_invoices: 3,
            }
        );
        assert_eq!(report.date_range, window);
    }

    #[test]
    fn stock_value_and_average() {
        let product = Product {
            id: Uuid::new_v4(),
            name: "Dust 2".into(),
            category: "tea bag".into(),
            price: "12.50".parse().unwrap(),
            stock: 1000,
            entire_stock: 1200,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let (lines, total) = stock_lines(&[product]);
        assert_eq!(lines[0].kilograms, Decimal::from(2));
        assert_eq!(total, Decimal::from(12500));

        let summary = SalesSummary {
            total_revenue: Decimal::from(1000),
            total_kilograms: Decimal::from(3),
            ..Default::default()
        };
        assert_eq!(net_sales_average(&summary), Some("333.33".parse().unwrap()));
        assert_eq!(net_sales_average(&SalesSummary::default()), None);
    }
}
