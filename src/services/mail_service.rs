// src/services/mail_service.rs

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    Message, SmtpTransport, Transport,
};

use crate::{
    common::error::AppError,
    config::SmtpConfig,
    models::report::MonthlyReport,
};

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_html(&self, recipients: &[String], subject: &str, html: String) -> Result<(), AppError>;
}

pub struct SmtpMailer {
    config: SmtpConfig,
}

impl SmtpMailer {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }
}

// 465 = TLS implícito; demais portas com TLS usam STARTTLS
fn build_transport(config: &SmtpConfig) -> Result<SmtpTransport, AppError> {
    let mut builder = if !config.use_tls {
        SmtpTransport::builder_dangerous(&config.host).port(config.port)
    } else if config.port == 465 {
        SmtpTransport::relay(&config.host)
            .map_err(|e| AppError::MailError(format!("invalid SMTP host: {e}")))?
            .port(config.port)
    } else {
        SmtpTransport::starttls_relay(&config.host)
            .map_err(|e| AppError::MailError(format!("invalid SMTP host: {e}")))?
            .port(config.port)
    };

    if let (Some(user), Some(password)) = (&config.user, &config.password) {
        builder = builder.credentials(Credentials::new(user.clone(), password.clone()));
    }

    Ok(builder.build())
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_html(&self, recipients: &[String], subject: &str, html: String) -> Result<(), AppError> {
        let from: Mailbox = self
            .config
            .from
            .parse()
            .map_err(|_| AppError::MailError("invalid sender address".into()))?;

        let mut builder = Message::builder().from(from).subject(subject);
        for recipient in recipients {
            let to: Mailbox = recipient
                .parse()
                .map_err(|_| AppError::MailError(format!("invalid recipient address: {recipient}")))?;
            builder = builder.to(to);
        }
        let email = builder
            .header(ContentType::TEXT_HTML)
            .body(html)
            .map_err(|e| AppError::MailError(format!("failed to build e-mail: {e}")))?;

        // O cliente SMTP do lettre é bloqueante
        let config = self.config.clone();
        tokio::task::spawn_blocking(move || {
            let transport = build_transport(&config)?;
            transport
                .send(&email)
                .map_err(|e| AppError::MailError(e.to_string()))?;
            Ok::<(), AppError>(())
        })
        .await
        .map_err(|e| anyhow::anyhow!("mail task failed: {}", e))??;

        Ok(())
    }
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Corpo HTML do relatório mensal.
pub fn render_report_html(report: &MonthlyReport) -> String {
    let sales = &report.sales;
    let mut html = String::new();

    html.push_str("<html><body style=\"font-family: Arial, sans-serif\">");
    html.push_str(&format!(
        "<h2>Sales report {} to {}</h2>",
        sales.date_range.start_date, sales.date_range.end_date
    ));

    html.push_str("<table cellpadding=\"6\">");
    html.push_str(&format!(
        "<tr><td>Total sales</td><td><b>{:.2}</b></td></tr>",
        sales.summary.total_revenue
    ));
    html.push_str(&format!(
        "<tr><td>Total kilograms</td><td><b>{:.2}</b></td></tr>",
        sales.summary.total_kilograms
    ));
    let average = report
        .net_sales_average
        .map(|a| format!("{a:.2}"))
        .unwrap_or_else(|| "-".to_string());
    html.push_str(&format!(
        "<tr><td>Net sales average (per kg)</td><td><b>{average}</b></td></tr>"
    ));
    html.push_str(&format!(
        "<tr><td>Invoices</td><td><b>{}</b></td></tr>",
        sales.summary.total_invoices
    ));
    html.push_str(&format!(
        "<tr><td>Stock value</td><td><b>{:.2}</b></td></tr>",
        report.total_stock_value
    ));
    html.push_str("</table>");

    html.push_str("<h3>Sales by product</h3>");
    html.push_str("<table border=\"1\" cellpadding=\"4\" cellspacing=\"0\">");
    html.push_str("<tr><th>Product</th><th>Category</th><th>Quantity</th><th>Kg</th><th>Revenue</th></tr>");
    for row in &sales.data {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{:.2}</td><td>{:.2}</td></tr>",
            escape_html(&row.product_name),
            escape_html(row.category.as_deref().unwrap_or("")),
            row.total_quantity,
            row.kilograms,
            row.total_revenue
        ));
    }
    html.push_str("</table>");

    html.push_str("<h3>Stock</h3>");
    html.push_str("<table border=\"1\" cellpadding=\"4\" cellspacing=\"0\">");
    html.push_str("<tr><th>Product</th><th>Category</th><th>Units</th><th>Kg</th><th>Value</th></tr>");
    for line in &report.stock {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{:.2}</td><td>{:.2}</td></tr>",
            escape_html(&line.name),
            escape_html(&line.category),
            line.stock,
            line.kilograms,
            line.value
        ));
    }
    html.push_str("</table></body></html>");

    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::report::{DateWindow, ProductSales, SalesReport, SalesSummary, StockLine};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn report(product_name: &str) -> MonthlyReport {
        MonthlyReport {
            sales: SalesReport {
                data: vec![ProductSales {
                    product_id: Uuid::new_v4(),
                    product_name: product_name.into(),
                    category: Some("250g".into()),
                    total_quantity: 4,
                    kilograms: Decimal::from(1),
                    total_revenue: Decimal::from(1200),
                    total_invoices: 2,
                }],
                summary: SalesSummary {
                    total_revenue: Decimal::from(1200),
                    total_quantity: 4,
                    total_kilograms: Decimal::from(1),
                    total_invoices: 2,
                },
                date_range: DateWindow {
                    start_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
                    end_date: NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
                },
            },
            stock: vec![StockLine {
                name: "Dust 2".into(),
                category: "bulk".into(),
                stock: 3,
                kilograms: Decimal::from(3),
                price: Decimal::from(100),
                value: Decimal::from(300),
            }],
            total_stock_value: Decimal::from(300),
            net_sales_average: Some(Decimal::from(1200)),
        }
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html("<b>\"Tom\" & 'Jerry'</b>"),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn report_contains_totals_and_escaped_names() {
        let html = render_report_html(&report("<script>alert(1)</script>"));

        assert!(html.contains("2025-03-01 to 2025-03-31"));
        assert!(html.contains("1200.00"));
        assert!(html.contains("300.00"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }
}
