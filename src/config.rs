// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{
        AdminRepository, CustomerRepository, InvoiceRepository, ProductRepository,
        ReceivedInvoiceRepository, ReportRepository,
    },
    services::{
        auth::{AuthService, TokenCodec},
        customer_service::CustomerService,
        invoice_service::InvoiceService,
        mail_service::{Mailer, SmtpMailer},
        product_service::ProductService,
        received_service::ReceivedInvoiceService,
        report_service::ReportService,
    },
};

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<String>,
    pub from: String,
    pub use_tls: bool,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub jwt_ttl_minutes: i64,
    pub cookie_secure: bool,
    pub db_max_connections: u32,
    // Presente só quando host, remetente e destinatários existem
    pub smtp: Option<SmtpConfig>,
    pub report_recipients: Vec<String>,
}

fn var_opt(key: &str) -> Option<String> {
    env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn var_parse<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match var_opt(key) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw}")),
        None => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = var_opt("DATABASE_URL").context("DATABASE_URL must be set")?;
        let jwt_secret = var_opt("JWT_SECRET").context("JWT_SECRET must be set")?;

        let report_recipients: Vec<String> = var_opt("REPORT_RECIPIENTS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|r| !r.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        let smtp = match (var_opt("SMTP_HOST"), var_opt("SMTP_FROM")) {
            (Some(host), Some(from)) if !report_recipients.is_empty() => Some(SmtpConfig {
                host,
                port: var_parse("SMTP_PORT", 587u16)?,
                user: var_opt("SMTP_USER"),
                password: var_opt("SMTP_PASSWORD"),
                from,
                use_tls: var_parse("SMTP_USE_TLS", true)?,
            }),
            _ => None,
        };

        Ok(Self {
            database_url,
            jwt_secret,
            bind_addr: var_opt("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            jwt_ttl_minutes: var_parse("JWT_TTL_MINUTES", 60i64)?,
            cookie_secure: var_parse("COOKIE_SECURE", false)?,
            db_max_connections: var_parse("DB_MAX_CONNECTIONS", 5u32)?,
            smtp,
            report_recipients,
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Arc<Config>,
    pub auth_service: AuthService,
    pub customer_service: CustomerService,
    pub product_service: ProductService,
    pub invoice_service: InvoiceService,
    pub received_service: ReceivedInvoiceService,
    pub report_service: ReportService,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("failed to connect to the database")?;

        tracing::info!("✅ Database connection established");

        let mailer: Option<Arc<dyn Mailer>> = config
            .smtp
            .clone()
            .map(|smtp| Arc::new(SmtpMailer::new(smtp)) as Arc<dyn Mailer>);

        Ok(Self::with_pool(config, db_pool, mailer))
    }

    /// Monta o gráfico de dependências sobre um pool já criado.
    pub fn with_pool(config: Config, db_pool: PgPool, mailer: Option<Arc<dyn Mailer>>) -> Self {
        let admin_repo = AdminRepository::new(db_pool.clone());
        let customer_repo = CustomerRepository::new(db_pool.clone());
        let product_repo = ProductRepository::new(db_pool.clone());
        let invoice_repo = InvoiceRepository::new(db_pool.clone());
        let received_repo = ReceivedInvoiceRepository::new(db_pool.clone());
        let report_repo = ReportRepository::new(db_pool.clone());

        let tokens = TokenCodec::new(&config.jwt_secret, config.jwt_ttl_minutes);
        let auth_service = AuthService::new(admin_repo, tokens, db_pool.clone());
        let customer_service = CustomerService::new(customer_repo.clone(), invoice_repo.clone());
        let product_service = ProductService::new(product_repo.clone());
        let invoice_service = InvoiceService::new(
            invoice_repo,
            product_repo.clone(),
            customer_repo,
            db_pool.clone(),
        );
        let received_service =
            ReceivedInvoiceService::new(received_repo, product_repo.clone(), db_pool.clone());
        let report_service = ReportService::new(
            report_repo,
            product_repo,
            mailer,
            config.report_recipients.clone(),
        );

        Self {
            db_pool,
            config: Arc::new(config),
            auth_service,
            customer_service,
            product_service,
            invoice_service,
            received_service,
            report_service,
        }
    }
}
