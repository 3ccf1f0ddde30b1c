// src/docs.rs

use utoipa::openapi::security::{ApiKey, ApiKeyValue, Http, HttpAuthScheme, SecurityScheme};
use utoipa::OpenApi;

use crate::common::pagination;
use crate::handlers;
use crate::middleware::auth::SESSION_COOKIE;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Admin ---
        handlers::admin::register,
        handlers::admin::login,
        handlers::admin::logout,
        handlers::admin::first_run,
        handlers::admin::get_me,
        handlers::admin::list_admins,
        handlers::admin::stats,
        handlers::admin::verify_admin,

        // --- Customers ---
        handlers::customer::list_customers,
        handlers::customer::list_customers_paginated,
        handlers::customer::get_customer,
        handlers::customer::customer_invoices,
        handlers::customer::customer_summary,
        handlers::customer::create_customer,
        handlers::customer::update_customer,
        handlers::customer::delete_customer,

        // --- Products ---
        handlers::product::list_products,
        handlers::product::list_products_paginated,
        handlers::product::get_product,
        handlers::product::create_product,
        handlers::product::update_product,
        handlers::product::delete_product,

        // --- Invoices ---
        handlers::invoice::list_invoices,
        handlers::invoice::list_invoices_paginated,
        handlers::invoice::recent_invoices,
        handlers::invoice::next_invoice_number,
        handlers::invoice::get_invoice,
        handlers::invoice::create_invoice,
        handlers::invoice::update_invoice,
        handlers::invoice::cancel_invoice,
        handlers::invoice::mark_invoice_paid,
        handlers::invoice::add_advance_payment,

        // --- Received Invoices ---
        handlers::received::list_received,
        handlers::received::list_received_paginated,
        handlers::received::next_received_number,
        handlers::received::get_received,
        handlers::received::create_received,
        handlers::received::update_received,

        // --- Reports ---
        handlers::invoice::top_selling,
        handlers::invoice::sales_report,
        handlers::invoice::working_months,
        handlers::report::send_email_report,
    ),
    components(
        schemas(
            // --- Admin ---
            models::admin::AdminRole,
            models::admin::Admin,
            models::admin::RegisterAdminPayload,
            models::admin::LoginAdminPayload,
            models::admin::UpdateAdminStatusPayload,
            models::admin::SessionResponse,
            models::admin::FirstRunResponse,

            // --- Customers ---
            models::customer::Customer,
            models::customer::CustomerPayload,
            models::customer::CustomerSummary,

            // --- Products ---
            models::product::Product,
            models::product::CreateProductPayload,
            models::product::UpdateProductPayload,

            // --- Invoices ---
            models::invoice::InvoiceItem,
            models::invoice::CustomerDetails,
            models::invoice::Invoice,
            models::invoice::InvoiceItemPayload,
            models::invoice::CreateInvoicePayload,
            models::invoice::UpdateInvoicePayload,
            models::invoice::AdvancePaymentPayload,
            models::invoice::NextNumberResponse,
            models::invoice::StatusFilter,

            // --- Received Invoices ---
            models::received::ReceivedItem,
            models::received::ReceivedInvoice,
            models::received::ReceivedItemPayload,
            models::received::ReceivedInvoicePayload,

            // --- Reports ---
            models::report::TimeFrame,
            models::report::DateWindow,
            models::report::ProductSales,
            models::report::SalesSummary,
            models::report::SalesReport,
            models::report::TopSellingProduct,
            models::report::ActiveMonth,
            models::report::ActiveMonths,
            models::report::DashboardStats,
            models::report::EmailReportResponse,

            // --- Paginação ---
            pagination::SortDirection,
            pagination::PageMeta,
        )
    ),
    tags(
        (name = "Admin", description = "Sessão, registro e verificação de administradores"),
        (name = "Customers", description = "Cadastro de clientes"),
        (name = "Products", description = "Catálogo e estoque"),
        (name = "Invoices", description = "Faturas de venda, cancelamento e pagamentos"),
        (name = "Received Invoices", description = "Notas de entrada de fornecedores"),
        (name = "Reports", description = "Relatórios de vendas e envio por e-mail")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
        components.add_security_scheme(
            "session_cookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(SESSION_COOKIE))),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_write_routes_and_security_schemes() {
        let doc = ApiDoc::openapi();

        assert!(doc.paths.paths.contains_key("/api/invoices/{id}/cancel"));
        assert!(doc.paths.paths.contains_key("/api/received-invoices"));
        assert!(doc.paths.paths.contains_key("/api/reports/email"));

        let schemes = &doc.components.expect("components").security_schemes;
        assert!(schemes.contains_key("api_jwt"));
        assert!(schemes.contains_key("session_cookie"));
    }
}
