pub mod auth;
pub mod customer_service;
pub mod invoice_service;
pub mod mail_service;
pub mod numbering;
pub mod payment;
pub mod product_service;
pub mod received_service;
pub mod report_service;
pub mod stock;
pub mod weights;
