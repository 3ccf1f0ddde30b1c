pub mod admin_repo;
pub use admin_repo::AdminRepository;
pub mod customer_repo;
pub use customer_repo::CustomerRepository;
pub mod product_repo;
pub use product_repo::ProductRepository;
pub mod invoice_repo;
pub use invoice_repo::InvoiceRepository;
pub mod received_repo;
pub use received_repo::ReceivedInvoiceRepository;
pub mod report_repo;
pub use report_repo::ReportRepository;
