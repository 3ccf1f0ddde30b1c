pub mod admin;
pub mod customer;
pub mod invoice;
pub mod product;
pub mod received;
pub mod report;
