// Database entities - SeaORM models
pub mod account;
pub mod address;
pub mod audit_event;
