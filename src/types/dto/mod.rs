// DTOs - request and response bodies exposed through the OpenAPI surface
pub mod access;
pub mod account;
pub mod auth;
pub mod common;
