/*
 * Responsibility
 * - HTTP surface: forms/DTOs, extractors, handlers, URL layout
 * - routes() is the only entry point app.rs needs
 */
pub mod dto;
pub mod extractors;
pub mod handlers;
mod routes;

pub use routes::routes;
