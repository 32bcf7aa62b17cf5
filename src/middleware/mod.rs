/*
 * Responsibility
 * - Router-level middleware (transport concerns + browser security headers)
 */
pub mod http;
pub mod security_headers;
