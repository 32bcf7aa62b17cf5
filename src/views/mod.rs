/*
 * Responsibility
 * - Server-rendered HTML for every page (escaping lives in layout)
 * - Views only format; they never call services
 */
pub mod calories;
pub mod errors;
pub mod layout;
pub mod pages;
pub mod recipes;
