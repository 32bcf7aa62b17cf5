/*
 * Responsibility
 * - One module per page group; handlers stay thin (validate → service → view)
 */
pub mod calories;
pub mod health;
pub mod pages;
pub mod recipes;
