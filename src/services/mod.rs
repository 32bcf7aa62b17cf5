pub mod cache;
pub mod calories;
pub mod key_lock;
pub mod rate_limit;
pub mod recipes;
