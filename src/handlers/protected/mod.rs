// handlers/protected/mod.rs - endpoints behind the bearer auth middleware

pub mod auth;
pub mod customers;

pub use auth::{logout, me};
