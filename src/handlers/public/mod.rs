// handlers/public/mod.rs - endpoints that hand out tokens

pub mod auth;

pub use auth::{login, register};
