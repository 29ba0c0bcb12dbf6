pub mod auth_service;
pub mod customer_service;

pub use auth_service::{AuthService, AuthSession, CurrentActor, LoginRequest, RegisterRequest};
pub use customer_service::{CustomerRequest, CustomerService};
