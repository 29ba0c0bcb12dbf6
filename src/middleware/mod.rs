pub mod auth;
pub mod response;

pub use auth::{bearer_auth_middleware, CurrentActor};
pub use response::{ApiResponse, ApiResult};
