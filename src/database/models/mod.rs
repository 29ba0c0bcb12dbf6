pub mod access_token;
pub mod actor;
pub mod customer;

pub use access_token::AccessToken;
pub use actor::{Actor, NewActor, Role};
pub use customer::{CompanyCount, Customer, CustomerChanges, CustomerPage, CustomerSummary, NewCustomer};
