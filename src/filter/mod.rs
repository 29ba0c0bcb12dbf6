pub mod filter;
pub mod filter_order;
pub mod filter_where;
pub mod types;

pub use filter::CustomerFilter;
pub use types::*;
