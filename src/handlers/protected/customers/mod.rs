pub mod create;
pub mod list;
pub mod process;
pub mod record;
pub mod summary;

// Re-export handler functions for use in routing
pub use create::post as customer_create;
pub use list::get as customer_list;
pub use process::export as customer_export;
pub use process::import as customer_import;
pub use record::delete as record_delete;
pub use record::get as record_get;
pub use record::put as record_put;
pub use summary::get as customer_summary;
