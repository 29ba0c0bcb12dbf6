use crate::database::models::Customer;

pub const HEADINGS: [&str; 6] = ["Name", "Email", "Phone", "Company", "Created By", "Created At"];

/// Shown when the creating actor no longer exists
pub const MISSING_CREATOR: &str = "N/A";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One export row, in `HEADINGS` order
pub fn project(customer: &Customer) -> [String; 6] {
    [
        customer.name.clone(),
        customer.email.clone(),
        customer.phone.clone(),
        customer.company_name.clone(),
        customer
            .creator_name
            .clone()
            .unwrap_or_else(|| MISSING_CREATOR.to_string()),
        customer.created_at.format(TIMESTAMP_FORMAT).to_string(),
    ]
}
