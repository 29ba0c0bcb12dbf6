use super::types::{SortDirection, SortField, SortOrder};

pub struct FilterOrder;

impl FilterOrder {
    /// Resolves `sort_by` / `sort_order` against the allow-list. Unknown or
    /// missing values fall back to `created_at` / `desc` independently.
    pub fn parse(sort_by: Option<&str>, sort_order: Option<&str>) -> SortOrder {
        let field = sort_by.and_then(SortField::from_param).unwrap_or_default();
        let direction = sort_order.and_then(SortDirection::from_param).unwrap_or_default();
        if sort_by.is_some_and(|raw| SortField::from_param(raw).is_none()) {
            tracing::debug!("Ignoring sort_by outside allow-list: {:?}", sort_by);
        }
        SortOrder { field, direction }
    }

    /// `ORDER BY` clause with an `id` tie-breaker for stable pagination
    pub fn generate(order: &SortOrder, table_alias: &str) -> String {
        format!(
            "ORDER BY {alias}.\"{}\" {dir}, {alias}.\"id\" {dir}",
            order.field.column(),
            alias = table_alias,
            dir = order.direction.to_sql(),
        )
    }
}
