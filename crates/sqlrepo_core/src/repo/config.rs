//! Per-repository naming configuration.

use crate::naming;
use std::any::type_name;

/// Table and model identity a repository is bound to for its lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryConfig {
    pub table_name: String,
    pub model_name: String,
}

impl RepositoryConfig {
    /// Explicit override of both names.
    pub fn new(table_name: impl Into<String>, model_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            model_name: model_name.into(),
        }
    }

    /// Model identity is `M`'s type path; table is its tableized short name.
    pub fn for_model<M: ?Sized>() -> Self {
        let model_name = type_name::<M>();
        Self::new(
            naming::tableize(naming::short_type_name(model_name)),
            model_name,
        )
    }

    /// Both names derived from a repository type path by convention.
    pub fn for_type<R: ?Sized>() -> Self {
        let type_path = type_name::<R>();
        Self::new(
            naming::table_name_for_type(type_path),
            naming::model_name_for_type(type_path),
        )
    }

    pub fn with_table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = table_name.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::RepositoryConfig;

    mod model {
        pub struct LineItem;
    }

    mod repo {
        pub struct SqliteLineItemRepository;
    }

    #[test]
    fn convention_matches_model_identity() {
        let by_type = RepositoryConfig::for_type::<repo::SqliteLineItemRepository>();
        let by_model = RepositoryConfig::for_model::<model::LineItem>();
        assert_eq!(by_type, by_model);
        assert_eq!(by_type.table_name, "line_items");
    }

    #[test]
    fn explicit_table_name_overrides_convention() {
        let config =
            RepositoryConfig::for_model::<model::LineItem>().with_table_name("order_lines");
        assert_eq!(config.table_name, "order_lines");
        assert!(config.model_name.ends_with("::model::LineItem"));
    }
}
