//! Statement text and parameter rendering for single-table CRUD.
//!
//! # Invariants
//! - Identifiers are backtick-quoted; placeholders are named after their column.
//! - A list value on `col` renders placeholders `:col_0, :col_1, ...` and
//!   `flatten_params` yields exactly those keys.
//! - Read predicates render null as `col IS NULL` without a placeholder;
//!   write predicates always bind.

use crate::model::{FieldValue, Row, ID_COLUMN};

/// Right-hand side of one predicate fragment.
#[derive(Debug, Clone, PartialEq)]
pub enum Criterion {
    /// `col = :col`, or `col IS NULL` on reads when null.
    Value(FieldValue),
    /// `col in (:col_0, ...)`.
    AnyOf(Vec<FieldValue>),
}

impl Criterion {
    pub fn any_of<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<FieldValue>,
    {
        Self::AnyOf(values.into_iter().map(Into::into).collect())
    }
}

impl From<FieldValue> for Criterion {
    fn from(value: FieldValue) -> Self {
        Self::Value(value)
    }
}

impl From<i64> for Criterion {
    fn from(value: i64) -> Self {
        Self::Value(value.into())
    }
}

impl From<i32> for Criterion {
    fn from(value: i32) -> Self {
        Self::Value(value.into())
    }
}

impl From<bool> for Criterion {
    fn from(value: bool) -> Self {
        Self::Value(value.into())
    }
}

impl From<&str> for Criterion {
    fn from(value: &str) -> Self {
        Self::Value(value.into())
    }
}

impl From<String> for Criterion {
    fn from(value: String) -> Self {
        Self::Value(value.into())
    }
}

impl From<Vec<i64>> for Criterion {
    fn from(values: Vec<i64>) -> Self {
        Self::any_of(values)
    }
}

impl From<&[i64]> for Criterion {
    fn from(values: &[i64]) -> Self {
        Self::any_of(values.iter().copied())
    }
}

impl From<Vec<&str>> for Criterion {
    fn from(values: Vec<&str>) -> Self {
        Self::any_of(values)
    }
}

impl From<Vec<String>> for Criterion {
    fn from(values: Vec<String>) -> Self {
        Self::any_of(values)
    }
}

/// Ordered column -> criterion pairs, combined with `and` on reads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conditions {
    entries: Vec<(String, Criterion)>,
}

impl Conditions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: impl Into<String>, criterion: impl Into<Criterion>) -> Self {
        self.insert(column, criterion);
        self
    }

    /// Sets `column`, replacing an existing criterion in its original position.
    pub fn insert(&mut self, column: impl Into<String>, criterion: impl Into<Criterion>) {
        let column = column.into();
        let criterion = criterion.into();
        match self.entries.iter_mut().find(|(name, _)| *name == column) {
            Some((_, slot)) => *slot = criterion,
            None => self.entries.push((column, criterion)),
        }
    }

    /// Overlays `other`: shared columns take `other`'s criterion, new ones are appended.
    pub fn merge(&mut self, other: &Conditions) {
        for (column, criterion) in &other.entries {
            self.insert(column.clone(), criterion.clone());
        }
    }

    pub fn get(&self, column: &str) -> Option<&Criterion> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, criterion)| criterion)
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.entries.retain(|(column, _)| keep(column));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Criterion)> {
        self.entries
            .iter()
            .map(|(column, criterion)| (column.as_str(), criterion))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<&Row> for Conditions {
    fn from(row: &Row) -> Self {
        row.iter()
            .fold(Conditions::new(), |conditions, (column, value)| {
                conditions.with(column, value.clone())
            })
    }
}

/// Renders statements against one table.
#[derive(Debug, Clone, Copy)]
pub struct SqlBuilder<'t> {
    table: &'t str,
}

impl<'t> SqlBuilder<'t> {
    pub fn new(table: &'t str) -> Self {
        Self { table }
    }

    /// ``INSERT INTO `t` (`a`, `b`) VALUES (:a, :b)``.
    pub fn insert(&self, fields: &Row) -> String {
        if fields.is_empty() {
            return format!("INSERT INTO {} DEFAULT VALUES", quote(self.table));
        }
        let columns = fields.columns().collect::<Vec<_>>();
        format!(
            "INSERT INTO {} (`{}`) VALUES (:{})",
            quote(self.table),
            columns.join("`, `"),
            columns.join(", :")
        )
    }

    /// ``UPDATE `t` SET `a`=:a,`b`=:b WHERE `id`=:id``.
    ///
    /// With no fields the id is assigned to itself, so the statement stays
    /// valid and changes nothing.
    pub fn update(&self, fields: &Row, filter: &Conditions) -> String {
        let assignments = if fields.is_empty() {
            format!("{id}={id}", id = quote(ID_COLUMN))
        } else {
            build_predicate(&Conditions::from(fields), ",", false)
        };
        format!(
            "UPDATE {} SET {} WHERE {}",
            quote(self.table),
            assignments,
            build_predicate(filter, " and ", false)
        )
    }

    /// ``SELECT * FROM `t` WHERE 1 [AND <predicate>] [AND <soft> is null] [LIMIT n]``.
    pub fn select(
        &self,
        filter: &Conditions,
        soft_delete_column: Option<&str>,
        limit: Option<u32>,
    ) -> String {
        let mut sql = format!("SELECT * FROM {} WHERE 1", quote(self.table));
        if !filter.is_empty() {
            sql.push_str(" AND ");
            sql.push_str(&build_predicate(filter, " and ", true));
        }
        if let Some(column) = soft_delete_column {
            sql.push_str(&format!(" AND {column} is null"));
        }
        if let Some(limit) = limit.filter(|limit| *limit > 0) {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        sql
    }

    /// Rows whose id is in `ids`, highest id first.
    pub fn select_by_ids(&self, ids: &Conditions) -> String {
        format!(
            "SELECT * FROM {} WHERE {} ORDER BY {} DESC",
            quote(self.table),
            build_predicate(ids, " and ", true),
            quote(ID_COLUMN)
        )
    }

    pub fn delete_by_id(&self) -> String {
        format!("DELETE FROM {} WHERE id=:id", quote(self.table))
    }

    /// SQLite has no `TRUNCATE`; an unqualified delete is its truncate form.
    pub fn truncate(&self) -> String {
        format!("DELETE FROM {}", quote(self.table))
    }

    /// Restarts the AUTOINCREMENT counter; binds the table name as `:name`.
    pub fn reset_sequence(&self) -> String {
        "DELETE FROM sqlite_sequence WHERE name = :name".to_string()
    }
}

/// Joins one fragment per column with `delimiter`, in column order.
pub fn build_predicate(fields: &Conditions, delimiter: &str, null_as_is_null: bool) -> String {
    fields
        .iter()
        .map(|(column, criterion)| match criterion {
            Criterion::AnyOf(values) => {
                let placeholders = (0..values.len())
                    .map(|index| format!(":{column}_{index}"))
                    .collect::<Vec<_>>();
                format!("`{column}` in ({})", placeholders.join(", "))
            }
            Criterion::Value(FieldValue::Null) if null_as_is_null => {
                format!("`{column}` IS NULL")
            }
            Criterion::Value(_) => format!("`{column}`=:{column}"),
        })
        .collect::<Vec<_>>()
        .join(delimiter)
}

/// Placeholder -> value pairs for a read predicate.
///
/// Nulls are dropped (rendered as `IS NULL`), lists expand to indexed keys.
pub fn flatten_params(fields: &Conditions) -> Vec<(String, FieldValue)> {
    let mut params = Vec::with_capacity(fields.len());
    for (column, criterion) in fields.iter() {
        match criterion {
            Criterion::Value(FieldValue::Null) => {}
            Criterion::Value(value) => params.push((column.to_string(), value.clone())),
            Criterion::AnyOf(values) => {
                for (index, value) in values.iter().enumerate() {
                    params.push((format!("{column}_{index}"), value.clone()));
                }
            }
        }
    }
    params
}

/// Placeholder -> value pairs for a write; every column binds, nulls included.
pub fn write_params(fields: &Row) -> Vec<(String, FieldValue)> {
    fields
        .iter()
        .map(|(column, value)| (column.to_string(), value.clone()))
        .collect()
}

fn quote(identifier: &str) -> String {
    format!("`{identifier}`")
}
