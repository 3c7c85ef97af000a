//! Field mapping tables and the entity <-> row mapper.

use crate::model::row::Row;
use crate::model::value::{FieldValue, MappingError, MappingResult};
use crate::naming;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Primary key column every model carries.
pub const ID_COLUMN: &str = "id";
/// Column whose presence marks a model as soft-deletable.
pub const DELETED_AT_COLUMN: &str = "deleted_at";
/// Column whose presence marks a model as carrying an external identifier.
pub const XUID_COLUMN: &str = "xuid";

pub type Getter<M> = fn(&M) -> FieldValue;
pub type Setter<M> = fn(&mut M, FieldValue) -> MappingResult<()>;

/// One entry of a model's mapping table: a member name with its accessor pair.
///
/// The storage column is resolved once, when the entry is built.
pub struct Field<M> {
    name: &'static str,
    column: String,
    get: Getter<M>,
    set: Setter<M>,
}

impl<M> Field<M> {
    pub fn new(name: &'static str, get: Getter<M>, set: Setter<M>) -> Self {
        Self {
            name,
            column: naming::column_name(name),
            get,
            set,
        }
    }

    /// Member name as declared.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Column name in storage convention.
    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn get(&self, entity: &M) -> FieldValue {
        (self.get)(entity)
    }

    pub fn set(&self, entity: &mut M, value: FieldValue) -> MappingResult<()> {
        (self.set)(entity, value)
    }
}

/// A type persisted as rows of one table.
///
/// `Default` builds a fresh, unpersisted entity.
pub trait Model: Default + 'static {
    /// Mapping table, in column order. Must include the `id` member.
    fn fields() -> Vec<Field<Self>>;
    fn id(&self) -> Option<i64>;
    fn set_id(&mut self, id: i64);
}

/// A row value could not be assigned to its member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMappingError {
    pub column: String,
    pub source: MappingError,
}

impl Display for FieldMappingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "column `{}`: {}", self.column, self.source)
    }
}

impl Error for FieldMappingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

/// A model's mapping table, materialized once and indexed by column.
pub struct FieldTable<M> {
    fields: Vec<Field<M>>,
    by_column: BTreeMap<String, usize>,
}

impl<M: Model> FieldTable<M> {
    pub fn of() -> Self {
        let fields = M::fields();
        let by_column = fields
            .iter()
            .enumerate()
            .map(|(index, field)| (field.column().to_string(), index))
            .collect();
        Self { fields, by_column }
    }

    pub fn field(&self, column: &str) -> Option<&Field<M>> {
        self.by_column
            .get(column)
            .map(|index| &self.fields[*index])
    }

    pub fn declares(&self, column: &str) -> bool {
        self.by_column.contains_key(column)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Field<M>> {
        self.fields.iter()
    }

    /// Reads every mapped member into a row keyed by column name.
    pub fn to_row(&self, entity: &M) -> Row {
        self.fields
            .iter()
            .map(|field| (field.column(), field.get(entity)))
            .collect()
    }

    /// Applies row columns to the entity through its setters.
    ///
    /// Columns outside `allowed` (when given) or without a member are skipped.
    pub fn apply_row(
        &self,
        entity: &mut M,
        row: &Row,
        allowed: Option<&[&str]>,
    ) -> Result<(), FieldMappingError> {
        for (column, value) in row.iter() {
            if allowed.is_some_and(|keys| !keys.contains(&column)) {
                continue;
            }
            if let Some(field) = self.field(column) {
                assign(field, entity, column, value.clone())?;
            }
        }
        Ok(())
    }

    /// Sets one column on the entity. Returns `false` when `M` has no such member.
    pub fn set_column(
        &self,
        entity: &mut M,
        column: &str,
        value: FieldValue,
    ) -> Result<bool, FieldMappingError> {
        match self.field(column) {
            Some(field) => assign(field, entity, column, value).map(|()| true),
            None => Ok(false),
        }
    }
}

fn assign<M>(
    field: &Field<M>,
    entity: &mut M,
    column: &str,
    value: FieldValue,
) -> Result<(), FieldMappingError> {
    field
        .set(entity, value)
        .map_err(|source| FieldMappingError {
            column: column.to_string(),
            source,
        })
}

/// Whether `M` declares a member stored in `column`.
pub fn declares_column<M: Model>(column: &str) -> bool {
    M::fields().iter().any(|field| field.column() == column)
}

/// Reads every mapped member into a row keyed by column name.
pub fn to_row<M: Model>(entity: &M) -> Row {
    FieldTable::<M>::of().to_row(entity)
}

/// Applies row columns to the entity; see `FieldTable::apply_row`.
pub fn from_row<M: Model>(
    entity: &mut M,
    row: &Row,
    allowed: Option<&[&str]>,
) -> Result<(), FieldMappingError> {
    FieldTable::<M>::of().apply_row(entity, row, allowed)
}

/// Sets one column on the entity. Returns `false` when `M` has no such member.
pub fn set_column<M: Model>(
    entity: &mut M,
    column: &str,
    value: FieldValue,
) -> Result<bool, FieldMappingError> {
    FieldTable::<M>::of().set_column(entity, column, value)
}
