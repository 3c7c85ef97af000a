//! Model binding: scalar values, rows and per-model field mapping tables.
//!
//! # Responsibility
//! - Describe how a model type's members map to table columns.
//! - Convert entities to rows and rows back to entities.
//!
//! # Invariants
//! - Only members listed in a model's mapping table take part in mapping.
//! - Row columns without a matching member are ignored.

pub mod field;
pub mod row;
pub mod value;

pub use field::{
    declares_column, from_row, set_column, to_row, Field, FieldMappingError, FieldTable, Model,
    DELETED_AT_COLUMN, ID_COLUMN, XUID_COLUMN,
};
pub use row::Row;
pub use value::{FieldValue, MappingError, MappingResult, TIMESTAMP_FORMAT};
