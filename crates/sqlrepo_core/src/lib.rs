//! Convention-driven repository layer over a single blocking SQLite
//! connection.
//!
//! Model types describe their columns through explicit mapping tables;
//! `Repository<M>` turns them into single-table CRUD, and
//! `RepositoryManager` keeps one repository per model type.

pub mod db;
pub mod logging;
pub mod model;
pub mod naming;
pub mod repo;
pub mod xuid;

pub use db::{open_db, open_db_in_memory, share, DbError, DbHandle, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingConfig};
pub use model::{Field, FieldMappingError, FieldTable, FieldValue, MappingError, Model, Row};
pub use repo::config::RepositoryConfig;
pub use repo::error::{RepoError, RepoResult};
pub use repo::filter::Filter;
pub use repo::manager::{
    CatalogEntry, ManagedRepository, RepositoryCatalog, RepositoryManager, RepositoryType,
};
pub use repo::repository::{Record, Repository, ReturnDataType};
pub use repo::sql::{Conditions, Criterion, SqlBuilder};
pub use xuid::{UuidXuidGenerator, XuidGenerator};

/// Returns the crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
