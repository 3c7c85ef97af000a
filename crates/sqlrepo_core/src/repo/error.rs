//! Repository error taxonomy.

use crate::db::DbError;
use crate::model::FieldMappingError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Failure of a repository or manager operation.
#[derive(Debug)]
pub enum RepoError {
    /// `find` matched no row.
    NotFound { table: String, id: i64 },
    /// No repository is registered under the requested model or table.
    RepositoryNotRegistered(String),
    /// Driver failure during prepare/execute, passed through as-is.
    Db(DbError),
    /// A stored value could not be assigned to its model member.
    Mapping(FieldMappingError),
    /// The discovery directory exists but could not be listed.
    Discovery(std::io::Error),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { table, id } => {
                write!(f, "entity '{table}' with id {id} not found")
            }
            Self::RepositoryNotRegistered(identity) => {
                write!(f, "no repository registered for `{identity}`")
            }
            Self::Db(err) => write!(f, "{err}"),
            Self::Mapping(err) => write!(f, "invalid stored value: {err}"),
            Self::Discovery(err) => write!(f, "repository discovery failed: {err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotFound { .. } | Self::RepositoryNotRegistered(_) => None,
            Self::Db(err) => Some(err),
            Self::Mapping(err) => Some(err),
            Self::Discovery(err) => Some(err),
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<FieldMappingError> for RepoError {
    fn from(value: FieldMappingError) -> Self {
        Self::Mapping(value)
    }
}
