//! SQLite connection bootstrap and the shared database handle.
//!
//! # Responsibility
//! - Open and configure SQLite connections used by repositories.
//! - Carry driver failures to callers without interpreting them.
//!
//! # Invariants
//! - Repositories share one connection through `DbHandle`; none of them owns it.
//! - Schema creation is the caller's job; this layer never migrates.

use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

mod open;

pub use open::{open_db, open_db_in_memory};

/// Shared blocking connection handed to every repository.
pub type DbHandle = Rc<Connection>;

pub type DbResult<T> = Result<T, DbError>;

/// Failure surfaced by the database driver during prepare/execute/fetch.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Wraps an opened connection into a shareable handle.
pub fn share(conn: Connection) -> DbHandle {
    Rc::new(conn)
}
