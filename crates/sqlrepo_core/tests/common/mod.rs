#![allow(dead_code)]

use rusqlite::Connection;
use sqlrepo_core::{open_db_in_memory, share, DbHandle};

pub const SCHEMA: &str = "
CREATE TABLE users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    email TEXT,
    group_id INTEGER
);
CREATE TABLE posts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    xuid TEXT,
    title TEXT NOT NULL,
    group_id INTEGER,
    user_id INTEGER REFERENCES users(id),
    deleted_at TEXT
);
";

pub mod model {
    use chrono::NaiveDateTime;
    use sqlrepo_core::{Field, Model};

    /// Plain model: hard delete, no external identifier.
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct User {
        pub id: Option<i64>,
        pub name: String,
        pub email: Option<String>,
        pub group_id: Option<i64>,
    }

    impl User {
        pub fn named(name: &str) -> Self {
            Self {
                name: name.to_string(),
                ..Self::default()
            }
        }
    }

    impl Model for User {
        fn fields() -> Vec<Field<Self>> {
            vec![
                Field::<Self>::new("id", |u| u.id.into(), |u, v| {
                    u.id = v.into_opt_i64()?;
                    Ok(())
                }),
                Field::<Self>::new("name", |u| u.name.as_str().into(), |u, v| {
                    u.name = v.into_string()?;
                    Ok(())
                }),
                Field::<Self>::new("email", |u| u.email.clone().into(), |u, v| {
                    u.email = v.into_opt_string()?;
                    Ok(())
                }),
                Field::<Self>::new("groupId", |u| u.group_id.into(), |u, v| {
                    u.group_id = v.into_opt_i64()?;
                    Ok(())
                }),
            ]
        }

        fn id(&self) -> Option<i64> {
            self.id
        }

        fn set_id(&mut self, id: i64) {
            self.id = Some(id);
        }
    }

    /// Soft-deletable model carrying an external identifier.
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Post {
        pub id: Option<i64>,
        pub xuid: Option<String>,
        pub title: String,
        pub group_id: Option<i64>,
        pub user_id: Option<i64>,
        pub deleted_at: Option<NaiveDateTime>,
    }

    impl Post {
        pub fn titled(title: &str) -> Self {
            Self {
                title: title.to_string(),
                ..Self::default()
            }
        }
    }

    impl Model for Post {
        fn fields() -> Vec<Field<Self>> {
            vec![
                Field::<Self>::new("id", |p| p.id.into(), |p, v| {
                    p.id = v.into_opt_i64()?;
                    Ok(())
                }),
                Field::<Self>::new("xuid", |p| p.xuid.clone().into(), |p, v| {
                    p.xuid = v.into_opt_string()?;
                    Ok(())
                }),
                Field::<Self>::new("title", |p| p.title.as_str().into(), |p, v| {
                    p.title = v.into_string()?;
                    Ok(())
                }),
                Field::<Self>::new("groupId", |p| p.group_id.into(), |p, v| {
                    p.group_id = v.into_opt_i64()?;
                    Ok(())
                }),
                Field::<Self>::new("userId", |p| p.user_id.into(), |p, v| {
                    p.user_id = v.into_opt_i64()?;
                    Ok(())
                }),
                Field::<Self>::new("deletedAt", |p| p.deleted_at.into(), |p, v| {
                    p.deleted_at = v.into_opt_timestamp()?;
                    Ok(())
                }),
            ]
        }

        fn id(&self) -> Option<i64> {
            self.id
        }

        fn set_id(&mut self, id: i64) {
            self.id = Some(id);
        }
    }
}

pub mod repo {
    use super::model::{Post, User};
    use sqlrepo_core::RepositoryType;

    pub struct SqliteUserRepository;

    impl RepositoryType for SqliteUserRepository {
        type Model = User;
    }

    pub struct SqlitePostRepository;

    impl RepositoryType for SqlitePostRepository {
        type Model = Post;
    }
}

/// In-memory database with the test schema applied.
pub fn setup_db() -> DbHandle {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(SCHEMA).unwrap();
    share(conn)
}

pub fn count_rows(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
        .unwrap()
}

/// Namespace of the repository marker types, as seen by `type_name`.
pub fn repo_namespace() -> String {
    let path = std::any::type_name::<repo::SqliteUserRepository>();
    match path.rsplit_once("::") {
        Some((namespace, _)) => namespace.to_string(),
        None => String::new(),
    }
}
