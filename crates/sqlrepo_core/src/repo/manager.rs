//! Registry binding model types to repository instances.
//!
//! # Responsibility
//! - Hold exactly one repository per model identity.
//! - Build repositories from a catalog, either in catalog order or by
//!   scanning a directory for repository source files.
//!
//! # Invariants
//! - A later registration for the same model identity replaces the former
//!   in its original position; iteration follows registration order.
//! - Lookup misses are `RepositoryNotRegistered`, never a default.
//! - Directory discovery visits files in name order.

use crate::db::DbHandle;
use crate::model::{Model, Row};
use crate::naming;
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::repository::Repository;
use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;
use std::any::{type_name, Any};
use std::collections::BTreeMap;
use std::path::Path;

static REPOSITORY_FILE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^sqlite_([a-z0-9_]+)_repository\.rs$").expect("valid repository file regex")
});

/// Contract every registrable repository fulfils.
pub trait ManagedRepository: Any {
    fn table_name(&self) -> &str;
    fn model_name(&self) -> &str;
    /// Raw rows for `ids`, highest id first.
    fn find_rows_by_ids(&self, ids: &[i64]) -> RepoResult<Vec<Row>>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<M: Model> ManagedRepository for Repository<M> {
    fn table_name(&self) -> &str {
        Repository::table_name(self)
    }

    fn model_name(&self) -> &str {
        Repository::model_name(self)
    }

    fn find_rows_by_ids(&self, ids: &[i64]) -> RepoResult<Vec<Row>> {
        self.fetch_rows_by_ids(ids)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Type-level description of a concrete repository.
///
/// The implementing type's path drives the naming convention, e.g.
/// `app::repo::SqliteUserRepository` binds table `users` and model
/// `app::model::User`. Override `open` to bind names explicitly.
pub trait RepositoryType: 'static {
    type Model: Model;

    fn open(db: DbHandle) -> Repository<Self::Model> {
        Repository::for_type::<Self>(db)
    }
}

/// One constructible repository type.
#[derive(Clone, Copy)]
pub struct CatalogEntry {
    type_path: &'static str,
    build: fn(DbHandle) -> Box<dyn ManagedRepository>,
}

impl CatalogEntry {
    pub fn of<R: RepositoryType>() -> Self {
        Self {
            type_path: type_name::<R>(),
            build: build_repository::<R>,
        }
    }

    pub fn type_path(&self) -> &'static str {
        self.type_path
    }

    pub fn build(&self, db: DbHandle) -> Box<dyn ManagedRepository> {
        (self.build)(db)
    }
}

fn build_repository<R: RepositoryType>(db: DbHandle) -> Box<dyn ManagedRepository> {
    Box::new(R::open(db))
}

/// Ordered list of repository types known to the application.
#[derive(Clone, Default)]
pub struct RepositoryCatalog {
    entries: Vec<CatalogEntry>,
}

impl RepositoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<R: RepositoryType>(mut self) -> Self {
        self.add::<R>();
        self
    }

    pub fn add<R: RepositoryType>(&mut self) {
        self.entries.push(CatalogEntry::of::<R>());
    }

    pub fn get(&self, type_path: &str) -> Option<&CatalogEntry> {
        self.entries
            .iter()
            .find(|entry| entry.type_path == type_path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Model identity -> repository registry.
#[derive(Default)]
pub struct RepositoryManager {
    repositories: Vec<Box<dyn ManagedRepository>>,
    by_model: BTreeMap<String, usize>,
}

impl RepositoryManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers under the repository's model identity, replacing any previous one.
    pub fn register(&mut self, repository: impl ManagedRepository) {
        self.register_boxed(Box::new(repository));
    }

    pub fn register_boxed(&mut self, repository: Box<dyn ManagedRepository>) {
        let model_name = repository.model_name().to_string();
        let replaced = match self.by_model.get(&model_name) {
            Some(&index) => {
                self.repositories[index] = repository;
                true
            }
            None => {
                self.by_model.insert(model_name.clone(), self.repositories.len());
                self.repositories.push(repository);
                false
            }
        };
        debug!(
            "event=repo_register module=manager status=ok model={} replaced={}",
            model_name, replaced
        );
    }

    pub fn has_repository(&self, model_name: &str) -> bool {
        self.by_model.contains_key(model_name)
    }

    /// # Errors
    /// - `RepoError::RepositoryNotRegistered` carrying `model_name`.
    pub fn lookup(&self, model_name: &str) -> RepoResult<&dyn ManagedRepository> {
        self.by_model
            .get(model_name)
            .map(|index| &*self.repositories[*index])
            .ok_or_else(|| RepoError::RepositoryNotRegistered(model_name.to_string()))
    }

    pub fn lookup_mut(&mut self, model_name: &str) -> RepoResult<&mut dyn ManagedRepository> {
        match self.by_model.get(model_name) {
            Some(&index) => Ok(&mut *self.repositories[index]),
            None => Err(RepoError::RepositoryNotRegistered(model_name.to_string())),
        }
    }

    /// Earliest registered repository bound to `table_name`.
    ///
    /// # Errors
    /// - `RepoError::RepositoryNotRegistered` carrying `table_name`.
    pub fn lookup_by_table(&self, table_name: &str) -> RepoResult<&dyn ManagedRepository> {
        self.repositories
            .iter()
            .find(|repository| repository.table_name() == table_name)
            .map(|repository| &**repository)
            .ok_or_else(|| RepoError::RepositoryNotRegistered(table_name.to_string()))
    }

    /// Typed lookup keyed by `M`'s type path.
    pub fn repository<M: Model>(&self) -> RepoResult<&Repository<M>> {
        let model_name = type_name::<M>();
        self.lookup(model_name)?
            .as_any()
            .downcast_ref::<Repository<M>>()
            .ok_or_else(|| RepoError::RepositoryNotRegistered(model_name.to_string()))
    }

    pub fn repository_mut<M: Model>(&mut self) -> RepoResult<&mut Repository<M>> {
        let model_name = type_name::<M>();
        self.lookup_mut(model_name)?
            .as_any_mut()
            .downcast_mut::<Repository<M>>()
            .ok_or_else(|| RepoError::RepositoryNotRegistered(model_name.to_string()))
    }

    /// Registered repositories, in registration order.
    pub fn repositories(&self) -> impl Iterator<Item = &dyn ManagedRepository> {
        self.repositories.iter().map(|repository| &**repository)
    }

    pub fn len(&self) -> usize {
        self.repositories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }

    /// Builds and registers every catalog entry, in catalog order.
    pub fn register_catalog(&mut self, catalog: &RepositoryCatalog, db: &DbHandle) -> usize {
        for entry in catalog.iter() {
            self.register_boxed(entry.build(db.clone()));
        }
        catalog.len()
    }

    /// Registers repositories whose source files sit in `directory`.
    ///
    /// Each `sqlite_<name>_repository.rs` resolves to
    /// `<namespace>::Sqlite<Name>Repository`; only types present in `catalog`
    /// are built. A missing directory registers nothing.
    ///
    /// # Errors
    /// - `RepoError::Discovery` when the directory exists but cannot be read.
    pub fn discover(
        &mut self,
        directory: impl AsRef<Path>,
        namespace: &str,
        db: &DbHandle,
        catalog: &RepositoryCatalog,
    ) -> RepoResult<usize> {
        let directory = directory.as_ref();
        if !directory.exists() {
            debug!(
                "event=repo_discover module=manager status=skipped dir={}",
                directory.display()
            );
            return Ok(0);
        }

        let mut file_names = Vec::new();
        for entry in std::fs::read_dir(directory).map_err(RepoError::Discovery)? {
            let entry = entry.map_err(RepoError::Discovery)?;
            if let Some(name) = entry.file_name().to_str() {
                file_names.push(name.to_string());
            }
        }
        file_names.sort();

        let mut registered = 0;
        for file_name in &file_names {
            let Some(captures) = REPOSITORY_FILE_RE.captures(file_name) else {
                continue;
            };
            let type_path = naming::repository_type_path(namespace, &captures[1]);
            match catalog.get(&type_path) {
                Some(entry) => {
                    self.register_boxed(entry.build(db.clone()));
                    registered += 1;
                }
                None => debug!(
                    "event=repo_discover module=manager status=skipped file={} type={}",
                    file_name, type_path
                ),
            }
        }

        info!(
            "event=repo_discover module=manager status=ok dir={} registered={}",
            directory.display(),
            registered
        );
        Ok(registered)
    }
}
