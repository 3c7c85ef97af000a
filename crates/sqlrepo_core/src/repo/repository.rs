//! Generic single-table repository.
//!
//! # Responsibility
//! - Translate CRUD calls into parameterized statements on the shared handle.
//! - Hydrate fetched rows into entities (or hand back raw rows).
//!
//! # Invariants
//! - `persist` with an id updates by id; without one it inserts and writes the
//!   generated id back onto the entity.
//! - Every fetch except `find_by_ids` applies the standing filter and, for
//!   soft-deletable models, `deleted_at is null`.
//! - Soft-delete and xuid support are read from the model's mapping table
//!   once, at construction.
//! - No operation opens a transaction.

use crate::db::DbHandle;
use crate::model::{
    from_row, to_row, FieldTable, FieldValue, Model, Row, DELETED_AT_COLUMN, ID_COLUMN,
    XUID_COLUMN,
};
use crate::repo::config::RepositoryConfig;
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::filter::Filter;
use crate::repo::sql::{flatten_params, write_params, Conditions, Criterion, SqlBuilder};
use crate::xuid::{UuidXuidGenerator, XuidGenerator};
use chrono::Local;
use log::{debug, info};
use rusqlite::types::{ToSql, Value};
use serde::{Deserialize, Serialize};
use std::rc::Rc;

const SEQUENCE_TABLE_EXISTS_SQL: &str =
    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'sqlite_sequence'";

/// Shape of fetched results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnDataType {
    /// Hydrate each row into a model entity.
    #[default]
    Object,
    /// Return rows as fetched.
    Array,
}

/// One fetched result, shaped by the repository's `ReturnDataType`.
#[derive(Debug, Clone, PartialEq)]
pub enum Record<M> {
    Entity(M),
    Row(Row),
}

impl<M: Model> Record<M> {
    /// The entity, hydrating a raw row on demand.
    pub fn into_entity(self) -> RepoResult<M> {
        match self {
            Self::Entity(entity) => Ok(entity),
            Self::Row(row) => {
                let mut entity = M::default();
                from_row(&mut entity, &row, None)?;
                Ok(entity)
            }
        }
    }

    /// The row, serializing an entity on demand.
    pub fn into_row(self) -> Row {
        match self {
            Self::Entity(entity) => to_row(&entity),
            Self::Row(row) => row,
        }
    }

    pub fn as_entity(&self) -> Option<&M> {
        match self {
            Self::Entity(entity) => Some(entity),
            Self::Row(_) => None,
        }
    }

    pub fn as_row(&self) -> Option<&Row> {
        match self {
            Self::Entity(_) => None,
            Self::Row(row) => Some(row),
        }
    }
}

/// CRUD gateway bound to one table and one model type.
pub struct Repository<M: Model> {
    db: DbHandle,
    config: RepositoryConfig,
    filter: Option<Filter>,
    return_data_type: ReturnDataType,
    soft_delete_column: Option<&'static str>,
    xuid_column: Option<&'static str>,
    xuid_generator: Rc<dyn XuidGenerator>,
    fields: FieldTable<M>,
}

impl<M: Model> Repository<M> {
    /// Binds to `M` using its own type path and tableized name.
    pub fn new(db: DbHandle) -> Self {
        Self::with_config(db, RepositoryConfig::for_model::<M>())
    }

    /// Binds using names derived from repository type `R` by convention.
    pub fn for_type<R: ?Sized>(db: DbHandle) -> Self {
        Self::with_config(db, RepositoryConfig::for_type::<R>())
    }

    pub fn with_config(db: DbHandle, config: RepositoryConfig) -> Self {
        let fields = FieldTable::<M>::of();
        Self {
            db,
            config,
            filter: None,
            return_data_type: ReturnDataType::default(),
            soft_delete_column: fields
                .declares(DELETED_AT_COLUMN)
                .then_some(DELETED_AT_COLUMN),
            xuid_column: fields.declares(XUID_COLUMN).then_some(XUID_COLUMN),
            xuid_generator: Rc::new(UuidXuidGenerator),
            fields,
        }
    }

    pub fn with_xuid_generator(mut self, generator: impl XuidGenerator + 'static) -> Self {
        self.xuid_generator = Rc::new(generator);
        self
    }

    pub fn table_name(&self) -> &str {
        &self.config.table_name
    }

    pub fn model_name(&self) -> &str {
        &self.config.model_name
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    pub fn db(&self) -> &DbHandle {
        &self.db
    }

    pub fn set_db(&mut self, db: DbHandle) {
        self.db = db;
    }

    pub fn supports_soft_delete(&self) -> bool {
        self.soft_delete_column.is_some()
    }

    pub fn supports_xuid(&self) -> bool {
        self.xuid_column.is_some()
    }

    /// Fresh, unpersisted entity.
    pub fn create_entity(&self) -> M {
        M::default()
    }

    /// Installs a standing filter for every later fetch.
    ///
    /// Columns `M` does not declare are dropped. When nothing is left the
    /// current filter, if any, stays in place.
    pub fn set_filter(&mut self, conditions: Conditions) {
        let filter = Filter::for_model::<M>(conditions);
        if !filter.is_empty() {
            self.filter = Some(filter);
        }
    }

    pub fn clear_filter(&mut self) {
        self.filter = None;
    }

    pub fn filter(&self) -> Option<&Filter> {
        self.filter.as_ref()
    }

    pub fn return_data_type(&self) -> ReturnDataType {
        self.return_data_type
    }

    pub fn set_return_data_type(&mut self, return_data_type: ReturnDataType) -> &mut Self {
        self.return_data_type = return_data_type;
        self
    }

    /// Fetches one visible row by id.
    ///
    /// # Errors
    /// - `RepoError::NotFound` when no visible row has this id.
    pub fn find(&self, id: i64) -> RepoResult<Record<M>> {
        let rows = self.fetch_rows(&Conditions::new().with(ID_COLUMN, id), None)?;
        match rows.into_iter().next() {
            Some(row) => self.hydrate(row),
            None => Err(RepoError::NotFound {
                table: self.config.table_name.clone(),
                id,
            }),
        }
    }

    /// Like `find`, but a miss yields a new entity seeded from the filter.
    ///
    /// The new entity is not persisted; its id stays unset.
    pub fn find_or_create(&self, id: i64) -> RepoResult<Record<M>> {
        let rows = self.fetch_rows(&Conditions::new().with(ID_COLUMN, id), None)?;
        if let Some(row) = rows.into_iter().next() {
            return self.hydrate(row);
        }

        let mut entity = self.create_entity();
        if let Some(filter) = &self.filter {
            for (column, criterion) in filter.conditions().iter() {
                // list criteria have no single value to seed with
                if let Criterion::Value(value) = criterion {
                    self.fields.set_column(&mut entity, column, value.clone())?;
                }
            }
        }
        Ok(Record::Entity(entity))
    }

    /// Every visible row.
    pub fn find_all(&self) -> RepoResult<Vec<Record<M>>> {
        self.find_where(&Conditions::new(), None)
    }

    /// Visible rows matching `conditions`, at most `limit` when positive.
    pub fn find_where(
        &self,
        conditions: &Conditions,
        limit: Option<u32>,
    ) -> RepoResult<Vec<Record<M>>> {
        self.fetch_rows(conditions, limit)?
            .into_iter()
            .map(|row| self.hydrate(row))
            .collect()
    }

    /// Rows with the given ids, highest id first.
    ///
    /// Neither the filter nor the soft-delete predicate applies. An empty
    /// `ids` returns without touching the database.
    pub fn find_by_ids(&self, ids: &[i64]) -> RepoResult<Vec<Record<M>>> {
        self.fetch_rows_by_ids(ids)?
            .into_iter()
            .map(|row| self.hydrate(row))
            .collect()
    }

    /// Inserts or updates `entity`, assigning `xuid` and `id` when missing.
    pub fn persist(&self, entity: &mut M) -> RepoResult<()> {
        if let Some(column) = self.xuid_column {
            let current = self.fields.field(column).map(|field| field.get(entity));
            if !has_value(current.as_ref()) {
                let xuid = self.xuid_generator.generate();
                self.fields
                    .set_column(entity, column, FieldValue::Text(xuid))?;
            }
        }

        let mut fields = self.fields.to_row(entity);
        fields.remove(ID_COLUMN);
        let builder = SqlBuilder::new(&self.config.table_name);

        match entity.id() {
            Some(id) => {
                let filter = Conditions::new().with(ID_COLUMN, id);
                let mut params = write_params(&fields);
                params.push((ID_COLUMN.to_string(), FieldValue::Integer(id)));
                self.execute(&builder.update(&fields, &filter), &params)?;
            }
            None => {
                self.execute(&builder.insert(&fields), &write_params(&fields))?;
                entity.set_id(self.db.last_insert_rowid());
            }
        }

        Ok(())
    }

    /// Soft-deletes through `persist` when supported, otherwise deletes the row.
    pub fn remove(&self, entity: &mut M) -> RepoResult<()> {
        if let Some(column) = self.soft_delete_column {
            let now = Local::now().naive_local();
            self.fields
                .set_column(entity, column, FieldValue::Timestamp(now))?;
            return self.persist(entity);
        }

        let builder = SqlBuilder::new(&self.config.table_name);
        let params = vec![(ID_COLUMN.to_string(), FieldValue::from(entity.id()))];
        self.execute(&builder.delete_by_id(), &params)?;
        Ok(())
    }

    /// Empties the table and restarts its id sequence, with foreign-key
    /// enforcement switched off.
    ///
    /// Not transactional: if the delete fails, enforcement stays off.
    pub fn truncate(&self) -> RepoResult<()> {
        let builder = SqlBuilder::new(&self.config.table_name);
        info!(
            "event=repo_truncate module=repo status=start table={}",
            self.config.table_name
        );
        self.db.execute_batch("PRAGMA foreign_keys = OFF;")?;
        self.db.execute_batch(&builder.truncate())?;
        // sqlite_sequence only exists once some AUTOINCREMENT table does
        if self.has_sequence_table()? {
            let params = vec![(
                "name".to_string(),
                FieldValue::from(self.config.table_name.as_str()),
            )];
            self.execute(&builder.reset_sequence(), &params)?;
        }
        self.db.execute_batch("PRAGMA foreign_keys = ON;")?;
        info!(
            "event=repo_truncate module=repo status=ok table={}",
            self.config.table_name
        );
        Ok(())
    }

    pub(crate) fn fetch_rows_by_ids(&self, ids: &[i64]) -> RepoResult<Vec<Row>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let conditions = Conditions::new().with(ID_COLUMN, ids);
        let sql = SqlBuilder::new(&self.config.table_name).select_by_ids(&conditions);
        self.query_rows(&sql, &flatten_params(&conditions))
    }

    fn has_sequence_table(&self) -> RepoResult<bool> {
        let count: i64 = self
            .db
            .query_row(SEQUENCE_TABLE_EXISTS_SQL, [], |row| row.get(0))?;
        Ok(count > 0)
    }

    fn fetch_rows(&self, conditions: &Conditions, limit: Option<u32>) -> RepoResult<Vec<Row>> {
        let mut conditions = conditions.clone();
        if let Some(filter) = &self.filter {
            conditions.merge(filter.conditions());
        }
        let sql = SqlBuilder::new(&self.config.table_name).select(
            &conditions,
            self.soft_delete_column,
            limit,
        );
        self.query_rows(&sql, &flatten_params(&conditions))
    }

    fn hydrate(&self, row: Row) -> RepoResult<Record<M>> {
        match self.return_data_type {
            ReturnDataType::Array => Ok(Record::Row(row)),
            ReturnDataType::Object => {
                let mut entity = self.create_entity();
                self.fields.apply_row(&mut entity, &row, None)?;
                Ok(Record::Entity(entity))
            }
        }
    }

    fn query_rows(&self, sql: &str, params: &[(String, FieldValue)]) -> RepoResult<Vec<Row>> {
        debug!(
            "event=repo_query module=repo status=start table={} sql={}",
            self.config.table_name, sql
        );
        let mut stmt = self.db.prepare(sql)?;
        let columns = stmt
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();

        let bound = bind_values(params);
        let named = named_params(&bound);
        let mut rows = stmt.query(named.as_slice())?;
        let mut fetched = Vec::new();
        while let Some(row) = rows.next()? {
            let mut record = Row::new();
            for (index, column) in columns.iter().enumerate() {
                let value: Value = row.get(index)?;
                record.insert(column.as_str(), FieldValue::from(value));
            }
            fetched.push(record);
        }

        debug!(
            "event=repo_query module=repo status=ok table={} rows={}",
            self.config.table_name,
            fetched.len()
        );
        Ok(fetched)
    }

    fn execute(&self, sql: &str, params: &[(String, FieldValue)]) -> RepoResult<usize> {
        debug!(
            "event=repo_execute module=repo status=start table={} sql={}",
            self.config.table_name, sql
        );
        let bound = bind_values(params);
        let changed = self.db.execute(sql, named_params(&bound).as_slice())?;
        debug!(
            "event=repo_execute module=repo status=ok table={} changed={}",
            self.config.table_name, changed
        );
        Ok(changed)
    }
}

fn has_value(value: Option<&FieldValue>) -> bool {
    match value {
        None | Some(FieldValue::Null) => false,
        Some(FieldValue::Text(text)) => !text.is_empty(),
        Some(_) => true,
    }
}

fn bind_values(params: &[(String, FieldValue)]) -> Vec<(String, Value)> {
    params
        .iter()
        .map(|(name, value)| (format!(":{name}"), value.to_sql_value()))
        .collect()
}

fn named_params(bound: &[(String, Value)]) -> Vec<(&str, &dyn ToSql)> {
    bound
        .iter()
        .map(|(name, value)| (name.as_str(), value as &dyn ToSql))
        .collect()
}
