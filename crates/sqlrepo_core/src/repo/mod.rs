//! Repository layer: statement rendering, CRUD gateway and registry.
//!
//! # Responsibility
//! - Map one model type onto one table through generated single-table SQL.
//! - Keep repositories discoverable by model identity or table name.
//!
//! # Invariants
//! - Not-found and unregistered lookups are distinct error kinds.
//! - Driver failures pass through uninterpreted as `RepoError::Db`.

pub mod config;
pub mod error;
pub mod filter;
pub mod manager;
pub mod repository;
pub mod sql;
