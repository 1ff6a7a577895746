//! Data access layer.
//!
//! This module provides:
//! - The `Store` trait the handlers are written against
//! - A MySQL backend for the `DB_*` configuration
//! - An embedded SQLite backend for local runs and tests

pub mod mysql;
pub mod sqlite;

pub use mysql::MySqlStore;
pub use sqlite::{init_db, SqliteStore};

use crate::config::{Config, DatabaseConfig};
use crate::domain::{NewTodo, Product, Todo};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Metadata returned by a write statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MutationResult {
    pub affected_rows: u64,
    /// Set for inserts only.
    pub insert_id: Option<i64>,
}

impl MutationResult {
    pub fn matched_nothing(&self) -> bool {
        self.affected_rows == 0
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("Invalid row: {0}")]
    Decode(String),
}

/// Parameterized access to the `todos` and `products` tables.
///
/// Every call is an independent statement on a pooled connection: no retries,
/// no transactions.
#[async_trait]
pub trait Store: Send + Sync + fmt::Debug {
    /// All todos, newest first.
    async fn list_todos(&self) -> Result<Vec<Todo>, StoreError>;

    async fn find_todo(&self, id: i64) -> Result<Option<Todo>, StoreError>;

    /// Insert a todo. The result carries the assigned id.
    async fn insert_todo(&self, todo: &NewTodo) -> Result<MutationResult, StoreError>;

    /// Set `completed` on one todo; zero affected rows means no such id.
    async fn set_todo_completed(
        &self,
        id: i64,
        completed: bool,
    ) -> Result<MutationResult, StoreError>;

    async fn delete_todo(&self, id: i64) -> Result<MutationResult, StoreError>;

    async fn list_products(&self) -> Result<Vec<Product>, StoreError>;

    async fn find_product(&self, id: i64) -> Result<Option<Product>, StoreError>;

    /// Round-trip a trivial statement to check connectivity.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Open the store named by the configuration.
pub async fn connect(config: &Config) -> Result<Arc<dyn Store>, StoreError> {
    let store: Arc<dyn Store> = match &config.database {
        DatabaseConfig::MySql {
            host,
            port,
            user,
            password,
            database,
        } => Arc::new(
            MySqlStore::connect(host, *port, user, password, database, config.max_connections)
                .await?,
        ),
        DatabaseConfig::Sqlite { path } => {
            Arc::new(SqliteStore::new(init_db(path, config.max_connections).await?))
        }
    };
    Ok(store)
}
