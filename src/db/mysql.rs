//! MySQL store for deployments configured through `DB_*`.
//!
//! The tables are expected to exist already:
//! `todos(id, task, completed, created_at)` and
//! `products(id, name, price, description)`.

use super::{MutationResult, Store, StoreError};
use crate::domain::{NewTodo, Price, Product, Todo};
use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::Row;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// `Store` over a MySQL pool.
#[derive(Debug, Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlStore { pool }
    }

    /// Build the pool and open one connection to fail fast on bad credentials.
    pub async fn connect(
        host: &str,
        port: u16,
        user: &str,
        password: &str,
        database: &str,
        max_connections: u32,
    ) -> Result<Self, sqlx::Error> {
        let options = MySqlConnectOptions::new()
            .host(host)
            .port(port)
            .username(user)
            .password(password)
            .database(database);

        let pool = MySqlPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await?;

        info!(host = %host, database = %database, "Connected to MySQL");
        Ok(MySqlStore { pool })
    }
}

fn todo_from_row(row: &MySqlRow) -> Result<Todo, StoreError> {
    Ok(Todo {
        id: row.try_get("id")?,
        task: row.try_get("task")?,
        completed: row.try_get("completed")?,
        created_at: row.try_get("created_at")?,
    })
}

fn product_from_row(row: &MySqlRow) -> Result<Product, StoreError> {
    let id: i64 = row.try_get("id")?;
    let price: String = row.try_get("price")?;
    let price = Price::from_str(&price)
        .map_err(|e| StoreError::Decode(format!("product {} has invalid price: {}", id, e)))?;

    Ok(Product {
        id,
        name: row.try_get("name")?,
        price,
        description: row.try_get("description")?,
    })
}

#[async_trait]
impl Store for MySqlStore {
    async fn list_todos(&self) -> Result<Vec<Todo>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, task, completed, created_at
            FROM todos
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(todo_from_row).collect()
    }

    async fn find_todo(&self, id: i64) -> Result<Option<Todo>, StoreError> {
        let row = sqlx::query("SELECT id, task, completed, created_at FROM todos WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(todo_from_row).transpose()
    }

    async fn insert_todo(&self, todo: &NewTodo) -> Result<MutationResult, StoreError> {
        let result = sqlx::query("INSERT INTO todos (task, completed) VALUES (?, ?)")
            .bind(&todo.task)
            .bind(todo.completed)
            .execute(&self.pool)
            .await?;

        let insert_id = i64::try_from(result.last_insert_id())
            .map_err(|_| StoreError::Decode("insert id out of range".to_string()))?;

        Ok(MutationResult {
            affected_rows: result.rows_affected(),
            insert_id: Some(insert_id),
        })
    }

    async fn set_todo_completed(
        &self,
        id: i64,
        completed: bool,
    ) -> Result<MutationResult, StoreError> {
        // sqlx negotiates CLIENT_FOUND_ROWS, so this counts matched rows even
        // when `completed` already had the requested value.
        let result = sqlx::query("UPDATE todos SET completed = ? WHERE id = ?")
            .bind(completed)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(MutationResult {
            affected_rows: result.rows_affected(),
            insert_id: None,
        })
    }

    async fn delete_todo(&self, id: i64) -> Result<MutationResult, StoreError> {
        let result = sqlx::query("DELETE FROM todos WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(MutationResult {
            affected_rows: result.rows_affected(),
            insert_id: None,
        })
    }

    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, name, CAST(price AS CHAR) AS price, description FROM products ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(product_from_row).collect()
    }

    async fn find_product(&self, id: i64) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query(
            "SELECT id, name, CAST(price AS CHAR) AS price, description FROM products WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(product_from_row).transpose()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
