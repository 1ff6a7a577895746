//! Embedded SQLite store: initialization and queries.

use super::{MutationResult, Store, StoreError};
use crate::domain::{NewTodo, Price, Product, Todo};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnection, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

/// Open the SQLite database, configure pragmas and create the tables.
pub async fn init_db(db_path: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(sqlx::Error::Io)?;
        }
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .after_connect(|conn, _meta| Box::pin(async move { configure_pragmas_conn(conn).await }))
        .connect(&format!("sqlite:{}?mode=rwc", db_path))
        .await?;

    create_tables(&pool).await?;

    info!("Database initialized successfully at {}", db_path);
    Ok(pool)
}

async fn create_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let schema_sql = include_str!("schema.sql");

    for statement in schema_sql.split(';') {
        let trimmed = statement.trim();
        if !trimmed.is_empty() {
            sqlx::query(trimmed).execute(pool).await?;
        }
    }

    Ok(())
}

async fn configure_pragmas_conn(conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&mut *conn)
        .await?;

    // journal_mode returns the resulting mode, so it has to be fetched
    sqlx::query("PRAGMA journal_mode = WAL")
        .fetch_one(&mut *conn)
        .await?;

    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// `Store` over a SQLite pool.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        SqliteStore { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn todo_from_row(row: &SqliteRow) -> Result<Todo, StoreError> {
    Ok(Todo {
        id: row.try_get("id")?,
        task: row.try_get("task")?,
        completed: row.try_get("completed")?,
        created_at: row.try_get("created_at")?,
    })
}

fn product_from_row(row: &SqliteRow) -> Result<Product, StoreError> {
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
impl Store for SqliteStore {
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

        Ok(MutationResult {
            affected_rows: result.rows_affected(),
            insert_id: Some(result.last_insert_rowid()),
        })
    }

    async fn set_todo_completed(
        &self,
        id: i64,
        completed: bool,
    ) -> Result<MutationResult, StoreError> {
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
        let rows = sqlx::query("SELECT id, name, price, description FROM products ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(product_from_row).collect()
    }

    async fn find_product(&self, id: i64) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query("SELECT id, name, price, description FROM products WHERE id = ?")
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

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn setup_store() -> (SqliteStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir
            .path()
            .join("test.db")
            .to_string_lossy()
            .to_string();
        let pool = init_db(&db_path, 5).await.expect("init_db failed");
        (SqliteStore::new(pool), temp_dir)
    }

    fn new_todo(task: &str) -> NewTodo {
        NewTodo {
            task: task.to_string(),
            completed: false,
        }
    }

    #[tokio::test]
    async fn test_init_db_creates_tables() {
        let (store, _temp) = setup_store().await;

        for table in ["todos", "products"] {
            let result: (String,) =
                sqlx::query_as("SELECT name FROM sqlite_master WHERE type='table' AND name = ?")
                    .bind(table)
                    .fetch_one(store.pool())
                    .await
                    .expect("query failed");
            assert_eq!(result.0, table);
        }
    }

    #[tokio::test]
    async fn test_init_db_creates_missing_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested").join("dir").join("todos.db");

        let pool = init_db(&db_path.to_string_lossy(), 1)
            .await
            .expect("init_db failed");
        assert!(db_path.exists());
        pool.close().await;
    }

    #[tokio::test]
    async fn test_init_db_reports_uncreatable_parent_dir() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"").unwrap();
        let db_path = blocker.join("todos.db");

        match init_db(&db_path.to_string_lossy(), 1).await {
            Err(sqlx::Error::Io(_)) => {}
            other => panic!("Expected Io error for the parent directory, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_create_tables_idempotent() {
        let (store, _temp) = setup_store().await;
        store.insert_todo(&new_todo("keep me")).await.unwrap();

        create_tables(store.pool())
            .await
            .expect("second table bootstrap failed");

        assert_eq!(store.list_todos().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_insert_assigns_id_and_defaults() {
        let (store, _temp) = setup_store().await;

        let first = store.insert_todo(&new_todo("first")).await.unwrap();
        let second = store.insert_todo(&new_todo("second")).await.unwrap();
        assert_eq!(first.affected_rows, 1);
        assert_ne!(first.insert_id, second.insert_id);

        let todo = store
            .find_todo(first.insert_id.unwrap())
            .await
            .unwrap()
            .expect("inserted todo missing");
        assert_eq!(todo.task, "first");
        assert!(!todo.completed);
    }

    #[tokio::test]
    async fn test_list_todos_newest_first() {
        let (store, _temp) = setup_store().await;
        for task in ["a", "b", "c"] {
            store.insert_todo(&new_todo(task)).await.unwrap();
        }

        let tasks: Vec<String> = store
            .list_todos()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.task)
            .collect();
        assert_eq!(tasks, vec!["c", "b", "a"]);
    }

    #[tokio::test]
    async fn test_set_completed_reports_matched_rows() {
        let (store, _temp) = setup_store().await;
        let id = store
            .insert_todo(&new_todo("toggle"))
            .await
            .unwrap()
            .insert_id
            .unwrap();

        let hit = store.set_todo_completed(id, true).await.unwrap();
        assert_eq!(hit.affected_rows, 1);
        assert!(store.find_todo(id).await.unwrap().unwrap().completed);

        // Writing the current value still counts as a match.
        let again = store.set_todo_completed(id, true).await.unwrap();
        assert_eq!(again.affected_rows, 1);

        let miss = store.set_todo_completed(id + 100, true).await.unwrap();
        assert!(miss.matched_nothing());
    }

    #[tokio::test]
    async fn test_delete_todo() {
        let (store, _temp) = setup_store().await;
        let id = store
            .insert_todo(&new_todo("gone"))
            .await
            .unwrap()
            .insert_id
            .unwrap();

        assert_eq!(store.delete_todo(id).await.unwrap().affected_rows, 1);
        assert!(store.find_todo(id).await.unwrap().is_none());
        assert!(store.delete_todo(id).await.unwrap().matched_nothing());
    }

    #[tokio::test]
    async fn test_products_decode_price() {
        let (store, _temp) = setup_store().await;
        sqlx::query("INSERT INTO products (id, name, price, description) VALUES (?, ?, ?, ?)")
            .bind(1_i64)
            .bind("Notebook")
            .bind("3.50")
            .bind(Option::<String>::None)
            .execute(store.pool())
            .await
            .unwrap();

        let products = store.list_products().await.unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].price.to_canonical_string(), "3.5");
        assert_eq!(products[0].description, None);

        assert!(store.find_product(1).await.unwrap().is_some());
        assert!(store.find_product(2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalid_price_is_decode_error() {
        let (store, _temp) = setup_store().await;
        sqlx::query("INSERT INTO products (id, name, price) VALUES (?, ?, ?)")
            .bind(9_i64)
            .bind("Broken")
            .bind("n/a")
            .execute(store.pool())
            .await
            .unwrap();

        match store.find_product(9).await {
            Err(StoreError::Decode(msg)) => assert!(msg.contains("product 9")),
            other => panic!("Expected Decode error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_closed_pool_surfaces_database_error() {
        let (store, _temp) = setup_store().await;
        store.pool().close().await;

        assert!(matches!(
            store.list_todos().await,
            Err(StoreError::Database(_))
        ));
        assert!(store.ping().await.is_err());
    }
}
