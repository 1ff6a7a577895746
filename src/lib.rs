pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;

pub use config::{Config, DatabaseConfig};
pub use db::{init_db, MySqlStore, SqliteStore, Store, StoreError};
pub use domain::{Price, Product, Todo};
pub use error::{AppError, ProductError};
