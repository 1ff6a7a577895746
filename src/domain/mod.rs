//! Records served by the API.
//!
//! - `Todo` and the payload types around its lifecycle
//! - `Product` with a lossless `Price`

pub mod product;
pub mod todo;

pub use product::{Price, Product};
pub use todo::{parse_completed, CreatedTodo, NewTodo, Todo};
