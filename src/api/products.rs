use axum::extract::{Path, State};
use axum::Json;

use super::{parse_id, AppState};
use crate::domain::Product;
use crate::error::ProductError;

pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<Product>>, ProductError> {
    let products = state
        .store
        .list_products()
        .await
        .map_err(ProductError::store("Error fetching products"))?;

    Ok(Json(products))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ProductError> {
    let id = parse_id(&id).ok_or(ProductError::NotFound)?;

    let product = state
        .store
        .find_product(id)
        .await
        .map_err(ProductError::store("Error fetching product"))?
        .ok_or(ProductError::NotFound)?;

    Ok(Json(product))
}
