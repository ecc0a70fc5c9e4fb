use axum::extract::{Path, State};
use axum::Json;

use super::AppState;
use crate::errors::{AppError, AppResult};
use crate::openfoodfacts::ProductInfo;
use crate::validation::validate_barcode;

pub async fn lookup_product(
    State(state): State<AppState>,
    Path(barcode): Path<String>,
) -> AppResult<Json<ProductInfo>> {
    let barcode = validate_barcode(&barcode)?;

    state
        .products
        .lookup_product(&barcode)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No product with barcode {barcode}")))
}
