//! OpenFoodFacts product lookup by barcode.

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::circuit_breaker::CircuitBreaker;
use crate::config::RecoveryConfig;
use crate::errors::{AppError, AppResult};
use crate::retry::with_recovery;

const USER_AGENT: &str = concat!("fridgechef/", env!("CARGO_PKG_VERSION"));

const PRODUCT_FIELDS: &str = "code,product_name,brands,categories,nutriments,image_url";

/// Product data relevant to a fridge inventory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInfo {
    pub barcode: String,
    pub name: Option<String>,
    pub brand: Option<String>,
    pub categories: Vec<String>,
    pub energy_kcal_100g: Option<f64>,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProductResponse {
    #[serde(default)]
    status: i64,
    product: Option<RawProduct>,
}

#[derive(Debug, Deserialize)]
struct RawProduct {
    product_name: Option<String>,
    brands: Option<String>,
    categories: Option<String>,
    #[serde(default)]
    nutriments: Value,
    image_url: Option<String>,
}

fn non_empty(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

/// Product for an OpenFoodFacts reply body, `None` when the product is unknown
pub fn parse_product(barcode: &str, body: &str) -> AppResult<Option<ProductInfo>> {
    let response: ProductResponse = serde_json::from_str(body)
        .map_err(|e| AppError::Upstream(format!("Unreadable OpenFoodFacts response: {e}")))?;

    let product = match response.product {
        Some(product) if response.status != 0 => product,
        _ => return Ok(None),
    };

    // Only the first brand of a comma separated list is kept
    let brand = non_empty(product.brands)
        .and_then(|brands| brands.split(',').next().map(|b| b.trim().to_string()));

    let categories = product
        .categories
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect();

    Ok(Some(ProductInfo {
        barcode: barcode.to_string(),
        name: non_empty(product.product_name),
        brand,
        categories,
        energy_kcal_100g: product.nutriments.get("energy-kcal_100g").and_then(Value::as_f64),
        image_url: non_empty(product.image_url),
    }))
}

/// Client for the OpenFoodFacts product API
pub struct OpenFoodFactsClient {
    client: Client,
    base_url: String,
    recovery: RecoveryConfig,
    breaker: CircuitBreaker,
}

impl OpenFoodFactsClient {
    pub fn new(base_url: impl Into<String>, recovery: RecoveryConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build OpenFoodFacts HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            breaker: CircuitBreaker::new("openfoodfacts", recovery.clone()),
            recovery,
        })
    }

    fn product_url(&self, barcode: &str) -> String {
        format!(
            "{}/api/v2/product/{barcode}.json?fields={PRODUCT_FIELDS}",
            self.base_url.trim_end_matches('/')
        )
    }

    /// Look a product up by its barcode
    ///
    /// Unknown barcodes yield `Ok(None)`.
    #[instrument(skip(self))]
    pub async fn lookup_product(&self, barcode: &str) -> AppResult<Option<ProductInfo>> {
        let product = with_recovery(&self.breaker, &self.recovery, || self.fetch(barcode)).await?;

        match &product {
            Some(p) => info!(barcode, name = ?p.name, "Product found"),
            None => info!(barcode, "Product not found"),
        }
        Ok(product)
    }

    async fn fetch(&self, barcode: &str) -> AppResult<Option<ProductInfo>> {
        let url = self.product_url(barcode);
        debug!(%url, "Querying OpenFoodFacts");

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::Timeout(format!("OpenFoodFacts request timed out: {e}"))
            } else {
                AppError::Upstream(format!("OpenFoodFacts request failed: {e}"))
            }
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let body = response
            .text()
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to read OpenFoodFacts response: {e}")))?;

        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            return Err(AppError::Upstream(format!("OpenFoodFacts returned {status}")));
        }
        if !status.is_success() {
            return Err(AppError::Internal(format!(
                "OpenFoodFacts rejected the request ({status})"
            )));
        }

        parse_product(barcode, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_product() {
        let body = r#"{
            "code": "3017620422003",
            "status": 1,
            "product": {
                "product_name": "Nutella",
                "brands": "Ferrero, Nutella",
                "categories": "Spreads, Sweet spreads,  ,Hazelnut spreads",
                "nutriments": {"energy-kcal_100g": 539},
                "image_url": "https://images.openfoodfacts.org/nutella.jpg"
            }
        }"#;

        let product = parse_product("3017620422003", body).unwrap().unwrap();

        assert_eq!(product.name.as_deref(), Some("Nutella"));
        assert_eq!(product.brand.as_deref(), Some("Ferrero"));
        assert_eq!(
            product.categories,
            vec!["Spreads", "Sweet spreads", "Hazelnut spreads"]
        );
        assert_eq!(product.energy_kcal_100g, Some(539.0));
    }

    #[test]
    fn test_parse_unknown_product() {
        let body = r#"{"code": "0000000000000", "status": 0, "status_verbose": "product not found"}"#;
        assert_eq!(parse_product("0000000000000", body).unwrap(), None);
    }

    #[test]
    fn test_parse_sparse_product() {
        let body = r#"{"status": 1, "product": {"product_name": " "}}"#;
        let product = parse_product("12345678", body).unwrap().unwrap();

        assert_eq!(product.name, None);
        assert_eq!(product.brand, None);
        assert!(product.categories.is_empty());
        assert_eq!(product.energy_kcal_100g, None);
    }

    #[test]
    fn test_parse_rejects_non_json() {
        assert!(matches!(
            parse_product("12345678", "<html>oops</html>"),
            Err(AppError::Upstream(_))
        ));
    }

    #[test]
    fn test_product_url() {
        let client =
            OpenFoodFactsClient::new("https://world.openfoodfacts.org/", RecoveryConfig::default())
                .unwrap();

        assert!(client
            .product_url("3017620422003")
            .starts_with("https://world.openfoodfacts.org/api/v2/product/3017620422003.json"));
    }
}
