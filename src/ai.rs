//! # Gemini Client
//!
//! Receipt extraction and recipe generation through Google's Gemini
//! `generateContent` endpoint.
//!
//! The model is asked for JSON, but replies still arrive wrapped in Markdown
//! fences or a sentence of prose now and then. The `parse_*` helpers dig
//! the JSON out and validate it before anything reaches the database.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, instrument};

use crate::circuit_breaker::CircuitBreaker;
use crate::config::{GeminiConfig, RecoveryConfig};
use crate::errors::{AppError, AppResult};
use crate::ingredient_names::{normalize_ingredient_name, receipt_line_to_name};
use crate::models::{NewRecipe, NewRecipeIngredient};
use crate::retry::with_recovery;

const RECEIPT_PROMPT: &str = "You read grocery receipts. List every food item on this receipt \
as JSON: {\"items\": [{\"name\": string, \"quantity\": number or null, \"unit\": string or null}]}. \
Use plain ingredient names without brands or prices. Skip non-food lines, totals and discounts.";

const RECIPE_PROMPT: &str = "Create one recipe that uses as many of these ingredients as \
possible. Answer with JSON only: {\"title\": string, \"description\": string, \
\"instructions\": string, \"prepTimeMinutes\": number, \"servings\": number, \
\"ingredients\": [{\"name\": string, \"quantity\": number or null, \"unit\": string or null}]}.";

// Wire types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

// Parsed replies

/// One food item read off a receipt, not yet stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptItem {
    pub name: String,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
}

/// A recipe proposed by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedRecipe {
    pub title: String,
    pub description: Option<String>,
    pub instructions: String,
    pub prep_time_minutes: Option<i32>,
    pub servings: Option<i32>,
    pub ingredients: Vec<NewRecipeIngredient>,
}

impl From<GeneratedRecipe> for NewRecipe {
    fn from(generated: GeneratedRecipe) -> Self {
        NewRecipe {
            title: generated.title,
            description: generated.description,
            instructions: generated.instructions,
            prep_time_minutes: generated.prep_time_minutes,
            servings: generated.servings,
            ingredients: generated.ingredients,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawItem {
    name: Option<String>,
    quantity: Option<Value>,
    unit: Option<String>,
}

/// Models sometimes answer with a list of steps instead of one string
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Instructions {
    Text(String),
    Steps(Vec<String>),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRecipe {
    title: Option<String>,
    description: Option<String>,
    instructions: Option<Instructions>,
    #[serde(alias = "prep_time_minutes")]
    prep_time_minutes: Option<Value>,
    servings: Option<Value>,
    #[serde(default)]
    ingredients: Vec<RawItem>,
}

/// The JSON object or array inside a model reply
///
/// Skips Markdown fences and prose around the payload.
pub fn extract_json_block(reply: &str) -> Option<&str> {
    let start = reply.find(|c: char| c == '{' || c == '[')?;
    let close = if reply[start..].starts_with('{') { '}' } else { ']' };
    let end = reply.rfind(close)?;
    (end > start).then(|| &reply[start..=end])
}

fn parse_json(reply: &str) -> AppResult<Value> {
    let block = extract_json_block(reply)
        .ok_or_else(|| AppError::Upstream("AI reply contained no JSON".to_string()))?;
    serde_json::from_str(block).map_err(|e| {
        debug!(error = %e, reply, "Unparseable AI reply");
        AppError::Upstream(format!("AI reply was not valid JSON: {e}"))
    })
}

/// Numbers may come back as strings ("2", "0.5")
fn number(value: Option<&Value>) -> Option<f64> {
    let n = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().replace(',', ".").parse().ok()?,
        _ => return None,
    };
    (n.is_finite() && n > 0.0).then_some(n)
}

fn clean_unit(unit: Option<String>) -> Option<String> {
    unit.map(|u| u.trim().to_string()).filter(|u| !u.is_empty())
}

/// Receipt items from a model reply
///
/// Accepts `{"items": [...]}` or a bare array. Items whose name is empty
/// after cleanup are dropped.
pub fn parse_receipt_items(reply: &str) -> AppResult<Vec<ReceiptItem>> {
    let value = parse_json(reply)?;
    let list = match value {
        Value::Array(list) => list,
        Value::Object(mut map) => match map.remove("items") {
            Some(Value::Array(list)) => list,
            _ => return Err(AppError::Upstream("AI reply had no item list".to_string())),
        },
        _ => return Err(AppError::Upstream("AI reply had no item list".to_string())),
    };

    let items = list
        .into_iter()
        .filter_map(|entry| serde_json::from_value::<RawItem>(entry).ok())
        .filter_map(|raw| {
            let name = receipt_line_to_name(raw.name.as_deref()?)?;
            Some(ReceiptItem {
                name,
                quantity: number(raw.quantity.as_ref()),
                unit: clean_unit(raw.unit),
            })
        })
        .collect();

    Ok(items)
}

/// A generated recipe from a model reply
pub fn parse_generated_recipe(reply: &str) -> AppResult<GeneratedRecipe> {
    let raw: RawRecipe = serde_json::from_value(parse_json(reply)?)
        .map_err(|e| AppError::Upstream(format!("AI recipe had an unexpected shape: {e}")))?;

    let title = raw
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Upstream("AI recipe has no title".to_string()))?;

    let instructions = match raw.instructions {
        Some(Instructions::Text(text)) => text.trim().to_string(),
        Some(Instructions::Steps(steps)) => steps
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
        None => String::new(),
    };
    if instructions.is_empty() {
        return Err(AppError::Upstream("AI recipe has no instructions".to_string()));
    }

    let ingredients: Vec<NewRecipeIngredient> = raw
        .ingredients
        .into_iter()
        .filter_map(|item| {
            let name = normalize_ingredient_name(item.name.as_deref()?);
            (!name.is_empty()).then(|| NewRecipeIngredient {
                name,
                quantity: number(item.quantity.as_ref()),
                unit: clean_unit(item.unit),
            })
        })
        .collect();
    if ingredients.is_empty() {
        return Err(AppError::Upstream("AI recipe lists no ingredients".to_string()));
    }

    Ok(GeneratedRecipe {
        title,
        description: raw
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty()),
        instructions,
        prep_time_minutes: number(raw.prep_time_minutes.as_ref()).map(|n| n.round() as i32),
        servings: number(raw.servings.as_ref()).map(|n| n.round() as i32),
        ingredients,
    })
}

/// Error for a non-success HTTP status
///
/// Rate limiting and server errors are worth retrying. Other client errors
/// mean the request or the API key is wrong and retrying will not help.
fn map_status(status: StatusCode, body: &str) -> AppError {
    let message = serde_json::from_str::<GenerateResponse>(body)
        .ok()
        .and_then(|r| r.error)
        .map_or_else(|| body.chars().take(200).collect(), |e| e.message);

    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        AppError::Upstream(format!("Gemini returned {status}: {message}"))
    } else {
        AppError::Internal(format!("Gemini rejected the request ({status}): {message}"))
    }
}

const API_KEY_HEADER: &str = "x-goog-api-key";

fn map_transport(err: reqwest::Error) -> AppError {
    let err = err.without_url();
    if err.is_timeout() {
        AppError::Timeout(format!("Gemini request timed out: {err}"))
    } else {
        AppError::Upstream(format!("Gemini request failed: {err}"))
    }
}

/// Client for the Gemini generative language API
pub struct GeminiClient {
    client: Client,
    config: GeminiConfig,
    recovery: RecoveryConfig,
    breaker: CircuitBreaker,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig, recovery: RecoveryConfig) -> Self {
        Self {
            client: Client::new(),
            breaker: CircuitBreaker::new("gemini", recovery.clone()),
            config,
            recovery,
        }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    /// Read the food items off a receipt photo
    #[instrument(skip(self, image), fields(size = image.len()))]
    pub async fn extract_receipt_items(
        &self,
        image: &[u8],
        mime_type: &str,
    ) -> AppResult<Vec<ReceiptItem>> {
        let encoded = BASE64.encode(image);
        let reply = self
            .generate(|| {
                vec![
                    Part::Text {
                        text: RECEIPT_PROMPT.to_string(),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: mime_type.to_string(),
                            data: encoded.clone(),
                        },
                    },
                ]
            })
            .await?;

        let items = parse_receipt_items(&reply)?;
        info!(items = items.len(), "Extracted receipt items");
        Ok(items)
    }

    /// Ask the model for a recipe built around `ingredients`
    #[instrument(skip(self, ingredients, preferences), fields(ingredients = ingredients.len()))]
    pub async fn generate_recipe(
        &self,
        ingredients: &[String],
        preferences: Option<&str>,
    ) -> AppResult<GeneratedRecipe> {
        let mut prompt = format!("{RECIPE_PROMPT}\nIngredients: {}", ingredients.join(", "));
        if let Some(preferences) = preferences.map(str::trim).filter(|p| !p.is_empty()) {
            prompt.push_str("\nPreferences: ");
            prompt.push_str(preferences);
        }

        let reply = self
            .generate(|| {
                vec![Part::Text {
                    text: prompt.clone(),
                }]
            })
            .await?;

        let recipe = parse_generated_recipe(&reply)?;
        info!(title = %recipe.title, "Generated recipe");
        Ok(recipe)
    }

    /// Send one prompt through the retry policy and return the reply text
    async fn generate<F>(&self, parts: F) -> AppResult<String>
    where
        F: Fn() -> Vec<Part>,
    {
        with_recovery(&self.breaker, &self.recovery, || {
            let request = GenerateRequest {
                contents: vec![Content {
                    role: Some("user".to_string()),
                    parts: parts(),
                }],
                generation_config: GenerationConfig {
                    response_mime_type: "application/json",
                    temperature: 0.2,
                },
            };
            self.send(request)
        })
        .await
    }

    async fn send(&self, request: GenerateRequest) -> AppResult<String> {
        debug!(model = %self.config.model, "Sending request to Gemini");

        let response = self
            .client
            .post(self.url())
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(map_transport)?;

        let status = response.status();
        let body = response.text().await.map_err(map_transport)?;

        if !status.is_success() {
            error!(status = %status, "Gemini API error");
            return Err(map_status(status, &body));
        }

        let parsed: GenerateResponse = serde_json::from_str(&body)
            .map_err(|e| AppError::Upstream(format!("Unreadable Gemini response: {e}")))?;

        if let Some(err) = parsed.error {
            return Err(AppError::Upstream(format!("Gemini error: {}", err.message)));
        }

        let text: String = parsed
            .candidates
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| match part {
                        Part::Text { text } => Some(text),
                        Part::InlineData { .. } => None,
                    })
                    .collect()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(AppError::Upstream("Gemini returned no content".to_string()));
        }
        Ok(text)
    }
}
