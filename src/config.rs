//! # Configuration Module
//!
//! This module defines the service configuration, loaded from environment
//! variables (a `.env` file is honoured by `main`), plus the recovery
//! settings used by outbound HTTP clients and the receipt upload limits.

use anyhow::{Context, Result};
use std::env;

use crate::suggestion::DEFAULT_RESULT_LIMIT;

// Constants for service configuration
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_OPENFOODFACTS_BASE_URL: &str = "https://world.openfoodfacts.org";
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024; // 10MB limit for receipt images
pub const MAX_SUGGESTION_LIMIT: usize = 50;
pub const MIN_FORMAT_BYTES: usize = 8;

/// Recovery configuration for outbound calls
#[derive(Debug, Clone)]
pub struct RecoveryConfig {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Base delay between retries in milliseconds
    pub base_retry_delay_ms: u64,
    /// Maximum delay between retries in milliseconds
    pub max_retry_delay_ms: u64,
    /// Timeout for a single outbound call in seconds
    pub operation_timeout_secs: u64,
    /// Circuit breaker failure threshold
    pub circuit_breaker_threshold: u32,
    /// Circuit breaker reset timeout in seconds
    pub circuit_breaker_reset_secs: u64,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_retry_delay_ms: 1000,  // 1 second
            max_retry_delay_ms: 10000,  // 10 seconds
            operation_timeout_secs: 30, // 30 seconds
            circuit_breaker_threshold: 5,
            circuit_breaker_reset_secs: 60, // 1 minute
        }
    }
}

/// Format-specific size limits for receipt images
#[derive(Debug, Clone)]
pub struct UploadLimits {
    /// Overall limit, checked before format detection
    pub max_bytes: u64,
    /// PNG format limit
    pub png_max: u64,
    /// JPEG format limit
    pub jpeg_max: u64,
    /// WebP format limit
    pub webp_max: u64,
    /// Minimum bytes required for format detection
    pub min_format_bytes: usize,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_bytes: MAX_UPLOAD_BYTES,
            png_max: 10 * 1024 * 1024,  // 10MB for PNG
            jpeg_max: 10 * 1024 * 1024, // 10MB for JPEG
            webp_max: 8 * 1024 * 1024,  // 8MB for WebP
            min_format_bytes: MIN_FORMAT_BYTES,
        }
    }
}

/// Gemini client settings
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

/// Service configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// PostgreSQL connection string
    pub database_url: String,
    /// Address the HTTP server listens on
    pub bind_addr: String,
    /// `None` when no API key is configured; AI routes then answer 503
    pub gemini: Option<GeminiConfig>,
    /// OpenFoodFacts API root
    pub openfoodfacts_base_url: String,
    /// Default number of suggestions per request
    pub suggestion_limit: usize,
    /// Receipt upload limits
    pub upload: UploadLimits,
    /// Retry and circuit breaker settings
    pub recovery: RecoveryConfig,
}

impl AppConfig {
    /// Build the configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

        let gemini = match env::var("GEMINI_API_KEY") {
            Ok(api_key) if !api_key.trim().is_empty() => Some(GeminiConfig {
                api_key,
                model: env_or("GEMINI_MODEL", DEFAULT_GEMINI_MODEL),
                base_url: env_or("GEMINI_BASE_URL", DEFAULT_GEMINI_BASE_URL),
            }),
            _ => None,
        };

        let suggestion_limit = parse_env("SUGGESTION_LIMIT", DEFAULT_RESULT_LIMIT)?;
        if suggestion_limit == 0 || suggestion_limit > MAX_SUGGESTION_LIMIT {
            anyhow::bail!("SUGGESTION_LIMIT must be between 1 and {MAX_SUGGESTION_LIMIT}");
        }

        let upload = UploadLimits {
            max_bytes: parse_env("MAX_UPLOAD_BYTES", MAX_UPLOAD_BYTES)?,
            ..UploadLimits::default()
        };

        Ok(Self {
            database_url,
            bind_addr: env_or("BIND_ADDR", DEFAULT_BIND_ADDR),
            gemini,
            openfoodfacts_base_url: env_or(
                "OPENFOODFACTS_BASE_URL",
                DEFAULT_OPENFOODFACTS_BASE_URL,
            ),
            suggestion_limit,
            upload,
            recovery: RecoveryConfig::default(),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Invalid value for {key}: {e}")),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recovery_config_defaults() {
        let recovery = RecoveryConfig::default();

        assert_eq!(recovery.max_retries, 3);
        assert_eq!(recovery.base_retry_delay_ms, 1000);
        assert_eq!(recovery.max_retry_delay_ms, 10000);
        assert_eq!(recovery.operation_timeout_secs, 30);
        assert_eq!(recovery.circuit_breaker_threshold, 5);
        assert_eq!(recovery.circuit_breaker_reset_secs, 60);
    }

    #[test]
    fn test_upload_limits_defaults() {
        let limits = UploadLimits::default();

        assert_eq!(limits.max_bytes, 10 * 1024 * 1024);
        assert_eq!(limits.png_max, 10 * 1024 * 1024);
        assert_eq!(limits.jpeg_max, 10 * 1024 * 1024);
        assert_eq!(limits.webp_max, 8 * 1024 * 1024);
        assert_eq!(limits.min_format_bytes, 8);
    }

    #[test]
    fn test_parse_env_falls_back_to_default() {
        let value: usize = parse_env("FRIDGECHEF_TEST_UNSET_VARIABLE", 7).unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn test_env_or_default() {
        assert_eq!(
            env_or("FRIDGECHEF_TEST_UNSET_VARIABLE", "fallback"),
            "fallback"
        );
    }
}
