//! Engine configuration.

use std::path::Path;

use glyph_core::{CreditError, PricingCatalog, Result};

/// Default low-balance notification threshold, in credits.
pub const DEFAULT_LOW_BALANCE_THRESHOLD: i64 = 10;

/// Configuration for the credit engine, loaded once at startup.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Balance level below which the first crossing fires a notification.
    pub low_balance_threshold: i64,

    /// The pricing catalog. Immutable after load; changes require a
    /// redeploy or reload.
    pub catalog: PricingCatalog,
}

impl EngineConfig {
    /// Load configuration from environment variables.
    ///
    /// - `GLYPH_LOW_BALANCE_THRESHOLD`: credits (default 10).
    /// - `GLYPH_PRICING_PATH`: optional path to a JSON catalog file that
    ///   replaces the built-in catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured catalog file cannot be read or
    /// parsed, or if the resulting catalog fails validation. Both are
    /// deployment errors and fatal at startup.
    pub fn from_env() -> Result<Self> {
        let low_balance_threshold = std::env::var("GLYPH_LOW_BALANCE_THRESHOLD")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_LOW_BALANCE_THRESHOLD);

        let catalog = match std::env::var("GLYPH_PRICING_PATH") {
            Ok(path) => {
                let catalog = load_catalog_file(Path::new(&path))?;
                tracing::info!(path = %path, "Loaded pricing catalog from file");
                catalog
            }
            Err(_) => PricingCatalog::default(),
        };

        catalog.validate()?;

        Ok(Self {
            low_balance_threshold,
            catalog,
        })
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            low_balance_threshold: DEFAULT_LOW_BALANCE_THRESHOLD,
            catalog: PricingCatalog::default(),
        }
    }
}

/// Load and parse a pricing catalog from a JSON file.
///
/// # Errors
///
/// Returns `CreditError::InvalidCatalog` if the file cannot be read or
/// does not parse as a catalog.
pub fn load_catalog_file(path: &Path) -> Result<PricingCatalog> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        CreditError::InvalidCatalog(format!("cannot read {}: {e}", path.display()))
    })?;
    serde_json::from_str(&contents).map_err(|e| {
        CreditError::InvalidCatalog(format!("cannot parse {}: {e}", path.display()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = EngineConfig::default();
        config.catalog.validate().unwrap();
        assert_eq!(config.low_balance_threshold, DEFAULT_LOW_BALANCE_THRESHOLD);
    }

    #[test]
    fn missing_catalog_file_is_fatal() {
        let err = load_catalog_file(Path::new("/nonexistent/pricing.json")).unwrap_err();
        assert!(matches!(err, CreditError::InvalidCatalog(_)));
    }
}
