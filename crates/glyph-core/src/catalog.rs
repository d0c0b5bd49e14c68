//! Pricing catalog for the Glyph credit engine.
//!
//! This module defines the static pricing configuration: per-model credit
//! weights and provider costs, per-tier access rules and generation caps,
//! and purchasable credit packs. The catalog is loaded once at startup and
//! shared read-only; there is no runtime mutation API.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{CreditError, Result};

/// Subscription tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierId {
    /// Free tier: basic models only beyond a small premium allowance.
    Free,
    /// Light (weekly pro) tier.
    Light,
    /// Heavy tier: all models including ultra-premium.
    Heavy,
}

impl fmt::Display for TierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Free => write!(f, "free"),
            Self::Light => write!(f, "light"),
            Self::Heavy => write!(f, "heavy"),
        }
    }
}

/// Configuration for a single generation model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model ID (e.g., "nano-banana", "seedance-pro").
    pub id: String,

    /// Actual provider cost per generation, in dollars.
    pub real_cost: Decimal,

    /// Credits consumed per generation. Always >= 1.
    pub credit_weight: i64,

    /// Tiers allowed to use this model.
    pub allowed_tiers: Vec<TierId>,
}

/// Configuration for a subscription tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierConfig {
    /// Generations allowed per month. 0 means unlimited.
    pub monthly_generation_cap: u32,

    /// Generations allowed per day. 0 means unlimited.
    pub daily_generation_cap: u32,

    /// Model IDs accessible to this tier.
    pub allowed_models: Vec<String>,

    /// Price per generation over the cap, in dollars.
    pub overage_rate: Decimal,

    /// Subscription price in dollars, if this tier is paid.
    pub price: Option<Decimal>,

    /// Free premium-model generations per month, if granted.
    pub premium_model_allowance: Option<u32>,
}

impl TierConfig {
    /// Check whether a model is accessible to this tier.
    #[must_use]
    pub fn allows_model(&self, model_id: &str) -> bool {
        self.allowed_models.iter().any(|m| m == model_id)
    }
}

/// A purchasable credit bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditPack {
    /// Price in dollars.
    pub price: Decimal,

    /// Credits granted. Always > 0.
    pub credits: i64,

    /// Human-readable description.
    pub description: String,
}

impl CreditPack {
    /// The implied dollar value of a single credit.
    ///
    /// This is the single authoritative per-credit value; every cost
    /// calculation derives from it rather than from a separate constant.
    #[must_use]
    pub fn credit_value(&self) -> Decimal {
        self.price / Decimal::from(self.credits)
    }
}

/// The full pricing catalog: models, tiers, and credit packs.
///
/// Maps are `BTreeMap` so iteration order (and thus margin report order)
/// is deterministic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingCatalog {
    /// Generation models by ID.
    pub models: BTreeMap<String, ModelConfig>,

    /// Subscription tiers.
    pub tiers: BTreeMap<TierId, TierConfig>,

    /// Credit packs by ID.
    pub packs: BTreeMap<String, CreditPack>,
}

impl PricingCatalog {
    /// Look up a model by ID.
    ///
    /// # Errors
    ///
    /// Returns `CreditError::UnknownModel` if the ID is absent. At startup
    /// this is fatal; at request time callers map it to a denial response.
    pub fn get_model(&self, model_id: &str) -> Result<&ModelConfig> {
        self.models.get(model_id).ok_or_else(|| CreditError::UnknownModel {
            model_id: model_id.to_string(),
        })
    }

    /// Look up a tier by ID.
    ///
    /// # Errors
    ///
    /// Returns `CreditError::UnknownTier` if the tier is absent.
    pub fn get_tier(&self, tier_id: TierId) -> Result<&TierConfig> {
        self.tiers.get(&tier_id).ok_or_else(|| CreditError::UnknownTier {
            tier_id: tier_id.to_string(),
        })
    }

    /// Look up a credit pack by ID.
    ///
    /// # Errors
    ///
    /// Returns `CreditError::UnknownPack` if the ID is absent.
    pub fn get_pack(&self, pack_id: &str) -> Result<&CreditPack> {
        self.packs.get(pack_id).ok_or_else(|| CreditError::UnknownPack {
            pack_id: pack_id.to_string(),
        })
    }

    /// Validate catalog invariants.
    ///
    /// Run once at startup; a failure here is a deployment error.
    ///
    /// # Errors
    ///
    /// Returns `CreditError::InvalidCatalog` if any model has a credit
    /// weight below 1, any pack has a non-positive price or credit count,
    /// or any tier references a model absent from the catalog.
    pub fn validate(&self) -> Result<()> {
        for (id, model) in &self.models {
            if model.credit_weight < 1 {
                return Err(CreditError::InvalidCatalog(format!(
                    "model {id} has credit weight {}, must be >= 1",
                    model.credit_weight
                )));
            }
        }

        for (id, pack) in &self.packs {
            if pack.price <= Decimal::ZERO {
                return Err(CreditError::InvalidCatalog(format!(
                    "pack {id} has non-positive price {}",
                    pack.price
                )));
            }
            if pack.credits <= 0 {
                return Err(CreditError::InvalidCatalog(format!(
                    "pack {id} has non-positive credits {}",
                    pack.credits
                )));
            }
        }

        for (tier_id, tier) in &self.tiers {
            for model_id in &tier.allowed_models {
                if !self.models.contains_key(model_id) {
                    return Err(CreditError::InvalidCatalog(format!(
                        "tier {tier_id} allows unknown model {model_id}"
                    )));
                }
            }
        }

        Ok(())
    }
}

impl Default for PricingCatalog {
    fn default() -> Self {
        let mut models = BTreeMap::new();

        // Basic models - 1 credit each
        for id in ["nano-banana", "runway-t2i", "minimax-2.0", "kling-2.1-master"] {
            models.insert(
                id.to_string(),
                ModelConfig {
                    id: id.to_string(),
                    real_cost: dec!(0.0398),
                    credit_weight: 1,
                    allowed_tiers: vec![TierId::Free, TierId::Light, TierId::Heavy],
                },
            );
        }

        // Premium models - 4 credits each
        for id in ["veo3-fast", "runway-video"] {
            models.insert(
                id.to_string(),
                ModelConfig {
                    id: id.to_string(),
                    real_cost: dec!(0.15),
                    credit_weight: 4,
                    allowed_tiers: vec![TierId::Light, TierId::Heavy],
                },
            );
        }

        // Ultra-premium - 63 credits
        models.insert(
            "seedance-pro".to_string(),
            ModelConfig {
                id: "seedance-pro".to_string(),
                real_cost: dec!(2.50),
                credit_weight: 63,
                allowed_tiers: vec![TierId::Heavy],
            },
        );

        let mut tiers = BTreeMap::new();
        tiers.insert(
            TierId::Free,
            TierConfig {
                monthly_generation_cap: 0, // unlimited for basic models
                daily_generation_cap: 0,
                allowed_models: vec![
                    "nano-banana".into(),
                    "runway-t2i".into(),
                    "minimax-2.0".into(),
                    "kling-2.1-master".into(),
                    "veo3-fast".into(),
                    "runway-video".into(),
                    "seedance-pro".into(),
                ],
                overage_rate: dec!(0.05),
                price: None,
                premium_model_allowance: Some(5),
            },
        );
        tiers.insert(
            TierId::Light,
            TierConfig {
                monthly_generation_cap: 50,
                daily_generation_cap: 20,
                allowed_models: vec![
                    "nano-banana".into(),
                    "runway-t2i".into(),
                    "minimax-2.0".into(),
                    "kling-2.1-master".into(),
                    "veo3-fast".into(),
                    "runway-video".into(),
                ],
                overage_rate: dec!(0.05),
                price: Some(dec!(14.99)),
                premium_model_allowance: None,
            },
        );
        tiers.insert(
            TierId::Heavy,
            TierConfig {
                monthly_generation_cap: 100,
                daily_generation_cap: 50,
                allowed_models: vec![
                    "nano-banana".into(),
                    "runway-t2i".into(),
                    "minimax-2.0".into(),
                    "kling-2.1-master".into(),
                    "veo3-fast".into(),
                    "runway-video".into(),
                    "seedance-pro".into(),
                ],
                overage_rate: dec!(0.04),
                price: Some(dec!(19.99)),
                premium_model_allowance: None,
            },
        );

        let mut packs = BTreeMap::new();
        packs.insert(
            "pack-5".to_string(),
            CreditPack {
                price: dec!(6.25),
                credits: 125,
                description: "125 credits - 125 basic generations OR 31 premium OR 2 ultra-premium"
                    .into(),
            },
        );
        packs.insert(
            "pack-10".to_string(),
            CreditPack {
                price: dec!(12.50),
                credits: 250,
                description: "250 credits - 250 basic generations OR 62 premium OR 4 ultra-premium"
                    .into(),
            },
        );
        packs.insert(
            "pack-25".to_string(),
            CreditPack {
                price: dec!(31.25),
                credits: 625,
                description:
                    "625 credits - 625 basic generations OR 156 premium OR 10 ultra-premium".into(),
            },
        );
        packs.insert(
            "weekly-pro".to_string(),
            CreditPack {
                price: dec!(7.50),
                credits: 150,
                description:
                    "150 credits/week - 150 basic generations OR 37 premium OR 2 ultra-premium"
                        .into(),
            },
        );
        packs.insert(
            "monthly-pro".to_string(),
            CreditPack {
                price: dec!(18.75),
                credits: 375,
                description:
                    "375 credits/month - 375 basic generations OR 93 premium OR 6 ultra-premium"
                        .into(),
            },
        );

        Self { models, tiers, packs }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_validates() {
        let catalog = PricingCatalog::default();
        catalog.validate().unwrap();
    }

    #[test]
    fn default_catalog_lookups() {
        let catalog = PricingCatalog::default();
        assert_eq!(catalog.get_model("nano-banana").unwrap().credit_weight, 1);
        assert_eq!(catalog.get_model("veo3-fast").unwrap().credit_weight, 4);
        assert_eq!(catalog.get_model("seedance-pro").unwrap().credit_weight, 63);
        assert_eq!(catalog.get_pack("pack-5").unwrap().credits, 125);
        assert_eq!(catalog.get_tier(TierId::Light).unwrap().daily_generation_cap, 20);
    }

    #[test]
    fn unknown_ids_fail() {
        let catalog = PricingCatalog::default();
        assert!(matches!(
            catalog.get_model("dall-e-9"),
            Err(CreditError::UnknownModel { .. })
        ));
        assert!(matches!(
            catalog.get_pack("pack-999"),
            Err(CreditError::UnknownPack { .. })
        ));
    }

    #[test]
    fn all_credit_weights_at_least_one() {
        let catalog = PricingCatalog::default();
        for model in catalog.models.values() {
            assert!(model.credit_weight >= 1, "model {} weight < 1", model.id);
        }
    }

    #[test]
    fn pack_credit_value_is_price_over_credits() {
        let catalog = PricingCatalog::default();
        let pack = catalog.get_pack("pack-5").unwrap();
        assert_eq!(pack.credit_value(), dec!(0.05));
    }

    #[test]
    fn validate_rejects_zero_weight() {
        let mut catalog = PricingCatalog::default();
        catalog.models.get_mut("nano-banana").unwrap().credit_weight = 0;
        assert!(matches!(
            catalog.validate(),
            Err(CreditError::InvalidCatalog(_))
        ));
    }

    #[test]
    fn validate_rejects_tier_with_unknown_model() {
        let mut catalog = PricingCatalog::default();
        catalog
            .tiers
            .get_mut(&TierId::Free)
            .unwrap()
            .allowed_models
            .push("phantom-model".into());
        assert!(matches!(
            catalog.validate(),
            Err(CreditError::InvalidCatalog(_))
        ));
    }

    #[test]
    fn catalog_json_roundtrip() {
        let catalog = PricingCatalog::default();
        let json = serde_json::to_string(&catalog).unwrap();
        let parsed: PricingCatalog = serde_json::from_str(&json).unwrap();
        parsed.validate().unwrap();
        assert_eq!(parsed.models.len(), catalog.models.len());
        assert_eq!(parsed.get_pack("pack-25").unwrap().price, dec!(31.25));
    }
}
