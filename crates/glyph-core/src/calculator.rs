//! Credit calculations for the Glyph engine.
//!
//! Pure arithmetic over the pricing catalog: credits required per model
//! call, pack-level economics, and suggested usage ceilings derived from a
//! credit balance. All dollar math uses `Decimal`; all generation counts
//! floor, since you cannot generate a fractional item.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::catalog::{CreditPack, PricingCatalog};
use crate::error::Result;

/// Share of a balance allocated to basic models (weight 1).
const BASIC_ALLOCATION: Decimal = dec!(0.80);

/// Share of a balance allocated to premium models (weight 4).
const PREMIUM_ALLOCATION: Decimal = dec!(0.15);

/// Share of a balance allocated to ultra-premium models (weight 63).
const ULTRA_ALLOCATION: Decimal = dec!(0.05);

/// Credit weight of the premium model class.
const PREMIUM_WEIGHT: Decimal = dec!(4);

/// Credit weight of the ultra-premium model class.
const ULTRA_WEIGHT: Decimal = dec!(63);

/// Days assumed per month when scaling daily ceilings.
const DAYS_PER_MONTH: Decimal = dec!(30);

/// Credits required for one generation against a model.
///
/// # Errors
///
/// Returns `CreditError::UnknownModel` if the model is not in the catalog.
pub fn credits_required(catalog: &PricingCatalog, model_id: &str) -> Result<i64> {
    Ok(catalog.get_model(model_id)?.credit_weight)
}

/// Economics of a single generation evaluated against a credit pack.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationEconomics {
    /// Credits the generation consumes.
    pub credits_required: i64,

    /// Dollar cost of those credits at the pack's per-credit value.
    pub actual_cost: Decimal,

    /// Pack price minus the cost, i.e. profit over the whole pack if this
    /// were the only usage drawn from it.
    pub profit: Decimal,

    /// Profit as a percentage of pack price.
    pub margin_percent: Decimal,

    /// Whether the pack remains profitable under this usage.
    pub profitable: bool,
}

/// Evaluate the economics of one generation against a credit pack.
///
/// Cost derives from [`CreditPack::credit_value`], the single authoritative
/// per-credit value. Profit is framed per full pack, matching the
/// scenario-based analysis in [`crate::margin`], which passes aggregate
/// `credits_used` through the same arithmetic.
///
/// # Errors
///
/// Returns `CreditError::UnknownModel` if the model is not in the catalog.
pub fn pack_economics(
    catalog: &PricingCatalog,
    model_id: &str,
    pack: &CreditPack,
) -> Result<GenerationEconomics> {
    let credits = credits_required(catalog, model_id)?;
    let actual_cost = Decimal::from(credits) * pack.credit_value();
    let profit = pack.price - actual_cost;
    let margin_percent = profit / pack.price * dec!(100);

    Ok(GenerationEconomics {
        credits_required: credits,
        actual_cost,
        profit,
        margin_percent,
        profitable: profit > Decimal::ZERO,
    })
}

/// Dollar cost of a single call against a model, at a pack's credit value.
///
/// # Errors
///
/// Returns `CreditError::UnknownModel` if the model is not in the catalog.
pub fn single_call_cost(
    catalog: &PricingCatalog,
    model_id: &str,
    pack: &CreditPack,
) -> Result<Decimal> {
    let credits = credits_required(catalog, model_id)?;
    Ok(Decimal::from(credits) * pack.credit_value())
}

/// Suggested generation ceilings derived from a credit balance.
///
/// The balance is split 80% basic / 15% premium / 5% ultra, divided by each
/// class's credit weight, and scaled by 30 for the monthly figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageLimits {
    /// Daily basic-model generations.
    pub daily_basic: i64,
    /// Daily premium-model generations.
    pub daily_premium: i64,
    /// Daily ultra-premium generations.
    pub daily_ultra: i64,
    /// Monthly basic-model generations.
    pub monthly_basic: i64,
    /// Monthly premium-model generations.
    pub monthly_premium: i64,
    /// Monthly ultra-premium generations.
    pub monthly_ultra: i64,
}

/// Compute usage ceilings for a balance. Never returns negative values.
#[must_use]
pub fn usage_limits(available_credits: i64) -> UsageLimits {
    let credits = Decimal::from(available_credits);

    UsageLimits {
        daily_basic: floor_count(credits * BASIC_ALLOCATION),
        monthly_basic: floor_count(credits * BASIC_ALLOCATION * DAYS_PER_MONTH),
        daily_premium: floor_count(credits * PREMIUM_ALLOCATION / PREMIUM_WEIGHT),
        monthly_premium: floor_count(credits * PREMIUM_ALLOCATION * DAYS_PER_MONTH / PREMIUM_WEIGHT),
        daily_ultra: floor_count(credits * ULTRA_ALLOCATION / ULTRA_WEIGHT),
        monthly_ultra: floor_count(credits * ULTRA_ALLOCATION * DAYS_PER_MONTH / ULTRA_WEIGHT),
    }
}

/// Floor a decimal to a whole generation count, clamped at zero.
fn floor_count(value: Decimal) -> i64 {
    value.floor().to_i64().unwrap_or(0).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::PricingCatalog;
    use crate::error::CreditError;

    #[test]
    fn credits_required_per_model() {
        let catalog = PricingCatalog::default();
        assert_eq!(credits_required(&catalog, "nano-banana").unwrap(), 1);
        assert_eq!(credits_required(&catalog, "veo3-fast").unwrap(), 4);
        assert_eq!(credits_required(&catalog, "seedance-pro").unwrap(), 63);
    }

    #[test]
    fn credits_required_unknown_model() {
        let catalog = PricingCatalog::default();
        assert!(matches!(
            credits_required(&catalog, "midjourney-v9"),
            Err(CreditError::UnknownModel { .. })
        ));
    }

    #[test]
    fn nano_banana_against_pack_5() {
        // pack-5: $6.25 / 125 credits -> $0.05 per credit
        let catalog = PricingCatalog::default();
        let pack = catalog.get_pack("pack-5").unwrap();
        let econ = pack_economics(&catalog, "nano-banana", pack).unwrap();

        assert_eq!(econ.credits_required, 1);
        assert_eq!(econ.actual_cost, dec!(0.05));
        assert_eq!(econ.profit, dec!(6.20));
        assert_eq!(econ.margin_percent, dec!(99.2));
        assert!(econ.profitable);
    }

    #[test]
    fn single_call_cost_scales_with_weight() {
        let catalog = PricingCatalog::default();
        let pack = catalog.get_pack("pack-5").unwrap();
        assert_eq!(single_call_cost(&catalog, "nano-banana", pack).unwrap(), dec!(0.05));
        assert_eq!(single_call_cost(&catalog, "veo3-fast", pack).unwrap(), dec!(0.20));
        assert_eq!(single_call_cost(&catalog, "seedance-pro", pack).unwrap(), dec!(3.15));
    }

    #[test]
    fn usage_limits_for_typical_balance() {
        let limits = usage_limits(125);
        assert_eq!(limits.daily_basic, 100); // 125 * 0.8
        assert_eq!(limits.monthly_basic, 3000);
        assert_eq!(limits.daily_premium, 4); // floor(125 * 0.15 / 4)
        assert_eq!(limits.monthly_premium, 140);
        assert_eq!(limits.daily_ultra, 0); // floor(125 * 0.05 / 63)
        assert_eq!(limits.monthly_ultra, 2);
    }

    #[test]
    fn usage_limits_zero_balance_all_zero() {
        let limits = usage_limits(0);
        assert_eq!(limits.daily_basic, 0);
        assert_eq!(limits.daily_premium, 0);
        assert_eq!(limits.daily_ultra, 0);
        assert_eq!(limits.monthly_basic, 0);
        assert_eq!(limits.monthly_premium, 0);
        assert_eq!(limits.monthly_ultra, 0);
    }

    #[test]
    fn usage_limits_never_negative() {
        let limits = usage_limits(-500);
        assert_eq!(limits.daily_basic, 0);
        assert_eq!(limits.monthly_ultra, 0);
    }
}
