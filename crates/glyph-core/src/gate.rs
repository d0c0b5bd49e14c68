//! Generation permission gate.
//!
//! A pure decision function over a snapshot of user state supplied by the
//! caller: tier, balance, and fresh daily/monthly generation counts. The
//! caller is responsible for reading that snapshot consistently and for
//! performing the subsequent debit atomically (see [`crate::ledger`]).

use serde::{Deserialize, Serialize};

use crate::calculator::credits_required;
use crate::catalog::{PricingCatalog, TierId};
use crate::error::Result;

/// Why a permission check resolved the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionReason {
    /// The generation is allowed.
    Ok,

    /// The balance does not cover the model's credit weight.
    InsufficientCredits,

    /// The model is not in the tier's allowed set.
    ModelNotAllowedForTier,

    /// The tier's daily generation cap is already met.
    DailyCapExceeded,

    /// The tier's monthly generation cap is already met.
    MonthlyCapExceeded,
}

/// The outcome of a permission check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationPermission {
    /// Whether the generation may proceed.
    pub allowed: bool,

    /// Structured reason code, stable across releases.
    pub reason: PermissionReason,

    /// Human-readable message for the end user.
    pub message: String,

    /// Credits the generation would consume. Passed to the ledger on allow.
    pub credits_required: i64,
}

impl GenerationPermission {
    fn denied(reason: PermissionReason, message: String, credits_required: i64) -> Self {
        Self {
            allowed: false,
            reason,
            message,
            credits_required,
        }
    }
}

/// Fresh generation counts for the current day and month.
///
/// Always re-derived from recorded generations at check time; the gate
/// never trusts a cached counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageCounts {
    /// Generations recorded today.
    pub today: u32,

    /// Generations recorded this calendar month.
    pub this_month: u32,
}

/// Decide whether a generation attempt may proceed.
///
/// Checks run in a fixed order: tier access, daily cap, monthly cap, then
/// credit balance. A cap of 0 means unlimited. The check is side-effect
/// free; the caller encodes the allow decision plus the debit into a single
/// atomic store operation.
///
/// # Errors
///
/// Returns `CreditError::UnknownModel` or `CreditError::UnknownTier` if
/// the catalog lacks the requested IDs; this is a configuration error, not
/// a denial.
pub fn check_permission(
    catalog: &PricingCatalog,
    tier_id: TierId,
    model_id: &str,
    available_credits: i64,
    usage: &UsageCounts,
) -> Result<GenerationPermission> {
    let tier = catalog.get_tier(tier_id)?;
    let required = credits_required(catalog, model_id)?;

    if !tier.allows_model(model_id) {
        return Ok(GenerationPermission::denied(
            PermissionReason::ModelNotAllowedForTier,
            format!("Model {model_id} is not available on the {tier_id} tier"),
            required,
        ));
    }

    if tier.daily_generation_cap > 0 && usage.today >= tier.daily_generation_cap {
        return Ok(GenerationPermission::denied(
            PermissionReason::DailyCapExceeded,
            format!(
                "Daily limit of {} generations reached",
                tier.daily_generation_cap
            ),
            required,
        ));
    }

    if tier.monthly_generation_cap > 0 && usage.this_month >= tier.monthly_generation_cap {
        return Ok(GenerationPermission::denied(
            PermissionReason::MonthlyCapExceeded,
            format!(
                "Monthly limit of {} generations reached",
                tier.monthly_generation_cap
            ),
            required,
        ));
    }

    if available_credits < required {
        return Ok(GenerationPermission::denied(
            PermissionReason::InsufficientCredits,
            format!(
                "This generation needs {required} credits but only {available_credits} remain"
            ),
            required,
        ));
    }

    Ok(GenerationPermission {
        allowed: true,
        reason: PermissionReason::Ok,
        message: format!("Generation permitted for {required} credits"),
        credits_required: required,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CreditError;

    #[test]
    fn zero_balance_denied_for_cheapest_model() {
        let catalog = PricingCatalog::default();
        let result = check_permission(
            &catalog,
            TierId::Heavy,
            "nano-banana",
            0,
            &UsageCounts::default(),
        )
        .unwrap();

        assert!(!result.allowed);
        assert_eq!(result.reason, PermissionReason::InsufficientCredits);
        assert_eq!(result.credits_required, 1);
    }

    #[test]
    fn tier_exclusion_wins_over_any_balance() {
        // Light tier excludes seedance-pro; 10000 credits change nothing.
        let catalog = PricingCatalog::default();
        let result = check_permission(
            &catalog,
            TierId::Light,
            "seedance-pro",
            10_000,
            &UsageCounts::default(),
        )
        .unwrap();

        assert!(!result.allowed);
        assert_eq!(result.reason, PermissionReason::ModelNotAllowedForTier);
    }

    #[test]
    fn cap_zero_means_unlimited() {
        // Free tier has both caps at 0; an absurd count never trips them.
        let catalog = PricingCatalog::default();
        let result = check_permission(
            &catalog,
            TierId::Free,
            "nano-banana",
            5,
            &UsageCounts {
                today: 100_000,
                this_month: 100_000,
            },
        )
        .unwrap();

        assert!(result.allowed);
        assert_eq!(result.reason, PermissionReason::Ok);
    }

    #[test]
    fn daily_cap_blocks_at_limit() {
        let catalog = PricingCatalog::default();
        let result = check_permission(
            &catalog,
            TierId::Light,
            "nano-banana",
            100,
            &UsageCounts {
                today: 20,
                this_month: 20,
            },
        )
        .unwrap();

        assert!(!result.allowed);
        assert_eq!(result.reason, PermissionReason::DailyCapExceeded);
    }

    #[test]
    fn monthly_cap_checked_after_daily() {
        let catalog = PricingCatalog::default();
        let result = check_permission(
            &catalog,
            TierId::Light,
            "nano-banana",
            100,
            &UsageCounts {
                today: 0,
                this_month: 50,
            },
        )
        .unwrap();

        assert!(!result.allowed);
        assert_eq!(result.reason, PermissionReason::MonthlyCapExceeded);
    }

    #[test]
    fn allowed_with_exact_balance() {
        let catalog = PricingCatalog::default();
        let result = check_permission(
            &catalog,
            TierId::Heavy,
            "seedance-pro",
            63,
            &UsageCounts::default(),
        )
        .unwrap();

        assert!(result.allowed);
        assert_eq!(result.credits_required, 63);
    }

    #[test]
    fn unknown_model_is_config_error_not_denial() {
        let catalog = PricingCatalog::default();
        let err = check_permission(
            &catalog,
            TierId::Free,
            "not-a-model",
            100,
            &UsageCounts::default(),
        )
        .unwrap_err();

        assert!(matches!(err, CreditError::UnknownModel { .. }));
    }

    #[test]
    fn reason_serializes_snake_case() {
        let json = serde_json::to_string(&PermissionReason::ModelNotAllowedForTier).unwrap();
        assert_eq!(json, "\"model_not_allowed_for_tier\"");
        let json = serde_json::to_string(&PermissionReason::InsufficientCredits).unwrap();
        assert_eq!(json, "\"insufficient_credits\"");
    }
}
