//! Core rules for the Glyph weighted-credit platform.
//!
//! This crate holds the pure business logic behind paid generation:
//!
//! - **Catalog**: `PricingCatalog`, `ModelConfig`, `TierConfig`, `CreditPack`
//! - **Calculator**: credit weights, pack economics, usage ceilings
//! - **Margin**: scenario-based pack profitability analysis
//! - **Gate**: the generation permission decision
//! - **Ledger**: balance deltas and the low-balance crossing check
//!
//! # Credit unit
//!
//! A credit is an abstract integer unit; each model consumes its
//! `credit_weight` per generation (1 for basic, 4 premium, 63 ultra). The
//! dollar value of a credit is always derived from a pack's
//! `price / credits`; there is no free-standing per-credit constant.
//!
//! Everything here is synchronous and free of I/O. State snapshots come in
//! as arguments; deltas go back out for the persistence layer to apply
//! atomically.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod balance;
pub mod calculator;
pub mod catalog;
pub mod error;
pub mod gate;
pub mod ids;
pub mod ledger;
pub mod margin;

pub use balance::UserCreditBalance;
pub use calculator::{
    credits_required, pack_economics, single_call_cost, usage_limits, GenerationEconomics,
    UsageLimits,
};
pub use catalog::{CreditPack, ModelConfig, PricingCatalog, TierConfig, TierId};
pub use error::{CreditError, Result};
pub use gate::{check_permission, GenerationPermission, PermissionReason, UsageCounts};
pub use ids::{AttemptId, IdError, UserId};
pub use ledger::{low_balance_notice, BalanceDelta, LowBalanceNotice};
pub use margin::{
    analyze_all, analyze_pack, margin_summary, render_report, MarginAnalysis, MarginSummary,
    UsageScenario, TARGET_MARGIN_PERCENT,
};
