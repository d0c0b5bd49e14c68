//! Margin analysis across credit packs and usage-mix scenarios.
//!
//! An operator-facing audit tool, not on the request hot path. Every credit
//! pack is stress-tested against a fixed battery of usage mixes, from
//! all-basic to worst-case all-ultra, and the per-scenario margins are
//! aggregated into an overall summary with a hard 15% margin floor.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::fmt::Write as _;

use crate::calculator::credits_required;
use crate::catalog::PricingCatalog;
use crate::error::Result;

/// Minimum acceptable worst-case margin, in percent.
pub const TARGET_MARGIN_PERCENT: Decimal = dec!(15);

/// Best-case margin above which promotional pricing is suggested.
const PROMO_MARGIN_PERCENT: Decimal = dec!(50);

/// One usage mix evaluated against a pack.
#[derive(Debug, Clone, Serialize)]
pub struct UsageScenario {
    /// Scenario label (e.g., "Worst Case: 100% Ultra Premium").
    pub name: String,

    /// Credits consumed under this mix.
    pub credits_used: i64,

    /// Dollar cost of the consumed credits at the pack's credit value.
    pub actual_cost: Decimal,

    /// Pack price minus actual cost.
    pub profit: Decimal,

    /// Margin as a percentage of pack price, floored at zero.
    pub margin_percent: Decimal,
}

/// Margin analysis for a single credit pack.
#[derive(Debug, Clone, Serialize)]
pub struct MarginAnalysis {
    /// The pack ID.
    pub credit_pack: String,

    /// Pack price in dollars.
    pub price: Decimal,

    /// Credits in the pack.
    pub credits: i64,

    /// Scenario results, in battery order.
    pub scenarios: Vec<UsageScenario>,

    /// Mean margin across scenarios.
    pub average_margin: Decimal,

    /// Lowest scenario margin.
    pub worst_case_margin: Decimal,

    /// Highest scenario margin.
    pub best_case_margin: Decimal,
}

/// Aggregate margin summary across all packs and scenarios.
#[derive(Debug, Clone, Serialize)]
pub struct MarginSummary {
    /// Mean margin across every scenario of every pack.
    pub overall_average: Decimal,

    /// Lowest margin observed anywhere.
    pub overall_worst: Decimal,

    /// Highest margin observed anywhere.
    pub overall_best: Decimal,

    /// Whether the worst case clears [`TARGET_MARGIN_PERCENT`].
    pub target_met: bool,

    /// Advisory, rule-based suggestions. Informational only.
    pub recommendations: Vec<String>,
}

/// The scenario battery for a pack of a given size.
///
/// Usage counts floor: a mix that cannot afford a whole ultra generation
/// runs zero of them.
fn scenario_battery(credits: i64) -> Vec<(String, &'static str, i64)> {
    let credits_dec = Decimal::from(credits);
    let floor = |value: Decimal| value.floor().to_i64().unwrap_or(0).max(0);

    vec![
        (
            "100% Basic Models (Nano Banana)".to_string(),
            "nano-banana",
            credits.max(0),
        ),
        (
            "80% Basic, 20% Premium".to_string(),
            "veo3-fast",
            floor(credits_dec * dec!(0.2) / dec!(4)),
        ),
        (
            "60% Basic, 30% Premium, 10% Ultra".to_string(),
            "seedance-pro",
            floor(credits_dec * dec!(0.1) / dec!(63)),
        ),
        (
            "50% Basic, 40% Premium, 10% Ultra".to_string(),
            "seedance-pro",
            floor(credits_dec * dec!(0.1) / dec!(63)),
        ),
        (
            "Worst Case: 100% Ultra Premium".to_string(),
            "seedance-pro",
            floor(credits_dec / dec!(63)),
        ),
    ]
}

/// Analyze margins for a single credit pack.
///
/// # Errors
///
/// Returns `CreditError::UnknownPack` for an absent pack ID, or
/// `CreditError::UnknownModel` if the catalog lacks a battery model.
pub fn analyze_pack(catalog: &PricingCatalog, pack_id: &str) -> Result<MarginAnalysis> {
    let pack = catalog.get_pack(pack_id)?;
    let credit_value = pack.credit_value();

    let mut scenarios = Vec::new();
    for (name, model_id, usage) in scenario_battery(pack.credits) {
        let credits_used = usage * credits_required(catalog, model_id)?;
        let actual_cost = Decimal::from(credits_used) * credit_value;
        let profit = pack.price - actual_cost;
        let margin_percent = (profit / pack.price * dec!(100)).max(Decimal::ZERO);

        scenarios.push(UsageScenario {
            name,
            credits_used,
            actual_cost,
            profit,
            margin_percent,
        });
    }

    let margins: Vec<Decimal> = scenarios.iter().map(|s| s.margin_percent).collect();
    let average_margin = mean(&margins);
    let worst_case_margin = margins.iter().copied().min().unwrap_or(Decimal::ZERO);
    let best_case_margin = margins.iter().copied().max().unwrap_or(Decimal::ZERO);

    Ok(MarginAnalysis {
        credit_pack: pack_id.to_string(),
        price: pack.price,
        credits: pack.credits,
        scenarios,
        average_margin,
        worst_case_margin,
        best_case_margin,
    })
}

/// Analyze margins for every pack in the catalog, in pack-ID order.
///
/// # Errors
///
/// Returns an error if any battery model is absent from the catalog.
pub fn analyze_all(catalog: &PricingCatalog) -> Result<Vec<MarginAnalysis>> {
    catalog
        .packs
        .keys()
        .map(|pack_id| analyze_pack(catalog, pack_id))
        .collect()
}

/// Aggregate every scenario of every pack into an overall summary.
///
/// # Errors
///
/// Returns an error if any battery model is absent from the catalog.
pub fn margin_summary(catalog: &PricingCatalog) -> Result<MarginSummary> {
    let analyses = analyze_all(catalog)?;

    let all_margins: Vec<Decimal> = analyses
        .iter()
        .flat_map(|a| a.scenarios.iter().map(|s| s.margin_percent))
        .collect();

    let overall_average = mean(&all_margins);
    let overall_worst = all_margins.iter().copied().min().unwrap_or(Decimal::ZERO);
    let overall_best = all_margins.iter().copied().max().unwrap_or(Decimal::ZERO);
    let target_met = overall_worst >= TARGET_MARGIN_PERCENT;

    let mut recommendations = Vec::new();
    if !target_met {
        recommendations
            .push("Consider increasing prices by 5-10% to meet 15% margin target".to_string());
        recommendations.push("Implement usage limits to prevent worst-case scenarios".to_string());
        recommendations.push("Add premium add-on services with 100% margins".to_string());
    }
    if overall_best > PROMO_MARGIN_PERCENT {
        recommendations.push(
            "Consider promotional pricing for expensive models to increase adoption".to_string(),
        );
    }

    Ok(MarginSummary {
        overall_average,
        overall_worst,
        overall_best,
        target_met,
        recommendations,
    })
}

/// Render a plain-text margin report for operators.
///
/// # Errors
///
/// Returns an error if any battery model is absent from the catalog.
pub fn render_report(catalog: &PricingCatalog) -> Result<String> {
    let analyses = analyze_all(catalog)?;
    let summary = margin_summary(catalog)?;

    let mut report = String::from("# Weighted Credit System Margin Analysis\n\n");

    report.push_str("## Overall Summary\n");
    let _ = writeln!(report, "- Average Margin: {:.1}%", summary.overall_average);
    let _ = writeln!(report, "- Worst Case Margin: {:.1}%", summary.overall_worst);
    let _ = writeln!(report, "- Best Case Margin: {:.1}%", summary.overall_best);
    let _ = writeln!(
        report,
        "- 15% Target Met: {}",
        if summary.target_met { "YES" } else { "NO" }
    );
    report.push('\n');

    if !summary.recommendations.is_empty() {
        report.push_str("## Recommendations\n");
        for rec in &summary.recommendations {
            let _ = writeln!(report, "- {rec}");
        }
        report.push('\n');
    }

    report.push_str("## Detailed Analysis by Credit Pack\n\n");
    for analysis in &analyses {
        let _ = writeln!(report, "### {}", analysis.credit_pack);
        let _ = writeln!(report, "- Price: ${}", analysis.price);
        let _ = writeln!(report, "- Credits: {}", analysis.credits);
        let _ = writeln!(report, "- Average Margin: {:.1}%", analysis.average_margin);
        let _ = writeln!(report, "- Worst Case: {:.1}%", analysis.worst_case_margin);
        let _ = writeln!(report, "- Best Case: {:.1}%", analysis.best_case_margin);
        report.push('\n');

        report.push_str("Usage Scenarios:\n");
        for scenario in &analysis.scenarios {
            let _ = writeln!(
                report,
                "- {}: {:.1}% margin",
                scenario.name, scenario.margin_percent
            );
        }
        report.push('\n');
    }

    Ok(report)
}

fn mean(values: &[Decimal]) -> Decimal {
    if values.is_empty() {
        return Decimal::ZERO;
    }
    values.iter().sum::<Decimal>() / Decimal::from(values.len())
}
