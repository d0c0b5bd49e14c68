//! The credit engine facade consumed by route handlers.

use serde::Serialize;

use glyph_core::{
    credits_required, gate, ledger, margin, AttemptId, BalanceDelta, CreditError,
    GenerationPermission, MarginAnalysis, MarginSummary, PermissionReason, UserId,
};

use crate::config::EngineConfig;
use crate::notify::Notifier;
use crate::store::CreditStore;

/// Errors surfaced by the engine facade.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The generation was denied. Expected and user-facing; the caller
    /// translates the reason code into a denial response.
    #[error("generation denied: {}", .0.message)]
    Denied(GenerationPermission),

    /// A configuration or storage fault. Fails the request fast.
    #[error(transparent)]
    Core(#[from] CreditError),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Outcome of a recorded generation.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationReceipt {
    /// Credits remaining after the debit.
    pub new_balance: i64,

    /// Credits the generation consumed.
    pub credits_used: i64,

    /// The idempotency key the debit was recorded under.
    pub attempt_id: AttemptId,
}

/// The caller-facing credit engine.
///
/// Holds the immutable pricing catalog and the two collaborator
/// boundaries: a [`CreditStore`] supplying snapshots and applying deltas
/// atomically, and a [`Notifier`] receiving low-balance events.
pub struct CreditEngine<S, N> {
    config: EngineConfig,
    store: S,
    notifier: N,
}

impl<S: CreditStore, N: Notifier> CreditEngine<S, N> {
    /// Create an engine over a store and notifier.
    #[must_use]
    pub fn new(config: EngineConfig, store: S, notifier: N) -> Self {
        Self {
            config,
            store,
            notifier,
        }
    }

    /// The engine's configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Check whether a user may run a generation against a model.
    ///
    /// Reads a fresh snapshot (tier, balance, usage counts) and applies the
    /// gate rules. Side-effect free; an allow here does not reserve
    /// credits; the reservation happens in [`Self::record_generation`].
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Core` on configuration or storage faults.
    /// Denials are reported in the returned permission, not as errors.
    pub fn check_permission(
        &self,
        user_id: &UserId,
        model_id: &str,
    ) -> Result<GenerationPermission> {
        let tier = self.store.user_tier(user_id)?;
        let counts = self.store.usage_counts(user_id)?;
        // A user with no balance record simply has nothing to spend.
        let available = self
            .store
            .read_balance(user_id)?
            .map_or(0, |b| b.available_credits);

        let permission =
            gate::check_permission(&self.config.catalog, tier, model_id, available, &counts)?;

        if !permission.allowed {
            tracing::debug!(
                user_id = %user_id,
                model = %model_id,
                reason = ?permission.reason,
                "Generation denied"
            );
        }

        Ok(permission)
    }

    /// Record a permitted generation: re-check permission against a fresh
    /// snapshot, debit the balance atomically, then run the low-balance
    /// crossing check.
    ///
    /// An attempt the store has already applied short-circuits the gate
    /// and converges to the recorded outcome; a redelivery must not be
    /// re-gated against the balance its own debit drained.
    ///
    /// A `LedgerConflict` from the store means a concurrent request spent
    /// the credits between our read and the debit; it is surfaced as an
    /// `insufficient_credits` denial rather than retried here, since the
    /// engine has no I/O of its own to retry.
    ///
    /// # Errors
    ///
    /// - `EngineError::Denied` if the gate denies or the debit conflicts.
    /// - `EngineError::Core` on configuration or storage faults.
    pub fn record_generation(
        &self,
        user_id: &UserId,
        model_id: &str,
        attempt_id: AttemptId,
    ) -> Result<GenerationReceipt> {
        if let Some(recorded) = self.store.recorded_attempt(&attempt_id)? {
            let credits = credits_required(&self.config.catalog, model_id)?;
            tracing::debug!(
                user_id = %user_id,
                attempt_id = %attempt_id,
                "Attempt already recorded, returning stored outcome"
            );
            return Ok(GenerationReceipt {
                new_balance: recorded.available_credits,
                credits_used: credits,
                attempt_id,
            });
        }

        let permission = self.check_permission(user_id, model_id)?;
        if !permission.allowed {
            return Err(EngineError::Denied(permission));
        }

        let credits = permission.credits_required;
        let delta = BalanceDelta::debit(credits);
        let outcome = match self.store.apply_delta(user_id, &delta, &attempt_id) {
            Ok(outcome) => outcome,
            Err(CreditError::LedgerConflict { balance, debit }) => {
                tracing::warn!(
                    user_id = %user_id,
                    model = %model_id,
                    balance = %balance,
                    debit = %debit,
                    "Debit lost race, surfacing as insufficient credits"
                );
                return Err(EngineError::Denied(GenerationPermission {
                    allowed: false,
                    reason: PermissionReason::InsufficientCredits,
                    message: format!(
                        "This generation needs {debit} credits but only {balance} remain"
                    ),
                    credits_required: credits,
                }));
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!(
            user_id = %user_id,
            model = %model_id,
            credits = %credits,
            new_balance = %outcome.balance.available_credits,
            attempt_id = %attempt_id,
            "Generation recorded"
        );

        // The pre-debit balance comes from inside the atomic operation, so
        // concurrent debits each see their own true crossing.
        if let Some(notice) = ledger::low_balance_notice(
            *user_id,
            outcome.previous_credits,
            outcome.balance.available_credits,
            self.config.low_balance_threshold,
        ) {
            self.notifier.low_balance(&notice);
        }

        Ok(GenerationReceipt {
            new_balance: outcome.balance.available_credits,
            credits_used: credits,
            attempt_id,
        })
    }

    /// Margin analysis for every pack. Operator-facing, off the hot path.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Core` if the catalog lacks a battery model.
    pub fn margin_report(&self) -> Result<Vec<MarginAnalysis>> {
        Ok(margin::analyze_all(&self.config.catalog)?)
    }

    /// Aggregate margin summary with the 15% floor verdict.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Core` if the catalog lacks a battery model.
    pub fn margin_summary(&self) -> Result<MarginSummary> {
        Ok(margin::margin_summary(&self.config.catalog)?)
    }
}
