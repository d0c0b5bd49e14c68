//! The storage trait and an in-memory implementation.
//!
//! Persistence is an external collaborator; this trait is its contract.
//! The one hard requirement is `apply_delta`: the store must evaluate the
//! ledger precondition (no negative balance) and the idempotency check
//! inside a single atomic operation, so concurrent debits cannot
//! double-spend and redelivered debits apply once.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use glyph_core::{
    AttemptId, BalanceDelta, CreditError, Result, TierId, UsageCounts, UserCreditBalance, UserId,
};

/// Storage operations the engine needs from the persistence layer.
///
/// All reads supply fresh snapshots; usage counts in particular are
/// re-derived from recorded generations on every call, never cached.
pub trait CreditStore: Send + Sync {
    /// Read the active balance record for a user, if one exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying read fails.
    fn read_balance(&self, user_id: &UserId) -> Result<Option<UserCreditBalance>>;

    /// Look up the user's current subscription tier.
    ///
    /// Users without a subscription resolve to the free tier.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying read fails.
    fn user_tier(&self, user_id: &UserId) -> Result<TierId>;

    /// Count the user's generations for today and this month.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying read fails.
    fn usage_counts(&self, user_id: &UserId) -> Result<UsageCounts>;

    /// Look up the balance recorded for an already-applied attempt.
    ///
    /// Lets the engine converge a redelivered attempt to its original
    /// outcome before running any permission checks; a replay must not be
    /// re-gated against the post-debit balance.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying read fails.
    fn recorded_attempt(&self, attempt_id: &AttemptId) -> Result<Option<UserCreditBalance>>;

    /// Atomically apply a balance delta, returning the balance before and
    /// after the change.
    ///
    /// The store must enforce, inside one atomic operation:
    ///
    /// - the conditional-decrement rule: a debit that would drive
    ///   `available_credits` negative fails with `LedgerConflict`;
    /// - idempotency: a delta already applied under `attempt_id` returns
    ///   the previously recorded outcome without applying again, with
    ///   `previous_credits` equal to the recorded balance so no threshold
    ///   crossing is observed twice.
    ///
    /// # Errors
    ///
    /// - `CreditError::BalanceNotFound` if no record exists for the user.
    /// - `CreditError::LedgerConflict` if the decrement precondition fails.
    fn apply_delta(
        &self,
        user_id: &UserId,
        delta: &BalanceDelta,
        attempt_id: &AttemptId,
    ) -> Result<DeltaOutcome>;
}

/// The result of an atomic delta application.
///
/// Carries the pre-change balance from inside the atomic operation, so
/// crossing checks never depend on a separate racy read.
#[derive(Debug, Clone)]
pub struct DeltaOutcome {
    /// Available credits immediately before the delta applied.
    pub previous_credits: i64,

    /// The balance after the delta.
    pub balance: UserCreditBalance,
}

impl<S: CreditStore + ?Sized> CreditStore for Arc<S> {
    fn read_balance(&self, user_id: &UserId) -> Result<Option<UserCreditBalance>> {
        (**self).read_balance(user_id)
    }

    fn user_tier(&self, user_id: &UserId) -> Result<TierId> {
        (**self).user_tier(user_id)
    }

    fn usage_counts(&self, user_id: &UserId) -> Result<UsageCounts> {
        (**self).usage_counts(user_id)
    }

    fn recorded_attempt(&self, attempt_id: &AttemptId) -> Result<Option<UserCreditBalance>> {
        (**self).recorded_attempt(attempt_id)
    }

    fn apply_delta(
        &self,
        user_id: &UserId,
        delta: &BalanceDelta,
        attempt_id: &AttemptId,
    ) -> Result<DeltaOutcome> {
        (**self).apply_delta(user_id, delta, attempt_id)
    }
}

#[derive(Debug, Default)]
struct Inner {
    balances: HashMap<UserId, UserCreditBalance>,
    tiers: HashMap<UserId, TierId>,
    counts: HashMap<UserId, UsageCounts>,
    applied: HashMap<String, UserCreditBalance>,
}

/// In-memory store for tests and local development.
///
/// A single mutex makes every operation atomic, which is exactly the
/// guarantee a production adapter must reproduce with its own transaction
/// or conditional-update primitive.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant credits to a user, creating the balance record on first grant.
    ///
    /// # Errors
    ///
    /// Returns an error if the store lock is poisoned.
    pub fn grant(&self, user_id: UserId, credits: i64) -> Result<UserCreditBalance> {
        let mut inner = self.lock()?;
        let balance = match inner.balances.get(&user_id) {
            Some(existing) => existing.apply(&BalanceDelta::grant(credits))?,
            None => UserCreditBalance::from_grant(user_id, credits),
        };
        inner.balances.insert(user_id, balance.clone());
        Ok(balance)
    }

    /// Set a user's tier (defaults to free when never set).
    ///
    /// # Errors
    ///
    /// Returns an error if the store lock is poisoned.
    pub fn set_tier(&self, user_id: UserId, tier: TierId) -> Result<()> {
        self.lock()?.tiers.insert(user_id, tier);
        Ok(())
    }

    /// Overwrite a user's usage counts (test setup helper).
    ///
    /// # Errors
    ///
    /// Returns an error if the store lock is poisoned.
    pub fn set_usage_counts(&self, user_id: UserId, counts: UsageCounts) -> Result<()> {
        self.lock()?.counts.insert(user_id, counts);
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| CreditError::Storage("memory store lock poisoned".into()))
    }
}

impl CreditStore for MemoryStore {
    fn read_balance(&self, user_id: &UserId) -> Result<Option<UserCreditBalance>> {
        Ok(self.lock()?.balances.get(user_id).cloned())
    }

    fn user_tier(&self, user_id: &UserId) -> Result<TierId> {
        Ok(self
            .lock()?
            .tiers
            .get(user_id)
            .copied()
            .unwrap_or(TierId::Free))
    }

    fn usage_counts(&self, user_id: &UserId) -> Result<UsageCounts> {
        Ok(self.lock()?.counts.get(user_id).copied().unwrap_or_default())
    }

    fn recorded_attempt(&self, attempt_id: &AttemptId) -> Result<Option<UserCreditBalance>> {
        Ok(self.lock()?.applied.get(attempt_id.as_str()).cloned())
    }

    fn apply_delta(
        &self,
        user_id: &UserId,
        delta: &BalanceDelta,
        attempt_id: &AttemptId,
    ) -> Result<DeltaOutcome> {
        let mut inner = self.lock()?;

        // Idempotency: a redelivered attempt returns the recorded outcome.
        // Previous equals the recorded balance so replays observe no change.
        if let Some(recorded) = inner.applied.get(attempt_id.as_str()) {
            return Ok(DeltaOutcome {
                previous_credits: recorded.available_credits,
                balance: recorded.clone(),
            });
        }

        let current = inner
            .balances
            .get(user_id)
            .ok_or_else(|| CreditError::BalanceNotFound {
                user_id: user_id.to_string(),
            })?;

        let previous_credits = current.available_credits;
        let next = current.apply(delta)?;
        inner.balances.insert(*user_id, next.clone());
        inner.applied.insert(attempt_id.as_str().to_string(), next.clone());

        if delta.is_debit() {
            let counts = inner.counts.entry(*user_id).or_default();
            counts.today += 1;
            counts.this_month += 1;
        }

        Ok(DeltaOutcome {
            previous_credits,
            balance: next,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grant_creates_then_tops_up() {
        let store = MemoryStore::new();
        let user_id = UserId::generate();

        let first = store.grant(user_id, 125).unwrap();
        assert_eq!(first.available_credits, 125);

        let second = store.grant(user_id, 250).unwrap();
        assert_eq!(second.available_credits, 375);
        assert_eq!(second.used_credits, 0);
    }

    #[test]
    fn apply_delta_requires_balance_record() {
        let store = MemoryStore::new();
        let err = store
            .apply_delta(
                &UserId::generate(),
                &BalanceDelta::debit(1),
                &AttemptId::generate(),
            )
            .unwrap_err();
        assert!(matches!(err, CreditError::BalanceNotFound { .. }));
    }

    #[test]
    fn conditional_decrement_rejects_overdraft() {
        let store = MemoryStore::new();
        let user_id = UserId::generate();
        store.grant(user_id, 2).unwrap();

        let err = store
            .apply_delta(&user_id, &BalanceDelta::debit(3), &AttemptId::generate())
            .unwrap_err();
        assert!(matches!(err, CreditError::LedgerConflict { .. }));

        // The failed debit left nothing behind.
        let balance = store.read_balance(&user_id).unwrap().unwrap();
        assert_eq!(balance.available_credits, 2);
        assert_eq!(balance.used_credits, 0);
    }

    #[test]
    fn duplicate_attempt_applies_once() {
        let store = MemoryStore::new();
        let user_id = UserId::generate();
        store.grant(user_id, 10).unwrap();

        let attempt = AttemptId::new("attempt-1").unwrap();
        let first = store
            .apply_delta(&user_id, &BalanceDelta::debit(4), &attempt)
            .unwrap();
        let second = store
            .apply_delta(&user_id, &BalanceDelta::debit(4), &attempt)
            .unwrap();

        assert_eq!(first.balance.available_credits, 6);
        assert_eq!(second.balance.available_credits, 6);
        assert_eq!(
            store.read_balance(&user_id).unwrap().unwrap().used_credits,
            4
        );
    }

    #[test]
    fn outcome_carries_pre_debit_balance() {
        let store = MemoryStore::new();
        let user_id = UserId::generate();
        store.grant(user_id, 10).unwrap();

        let attempt = AttemptId::new("attempt-prev").unwrap();
        let fresh = store
            .apply_delta(&user_id, &BalanceDelta::debit(4), &attempt)
            .unwrap();
        assert_eq!(fresh.previous_credits, 10);
        assert_eq!(fresh.balance.available_credits, 6);

        // A replay reports no change, so a crossing cannot fire twice.
        let replay = store
            .apply_delta(&user_id, &BalanceDelta::debit(4), &attempt)
            .unwrap();
        assert_eq!(replay.previous_credits, 6);
        assert_eq!(replay.balance.available_credits, 6);
    }

    #[test]
    fn recorded_attempt_lookup() {
        let store = MemoryStore::new();
        let user_id = UserId::generate();
        store.grant(user_id, 10).unwrap();

        let attempt = AttemptId::new("attempt-lookup").unwrap();
        assert!(store.recorded_attempt(&attempt).unwrap().is_none());

        store
            .apply_delta(&user_id, &BalanceDelta::debit(4), &attempt)
            .unwrap();

        let recorded = store.recorded_attempt(&attempt).unwrap().unwrap();
        assert_eq!(recorded.available_credits, 6);
    }

    #[test]
    fn debits_feed_usage_counts() {
        let store = MemoryStore::new();
        let user_id = UserId::generate();
        store.grant(user_id, 10).unwrap();

        store
            .apply_delta(&user_id, &BalanceDelta::debit(1), &AttemptId::generate())
            .unwrap();
        store
            .apply_delta(&user_id, &BalanceDelta::debit(1), &AttemptId::generate())
            .unwrap();

        let counts = store.usage_counts(&user_id).unwrap();
        assert_eq!(counts.today, 2);
        assert_eq!(counts.this_month, 2);
    }

    #[test]
    fn unknown_user_defaults_to_free_tier() {
        let store = MemoryStore::new();
        assert_eq!(store.user_tier(&UserId::generate()).unwrap(), TierId::Free);
    }
}
