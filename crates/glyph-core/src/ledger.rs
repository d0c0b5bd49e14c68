//! Ledger mutations: balance deltas and the low-balance crossing check.
//!
//! The functions here are the pure rules the persistence layer must enforce
//! inside its atomic conditional update. [`UserCreditBalance::apply`] is the
//! precondition: a debit that would drive the balance negative fails with
//! `LedgerConflict`, and the store must evaluate the same predicate inside
//! its transaction so concurrent requests cannot double-spend past zero.

use serde::{Deserialize, Serialize};

use crate::balance::UserCreditBalance;
use crate::error::{CreditError, Result};
use crate::ids::UserId;

/// A pending change to a user's balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceDelta {
    /// Change to `available_credits`. Negative for a debit.
    pub credits_delta: i64,

    /// Change to `used_credits`. Never negative.
    pub used_delta: i64,
}

impl BalanceDelta {
    /// Delta for a permitted generation consuming `credits` credits.
    #[must_use]
    pub const fn debit(credits: i64) -> Self {
        Self {
            credits_delta: -credits,
            used_delta: credits,
        }
    }

    /// Delta for a credit grant (purchase or free allotment).
    #[must_use]
    pub const fn grant(credits: i64) -> Self {
        Self {
            credits_delta: credits,
            used_delta: 0,
        }
    }

    /// Whether this delta removes credits.
    #[must_use]
    pub const fn is_debit(&self) -> bool {
        self.credits_delta < 0
    }
}

impl UserCreditBalance {
    /// Apply a delta, producing the successor snapshot.
    ///
    /// This is the all-or-nothing rule for the store's atomic operation:
    /// either the whole delta applies or nothing does.
    ///
    /// # Errors
    ///
    /// Returns `CreditError::LedgerConflict` if the resulting available
    /// balance would be negative.
    pub fn apply(&self, delta: &BalanceDelta) -> Result<UserCreditBalance> {
        let available = self.available_credits + delta.credits_delta;
        if available < 0 {
            return Err(CreditError::LedgerConflict {
                balance: self.available_credits,
                debit: -delta.credits_delta,
            });
        }

        Ok(UserCreditBalance {
            user_id: self.user_id,
            available_credits: available,
            used_credits: self.used_credits + delta.used_delta,
            is_active: self.is_active,
            created_at: self.created_at,
        })
    }
}

/// A one-time event fired when a balance first drops below the threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LowBalanceNotice {
    /// The affected user.
    pub user_id: UserId,

    /// Credits remaining after the debit.
    pub remaining_credits: i64,

    /// The configured threshold that was crossed.
    pub threshold: i64,
}

/// Check whether a debit crossed the low-balance threshold.
///
/// Fires only on the first crossing: the previous balance must have been at
/// or above the threshold and the new balance below it. Repeated debits
/// under the threshold stay silent.
#[must_use]
pub fn low_balance_notice(
    user_id: UserId,
    previous_credits: i64,
    new_credits: i64,
    threshold: i64,
) -> Option<LowBalanceNotice> {
    if previous_credits >= threshold && new_credits < threshold {
        Some(LowBalanceNotice {
            user_id,
            remaining_credits: new_credits,
            threshold,
        })
    } else {
        None
    }
}
