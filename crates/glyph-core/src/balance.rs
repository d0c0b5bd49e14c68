//! User credit balance snapshots.
//!
//! Balances are owned by the persistence layer. The engine only ever sees a
//! snapshot passed in and hands a delta back out; it never mutates a shared
//! in-memory copy across concurrent requests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::UserId;

/// A snapshot of a user's credit balance.
///
/// Records are never hard-deleted; a new active record supersedes the old
/// one and the most recent `created_at` wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCreditBalance {
    /// The user who owns the balance.
    pub user_id: UserId,

    /// Credits available to spend. Non-negative after any successful debit.
    pub available_credits: i64,

    /// Lifetime credits spent. Monotonically non-decreasing.
    pub used_credits: i64,

    /// Whether this is the active record for the user.
    pub is_active: bool,

    /// When this record was created.
    pub created_at: DateTime<Utc>,
}

impl UserCreditBalance {
    /// Create a fresh balance record from an initial credit grant.
    #[must_use]
    pub fn from_grant(user_id: UserId, credits: i64) -> Self {
        Self {
            user_id,
            available_credits: credits.max(0),
            used_credits: 0,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    /// Check whether the balance covers a required credit amount.
    #[must_use]
    pub fn has_sufficient_credits(&self, required: i64) -> bool {
        self.available_credits >= required
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grant_starts_unused_and_active() {
        let balance = UserCreditBalance::from_grant(UserId::generate(), 125);
        assert_eq!(balance.available_credits, 125);
        assert_eq!(balance.used_credits, 0);
        assert!(balance.is_active);
    }

    #[test]
    fn negative_grant_clamps_to_zero() {
        let balance = UserCreditBalance::from_grant(UserId::generate(), -10);
        assert_eq!(balance.available_credits, 0);
    }

    #[test]
    fn sufficiency_check() {
        let balance = UserCreditBalance::from_grant(UserId::generate(), 10);
        assert!(balance.has_sufficient_credits(10));
        assert!(balance.has_sufficient_credits(4));
        assert!(!balance.has_sufficient_credits(11));
    }
}
