//! Error types for the Glyph credit engine.

use crate::ids::IdError;

/// Result type for credit engine operations.
pub type Result<T> = std::result::Result<T, CreditError>;

/// Errors that can occur in credit engine operations.
///
/// Permission denials are not errors: they are expected outcomes carried by
/// [`GenerationPermission`](crate::gate::GenerationPermission). Everything
/// here is either a configuration fault or a ledger-level failure.
#[derive(Debug, thiserror::Error)]
pub enum CreditError {
    /// Model ID not present in the pricing catalog.
    #[error("unknown model: {model_id}")]
    UnknownModel {
        /// The model ID that was not found.
        model_id: String,
    },

    /// Tier ID not present in the pricing catalog.
    #[error("unknown tier: {tier_id}")]
    UnknownTier {
        /// The tier ID that was not found.
        tier_id: String,
    },

    /// Credit pack ID not present in the pricing catalog.
    #[error("unknown credit pack: {pack_id}")]
    UnknownPack {
        /// The pack ID that was not found.
        pack_id: String,
    },

    /// The catalog failed startup validation.
    #[error("invalid pricing catalog: {0}")]
    InvalidCatalog(String),

    /// A debit would drive the balance negative.
    ///
    /// Raised by the ledger predicate and by the store when its atomic
    /// conditional decrement detects a concurrent spend. Callers retry the
    /// permission check from a fresh read or surface insufficient credits.
    #[error("ledger conflict: balance={balance}, debit={debit}")]
    LedgerConflict {
        /// Balance at the time of the attempted debit.
        balance: i64,
        /// Credits the debit would have consumed.
        debit: i64,
    },

    /// No balance record exists for the user.
    #[error("balance not found: {user_id}")]
    BalanceNotFound {
        /// The user ID with no balance record.
        user_id: String,
    },

    /// Storage error from the persistence collaborator.
    #[error("storage error: {0}")]
    Storage(String),

    /// Invalid identifier.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] IdError),
}
