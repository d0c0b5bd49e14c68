//! Notification dispatch boundary.

use glyph_core::LowBalanceNotice;

/// Receives low-balance events after a successful debit crosses the
/// configured threshold. Fire-and-forget: delivery failures are the
/// implementation's problem, never the debit's.
pub trait Notifier: Send + Sync {
    /// Handle a low-balance crossing.
    fn low_balance(&self, notice: &LowBalanceNotice);
}

/// A notifier that drops every event. The default when no delivery channel
/// is wired up.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn low_balance(&self, notice: &LowBalanceNotice) {
        tracing::debug!(
            user_id = %notice.user_id,
            remaining = %notice.remaining_credits,
            threshold = %notice.threshold,
            "Low balance notice dropped (no notifier configured)"
        );
    }
}
