//! Caller-facing facade for the Glyph credit engine.
//!
//! Route handlers consume this crate in-process. It wires the pure rules
//! from `glyph-core` to two collaborator boundaries:
//!
//! - [`CreditStore`]: persistence, responsible for fresh snapshots and for
//!   applying balance deltas atomically (conditional decrement plus
//!   idempotency on the attempt ID);
//! - [`Notifier`]: fire-and-forget delivery of low-balance events.
//!
//! The permission check and the debit are each all-or-nothing. The check
//! itself never reserves credits; only [`CreditEngine::record_generation`]
//! spends them, and a store-level conflict surfaces as an insufficient
//! credits denial for the caller to translate.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod engine;
pub mod notify;
pub mod store;

pub use config::{load_catalog_file, EngineConfig, DEFAULT_LOW_BALANCE_THRESHOLD};
pub use engine::{CreditEngine, EngineError, GenerationReceipt, Result};
pub use notify::{Notifier, NullNotifier};
pub use store::{CreditStore, DeltaOutcome, MemoryStore};
