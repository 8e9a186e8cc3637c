//! logtap - real-time log-event distribution and filtering
//!
//! A continuous stream of structured log entries is broadcast to any
//! number of independent subscribers, each defined by a boolean filter
//! expression evaluated against every entry, with automatic catch-up
//! replay from a bounded in-memory history when a subscriber joins.
//!
//! # Architecture
//!
//! ```text
//! tracing events ──→ HubLayer ─┐
//!                              ▼
//! producers ──────────→ Hub::submit()
//!                              │
//!                       dispatch loop ──→ History (last 64 entries)
//!                              │
//!                    non-blocking fan-out
//!                    ┌─────────┼─────────┐
//!                    ▼         ▼         ▼
//!                Selector  Selector  Selector ──→ drain() per consumer
//!                (predicate + bounded queue each)
//! ```
//!
//! A subscriber creates a [`Selector`] with a filter expression (the
//! empty expression selects everything), which registers with the hub
//! and synchronously receives the replay window, then polls
//! [`Selector::drain`] for matching entries. Filters are hot-swappable
//! via [`Selector::set_expression`]; see [`mod@predicate`] for the
//! expression grammar.

pub mod entry;
pub mod error;
pub mod history;
pub mod hub;
pub mod layer;
pub mod predicate;
pub mod selector;
pub mod value;

pub use entry::{Entry, Level};
pub use error::{HubError, ParseError};
pub use history::History;
pub use hub::Hub;
pub use layer::HubLayer;
pub use predicate::{Predicate, ValueExpr};
pub use selector::Selector;
pub use value::Value;

/// Result type for hub and selector operations
pub type Result<T> = std::result::Result<T, HubError>;
