//! `tracing` layer that feeds a hub
//!
//! `HubLayer` taps an existing `tracing` subscriber stack and turns
//! every event into an [`Entry`] submitted to the hub: the event's level
//! maps onto [`Level`], the `message` field becomes the message text,
//! all other fields are captured as JSON values, and the event's target
//! is recorded under the `prefix` field (so `Prefix(...)` expressions
//! select by emitting module).
//!
//! Delivery uses a non-blocking push straight into the hub mailbox — a
//! logging layer must never block the thread it fires on — so under a
//! saturated mailbox events are shed here rather than queued.
//!
//! The hub's own diagnostics are emitted under the `logtap::hub` target;
//! when installing this layer globally, filter that target out to avoid
//! the loop feeding itself.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value as Json;
use tokio::sync::mpsc;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

use crate::entry::{Entry, Level};
use crate::hub::Command;

#[cfg(test)]
#[path = "layer_test.rs"]
mod tests;

/// A `tracing_subscriber` layer forwarding events into a [`crate::hub::Hub`]
///
/// Obtained from [`crate::hub::Hub::layer`]; cheap to clone.
#[derive(Debug, Clone)]
pub struct HubLayer {
    tx: mpsc::Sender<Command>,
}

impl HubLayer {
    pub(crate) fn new(tx: mpsc::Sender<Command>) -> Self {
        Self { tx }
    }
}

impl<S: Subscriber> Layer<S> for HubLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();

        let mut visitor = EntryVisitor::default();
        event.record(&mut visitor);

        let mut fields = visitor.fields;
        fields
            .entry("prefix".to_string())
            .or_insert_with(|| Json::from(metadata.target()));

        let entry = Entry::new(
            Level::from(*metadata.level()),
            visitor.message.unwrap_or_default(),
        )
        .with_fields(fields);

        // Never block inside a logging callback; shed on a full mailbox.
        let _ = self.tx.try_send(Command::Publish(Arc::new(entry)));
    }
}

/// Collects event fields into `message` text plus a JSON field map
#[derive(Default)]
struct EntryVisitor {
    message: Option<String>,
    fields: BTreeMap<String, Json>,
}

impl Visit for EntryVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.fields.insert(field.name().to_string(), Json::from(value));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().to_string(), Json::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().to_string(), Json::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        let json = serde_json::Number::from_f64(value)
            .map(Json::Number)
            .unwrap_or(Json::Null);
        self.fields.insert(field.name().to_string(), json);
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().to_string(), Json::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let rendered = format!("{value:?}");
        if field.name() == "message" {
            self.message = Some(rendered);
        } else {
            self.fields.insert(field.name().to_string(), Json::from(rendered));
        }
    }
}
