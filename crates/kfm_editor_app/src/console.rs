// SPDX-License-Identifier: MIT OR Apache-2.0
//! Console bridge - forwards `tracing` events into the session transcript.
//!
//! Edit operations write their own progress notes, so only events at or above
//! the bridge's level are copied. Everything else stays in the fmt output.

use kfm_editor_core::Transcript;
use tracing::Level;

/// A `tracing_subscriber::Layer` that appends event messages to a [`Transcript`]
pub struct TranscriptBridge {
    transcript: Transcript,
    level: Level,
}

impl TranscriptBridge {
    /// Bridge events at `WARN` and above into `transcript`
    pub fn new(transcript: Transcript) -> Self {
        Self {
            transcript,
            level: Level::WARN,
        }
    }

    /// Change the least severe level that is forwarded
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }
}

impl<S> tracing_subscriber::Layer<S> for TranscriptBridge
where
    S: tracing::Subscriber,
{
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let level = *event.metadata().level();
        // `Level` orders TRACE as the greatest
        if level > self.level {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        if let Some(message) = visitor.into_message() {
            self.transcript.line(format!("[{level}] {message}"));
        }
    }
}

/// Visitor that extracts the `message` field from a tracing event.
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: Vec<String>,
}

impl MessageVisitor {
    fn push_field(&mut self, name: &str, value: String) {
        self.fields.push(format!("{name} = {value}"));
    }

    fn into_message(self) -> Option<String> {
        match (self.message.is_empty(), self.fields.is_empty()) {
            (true, true) => None,
            (true, false) => Some(self.fields.join(", ")),
            (false, true) => Some(self.message),
            (false, false) => Some(format!("{} ({})", self.message, self.fields.join(", "))),
        }
    }
}

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.push_field(field.name(), format!("{value:?}"));
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.push_field(field.name(), value.to_string());
        }
    }
}
