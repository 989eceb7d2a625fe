//! # Request Handler
//!
//! Drives one inbound message through the print pipeline:
//!
//! ```text
//! Received → Authorizing ─┬→ Denied                       (reply: private bot)
//!                         └→ Formatting ─┬→ Skipped       (empty body, silent)
//!                                        └→ Wrapping → Rendering → Dispatching → Done
//! ```
//!
//! There are no retries and no backward transitions. The handler holds only
//! read-only state, so one instance is shared by every message task.

use std::fmt;

use crate::access::AccessPolicy;
use crate::dispatch::{DispatchOutcome, PrintDispatcher};
use crate::format::{FormatError, format_document};
use crate::message::Message;
use crate::render::{Canvas, ImageRenderer, RenderSpec};

/// Reply to an authorized `/start`.
pub const WELCOME_TEXT: &str = "Welcome!";

/// Reply to anyone not on the allow list.
pub const PRIVATE_TEXT: &str = "Sorry, this bot is private.";

/// Pipeline stages a message passes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Authorizing,
    Formatting,
    Wrapping,
    Rendering,
    Dispatching,
    Done,
    Denied,
    Skipped,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// How a message left the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerOutcome {
    /// Sender is not allowed to print.
    Denied,
    /// Message had no text; nothing was rendered.
    Skipped,
    /// Canvas was handed to the dispatcher.
    Done(DispatchOutcome),
}

impl HandlerOutcome {
    /// Terminal stage this outcome corresponds to.
    pub fn stage(&self) -> Stage {
        match self {
            HandlerOutcome::Denied => Stage::Denied,
            HandlerOutcome::Skipped => Stage::Skipped,
            HandlerOutcome::Done(_) => Stage::Done,
        }
    }

    /// Text to send back to the sender, if any.
    ///
    /// Printing is fire-and-forget, so only a denial produces a reply.
    pub fn reply(&self) -> Option<&'static str> {
        match self {
            HandlerOutcome::Denied => Some(PRIVATE_TEXT),
            HandlerOutcome::Skipped | HandlerOutcome::Done(_) => None,
        }
    }
}

/// Orchestrates access check, formatting, rendering and dispatch.
#[derive(Debug, Clone)]
pub struct RequestHandler {
    policy: AccessPolicy,
    renderer: ImageRenderer,
    dispatcher: PrintDispatcher,
}

impl RequestHandler {
    pub fn new(policy: AccessPolicy, spec: RenderSpec, dispatcher: PrintDispatcher) -> Self {
        Self {
            policy,
            renderer: ImageRenderer::new(spec),
            dispatcher,
        }
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    pub fn spec(&self) -> &RenderSpec {
        self.renderer.spec()
    }

    /// Answer a `/start` command.
    pub fn handle_start(&self, message: &Message) -> &'static str {
        tracing::info!("User {}: /start", message.sender_id);
        if self.policy.is_authorized(message.sender_id) {
            WELCOME_TEXT
        } else {
            tracing::warn!("Denied: {} ({})", message.sender_id, message.display_name());
            PRIVATE_TEXT
        }
    }

    /// Run a message through the pipeline.
    ///
    /// Blocks on rendering and file I/O; call it from a blocking-capable
    /// context inside a Tokio runtime.
    pub fn handle_message(&self, message: &Message) -> HandlerOutcome {
        let sender = message.sender_id;
        tracing::info!("User {}: message", sender);
        trace_stage(sender, Stage::Received);

        trace_stage(sender, Stage::Authorizing);
        if !self.policy.is_authorized(sender) {
            tracing::warn!("Denied: {} ({})", sender, message.display_name());
            return HandlerOutcome::Denied;
        }

        let canvas = match self.render(message) {
            Ok(canvas) => canvas,
            Err(FormatError::MissingBody) => {
                tracing::debug!(sender, "Message has no text, skipping");
                return HandlerOutcome::Skipped;
            }
        };

        trace_stage(sender, Stage::Dispatching);
        let keep_file = self.renderer.spec().keep_temp_files;
        let outcome = self.dispatcher.dispatch(&canvas, keep_file);
        if !outcome.is_dispatched() {
            tracing::warn!(sender, ?outcome, "Print dispatch did not start the printer");
        }

        trace_stage(sender, Stage::Done);
        HandlerOutcome::Done(outcome)
    }

    /// Format, wrap and render a message without any access check or dispatch.
    pub fn render(&self, message: &Message) -> Result<Canvas, FormatError> {
        let sender = message.sender_id;
        let spec = self.renderer.spec();

        trace_stage(sender, Stage::Formatting);
        let text = format_document(message, spec.timezone)?;
        tracing::info!("Processing message from {}", message.display_name());

        trace_stage(sender, Stage::Wrapping);
        let document = spec.wrap(&text);
        tracing::debug!(sender, lines = document.len(), "Wrapped message");

        trace_stage(sender, Stage::Rendering);
        Ok(self.renderer.render(&document))
    }
}

fn trace_stage(sender: i64, stage: Stage) {
    tracing::trace!(sender, %stage, "Pipeline stage");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::PrinterCommand;
    use crate::render::font::BlockTypeface;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn handler(dir: &std::path::Path, keep: bool) -> RequestHandler {
        let mut spec = RenderSpec::new(Arc::new(BlockTypeface::new(10, 20)));
        spec.keep_temp_files = keep;
        let dispatcher =
            PrintDispatcher::new(PrinterCommand::parse("true").unwrap()).with_temp_dir(dir);
        RequestHandler::new(AccessPolicy::new([123, 456]), spec, dispatcher)
    }

    fn message(sender: i64, text: &str) -> Message {
        Message::new(sender, Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(), text)
            .with_username("alice")
    }

    #[test]
    fn test_start_greets_authorized_sender() {
        let dir = tempfile::tempdir().unwrap();
        let handler = handler(dir.path(), false);
        assert_eq!(handler.handle_start(&message(123, "/start")), WELCOME_TEXT);
        assert_eq!(handler.handle_start(&message(999, "/start")), PRIVATE_TEXT);
    }

    #[test]
    fn test_unauthorized_sender_is_denied() {
        let dir = tempfile::tempdir().unwrap();
        let handler = handler(dir.path(), true);

        let outcome = handler.handle_message(&message(999, "print me"));
        assert_eq!(outcome, HandlerOutcome::Denied);
        assert_eq!(outcome.stage(), Stage::Denied);
        assert_eq!(outcome.reply(), Some(PRIVATE_TEXT));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_empty_body_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let handler = handler(dir.path(), true);

        let mut msg = message(123, "");
        assert_eq!(handler.handle_message(&msg), HandlerOutcome::Skipped);
        msg.text = None;
        let outcome = handler.handle_message(&msg);
        assert_eq!(outcome.stage(), Stage::Skipped);
        assert_eq!(outcome.reply(), None);
        // Nothing reached the dispatcher
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_authorized_message_is_dispatched() {
        let dir = tempfile::tempdir().unwrap();
        let handler = handler(dir.path(), true);

        let outcome = handler.handle_message(&message(456, "Hello world"));
        let HandlerOutcome::Done(DispatchOutcome::Dispatched { image, .. }) = &outcome else {
            panic!("expected dispatch, got {outcome:?}");
        };
        assert_eq!(outcome.reply(), None);

        // Header (timestamp, name, blank) + body = 4 lines
        let decoded = image::open(image).unwrap().to_luma8();
        assert_eq!(decoded.dimensions(), (384, 28 * 4 + 16));
    }

    #[tokio::test]
    async fn test_retention_follows_render_spec() {
        for keep in [true, false] {
            let dir = tempfile::tempdir().unwrap();
            let handler = handler(dir.path(), keep);

            let outcome = handler.handle_message(&message(123, "hi"));
            let HandlerOutcome::Done(DispatchOutcome::Dispatched { image, .. }) = &outcome else {
                panic!("expected dispatch, got {outcome:?}");
            };
            assert_eq!(image.exists(), keep, "keep_temp_files = {keep}");
            assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), keep as usize);
        }
    }

    #[test]
    fn test_render_line_count() {
        let dir = tempfile::tempdir().unwrap();
        let handler = handler(dir.path(), false);

        let canvas = handler.render(&message(123, &"word ".repeat(40))).unwrap();
        // 3 header lines + 6 body lines
        assert_eq!(canvas.height(), handler.spec().canvas_height(9));
    }
}
