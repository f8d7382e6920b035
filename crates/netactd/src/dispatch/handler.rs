//! Request handler that turns one request line into one response envelope.
//!
//! The handler implements the transport's `ExchangeHandler` seam: it decodes
//! the line, dispatches it, and renders the outcome. Every failure becomes a
//! response; nothing here can stop the listener.

use netact_config::StatusMode;
use tracing::info;

use crate::transport::ExchangeHandler;

use super::DISPATCH_TARGET;
use super::dispatcher::ActuationDispatcher;
use super::errors::DispatchError;
use super::request::decode_envelope;
use super::response::ResponseEnvelope;

/// Exchange handler backed by an [`ActuationDispatcher`].
#[derive(Debug, Clone, Copy)]
pub struct DispatchHandler<'a> {
    dispatcher: &'a ActuationDispatcher,
    mode: StatusMode,
}

impl<'a> DispatchHandler<'a> {
    /// Creates a handler that renders statuses according to `mode`.
    #[must_use]
    pub const fn new(dispatcher: &'a ActuationDispatcher, mode: StatusMode) -> Self {
        Self { dispatcher, mode }
    }

    fn render(
        &self,
        request: &[u8],
        outcome: &Result<serde_json::Value, DispatchError>,
    ) -> ResponseEnvelope {
        let request = String::from_utf8_lossy(request);
        let request = request.trim_end();
        match outcome {
            Ok(_) => info!(target: DISPATCH_TARGET, request, "request handled"),
            Err(error) => info!(
                target: DISPATCH_TARGET,
                request,
                kind = error.kind(),
                %error,
                "request encountered payload error"
            ),
        }
        ResponseEnvelope::from_outcome(outcome, self.mode)
    }
}

impl ExchangeHandler for DispatchHandler<'_> {
    fn respond(&self, request: &[u8]) -> ResponseEnvelope {
        let outcome =
            decode_envelope(request).and_then(|envelope| self.dispatcher.dispatch(&envelope));
        self.render(request, &outcome)
    }

    fn reject(&self, error: DispatchError) -> ResponseEnvelope {
        info!(
            target: DISPATCH_TARGET,
            kind = error.kind(),
            %error,
            "request rejected before dispatch"
        );
        ResponseEnvelope::failure(&error, self.mode)
    }
}
