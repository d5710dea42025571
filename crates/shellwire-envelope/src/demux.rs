use std::sync::Arc;

use tracing::{debug, warn};

use crate::envelope::ResultEnvelope;
use crate::error::Result;
use crate::format::OutputFormat;
use crate::registry::ChannelRegistry;

/// Turns frame payloads into envelopes and fans categories out to observers.
///
/// Reports parse failures; deciding what happens next is up to the caller.
#[derive(Debug, Clone)]
pub struct Demultiplexer {
    channels: Arc<ChannelRegistry>,
}

impl Demultiplexer {
    pub fn new(channels: Arc<ChannelRegistry>) -> Self {
        Self { channels }
    }

    /// The registry categories are published on.
    pub fn channels(&self) -> &Arc<ChannelRegistry> {
        &self.channels
    }

    /// Parse one frame payload and publish every non-empty category.
    ///
    /// Publication happens before this returns, so broadcast observers see a
    /// category no later than whoever awaits the returned envelope.
    pub fn demultiplex(&self, payload: &[u8], requested: OutputFormat) -> Result<ResultEnvelope> {
        let envelope = match ResultEnvelope::parse(payload, requested) {
            Ok(envelope) => envelope,
            Err(err) => {
                warn!(error = %err, payload_size = payload.len(), "frame payload rejected");
                return Err(err);
            }
        };

        for (category, value) in envelope.non_empty() {
            self.channels.publish(category, value.clone());
        }
        debug!(
            format = %requested,
            published = envelope.non_empty().count(),
            "frame demultiplexed"
        );
        Ok(envelope)
    }

    /// Forward diagnostic-stream text to the `error` channel.
    ///
    /// Trailing line breaks are trimmed; blank text is dropped.
    pub fn diagnostic(&self, text: &str) {
        let text = text.trim_end_matches(['\r', '\n']);
        if text.trim().is_empty() {
            return;
        }
        debug!(len = text.len(), "diagnostic text received");
        self.channels.publish_diagnostic(text);
    }
}
