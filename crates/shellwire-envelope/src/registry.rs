use serde_json::Value;
use tokio::sync::broadcast;
use tracing::trace;

use crate::category::{Category, CategoryValue};
use crate::config::ChannelConfig;

/// Category-keyed registry of broadcast channels.
///
/// Lives as long as the pipeline that owns it. Subscribing returns a
/// receiver; dropping the receiver unsubscribes. Publishing never blocks and
/// never fails when nobody is listening.
pub struct ChannelRegistry {
    senders: [broadcast::Sender<CategoryValue>; 6],
    config: ChannelConfig,
}

impl ChannelRegistry {
    /// Create a registry with default config.
    pub fn new() -> Self {
        Self::with_config(ChannelConfig::default())
    }

    /// Create a registry with explicit config.
    pub fn with_config(config: ChannelConfig) -> Self {
        let capacity = config.capacity.max(1);
        Self {
            senders: std::array::from_fn(|_| broadcast::channel(capacity).0),
            config,
        }
    }

    /// Subscribe to one category. Only events published after this call are seen.
    pub fn subscribe(&self, category: Category) -> broadcast::Receiver<CategoryValue> {
        self.sender(category).subscribe()
    }

    /// Publish a value; returns how many subscribers received it.
    pub fn publish(&self, category: Category, value: CategoryValue) -> usize {
        let delivered = self.sender(category).send(value).unwrap_or(0);
        trace!(%category, delivered, "category published");
        delivered
    }

    /// Publish diagnostic text on the `error` channel as `["<text>"]`.
    pub fn publish_diagnostic(&self, text: &str) -> usize {
        let value = CategoryValue::Decoded(Value::Array(vec![Value::String(text.to_string())]));
        self.publish(Category::Error, value)
    }

    /// Number of live subscribers on a category.
    pub fn subscriber_count(&self, category: Category) -> usize {
        self.sender(category).receiver_count()
    }

    /// Registry configuration.
    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    fn sender(&self, category: Category) -> &broadcast::Sender<CategoryValue> {
        &self.senders[category.index()]
    }
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ChannelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut dbg = f.debug_struct("ChannelRegistry");
        for category in Category::ALL {
            dbg.field(category.name(), &self.subscriber_count(category));
        }
        dbg.field("capacity", &self.config.capacity).finish()
    }
}
