//! Post-checkout notifications.
//!
//! The checkout transaction calls a [`NotificationSink`] only after it has
//! committed. Sink errors are logged by the caller and never undo the order.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use thiserror::Error;

use crate::dto::orders::OrderWithItems;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification sink unavailable: {0}")]
    Unavailable(String),
}

/// Receiver of `order_created` events.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn order_created(&self, order: &OrderWithItems) -> Result<(), NotifyError>;
}

/// Default sink: writes the event to the tracing log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    async fn order_created(&self, order: &OrderWithItems) -> Result<(), NotifyError> {
        tracing::info!(
            order_id = order.order.id,
            customer_id = order.order.customer_id,
            items = order.items.len(),
            total = %order.total_price,
            "order_created"
        );
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemorySinkState {
    events: Vec<OrderWithItems>,
    fail: bool,
}

/// In-memory sink for tests. Records every delivered order and can be told to fail.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    state: Arc<Mutex<MemorySinkState>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail(&self, fail: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.fail = fail;
        }
    }

    /// Ids of the orders delivered so far, in delivery order.
    pub fn delivered(&self) -> Vec<i64> {
        self.state
            .lock()
            .map(|state| state.events.iter().map(|e| e.order.id).collect())
            .unwrap_or_default()
    }

    pub fn event_count(&self) -> usize {
        self.state.lock().map(|s| s.events.len()).unwrap_or(0)
    }
}

#[async_trait]
impl NotificationSink for MemorySink {
    async fn order_created(&self, order: &OrderWithItems) -> Result<(), NotifyError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| NotifyError::Unavailable("sink state poisoned".into()))?;
        if state.fail {
            return Err(NotifyError::Unavailable("configured to fail".into()));
        }
        state.events.push(order.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{entity::enums::PaymentStatus, models::Order};
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn order(id: i64) -> OrderWithItems {
        OrderWithItems {
            order: Order {
                id,
                placed_at: Utc::now(),
                payment_status: PaymentStatus::Pending,
                customer_id: 1,
            },
            items: Vec::new(),
            total_price: Decimal::ZERO,
        }
    }

    #[tokio::test]
    async fn memory_sink_records_deliveries() {
        let sink = MemorySink::new();
        sink.order_created(&order(1)).await.unwrap();
        sink.order_created(&order(2)).await.unwrap();

        assert_eq!(sink.delivered(), vec![1, 2]);
    }

    #[tokio::test]
    async fn memory_sink_can_fail() {
        let sink = MemorySink::new();
        sink.set_fail(true);

        assert!(sink.order_created(&order(1)).await.is_err());
        assert_eq!(sink.event_count(), 0);
    }

    #[tokio::test]
    async fn log_sink_accepts_everything() {
        assert!(LogSink.order_created(&order(3)).await.is_ok());
    }
}
