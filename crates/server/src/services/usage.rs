//! Usage audit.
//!
//! Every authorized lookup appends one row to the usage table. The append
//! runs on its own task: the handler never waits for it, and a failed write
//! is logged and dropped.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use ofertas_vin_core::Identity;
use serde::Serialize;

use crate::warehouse::WarehouseError;

/// One row of the usage table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageRow {
    pub email: String,
    pub name: String,
    pub usage_count: u32,
    /// Local calendar date, `YYYY-MM-DD`.
    pub date: String,
    /// Local time with offset, RFC 3339.
    pub timestamp: String,
}

impl UsageRow {
    /// Build the row for one use by `identity` at `now`, in `timezone`.
    #[must_use]
    pub fn new(identity: &Identity, now: DateTime<Utc>, timezone: Tz) -> Self {
        let local = now.with_timezone(&timezone);
        Self {
            email: identity.email.to_string(),
            name: identity.display_name().to_string(),
            usage_count: 1,
            date: local.format("%Y-%m-%d").to_string(),
            timestamp: local.to_rfc3339(),
        }
    }
}

/// Destination for usage rows.
#[async_trait]
pub trait UsageSink: Send + Sync {
    /// Append one row.
    ///
    /// # Errors
    ///
    /// Returns an error if the row could not be written.
    async fn append(&self, row: &UsageRow) -> Result<(), WarehouseError>;
}

/// Fire-and-forget usage recorder.
#[derive(Clone)]
pub struct UsageRecorder {
    sink: Arc<dyn UsageSink>,
    timezone: Tz,
}

impl UsageRecorder {
    #[must_use]
    pub fn new(sink: Arc<dyn UsageSink>, timezone: Tz) -> Self {
        Self { sink, timezone }
    }

    /// Record one use by `identity` without waiting for the write.
    ///
    /// Must be called from within a tokio runtime.
    pub fn record(&self, identity: &Identity) {
        let row = UsageRow::new(identity, Utc::now(), self.timezone);
        let sink = Arc::clone(&self.sink);

        tokio::spawn(async move {
            match sink.append(&row).await {
                Ok(()) => {
                    tracing::debug!(email = %row.email, date = %row.date, "Usage recorded");
                }
                Err(e) => {
                    tracing::warn!(
                        email = %row.email,
                        error = %e,
                        "Failed to record usage"
                    );
                }
            }
        });
    }
}
