pub mod in_memory;

use crate::core::errors::SmartSplitError;
use crate::core::models::change_log::ChangeLogEntry;
use async_trait::async_trait;

/// Where change-log entries go. The service builds entries; the sink only keeps them.
#[async_trait]
pub trait ChangeLogSink: Send + Sync {
    async fn record(&self, entry: ChangeLogEntry) -> Result<(), SmartSplitError>;
    /// Newest first.
    async fn list_for_trip(&self, trip_id: &str) -> Result<Vec<ChangeLogEntry>, SmartSplitError>;
    async fn get(&self, log_id: &str) -> Result<Option<ChangeLogEntry>, SmartSplitError>;
    async fn remove(&self, log_id: &str) -> Result<Option<ChangeLogEntry>, SmartSplitError>;
    async fn clear_trip(&self, trip_id: &str) -> Result<(), SmartSplitError>;
}
