use crate::core::errors::SmartSplitError;
use crate::core::models::change_log::ChangeLogEntry;
use crate::infrastructure::logging::ChangeLogSink;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone, Default)]
pub struct InMemoryChangeLog {
    logs: Arc<RwLock<Vec<ChangeLogEntry>>>,
}

impl InMemoryChangeLog {
    pub fn new() -> Self {
        InMemoryChangeLog::default()
    }
}

#[async_trait]
impl ChangeLogSink for InMemoryChangeLog {
    async fn record(&self, entry: ChangeLogEntry) -> Result<(), SmartSplitError> {
        let mut logs = self.logs.write().await;
        logs.push(entry);
        Ok(())
    }

    async fn list_for_trip(&self, trip_id: &str) -> Result<Vec<ChangeLogEntry>, SmartSplitError> {
        let logs = self.logs.read().await;
        // appended in order, so reversing gives newest first even on equal timestamps
        Ok(logs.iter().rev().filter(|l| l.trip_id == trip_id).cloned().collect())
    }

    async fn get(&self, log_id: &str) -> Result<Option<ChangeLogEntry>, SmartSplitError> {
        let logs = self.logs.read().await;
        Ok(logs.iter().find(|l| l.id == log_id).cloned())
    }

    async fn remove(&self, log_id: &str) -> Result<Option<ChangeLogEntry>, SmartSplitError> {
        let mut logs = self.logs.write().await;
        let removed = logs
            .iter()
            .position(|l| l.id == log_id)
            .map(|index| logs.remove(index));
        Ok(removed)
    }

    async fn clear_trip(&self, trip_id: &str) -> Result<(), SmartSplitError> {
        let mut logs = self.logs.write().await;
        logs.retain(|l| l.trip_id != trip_id);
        Ok(())
    }
}
