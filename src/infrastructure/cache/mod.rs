pub mod cache_keys;
pub mod in_memory;

use crate::core::errors::SmartSplitError;
use crate::core::services::TripDetailsView;
use async_trait::async_trait;

/// Read-through cache for computed trip views. Never authoritative.
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get_trip_view(&self, trip_id: &str, viewer_id: &str) -> Result<Option<TripDetailsView>, SmartSplitError>;
    async fn save_trip_view(
        &self,
        trip_id: &str,
        viewer_id: &str,
        view: &TripDetailsView,
        ttl: std::time::Duration,
    ) -> Result<(), SmartSplitError>;
    /// Drops every cached view of the trip, for all viewers.
    async fn invalidate_trip(&self, trip_id: &str) -> Result<(), SmartSplitError>;
}
