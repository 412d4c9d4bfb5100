use crate::core::errors::SmartSplitError;
use crate::core::services::TripDetailsView;
use crate::infrastructure::cache::{Cache, cache_keys};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone, Default)]
pub struct InMemoryCache {
    cache: Arc<RwLock<HashMap<String, (TripDetailsView, DateTime<Utc>)>>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        InMemoryCache::default()
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get_trip_view(&self, trip_id: &str, viewer_id: &str) -> Result<Option<TripDetailsView>, SmartSplitError> {
        let cache = self.cache.read().await;
        let key = cache_keys::trip_view_key(trip_id, viewer_id);
        Ok(cache
            .get(&key)
            .filter(|(_, expiry)| *expiry > Utc::now())
            .map(|(view, _)| view.clone()))
    }

    async fn save_trip_view(
        &self,
        trip_id: &str,
        viewer_id: &str,
        view: &TripDetailsView,
        ttl: std::time::Duration,
    ) -> Result<(), SmartSplitError> {
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| SmartSplitError::CacheError(format!("Failed to convert TTL: {}", e)))?;
        let mut cache = self.cache.write().await;
        // opportunistic sweep of expired views
        let now = Utc::now();
        cache.retain(|_, (_, expiry)| *expiry > now);
        cache.insert(cache_keys::trip_view_key(trip_id, viewer_id), (view.clone(), now + ttl));
        Ok(())
    }

    async fn invalidate_trip(&self, trip_id: &str) -> Result<(), SmartSplitError> {
        let mut cache = self.cache.write().await;
        let prefix = cache_keys::trip_view_prefix(trip_id);
        cache.retain(|key, _| !key.starts_with(&prefix));
        Ok(())
    }
}
