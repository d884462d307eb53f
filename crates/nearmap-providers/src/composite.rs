//! Merges several place providers and a static overlay into one
//! [`PlaceProvider`].

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;

use nearmap_core::{Business, Coordinate};

use crate::error::ProviderError;
use crate::overlay::StaticOverlay;
use crate::places::PlaceProvider;

/// Queries every primary concurrently. The first primary is authoritative;
/// later primaries only contribute ids not already seen. Failing primaries
/// are skipped as long as at least one succeeds.
#[derive(Default, Clone)]
pub struct CompositeProvider {
    primaries: Vec<Arc<dyn PlaceProvider>>,
    overlay: Option<StaticOverlay>,
}

impl CompositeProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_primary(mut self, provider: Arc<dyn PlaceProvider>) -> Self {
        self.primaries.push(provider);
        self
    }

    #[must_use]
    pub fn with_overlay(mut self, overlay: StaticOverlay) -> Self {
        self.overlay = Some(overlay);
        self
    }

    /// Never fails: any provider error degrades to an empty list.
    pub async fn get_nearby_businesses(&self, coord: Coordinate, limit: usize) -> Vec<Business> {
        match self.nearby(coord, limit).await {
            Ok(businesses) => businesses,
            Err(e) => {
                tracing::warn!(error = %e, "nearby business lookup failed; returning no results");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl PlaceProvider for CompositeProvider {
    fn name(&self) -> &str {
        "composite"
    }

    async fn nearby(
        &self,
        coord: Coordinate,
        limit: usize,
    ) -> Result<Vec<Business>, ProviderError> {
        if limit == 0 || self.primaries.is_empty() {
            return Ok(Vec::new());
        }

        let outcomes = join_all(self.primaries.iter().map(|p| p.nearby(coord, limit))).await;

        let mut seen = HashSet::new();
        let mut merged = Vec::new();
        let mut last_error = None;
        let mut any_ok = false;

        for (provider, outcome) in self.primaries.iter().zip(outcomes) {
            match outcome {
                Ok(businesses) => {
                    any_ok = true;
                    tracing::debug!(
                        provider = provider.name(),
                        count = businesses.len(),
                        "primary returned"
                    );
                    for business in businesses {
                        if seen.insert(business.id.clone()) {
                            merged.push(business);
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(provider = provider.name(), error = %e, "primary failed");
                    last_error = Some(e);
                }
            }
        }

        if !any_ok {
            if let Some(e) = last_error {
                return Err(e);
            }
        }

        merged.truncate(limit);
        if let Some(overlay) = &self.overlay {
            merged = merged.into_iter().map(|b| overlay.apply(b)).collect();
        }
        Ok(merged)
    }
}
