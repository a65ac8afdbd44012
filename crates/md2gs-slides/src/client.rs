//! Presentation service seam.

use async_trait::async_trait;

use crate::error::Result;
use crate::wire::{BatchUpdateResponse, Presentation, Request};

/// Remote presentation service.
///
/// Implementations own transport concerns (authentication, timeouts) and
/// map failures to [`SlidesError::Remote`](crate::SlidesError::Remote).
#[async_trait]
pub trait PresentationClient: Send + Sync {
    /// Fetch a full snapshot of the presentation
    async fn get(&self, presentation_id: &str) -> Result<Presentation>;

    /// Apply `requests` atomically
    async fn batch_update(
        &self,
        presentation_id: &str,
        requests: Vec<Request>,
    ) -> Result<BatchUpdateResponse>;
}
