//! CDN cache invalidation.
//!
//! Invalidation is submitted once per deploy, after the uploads settle. The
//! outcome never affects the deploy result: a failed invalidation is logged
//! and the run carries on.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_cloudfront::error::ProvideErrorMetadata;
use aws_sdk_cloudfront::types::{InvalidationBatch, Paths};
use aws_sdk_cloudfront::Client;
use chrono::Utc;
use thiserror::Error;
use tracing::debug;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Debug, Error)]
pub enum CdnError {
    #[error("invalid invalidation batch: {0}")]
    InvalidBatch(String),

    #[error("invalidation request failed: {code}: {message}")]
    Request { code: String, message: String },
}

// =============================================================================
// CdnInvalidation Trait
// =============================================================================

/// Submits cache invalidations for a set of paths.
#[async_trait]
pub trait CdnInvalidation: Send + Sync {
    async fn invalidate(&self, distribution_id: &str, paths: &[String]) -> Result<(), CdnError>;
}

// =============================================================================
// CloudFront
// =============================================================================

/// [`CdnInvalidation`] backed by CloudFront.
pub struct CloudFrontCdn {
    client: Client,
}

impl CloudFrontCdn {
    pub async fn connect(region: Option<&str>, profile: Option<&str>) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region.to_string()));
        }
        if let Some(profile) = profile {
            loader = loader.profile_name(profile);
        }
        let shared = loader.load().await;
        Self {
            client: Client::new(&shared),
        }
    }
}

#[async_trait]
impl CdnInvalidation for CloudFrontCdn {
    async fn invalidate(&self, distribution_id: &str, paths: &[String]) -> Result<(), CdnError> {
        debug!(distribution_id, ?paths, "submitting invalidation");

        let batch_paths = Paths::builder()
            .quantity(paths.len() as i32)
            .set_items(Some(paths.to_vec()))
            .build()
            .map_err(|err| CdnError::InvalidBatch(err.to_string()))?;
        // CloudFront deduplicates batches by caller reference, so every run
        // needs a fresh one.
        let batch = InvalidationBatch::builder()
            .paths(batch_paths)
            .caller_reference(Utc::now().timestamp_millis().to_string())
            .build()
            .map_err(|err| CdnError::InvalidBatch(err.to_string()))?;

        self.client
            .create_invalidation()
            .distribution_id(distribution_id)
            .invalidation_batch(batch)
            .send()
            .await
            .map_err(|err| CdnError::Request {
                code: err.code().unwrap_or("unknown").to_string(),
                message: err
                    .message()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("{err:?}")),
            })?;
        Ok(())
    }
}
