//! S3 implementation of the [`ObjectStore`] trait.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::{ByteStream, DateTime};
use aws_sdk_s3::types::{Delete, ObjectCannedAcl, ObjectIdentifier};
use aws_sdk_s3::Client;

use super::{ObjectAcl, ObjectStore, ProbeConditions, ProbeResult, Result, StoreError, UploadParams};

/// S3 rejects delete batches larger than this.
const MAX_DELETE_BATCH: usize = 1000;

// =============================================================================
// Configuration
// =============================================================================

/// Connection settings for [`S3ObjectStore`].
#[derive(Debug, Clone)]
pub struct S3StoreConfig {
    pub bucket: String,
    pub region: Option<String>,
    pub profile: Option<String>,
    pub endpoint_url: Option<String>,
}

impl S3StoreConfig {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            region: None,
            profile: None,
            endpoint_url: None,
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    /// Point at a custom endpoint such as LocalStack or MinIO.
    pub fn with_endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = Some(endpoint_url.into());
        self
    }
}

// =============================================================================
// S3ObjectStore
// =============================================================================

/// [`ObjectStore`] backed by a real S3 bucket.
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
}

impl S3ObjectStore {
    /// Build a client from the ambient AWS environment plus any overrides.
    pub async fn connect(config: S3StoreConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = config.region.clone() {
            loader = loader.region(Region::new(region));
        }
        if let Some(profile) = &config.profile {
            loader = loader.profile_name(profile);
        }
        let shared = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = &config.endpoint_url {
            // Custom endpoints (LocalStack, MinIO) need path-style addressing.
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self {
            client: Client::from_conf(builder.build()),
            bucket: config.bucket,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn probe(&self, key: &str, conditions: &ProbeConditions) -> Result<ProbeResult> {
        let mut request = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .if_none_match(&conditions.if_none_match);
        if let Some(since) = conditions.if_unmodified_since {
            request = request.if_unmodified_since(DateTime::from(since));
        }

        match request.send().await {
            Ok(output) => Ok(ProbeResult::Exists {
                etag: output.e_tag().map(str::to_string),
            }),
            Err(err) => match response_status(&err) {
                Some(304) => Ok(ProbeResult::NotModified),
                Some(412) => Ok(ProbeResult::PreconditionFailed),
                Some(404) => Ok(ProbeResult::NotFound),
                _ => {
                    let (code, message) = error_summary(&err);
                    Err(StoreError::Probe {
                        key: key.to_string(),
                        code,
                        message,
                    })
                }
            },
        }
    }

    async fn put(&self, params: UploadParams) -> Result<()> {
        let key = params.key;
        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(params.body))
            .content_type(params.content_type)
            .content_md5(params.content_md5)
            .acl(canned_acl(params.acl))
            .set_content_encoding(params.content_encoding)
            .set_cache_control(params.cache_control);
        if !params.metadata.is_empty() {
            request = request.set_metadata(Some(params.metadata));
        }

        request.send().await.map_err(|err| {
            let (code, message) = error_summary(&err);
            StoreError::Write { key, code, message }
        })?;
        Ok(())
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut request = self.client.list_objects_v2().bucket(&self.bucket);
            if let Some(token) = continuation_token.take() {
                request = request.continuation_token(token);
            }

            let response = request.send().await.map_err(|err| {
                let (code, message) = error_summary(&err);
                StoreError::List { code, message }
            })?;

            for object in response.contents() {
                if let Some(key) = object.key() {
                    keys.push(key.to_string());
                }
            }

            if response.is_truncated() == Some(true) {
                continuation_token = response.next_continuation_token().map(str::to_string);
            } else {
                break;
            }
        }

        Ok(keys)
    }

    async fn delete_keys(&self, keys: &[String]) -> Result<()> {
        for chunk in keys.chunks(MAX_DELETE_BATCH) {
            let objects = chunk
                .iter()
                .map(|key| {
                    ObjectIdentifier::builder()
                        .key(key)
                        .build()
                        .map_err(|err| StoreError::InvalidParams(err.to_string()))
                })
                .collect::<Result<Vec<_>>>()?;
            let delete = Delete::builder()
                .set_objects(Some(objects))
                .build()
                .map_err(|err| StoreError::InvalidParams(err.to_string()))?;

            let response = self
                .client
                .delete_objects()
                .bucket(&self.bucket)
                .delete(delete)
                .send()
                .await
                .map_err(|err| {
                    let (code, message) = error_summary(&err);
                    StoreError::Delete { code, message }
                })?;

            // A 200 response can still carry per-key failures.
            if let Some(error) = response.errors().first() {
                return Err(StoreError::Delete {
                    code: error.code().unwrap_or("unknown").to_string(),
                    message: format!(
                        "{} (key '{}')",
                        error.message().unwrap_or("delete rejected"),
                        error.key().unwrap_or("?"),
                    ),
                });
            }
        }
        Ok(())
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn canned_acl(acl: ObjectAcl) -> ObjectCannedAcl {
    match acl {
        ObjectAcl::PublicRead => ObjectCannedAcl::PublicRead,
        ObjectAcl::Private => ObjectCannedAcl::Private,
    }
}

/// HTTP status of the response behind an SDK error, if one was received.
///
/// Conditional HEAD outcomes (304, 412) surface as errors without a modeled
/// service type, so classification has to look at the raw status line.
fn response_status<E>(err: &SdkError<E>) -> Option<u16> {
    match err {
        SdkError::ServiceError(context) => Some(context.raw().status().as_u16()),
        SdkError::ResponseError(context) => Some(context.raw().status().as_u16()),
        _ => None,
    }
}

fn error_summary<E>(err: &SdkError<E>) -> (String, String)
where
    E: ProvideErrorMetadata + std::fmt::Debug,
{
    let code = err.code().unwrap_or("unknown").to_string();
    let message = err
        .message()
        .map(str::to_string)
        .unwrap_or_else(|| format!("{err:?}"));
    (code, message)
}
