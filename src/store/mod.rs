//! Object storage abstraction for the deploy pipeline.
//!
//! The [`ObjectStore`] trait covers the four operations a deploy needs:
//! a conditional existence probe, an object write, a full key listing,
//! and a batch delete. [`S3ObjectStore`] talks to a real bucket;
//! [`MemoryObjectStore`] backs the tests.

use std::collections::HashMap;
use std::time::SystemTime;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

mod memory;
mod s3;

pub use memory::{MemoryObjectStore, StoredObject};
pub use s3::{S3ObjectStore, S3StoreConfig};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("existence probe failed for '{key}': {code}: {message}")]
    Probe {
        key: String,
        code: String,
        message: String,
    },

    #[error("upload failed for '{key}': {code}: {message}")]
    Write {
        key: String,
        code: String,
        message: String,
    },

    #[error("listing bucket contents failed: {code}: {message}")]
    List { code: String, message: String },

    #[error("batch delete failed: {code}: {message}")]
    Delete { code: String, message: String },

    #[error("invalid request parameters: {0}")]
    InvalidParams(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

// =============================================================================
// Request / Response Types
// =============================================================================

/// Conditions attached to an existence probe.
///
/// `if_none_match` always carries the local content hash (hex MD5, the form
/// S3 uses for plain-upload ETags). `if_unmodified_since` carries the local
/// file's mtime when overwrites are allowed, so a remote object touched more
/// recently than the local file reports back as a precondition failure
/// instead of a candidate for upload.
#[derive(Debug, Clone)]
pub struct ProbeConditions {
    pub if_none_match: String,
    pub if_unmodified_since: Option<SystemTime>,
}

/// What a conditional probe learned about the remote object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeResult {
    /// The object exists and matched neither condition.
    Exists { etag: Option<String> },
    /// The object matched `if_none_match`: remote content equals local.
    NotModified,
    /// The object failed `if_unmodified_since`: remote is newer than local.
    PreconditionFailed,
    /// No object under this key.
    NotFound,
}

/// Canned access level applied to uploaded objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObjectAcl {
    #[default]
    PublicRead,
    Private,
}

/// A fully resolved upload request.
#[derive(Debug, Clone)]
pub struct UploadParams {
    pub key: String,
    pub body: Bytes,
    pub content_type: String,
    pub content_encoding: Option<String>,
    pub cache_control: Option<String>,
    pub acl: ObjectAcl,
    /// Base64 MD5 of `body`, sent for server-side integrity checking.
    pub content_md5: String,
    pub metadata: HashMap<String, String>,
}

// =============================================================================
// ObjectStore Trait
// =============================================================================

/// Backend-agnostic interface to the destination bucket.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Probe a key with the given conditions.
    ///
    /// Condition mismatches are ordinary [`ProbeResult`] values, not errors;
    /// only transport and service failures surface as `Err`.
    async fn probe(&self, key: &str, conditions: &ProbeConditions) -> Result<ProbeResult>;

    /// Write one object.
    async fn put(&self, params: UploadParams) -> Result<()>;

    /// List every key in the bucket.
    async fn list_keys(&self) -> Result<Vec<String>>;

    /// Delete the given keys in bulk.
    async fn delete_keys(&self, keys: &[String]) -> Result<()>;
}
