//! s3-site-deploy - A command-line utility for deploying static sites to S3.
//!
//! Files matched by glob patterns are uploaded to a bucket, each gated by a
//! conditional probe so unchanged content is never re-sent. Deploys can gzip
//! selected files, upload directory-index aliases, invalidate a CloudFront
//! distribution, and prune remote objects that no longer exist locally.

pub mod cdn;
pub mod cli;
pub mod config;
pub mod deploy;
pub mod store;

pub use config::{CdnConfig, DeployConfig, GzipMode};
pub use deploy::{run_deploy, DeployReport, KeyOutcome, KeyStatus};
pub use store::{MemoryObjectStore, ObjectStore, S3ObjectStore, S3StoreConfig};
