//! Command-line argument definitions.

use std::collections::HashMap;
use std::path::Path;

use clap::Parser;

use crate::config::{
    cache_control_header, CdnConfig, ConfigError, DeployConfig, GzipMode, ETAG_FROM_CONTENT,
    ETAG_METADATA_KEY,
};
use crate::store::ObjectAcl;

#[derive(Parser, Debug)]
#[command(
    name = "s3-site-deploy",
    version,
    about = "Deploy static site files to an S3 bucket"
)]
pub struct DeployArgs {
    /// Glob patterns selecting the files to deploy.
    #[arg(required = true, value_name = "PATTERN")]
    pub patterns: Vec<String>,

    /// Destination bucket.
    #[arg(long)]
    pub bucket: String,

    /// AWS region of the bucket.
    #[arg(short = 'r', long, default_value = "us-east-1")]
    pub region: String,

    /// Shared credentials profile to use.
    #[arg(long)]
    pub profile: Option<String>,

    /// Custom S3 endpoint (LocalStack, MinIO).
    #[arg(long, value_name = "URL")]
    pub endpoint_url: Option<String>,

    /// Directory stripped from file paths to form object keys.
    #[arg(long, default_value = "", value_name = "DIR")]
    pub cwd: String,

    /// Prefix prepended to every object key.
    #[arg(long, value_name = "PREFIX")]
    pub file_prefix: Option<String>,

    /// Gzip files before upload: bare to compress everything, or a
    /// comma-separated list of extensions.
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_name = "EXTENSIONS")]
    pub gzip: Option<String>,

    /// Cache-Control max-age in seconds.
    #[arg(long, value_name = "SECONDS")]
    pub cache: Option<u64>,

    /// Mark objects immutable in Cache-Control.
    #[arg(long)]
    pub immutable: bool,

    /// Attach an ETag metadata entry; the bare flag derives the value from
    /// the uploaded content.
    #[arg(long, num_args = 0..=1, default_missing_value = ETAG_FROM_CONTENT, value_name = "VALUE")]
    pub etag: Option<String>,

    /// Upload with a private ACL instead of public-read.
    #[arg(long)]
    pub private: bool,

    /// Resolve every file's content type from this extension instead of
    /// its path.
    #[arg(long, value_name = "EXTENSION")]
    pub ext: Option<String>,

    /// Request signature version; only v4 is supported.
    #[arg(long, value_name = "VERSION")]
    pub signature_version: Option<String>,

    /// Never overwrite a remote object that differs from the local file.
    #[arg(long)]
    pub prevent_updates: bool,

    /// After uploading, delete bucket objects with no local counterpart.
    #[arg(long)]
    pub delete_removed: bool,

    /// Also upload each HTML file under this directory-index name.
    #[arg(long, value_name = "NAME")]
    pub index: Option<String>,

    /// CloudFront distribution to invalidate after the deploy.
    #[arg(long, value_name = "DISTRIBUTION")]
    pub dist_id: Option<String>,

    /// Paths to invalidate; defaults to everything.
    #[arg(long, value_name = "PATH")]
    pub invalidate: Vec<String>,

    /// Print the run report as JSON.
    #[arg(long)]
    pub json: bool,

    /// Enable debug logging.
    #[arg(short, long)]
    pub verbose: bool,
}

impl DeployArgs {
    /// Resolve the arguments into an immutable deploy configuration.
    ///
    /// `invocation_dir` anchors the relative `--cwd` value.
    pub fn into_config(self, invocation_dir: &Path) -> Result<DeployConfig, ConfigError> {
        if let Some(version) = &self.signature_version {
            if version != "v4" {
                return Err(ConfigError::UnsupportedSignatureVersion(version.clone()));
            }
        }

        let mut metadata = HashMap::new();
        if let Some(etag) = self.etag {
            metadata.insert(ETAG_METADATA_KEY.to_string(), etag);
        }

        let cdn = self
            .dist_id
            .map(|dist_id| CdnConfig::new(dist_id, &self.invalidate));

        Ok(DeployConfig {
            bucket: self.bucket,
            region: self.region,
            profile: self.profile,
            endpoint_url: self.endpoint_url,
            base_dir: invocation_dir.join(&self.cwd),
            key_prefix: self.file_prefix.filter(|prefix| !prefix.is_empty()),
            gzip: GzipMode::parse(self.gzip.as_deref()),
            cache_control: cache_control_header(self.cache, self.immutable),
            acl: if self.private {
                ObjectAcl::Private
            } else {
                ObjectAcl::PublicRead
            },
            ext_override: self.ext,
            prevent_updates: self.prevent_updates,
            delete_removed: self.delete_removed,
            index_name: self.index.filter(|name| !name.is_empty()),
            metadata,
            cdn,
        })
    }
}
