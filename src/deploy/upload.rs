//! Upload parameter assembly and execution.

use crate::config::{DeployConfig, ETAG_FROM_CONTENT, ETAG_METADATA_KEY};
use crate::deploy::content_type::resolve_content_type;
use crate::deploy::fingerprint::Fingerprint;
use crate::deploy::reader::LocalFile;
use crate::store::{ObjectStore, StoreError, UploadParams};

/// Assemble the upload request for one (file, key) pair.
pub fn build_upload_params(
    file: &LocalFile,
    fingerprint: &Fingerprint,
    key: String,
    config: &DeployConfig,
) -> UploadParams {
    UploadParams {
        key,
        body: file.contents.clone(),
        content_type: resolve_content_type(&file.path, config.ext_override.as_deref()),
        content_encoding: file.gzipped.then(|| "gzip".to_string()),
        cache_control: config.cache_control.clone(),
        acl: config.acl,
        content_md5: fingerprint.base64.clone(),
        metadata: config.metadata.clone(),
    }
}

/// Replace the ETag metadata sentinel with the body's base64 MD5.
///
/// The sentinel can only be resolved here, after compression has produced
/// the final body bytes.
fn resolve_etag_metadata(mut params: UploadParams) -> UploadParams {
    let from_content = params
        .metadata
        .get(ETAG_METADATA_KEY)
        .map(|value| value == ETAG_FROM_CONTENT)
        .unwrap_or(false);
    if from_content {
        let md5 = params.content_md5.clone();
        params
            .metadata
            .insert(ETAG_METADATA_KEY.to_string(), md5);
    }
    params
}

/// Resolve metadata sentinels and write the object.
pub async fn execute_upload(
    store: &dyn ObjectStore,
    params: UploadParams,
) -> Result<(), StoreError> {
    store.put(resolve_etag_metadata(params)).await
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use bytes::Bytes;

    use super::*;
    use crate::store::{MemoryObjectStore, ObjectAcl};

    fn fixture_file(name: &str, contents: &[u8], gzipped: bool) -> LocalFile {
        LocalFile {
            path: format!("/site/{name}").into(),
            base: "/site".into(),
            contents: Bytes::copy_from_slice(contents),
            modified: SystemTime::now(),
            gzipped,
        }
    }

    #[test]
    fn test_build_params_for_plain_file() {
        let config = DeployConfig::new("bucket", "/site");
        let file = fixture_file("logo.png", b"png bytes", false);
        let fingerprint = Fingerprint::compute(&file.contents);

        let params = build_upload_params(&file, &fingerprint, "logo.png".to_string(), &config);
        assert_eq!(params.key, "logo.png");
        assert_eq!(params.content_type, "image/png");
        assert_eq!(params.content_encoding, None);
        assert_eq!(params.cache_control, None);
        assert_eq!(params.acl, ObjectAcl::PublicRead);
        assert_eq!(params.content_md5, fingerprint.base64);
        assert!(params.metadata.is_empty());
    }

    #[test]
    fn test_build_params_marks_gzipped_bodies() {
        let config = DeployConfig::new("bucket", "/site");
        let file = fixture_file("app.js", b"compressed bytes", true);
        let fingerprint = Fingerprint::compute(&file.contents);

        let params = build_upload_params(&file, &fingerprint, "app.js".to_string(), &config);
        assert_eq!(params.content_encoding.as_deref(), Some("gzip"));
    }

    #[test]
    fn test_build_params_carries_cache_control_and_acl() {
        let mut config = DeployConfig::new("bucket", "/site");
        config.cache_control = Some("max-age=3600".to_string());
        config.acl = ObjectAcl::Private;
        let file = fixture_file("page.html", b"<html></html>", false);
        let fingerprint = Fingerprint::compute(&file.contents);

        let params = build_upload_params(&file, &fingerprint, "page.html".to_string(), &config);
        assert_eq!(params.cache_control.as_deref(), Some("max-age=3600"));
        assert_eq!(params.acl, ObjectAcl::Private);
    }

    #[tokio::test]
    async fn test_etag_sentinel_resolves_to_content_md5() {
        let mut config = DeployConfig::new("bucket", "/site");
        config
            .metadata
            .insert(ETAG_METADATA_KEY.to_string(), ETAG_FROM_CONTENT.to_string());
        let file = fixture_file("app.js", b"body", false);
        let fingerprint = Fingerprint::compute(&file.contents);

        let store = MemoryObjectStore::new();
        let params = build_upload_params(&file, &fingerprint, "app.js".to_string(), &config);
        execute_upload(&store, params).await.unwrap();

        let object = store.object("app.js").unwrap();
        assert_eq!(
            object.metadata.get(ETAG_METADATA_KEY).map(String::as_str),
            Some(fingerprint.base64.as_str())
        );
    }

    #[tokio::test]
    async fn test_explicit_etag_value_is_kept() {
        let mut config = DeployConfig::new("bucket", "/site");
        config
            .metadata
            .insert(ETAG_METADATA_KEY.to_string(), "release-42".to_string());
        let file = fixture_file("app.js", b"body", false);
        let fingerprint = Fingerprint::compute(&file.contents);

        let store = MemoryObjectStore::new();
        let params = build_upload_params(&file, &fingerprint, "app.js".to_string(), &config);
        execute_upload(&store, params).await.unwrap();

        let object = store.object("app.js").unwrap();
        assert_eq!(
            object.metadata.get(ETAG_METADATA_KEY).map(String::as_str),
            Some("release-42")
        );
    }
}
