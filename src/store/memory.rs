//! In-memory [`ObjectStore`] used by tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;
use std::time::SystemTime;

use async_trait::async_trait;
use bytes::Bytes;
use md5::{Digest, Md5};

use super::{ObjectStore, ProbeConditions, ProbeResult, Result, StoreError, UploadParams};

/// One stored object plus the upload fields tests want to inspect.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub body: Bytes,
    pub etag: String,
    pub last_modified: SystemTime,
    pub content_type: String,
    pub content_encoding: Option<String>,
    pub cache_control: Option<String>,
    pub metadata: HashMap<String, String>,
}

/// [`ObjectStore`] living entirely in memory.
///
/// Probes evaluate conditions the way S3 does: `if-none-match` first, then
/// `if-unmodified-since`. Keys named via [`MemoryObjectStore::poison`] fail
/// every probe and put, for exercising error paths.
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: RwLock<HashMap<String, StoredObject>>,
    poisoned: RwLock<HashSet<String>>,
    puts: AtomicUsize,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object as if it had been uploaded earlier.
    pub fn insert(&self, key: &str, body: &[u8], last_modified: SystemTime) {
        let object = StoredObject {
            body: Bytes::copy_from_slice(body),
            etag: hex_md5(body),
            last_modified,
            content_type: "application/octetstream".to_string(),
            content_encoding: None,
            cache_control: None,
            metadata: HashMap::new(),
        };
        self.objects
            .write()
            .unwrap()
            .insert(key.to_string(), object);
    }

    /// Make every probe and put against `key` fail.
    pub fn poison(&self, key: &str) {
        self.poisoned.write().unwrap().insert(key.to_string());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.read().unwrap().contains_key(key)
    }

    pub fn object(&self, key: &str) -> Option<StoredObject> {
        self.objects.read().unwrap().get(key).cloned()
    }

    /// Number of successful writes so far.
    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    fn is_poisoned(&self, key: &str) -> bool {
        self.poisoned.read().unwrap().contains(key)
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn probe(&self, key: &str, conditions: &ProbeConditions) -> Result<ProbeResult> {
        if self.is_poisoned(key) {
            return Err(StoreError::Probe {
                key: key.to_string(),
                code: "InternalError".to_string(),
                message: "injected probe failure".to_string(),
            });
        }

        let objects = self.objects.read().unwrap();
        let object = match objects.get(key) {
            Some(object) => object,
            None => return Ok(ProbeResult::NotFound),
        };

        if object.etag == conditions.if_none_match {
            return Ok(ProbeResult::NotModified);
        }
        if let Some(since) = conditions.if_unmodified_since {
            if object.last_modified > since {
                return Ok(ProbeResult::PreconditionFailed);
            }
        }
        Ok(ProbeResult::Exists {
            etag: Some(object.etag.clone()),
        })
    }

    async fn put(&self, params: UploadParams) -> Result<()> {
        if self.is_poisoned(&params.key) {
            return Err(StoreError::Write {
                key: params.key,
                code: "InternalError".to_string(),
                message: "injected write failure".to_string(),
            });
        }

        let etag = hex_md5(&params.body);
        let object = StoredObject {
            body: params.body,
            etag,
            last_modified: SystemTime::now(),
            content_type: params.content_type,
            content_encoding: params.content_encoding,
            cache_control: params.cache_control,
            metadata: params.metadata,
        };
        self.objects.write().unwrap().insert(params.key, object);
        self.puts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        // S3 lists lexicographically.
        let mut keys: Vec<String> = self.objects.read().unwrap().keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    async fn delete_keys(&self, keys: &[String]) -> Result<()> {
        let mut objects = self.objects.write().unwrap();
        for key in keys {
            objects.remove(key);
        }
        Ok(())
    }
}

fn hex_md5(data: &[u8]) -> String {
    hex::encode(Md5::digest(data))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn probe_for(body: &[u8]) -> ProbeConditions {
        ProbeConditions {
            if_none_match: hex_md5(body),
            if_unmodified_since: None,
        }
    }

    #[tokio::test]
    async fn test_probe_missing_key_is_not_found() {
        let store = MemoryObjectStore::new();
        let result = store.probe("site/a.js", &probe_for(b"x")).await.unwrap();
        assert_eq!(result, ProbeResult::NotFound);
    }

    #[tokio::test]
    async fn test_probe_matching_hash_is_not_modified() {
        let store = MemoryObjectStore::new();
        store.insert("site/a.js", b"content", SystemTime::now());

        let result = store
            .probe("site/a.js", &probe_for(b"content"))
            .await
            .unwrap();
        assert_eq!(result, ProbeResult::NotModified);
    }

    #[tokio::test]
    async fn test_probe_remote_newer_fails_precondition() {
        let store = MemoryObjectStore::new();
        let now = SystemTime::now();
        store.insert("site/a.js", b"remote", now);

        let conditions = ProbeConditions {
            if_none_match: hex_md5(b"local"),
            if_unmodified_since: Some(now - Duration::from_secs(60)),
        };
        let result = store.probe("site/a.js", &conditions).await.unwrap();
        assert_eq!(result, ProbeResult::PreconditionFailed);
    }

    #[tokio::test]
    async fn test_probe_differing_object_reports_exists_with_etag() {
        let store = MemoryObjectStore::new();
        let now = SystemTime::now();
        store.insert("site/a.js", b"remote", now);

        let conditions = ProbeConditions {
            if_none_match: hex_md5(b"local"),
            if_unmodified_since: Some(now + Duration::from_secs(60)),
        };
        let result = store.probe("site/a.js", &conditions).await.unwrap();
        assert_eq!(
            result,
            ProbeResult::Exists {
                etag: Some(hex_md5(b"remote")),
            }
        );
    }

    #[tokio::test]
    async fn test_put_records_upload_fields() {
        let store = MemoryObjectStore::new();
        let params = UploadParams {
            key: "site/a.js".to_string(),
            body: Bytes::from_static(b"body"),
            content_type: "application/javascript".to_string(),
            content_encoding: Some("gzip".to_string()),
            cache_control: Some("max-age=60".to_string()),
            acl: Default::default(),
            content_md5: String::new(),
            metadata: HashMap::from([("ETag".to_string(), "abc".to_string())]),
        };
        store.put(params).await.unwrap();

        let object = store.object("site/a.js").unwrap();
        assert_eq!(object.body.as_ref(), b"body");
        assert_eq!(object.etag, hex_md5(b"body"));
        assert_eq!(object.content_encoding.as_deref(), Some("gzip"));
        assert_eq!(object.cache_control.as_deref(), Some("max-age=60"));
        assert_eq!(object.metadata.get("ETag").map(String::as_str), Some("abc"));
        assert_eq!(store.put_count(), 1);
    }

    #[tokio::test]
    async fn test_list_keys_is_sorted() {
        let store = MemoryObjectStore::new();
        let now = SystemTime::now();
        store.insert("b.css", b"b", now);
        store.insert("a.js", b"a", now);
        store.insert("sub/c.html", b"c", now);

        let keys = store.list_keys().await.unwrap();
        assert_eq!(keys, vec!["a.js", "b.css", "sub/c.html"]);
    }

    #[tokio::test]
    async fn test_delete_keys_removes_objects() {
        let store = MemoryObjectStore::new();
        let now = SystemTime::now();
        store.insert("a.js", b"a", now);
        store.insert("b.css", b"b", now);

        store.delete_keys(&["a.js".to_string()]).await.unwrap();
        assert!(!store.contains("a.js"));
        assert!(store.contains("b.css"));
    }

    #[tokio::test]
    async fn test_poisoned_key_fails_probe_and_put() {
        let store = MemoryObjectStore::new();
        store.poison("bad.js");

        let probe = store.probe("bad.js", &probe_for(b"x")).await;
        assert!(matches!(probe, Err(StoreError::Probe { .. })));

        let params = UploadParams {
            key: "bad.js".to_string(),
            body: Bytes::from_static(b"x"),
            content_type: "application/javascript".to_string(),
            content_encoding: None,
            cache_control: None,
            acl: Default::default(),
            content_md5: String::new(),
            metadata: HashMap::new(),
        };
        let put = store.put(params).await;
        assert!(matches!(put, Err(StoreError::Write { .. })));
        assert_eq!(store.put_count(), 0);
    }
}
