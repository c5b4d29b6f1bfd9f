//! Content fingerprinting.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use md5::{Digest, Md5};

/// MD5 of an object body in the two encodings the pipeline needs: hex for
/// comparing against S3 ETags, base64 for the `Content-MD5` header.
///
/// Computed over the bytes that will actually be uploaded, so for gzipped
/// files this is the hash of the compressed output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    pub hex: String,
    pub base64: String,
}

impl Fingerprint {
    pub fn compute(data: &[u8]) -> Self {
        let digest = Md5::digest(data);
        Self {
            hex: hex::encode(digest),
            base64: STANDARD.encode(digest),
        }
    }
}
