//! Content-derived entity tags.

use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine as _;
use sha1::{Digest, Sha1};

/// Length of the digest segment: a 20-byte SHA-1 is 27 base64 chars unpadded.
const DIGEST_CHARS: usize = 27;

/// Generate a strong ETag from response content.
///
/// Format: `"<byte length, lowercase hex>-<base64 SHA-1, 27 chars>"`, quoted.
/// Depends only on the body bytes, so identical renders validate against
/// each other across instances.
pub fn generate_etag(content: impl AsRef<[u8]>) -> String {
    let bytes = content.as_ref();
    let digest = Sha1::digest(bytes);
    let mut encoded = STANDARD_NO_PAD.encode(digest);
    encoded.truncate(DIGEST_CHARS);
    format!("\"{:x}-{}\"", bytes.len(), encoded)
}
