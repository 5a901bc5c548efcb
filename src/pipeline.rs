use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use sha2::{Digest, Sha256};

use crate::cache::Cache;
use crate::classify::Directive;
use crate::files::FileStore;
use crate::transform::{decode_image, encode_image, resize_image, resolve_dimensions};
use crate::{ResizeKitError, Result};
use image::GenericImageView;

/// A finished rendition ready to be written to the response.
pub struct Rendered {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub cache_key: String,
    pub from_cache: bool,
}

/// Derive the fixed-width cache key for (location, modification time,
/// directive).
///
/// SHA-256 over a canonical string of the three components: same file, same
/// mtime, same directive always map to the same key, and any difference in
/// one of them changes it. A collision would silently serve the wrong
/// rendition, so the hash is kept at cryptographic width.
pub fn cache_key(location: &Path, modified: SystemTime, directive: &Directive) -> String {
    let stamp = modified
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let canonical = format!(
        "{}|{}|{}x{}|{}",
        location.display(),
        stamp,
        directive.width,
        directive.height,
        directive.format
    );
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}

/// Produce the encoded bytes for a resize request, from cache when possible.
///
/// On a hit the codec is never touched; repeated requests for an unchanged
/// file with the same parameters cost one cache lookup. On a miss the file
/// is read, decoded, resized to the resolved dimensions, encoded, and the
/// result is stored under the key before being returned.
///
/// Every failure (read, decode, resize, encode, cache fault) surfaces as a
/// single pipeline error for the dispatch layer to degrade on.
pub async fn render(
    cache: &dyn Cache,
    store: &FileStore,
    location: &Path,
    modified: SystemTime,
    directive: &Directive,
    jpeg_quality: u8,
) -> Result<Rendered> {
    let key = cache_key(location, modified, directive);
    let content_type = directive.format.content_type();

    if let Some(bytes) = cache.get(&key).await.map_err(ResizeKitError::CacheError)? {
        tracing::info!("Cache hit for key={}", key);
        return Ok(Rendered { bytes, content_type, cache_key: key, from_cache: true });
    }

    tracing::info!("Cache miss for key={}, rendering {}", key, location.display());

    let bytes = store.read(location).await?;
    let img = decode_image(&bytes)?;

    let (width, height) = resolve_dimensions(img.dimensions(), directive.width, directive.height);
    let resized = resize_image(img, width, height)?;

    let encoded = encode_image(&resized, directive.format, jpeg_quality)?;

    cache
        .set(&key, encoded.clone())
        .await
        .map_err(ResizeKitError::CacheError)?;

    Ok(Rendered { bytes: encoded, content_type, cache_key: key, from_cache: false })
}
