use std::path::{Path, PathBuf};
use std::time::Duration;

use resizekit::cache::MemoryCache;
use resizekit::classify::Directive;
use resizekit::config::OutputFormat;
use resizekit::files::FileStore;
use resizekit::pipeline::{cache_key, render};
use tempfile::TempDir;

fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let img = image::DynamicImage::new_rgb8(width, height);
    let mut bytes = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

#[tokio::test]
async fn second_render_is_served_from_cache_without_codec_work() {
    let origin = TempDir::new().unwrap();
    write_png(origin.path(), "photo.png", 64, 64);

    let store = FileStore::new(origin.path().to_path_buf());
    let cache = MemoryCache::new(16);

    let location = store.resolve("/photo.png").unwrap();
    let modified = store.last_modified(&location).await.unwrap();
    let directive = Directive { width: 32, height: 0, format: OutputFormat::Png };

    let first = render(&cache, &store, &location, modified, &directive, 80)
        .await
        .unwrap();
    assert!(!first.from_cache);
    assert_eq!(first.content_type, "image/png");

    // With the source gone, any attempt to read or decode would fail; the
    // second call can only succeed by returning the cached bytes.
    std::fs::remove_file(&location).unwrap();

    let second = render(&cache, &store, &location, modified, &directive, 80)
        .await
        .unwrap();
    assert!(second.from_cache);
    assert_eq!(second.bytes, first.bytes);
    assert_eq!(second.cache_key, first.cache_key);
}

#[tokio::test]
async fn modification_time_change_misses_the_cache() {
    let origin = TempDir::new().unwrap();
    write_png(origin.path(), "photo.png", 64, 64);

    let store = FileStore::new(origin.path().to_path_buf());
    let cache = MemoryCache::new(16);

    let location = store.resolve("/photo.png").unwrap();
    let modified = store.last_modified(&location).await.unwrap();
    let directive = Directive { width: 16, height: 16, format: OutputFormat::Jpeg };

    let first = render(&cache, &store, &location, modified, &directive, 80)
        .await
        .unwrap();
    assert!(!first.from_cache);

    let touched = modified + Duration::from_secs(1);
    let second = render(&cache, &store, &location, touched, &directive, 80)
        .await
        .unwrap();
    assert!(!second.from_cache);
    assert_ne!(second.cache_key, first.cache_key);
}

#[tokio::test]
async fn corrupt_file_is_a_pipeline_error() {
    let origin = TempDir::new().unwrap();
    let path = origin.path().join("broken.jpg");
    std::fs::write(&path, b"not a jpeg at all").unwrap();

    let store = FileStore::new(origin.path().to_path_buf());
    let cache = MemoryCache::new(16);

    let location = store.resolve("/broken.jpg").unwrap();
    let modified = store.last_modified(&location).await.unwrap();
    let directive = Directive { width: 10, height: 10, format: OutputFormat::Jpeg };

    let result = render(&cache, &store, &location, modified, &directive, 80).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn degenerate_directive_is_a_pipeline_error() {
    let origin = TempDir::new().unwrap();
    write_png(origin.path(), "photo.png", 64, 64);

    let store = FileStore::new(origin.path().to_path_buf());
    let cache = MemoryCache::new(16);

    let location = store.resolve("/photo.png").unwrap();
    let modified = store.last_modified(&location).await.unwrap();
    // Both dimensions unusable: the 0x0 target is rejected by the resize step.
    let directive = Directive { width: 0, height: 0, format: OutputFormat::Png };

    let result = render(&cache, &store, &location, modified, &directive, 80).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn missing_file_resolves_to_not_found_sentinel() {
    let origin = TempDir::new().unwrap();
    let store = FileStore::new(origin.path().to_path_buf());

    let location = store.resolve("/ghost.png").unwrap();
    assert!(store.last_modified(&location).await.is_none());
}

#[tokio::test]
async fn parent_directory_escapes_do_not_resolve() {
    let origin = TempDir::new().unwrap();
    let store = FileStore::new(origin.path().to_path_buf());

    assert!(store.resolve("/../etc/passwd.png").is_none());
    assert!(store.resolve("/a/../../b.png").is_none());
    assert!(store.resolve("/").is_none());
}

#[test]
fn cache_key_is_sensitive_to_every_component() {
    let now = std::time::SystemTime::now();
    let base = Directive { width: 100, height: 0, format: OutputFormat::Jpeg };

    let key = cache_key(Path::new("/srv/a.jpg"), now, &base);
    assert_eq!(key, cache_key(Path::new("/srv/a.jpg"), now, &base));
    assert_eq!(key.len(), 64);

    assert_ne!(key, cache_key(Path::new("/srv/b.jpg"), now, &base));
    assert_ne!(
        key,
        cache_key(Path::new("/srv/a.jpg"), now + Duration::from_millis(1), &base)
    );
    assert_ne!(
        key,
        cache_key(
            Path::new("/srv/a.jpg"),
            now,
            &Directive { width: 101, ..base }
        )
    );
    assert_ne!(
        key,
        cache_key(
            Path::new("/srv/a.jpg"),
            now,
            &Directive { format: OutputFormat::Png, ..base }
        )
    );
}
