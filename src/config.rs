use std::path::PathBuf;
use thiserror::Error;

/// JPEG encoder quality used for every JPEG response; no per-request override.
pub const DEFAULT_JPEG_QUALITY: u8 = 80;

/// Resize parameters act as cache busters, so responses can be cached hard.
pub const DEFAULT_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

/// Default number of encoded images held by the in-memory cache.
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Png,
    Jpeg,
}

impl OutputFormat {
    /// Resolve a format name from a query value or a path extension.
    /// Anything other than `png` encodes as JPEG rather than being rejected;
    /// `jpg` and `jpeg` are just the explicit spellings of that default.
    pub fn from_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("png") {
            OutputFormat::Png
        } else {
            OutputFormat::Jpeg
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Jpeg => "image/jpeg",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Png => write!(f, "png"),
            OutputFormat::Jpeg => write!(f, "jpeg"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResizeKitConfig {
    /// Root directory of the static origin the middleware sits in front of.
    pub root: PathBuf,
    /// Capacity of the in-memory cache, in entries.
    pub cache_capacity: usize,
    pub jpeg_quality: u8,
}

impl Default for ResizeKitConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./public"),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Root directory cannot be empty")] EmptyRoot,
    #[error("Cache capacity must be > 0")] InvalidCacheCapacity,
    #[error("JPEG quality must be in 1..=100")] InvalidJpegQuality,
}

impl ResizeKitConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.root.as_os_str().is_empty() { return Err(ConfigError::EmptyRoot); }
        if self.cache_capacity == 0 { return Err(ConfigError::InvalidCacheCapacity); }
        if self.jpeg_quality == 0 || self.jpeg_quality > 100 { return Err(ConfigError::InvalidJpegQuality); }
        Ok(())
    }
}
