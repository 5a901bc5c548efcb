use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue, Request},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::{collections::BTreeMap, sync::Arc};
use thiserror::Error;
use tower_http::services::ServeDir;

pub mod cache;
pub mod classify;
pub mod config;
pub mod files;
pub mod pipeline;
pub mod transform;

use crate::cache::{etag_for_key, MemoryCache};
use crate::classify::{is_image_path, Directive};
use crate::config::{ResizeKitConfig, DEFAULT_CACHE_CONTROL};
use crate::files::FileStore;
use crate::pipeline::Rendered;

#[derive(Error, Debug)]
pub enum ResizeKitError {
    #[error("Cache error: {0}")]
    CacheError(String),
    #[error("Transformation error: {0}")]
    TransformError(String),
    #[error("Read error: {0}")]
    ReadError(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, ResizeKitError>;

/// Shared state for the dispatch middleware and the observability handlers.
pub struct App {
    pub config: ResizeKitConfig,
    pub store: FileStore,
    pub cache: Arc<MemoryCache>,
}

impl App {
    pub fn new(config: ResizeKitConfig) -> Self {
        let store = FileStore::new(config.root.clone());
        let cache = Arc::new(MemoryCache::new(config.cache_capacity));
        Self { config, store, cache }
    }
}

/// Top-level dispatch: intercept image requests carrying resize parameters,
/// pass everything else to the static origin untouched.
///
/// Failure anywhere in classification or rendering degrades to pass-through;
/// the worst case is identical to this middleware not existing. It never
/// writes an error response of its own.
async fn resize_middleware(
    axum::extract::State(app): axum::extract::State<Arc<App>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let query = match req.uri().query() {
        Some(q) if !q.is_empty() => q.to_owned(),
        _ => return next.run(req).await,
    };
    let path = req.uri().path().to_owned();

    match intercept(&app, &path, &query).await {
        Ok(Some(rendered)) => {
            if rendered.from_cache {
                METRICS.cache_hits.fetch_add(1, Ordering::Relaxed);
            } else {
                METRICS.cache_misses.fetch_add(1, Ordering::Relaxed);
                METRICS.transforms.fetch_add(1, Ordering::Relaxed);
            }

            let mut headers = HeaderMap::new();
            headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static(rendered.content_type),
            );
            headers.insert(
                header::CACHE_CONTROL,
                HeaderValue::from_static(DEFAULT_CACHE_CONTROL),
            );
            if let Ok(etag) = HeaderValue::from_str(&etag_for_key(&rendered.cache_key)) {
                headers.insert(header::ETAG, etag);
            }
            (headers, Body::from(rendered.bytes)).into_response()
        }
        Ok(None) => next.run(req).await,
        Err(e) => {
            METRICS.errors.fetch_add(1, Ordering::Relaxed);
            tracing::error!("Resize failed for {}: {}, passing through", path, e);
            next.run(req).await
        }
    }
}

/// Classify the request and run the resize pipeline when it qualifies.
///
/// `Ok(None)` is the pass-through verdict: not an image path, no resize
/// directive in the query, or no servable file at the resolved location (the
/// codec is never invoked for a missing file). `Err` is reserved for actual
/// pipeline failures.
async fn intercept(app: &App, path: &str, query: &str) -> Result<Option<Rendered>> {
    if !is_image_path(path) {
        return Ok(None);
    }

    let params: BTreeMap<String, String> = serde_urlencoded::from_str(query)
        .map_err(|e| ResizeKitError::InvalidArgument(e.to_string()))?;

    let directive = match Directive::from_query(path, &params) {
        Some(d) => d,
        None => return Ok(None),
    };

    tracing::debug!(
        "Resize candidate: path={}, w={}, h={}, format={}",
        path, directive.width, directive.height, directive.format
    );

    let location = match app.store.resolve(path) {
        Some(l) => l,
        None => return Ok(None),
    };

    let modified = match app.store.last_modified(&location).await {
        Some(m) => m,
        None => return Ok(None),
    };

    let rendered = pipeline::render(
        app.cache.as_ref(),
        &app.store,
        &location,
        modified,
        &directive,
        app.config.jpeg_quality,
    )
    .await?;

    Ok(Some(rendered))
}

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics tracking
pub struct Metrics {
    pub cache_hits: AtomicU64,
    pub cache_misses: AtomicU64,
    pub transforms: AtomicU64,
    pub errors: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
            transforms: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

lazy_static::lazy_static! {
    static ref METRICS: Metrics = Metrics::new();
}

/// Health check endpoint
async fn health_handler() -> impl IntoResponse {
    use serde_json::json;

    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "resizekit"
    }))
}

/// Cache statistics endpoint
async fn cache_stats_handler(
    axum::extract::State(app): axum::extract::State<Arc<App>>,
) -> impl IntoResponse {
    use serde_json::json;

    let stats = app.cache.stats().await;

    let hits = METRICS.cache_hits.load(Ordering::Relaxed);
    let misses = METRICS.cache_misses.load(Ordering::Relaxed);
    let total_requests = hits + misses;
    let hit_rate = if total_requests > 0 {
        (hits as f64 / total_requests as f64) * 100.0
    } else {
        0.0
    };

    Json(json!({
        "cache": {
            "entry_count": stats.entry_count,
            "total_size_bytes": stats.total_size_bytes,
            "total_size_mb": stats.total_size_bytes as f64 / 1024.0 / 1024.0,
            "capacity": stats.capacity,
        },
        "requests": {
            "cache_hits": hits,
            "cache_misses": misses,
            "total": total_requests,
            "hit_rate_percent": hit_rate,
        },
        "transforms": {
            "total": METRICS.transforms.load(Ordering::Relaxed),
            "errors": METRICS.errors.load(Ordering::Relaxed),
        }
    }))
}

/// Metrics endpoint (Prometheus-compatible plain text)
async fn metrics_handler() -> impl IntoResponse {
    let hits = METRICS.cache_hits.load(Ordering::Relaxed);
    let misses = METRICS.cache_misses.load(Ordering::Relaxed);
    let transforms = METRICS.transforms.load(Ordering::Relaxed);
    let errors = METRICS.errors.load(Ordering::Relaxed);

    let metrics = format!(
        "# HELP resizekit_cache_hits_total Total number of cache hits\n\
         # TYPE resizekit_cache_hits_total counter\n\
         resizekit_cache_hits_total {}\n\
         # HELP resizekit_cache_misses_total Total number of cache misses\n\
         # TYPE resizekit_cache_misses_total counter\n\
         resizekit_cache_misses_total {}\n\
         # HELP resizekit_transforms_total Total number of image transformations\n\
         # TYPE resizekit_transforms_total counter\n\
         resizekit_transforms_total {}\n\
         # HELP resizekit_errors_total Total number of errors\n\
         # TYPE resizekit_errors_total counter\n\
         resizekit_errors_total {}\n",
        hits, misses, transforms, errors
    );

    (
        [("Content-Type", "text/plain; version=0.0.4")],
        metrics,
    )
}

/// Build the full router: observability endpoints, the resize interceptor,
/// and the static origin it degrades to.
pub fn router(config: ResizeKitConfig) -> Router {
    let app = Arc::new(App::new(config));
    let origin = ServeDir::new(app.config.root.clone());

    let observability = Router::new()
        .route("/health", get(health_handler))
        .route("/stats/cache", get(cache_stats_handler).with_state(app.clone()))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(observability)
        .fallback_service(origin)
        .layer(middleware::from_fn_with_state(app, resize_middleware))
}
