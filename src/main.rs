use resizekit::{config::ResizeKitConfig, router};
use std::net::SocketAddr;

/// resizekit standalone server entry point.
///
/// Initializes tracing, validates configuration, and serves the configured
/// static root with on-the-fly image resizing in front of it.
///
/// # Configuration
/// Environment variables:
/// - `RESIZEKIT_ROOT`: directory of the static origin (default: "./public")
/// - `RESIZEKIT_CACHE_CAPACITY`: in-memory cache capacity in entries (default: 256)
/// - `PORT`: HTTP listen port (default: 8080)
/// - `RUST_LOG`: Logging verbosity (default: "resizekit=debug,tower_http=debug")
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured logging with environment-based filtering
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "resizekit=debug,tower_http=debug".into()),
        )
        .init();

    tracing::info!("Starting resizekit server");

    let cfg = ResizeKitConfig {
        root: std::env::var("RESIZEKIT_ROOT")
            .map(std::path::PathBuf::from)
            .unwrap_or_else(|_| std::path::PathBuf::from("./public")),
        cache_capacity: std::env::var("RESIZEKIT_CACHE_CAPACITY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(resizekit::config::DEFAULT_CACHE_CAPACITY),
        jpeg_quality: resizekit::config::DEFAULT_JPEG_QUALITY,
    };
    cfg.validate()?;

    tracing::info!("Serving static root {}", cfg.root.display());

    let app = router(cfg);

    // Cloud platforms inject PORT environment variable
    let port = std::env::var("PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse::<u16>()
        .unwrap_or(8080);

    // Bind to 0.0.0.0 for external access (required for containerized deployment)
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Server listening on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;
    Ok(())
}
