//! Local stand-in for the remote resources: `/ping` for health checks, any
//! `*.json` path answers a title document, any `*.html` path a product page.
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use axum::http::{header, StatusCode, Uri};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use scrape_logging::{scrape_debug, scrape_error, scrape_info};

const JSON_DOCUMENT: &str = r#"{"title":"My title"}"#;

const HTML_DOCUMENT: &str = r#"
    <html>
        <body>
            <h1 class="product-title" data-id="f3bfa24c-2645-48c0-9117-b338bef9b9ab">Product title</h1>
        </body>
    </html>
"#;

pub(crate) const HEALTH_PATH: &str = "/ping";

fn router() -> Router {
    Router::new()
        .route(HEALTH_PATH, get(ping))
        .fallback(document)
}

async fn ping() -> &'static str {
    "pong"
}

async fn document(uri: Uri) -> Response {
    let path = uri.path();
    if path.ends_with(".json") {
        ([(header::CONTENT_TYPE, "application/json")], JSON_DOCUMENT).into_response()
    } else if path.ends_with(".html") {
        Html(HTML_DOCUMENT).into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}

/// Bind `addr` and serve in the background. Returns the bound address, which
/// differs from `addr` when port 0 was requested.
pub(crate) async fn spawn(addr: SocketAddr) -> Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind mock server to {addr}"))?;
    let bound = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, router()).await {
            scrape_error!("Mock server stopped: {}", err);
        }
    });
    scrape_info!("Mock server listening on {}", bound);
    Ok(bound)
}

/// Poll `url` until it answers 2xx, at most `attempts` times.
pub(crate) async fn wait_until_healthy(url: &str, interval: Duration, attempts: u32) -> Result<()> {
    let client = reqwest::Client::builder()
        .timeout(interval.max(Duration::from_secs(1)))
        .build()?;
    for attempt in 1..=attempts {
        scrape_info!("Requesting health check {}/{} at {}", attempt, attempts, url);
        match client.get(url).send().await {
            Ok(response) if response.status().is_success() => {
                scrape_info!("Server is ready");
                return Ok(());
            }
            Ok(response) => scrape_debug!("Health check answered {}", response.status()),
            Err(err) => scrape_debug!("Health check failed: {}", err),
        }
        if attempt < attempts {
            tokio::time::sleep(interval).await;
        }
    }
    bail!("server at {url} not ready after {attempts} attempts")
}
