use std::net::SocketAddr;

use axum::{extract::Request, routing::get, Json, Router, ServiceExt};
use tower_http::{cors::CorsLayer, normalize_path::NormalizePath, trace::TraceLayer};

use crate::errors::MessageBody;
use crate::state::AppState;
use crate::{answers, auth, questions};

/// The full service. Trailing slashes are trimmed before routing so
/// `/questions/` and `/questions` reach the same handler.
pub fn build_app(state: AppState) -> NormalizePath<Router> {
    let router = Router::new()
        .route("/", get(|| async { Json(MessageBody::new("API is running....")) }))
        .route("/health", get(|| async { "ok" }))
        .merge(auth::router())
        .merge(questions::router())
        .merge(answers::router())
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, ?latency, "response");
                        } else {
                            tracing::info!(%status, ?latency, "response");
                        }
                    },
                ),
        );

    NormalizePath::trim_trailing_slash(router)
}

pub async fn serve(app: NormalizePath<Router>) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "8080".into())
    )
    .parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, ServiceExt::<Request>::into_make_service(app)).await?;
    Ok(())
}
