use super::app_error::AppError;
use super::health::{liveness, readiness};
use super::state::HttpServerState;
use super::table::{admin_auth, admin_update, get_table};
use crate::config;
use crate::http::health::{__path_liveness, __path_readiness};
use crate::http::table::{__path_admin_auth, __path_admin_update, __path_get_table};
use anyhow::Result;
use axum::Json;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::extract::State;
use axum::http::header;
use axum::routing::get;
use axum::routing::post;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::trace;
use tower_http::{ServiceBuilderExt, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable as ScalarServable};

#[derive(OpenApi)]
#[openapi(
    tags(
        (name = "Table", description = "Read the medication reference table"),
        (name = "Admin", description = "Authenticate and replace the table"),
        (name = "Health", description = "Liveness and readiness"),
    ),
    paths(frontpage, get_table, admin_auth, admin_update, liveness, readiness),
)]
struct ApiDoc;

pub async fn run_http_server(state: HttpServerState, address: SocketAddr) -> Result<()> {
    let config = config::get()?;
    let max_body_layer = DefaultBodyLimit::max(config.parse_http_body_limit()?);
    let timeout_seconds = config.http_server_timeout_seconds;

    // List of headers that shouldn't be logged
    let sensitive_headers: Arc<[_]> = vec![header::AUTHORIZATION, header::COOKIE].into();

    // Middleware creation
    let middleware = ServiceBuilder::new()
        .sensitive_request_headers(sensitive_headers.clone())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .sensitive_response_headers(sensitive_headers)
        .layer(TimeoutLayer::new(Duration::from_secs(timeout_seconds)))
        .compression()
        .into_inner();

    let app = Router::new()
        .route("/", get(frontpage))
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .route("/api/data", get(get_table))
        .route("/api/admin-auth", post(admin_auth))
        .route(
            "/api/admin-update",
            post(admin_update).layer(max_body_layer.clone()),
        )
        .route("/health/live", get(liveness))
        .route("/health/ready", get(readiness))
        .layer(middleware)
        .with_state(state);

    // Run our application
    let listener = tokio::net::TcpListener::bind(address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    // Wait for the CTRL+C signal
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install shutdown CTRL+C signal handler");
}

/// Frontpage
///
/// Returns the server name.
#[utoipa::path(
    get,
    path = "/",
    tag = "Table",
    responses(
        (status = 200, description = "Server name", body = String)
    )
)]
async fn frontpage(State(state): State<HttpServerState>) -> Result<Json<String>, AppError> {
    let name: String = (*state.name).clone();
    Ok(Json(name))
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, http::Request, http::StatusCode};
    use tower::ServiceExt;

    use super::*;
    use crate::storage::storage_factory::create_storage_from_connection_string;

    #[tokio::test]
    async fn test_frontpage() {
        let storage = create_storage_from_connection_string("sqlite::memory:")
            .await
            .unwrap();
        let state = HttpServerState {
            name: Arc::new("medtable".to_string()),
            storage,
        };
        let app = Router::new().route("/", get(frontpage)).with_state(state);
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        use axum::body::to_bytes;
        let body_str =
            String::from_utf8(to_bytes(response.into_body(), 128).await.unwrap().to_vec()).unwrap();
        assert_eq!(body_str, "\"medtable\"");
    }
}
