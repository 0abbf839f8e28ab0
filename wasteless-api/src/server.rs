use anyhow::Result;
use axum::{
    extract::Extension,
    http::{header, HeaderValue, Method},
    routing::{delete, get, patch, post, put},
    Router,
};
use std::env;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing;
use wasteless_core::config::ServerConfig;
use wasteless_core::AppContext;
use wasteless_jobs::Sweeper;

use crate::handlers;

// Credentialed CORS cannot be combined with wildcard methods or
// headers, so the allow lists are spelled out when an origin list is
// configured.
fn cors_layer(origins: Option<String>) -> CorsLayer {
    match origins {
        Some(origins) => {
            let origin_list: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| s.trim().parse::<HeaderValue>().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origin_list))
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::PATCH,
                    Method::DELETE,
                ])
                .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION])
                .allow_credentials(true)
        }
        None => {
            tracing::warn!("CORS_ORIGINS not set, using permissive CORS. Set CORS_ORIGINS for production!");
            CorsLayer::permissive()
        }
    }
}

fn bind_target(server: &ServerConfig) -> (String, u16) {
    (server.host.clone(), server.api_port)
}

pub async fn run(ctx: AppContext, sweeper: Sweeper) -> Result<()> {
    let (host, port) = bind_target(&ctx.config.server);
    let cors = cors_layer(env::var("CORS_ORIGINS").ok());

    let app = Router::new()
        .route("/health", get(handlers::health))
        .route("/api/v1/inventory/:user_id/all", get(handlers::inventory::all_items))
        .route("/api/v1/inventory/:user_id/add", post(handlers::inventory::add_item))
        .route("/api/v1/inventory/item/:id", get(handlers::inventory::item_by_id))
        .route("/api/v1/inventory/item/:id/status", patch(handlers::inventory::update_item_status))
        .route("/api/v1/inventory/update/:id", put(handlers::inventory::update_item))
        .route("/api/v1/inventory/delete/:id", delete(handlers::inventory::delete_item))
        .route("/api/v1/donations/nearby", get(handlers::donations::nearby))
        .route("/api/v1/donations/city/:city", get(handlers::donations::by_city))
        .route("/api/v1/donations/all", get(handlers::donations::all))
        .route("/api/v1/donations/centers", post(handlers::donations::create))
        .route("/api/v1/donations/:id", get(handlers::donations::by_id))
        .route("/api/v1/expiration/create", post(handlers::expiration::create_record))
        .route("/api/v1/expiration/all", get(handlers::expiration::all_records))
        .route("/api/v1/expiration/send-reminders", post(handlers::expiration::send_reminders))
        .route("/api/v1/expiration/upcoming/:user_id", get(handlers::expiration::upcoming))
        .route("/api/v1/expiration/alerts/:user_id", get(handlers::expiration::alerts))
        .route("/api/v1/expiration/settings/:user_id", get(handlers::expiration::get_settings))
        .route("/api/v1/expiration/settings/:user_id", put(handlers::expiration::update_settings))
        .route("/api/v1/impact/summary/:user_id", get(handlers::impact::current_month_summary))
        .route("/api/v1/impact/summary/:user_id/30days", get(handlers::impact::last_30_days_summary))
        .route("/api/v1/impact/history/:user_id", get(handlers::impact::history))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(Extension(ctx))
                .layer(Extension(sweeper))
                .layer(cors),
        );

    tracing::info!("Starting API server on {}:{}", host, port);

    let listener = tokio::net::TcpListener::bind((host.as_str(), port)).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    const ORIGIN: &str = "https://app.wasteless.example";

    fn cors_app() -> Router {
        Router::new()
            .route("/health", get(handlers::health))
            .layer(cors_layer(Some(ORIGIN.to_string())))
    }

    #[tokio::test]
    async fn test_cors_origin_list_serves_simple_requests() {
        let response = cors_app()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header(header::ORIGIN, ORIGIN)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN),
            Some(&HeaderValue::from_static(ORIGIN))
        );
    }

    #[tokio::test]
    async fn test_cors_origin_list_answers_preflight() {
        let response = cors_app()
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/health")
                    .header(header::ORIGIN, ORIGIN)
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PATCH")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS),
            Some(&HeaderValue::from_static("true"))
        );
    }

    #[test]
    fn test_bind_target_uses_configured_host() {
        let server = ServerConfig {
            host: "127.0.0.1".to_string(),
            api_port: 9090,
        };
        assert_eq!(bind_target(&server), ("127.0.0.1".to_string(), 9090));
    }
}
