mod handlers;
mod middleware;

use std::net::SocketAddr;

use axum::{
    extract::Extension,
    handler::Handler,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::server::handlers::{admin, contact, health, places};
use crate::api::DynAPI;
use crate::config::{AllowedOrigins, Config, Mode};
use crate::error::{internal_error, Error};

use handlers::admin::AdminToken;
pub use middleware::RateLimit;
use middleware::{
    expose_hidden_details, limit_contact, limit_requests, ContactLimiter, GeneralLimiter,
};

#[derive(Clone, Debug)]
pub struct ServerOptions {
    pub mode: Mode,
    pub allowed_origins: AllowedOrigins,
    pub admin_token: Option<String>,
    pub general_limit: RateLimit,
    pub contact_limit: RateLimit,
}

impl ServerOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            mode: config.mode,
            allowed_origins: config.allowed_origins.clone(),
            admin_token: config.admin_token.clone(),
            general_limit: RateLimit::GENERAL,
            contact_limit: RateLimit::CONTACT,
        }
    }
}

fn cors_layer(origins: &AllowedOrigins) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION]);

    match origins {
        AllowedOrigins::Any => layer.allow_origin(Any),
        AllowedOrigins::List(origins) => {
            let origins: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|origin| match origin.parse() {
                    Ok(value) => Some(value),
                    Err(_) => {
                        tracing::warn!(%origin, "ignoring invalid CORS origin");
                        None
                    }
                })
                .collect();

            layer.allow_origin(AllowOrigin::list(origins))
        }
    }
}

pub fn build_router(api: DynAPI, options: ServerOptions) -> Router {
    let admin_routes = Router::new()
        .route("/admin/refresh-ratings", post(admin::refresh_ratings))
        .route_layer(from_fn(admin::require_admin));

    let contact_routes = Router::new()
        .route("/contact", post(contact::submit))
        .route_layer(from_fn(limit_contact));

    let mut app = Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(health::check))
        .route("/places", get(places::list))
        .route("/places/:id", get(places::find))
        .merge(admin_routes)
        .merge(contact_routes)
        .fallback(handlers::not_found.into_service());

    if options.mode == Mode::Development {
        app = app.layer(from_fn(expose_hidden_details));
    }

    app.layer(from_fn(limit_requests))
        .layer(cors_layer(&options.allowed_origins))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(api))
        .layer(Extension(AdminToken(options.admin_token)))
        .layer(Extension(GeneralLimiter(options.general_limit.limiter())))
        .layer(Extension(ContactLimiter(options.contact_limit.limiter())))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }

    tracing::info!("shutting down");
}

pub async fn serve(api: DynAPI, options: ServerOptions, addr: SocketAddr) -> Result<(), Error> {
    let app = build_router(api, options);

    let server = axum::Server::try_bind(&addr)
        .map_err(|e| internal_error(format!("failed to bind {}: {}", addr, e)))?;

    tracing::info!("listening on {}", addr);

    server
        .serve(app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| internal_error(format!("server error: {}", e)))
}
