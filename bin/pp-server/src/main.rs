//! ProductPulse Server
//!
//! Production server for the product-discovery REST APIs:
//! - Public APIs: products, featured listing, reviews, coupons
//! - User APIs: submissions, upvotes, reports, subscription, payments
//! - Admin APIs: moderation, user roles, reports, statistics, analytics
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `PP_API_PORT` | `8080` | HTTP API port |
//! | `PP_MONGO_URL` | `mongodb://localhost:27017` | MongoDB connection URL |
//! | `PP_MONGO_DB` | `productpulse` | MongoDB database name |
//! | `PP_JWT_SECRET` | dev default | HMAC secret shared with the identity provider |
//! | `PP_JWT_ISSUER` | `productpulse` | JWT issuer claim |
//! | `STRIPE_SECRET_KEY` | - | Payment gateway API key |
//! | `PP_GATEWAY_TIMEOUT_SECS` | `10` | Payment gateway request timeout |
//! | `RUST_LOG` | `info` | Log level |

use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::get,
    response::Json,
    Router,
};
use utoipa_axum::router::OpenApiRouter;
use tower_http::cors::{CorsLayer, Any};
use tower_http::trace::TraceLayer;
use anyhow::Result;
use tracing::info;
use tokio::{signal, net::TcpListener};
use utoipa_swagger_ui::SwaggerUi;

use pp_platform::{
    AuthService, AuthConfig, StripeGateway, PaymentService,
    ProductRepository, ReviewRepository, ReportRepository,
    UserRepository, CouponRepository, PaymentRepository,
};
use pp_platform::shared::middleware::{AppState, AuthLayer};
use pp_platform::product::{ProductsState, products_router};
use pp_platform::review::{ReviewsState, reviews_router};
use pp_platform::report::{ReportsState, reports_router};
use pp_platform::user::{UsersState, users_router};
use pp_platform::coupon::{CouponsState, coupons_router};
use pp_platform::payment::{PaymentsState, payments_router};
use pp_platform::stats::{StatsState, stats_router};

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_or_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[tokio::main]
async fn main() -> Result<()> {
    pp_common::logging::init_logging("pp-server");

    info!("Starting ProductPulse Server");

    // Configuration from environment
    let api_port: u16 = env_or_parse("PP_API_PORT", 8080);
    let mongo_url = env_or("PP_MONGO_URL", "mongodb://localhost:27017");
    let mongo_db = env_or("PP_MONGO_DB", "productpulse");
    let jwt_secret = env_or("PP_JWT_SECRET", "dev-secret-do-not-use-in-production");
    let jwt_issuer = env_or("PP_JWT_ISSUER", "productpulse");
    let stripe_secret_key = env_or("STRIPE_SECRET_KEY", "");
    let gateway_timeout_secs: u64 = env_or_parse("PP_GATEWAY_TIMEOUT_SECS", 10);

    // Connect to MongoDB
    info!("Connecting to MongoDB: {}/{}", mongo_url, mongo_db);
    let mongo_client = mongodb::Client::with_uri_str(&mongo_url).await?;
    let db = mongo_client.database(&mongo_db);

    // Initialize repositories
    let product_repo = Arc::new(ProductRepository::new(&db));
    let review_repo = Arc::new(ReviewRepository::new(&db));
    let report_repo = Arc::new(ReportRepository::new(&db));
    let user_repo = Arc::new(UserRepository::new(&db));
    let coupon_repo = Arc::new(CouponRepository::new(&db));
    let payment_repo = Arc::new(PaymentRepository::new(&db));
    info!("Repositories initialized");

    // The unique email index backs first-sign-in conflict semantics.
    user_repo.ensure_indexes().await?;

    // Initialize auth
    let auth_config = AuthConfig {
        secret_key: jwt_secret,
        issuer: jwt_issuer,
        access_token_expiry_secs: 3600,
    };
    let auth_service = Arc::new(AuthService::new(auth_config));
    info!("Auth service initialized");

    // Initialize payment gateway
    if stripe_secret_key.is_empty() {
        tracing::warn!("STRIPE_SECRET_KEY not set; payment gateway calls will fail");
    }
    let gateway = Arc::new(StripeGateway::new(
        stripe_secret_key,
        Duration::from_secs(gateway_timeout_secs),
    )?);
    let payment_service = Arc::new(PaymentService::new(gateway));
    info!("Payment gateway initialized");

    // Create AppState
    let app_state = AppState {
        auth_service: auth_service.clone(),
    };

    // Build API states
    let products_state = ProductsState {
        product_repo: product_repo.clone(),
        report_repo: report_repo.clone(),
        user_repo: user_repo.clone(),
    };
    let reviews_state = ReviewsState {
        review_repo: review_repo.clone(),
    };
    let reports_state = ReportsState {
        report_repo: report_repo.clone(),
        product_repo: product_repo.clone(),
        user_repo: user_repo.clone(),
    };
    let users_state = UsersState {
        user_repo: user_repo.clone(),
    };
    let coupons_state = CouponsState {
        coupon_repo,
        user_repo: user_repo.clone(),
    };
    let payments_state = PaymentsState {
        payment_service,
        payment_repo: payment_repo.clone(),
        user_repo: user_repo.clone(),
    };
    let stats_state = StatsState {
        product_repo,
        review_repo,
        report_repo,
        user_repo,
        payment_repo,
    };

    // Build API router using OpenApiRouter for auto-collected OpenAPI paths
    let (router, mut openapi) = OpenApiRouter::new()
        .nest("/products", products_router(products_state))
        .nest("/reviews", reviews_router(reviews_state))
        .nest("/reports", reports_router(reports_state))
        .nest("/coupons", coupons_router(coupons_state))
        .nest("/admin", stats_router(stats_state))
        // Root-level paths (users, payments) are absolute inside their routers
        .merge(users_router(users_state))
        .merge(payments_router(payments_state))
        .split_for_parts();

    // Add missing schemas that are referenced but not auto-collected (e.g., from #[serde(flatten)])
    use utoipa::openapi::{ObjectBuilder, schema::Type};
    if let Some(components) = openapi.components.as_mut() {
        // PaginationParams is used in query params with #[serde(flatten)]
        components.schemas.insert(
            "PaginationParams".to_string(),
            ObjectBuilder::new()
                .property("page", ObjectBuilder::new().schema_type(Type::Integer))
                .property("limit", ObjectBuilder::new().schema_type(Type::Integer))
                .into(),
        );
    }

    // Update OpenAPI info
    openapi.info.title = "ProductPulse API".to_string();
    openapi.info.version = "1.0.0".to_string();
    openapi.info.description = Some("REST APIs for products, reviews, payments, and administration".to_string());

    let app = Router::new()
        .merge(router)
        .route("/health", get(health_handler))
        // OpenAPI / Swagger UI with auto-collected paths
        .merge(SwaggerUi::new("/swagger-ui").url("/q/openapi", openapi))
        // Auth middleware
        .layer(AuthLayer::new(app_state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any));

    // Start API server
    let api_addr = format!("0.0.0.0:{}", api_port);
    info!("API server listening on http://{}", api_addr);

    let api_listener = TcpListener::bind(&api_addr).await?;
    let api_task = tokio::spawn(async move {
        axum::serve(api_listener, app).await.unwrap();
    });

    info!("ProductPulse Server started");
    info!("Press Ctrl+C to shutdown");

    // Wait for shutdown
    shutdown_signal().await;
    info!("Shutdown signal received...");

    api_task.abort();

    info!("ProductPulse Server shutdown complete");
    Ok(())
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "UP",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
