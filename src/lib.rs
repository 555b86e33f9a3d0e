use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core services.
pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod storage;

// Integrations with third-party APIs.
pub mod email;
pub mod identity;
pub mod payments;
pub mod qr;

// Domain helpers.
pub mod plans;
pub mod slug;

// Routing, split by access level (public, authenticated, admin).
pub mod routes;
use auth::AuthUser;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use email::{EmailState, MockEmailService, ResendEmailClient};
pub use error::{ApiError, ApiResult};
pub use identity::{IdentityState, MockIdentityProvider, SupabaseAuthClient};
pub use payments::{MockPaymentGateway, PaymentState, PaystackClient};
pub use repository::{PostgresRepository, RepositoryState};
pub use storage::{MockStorageService, S3StorageClient, StorageState};

/// ApiDoc
///
/// Aggregates every `#[utoipa::path]` handler and `ToSchema` model into the OpenAPI document
/// served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::profile::register_user, handlers::profile::get_me,
        handlers::profile::update_me, handlers::profile::get_my_plan,
        handlers::profile::list_plans,
        handlers::memorials::create_memorial, handlers::memorials::list_memorials,
        handlers::memorials::get_memorial, handlers::memorials::get_my_memorials,
        handlers::memorials::update_memorial, handlers::memorials::delete_memorial,
        handlers::memorials::get_memorial_page, handlers::memorials::get_memorial_qr,
        handlers::tributes::list_tributes, handlers::tributes::create_tribute,
        handlers::tributes::list_all_tributes, handlers::tributes::set_tribute_approval,
        handlers::tributes::delete_tribute,
        handlers::candles::list_candles, handlers::candles::light_candle,
        handlers::guestbook::list_guestbook, handlers::guestbook::sign_guestbook,
        handlers::guestbook::delete_guestbook_entry,
        handlers::gallery::list_gallery, handlers::gallery::create_upload_url,
        handlers::gallery::add_media, handlers::gallery::delete_media,
        handlers::analytics::get_memorial_analytics,
        handlers::order_of_service::list_service_items,
        handlers::order_of_service::create_service_item,
        handlers::order_of_service::update_service_item,
        handlers::order_of_service::delete_service_item,
        handlers::payments::initialize_payment, handlers::payments::verify_payment,
        handlers::payments::payment_webhook, handlers::payments::payment_history,
        handlers::admin::get_dashboard_stats, handlers::admin::list_all_memorials,
        handlers::admin::set_memorial_status, handlers::admin::delete_any_memorial,
        handlers::admin::list_users, handlers::admin::set_user_role,
        handlers::admin::list_payments, handlers::admin::remove_tribute,
    ),
    components(
        schemas(
            error::ErrorBody,
            models::Profile, models::RegisterUserRequest, models::UpdateProfileRequest,
            models::UpdateRoleRequest, models::Plan, models::PlanLimits,
            models::Memorial, models::CreateMemorialRequest, models::UpdateMemorialRequest,
            models::MemorialStatusUpdate, models::MemorialPage, models::QrCodeResponse,
            models::Tribute, models::CreateTributeRequest,
            models::Candle, models::LightCandleRequest,
            models::GuestbookEntry, models::CreateGuestbookEntryRequest,
            models::Media, models::UploadUrlRequest, models::UploadUrlResponse,
            models::CreateMediaRequest, models::MemorialAnalytics,
            models::OrderOfServiceItem, models::CreateServiceItemRequest,
            models::UpdateServiceItemRequest,
            models::PaymentTransaction, models::InitializePaymentRequest,
            models::InitializePaymentResponse, models::PaymentVerification,
            models::AdminDashboardStats,
        )
    ),
    tags(
        (name = "soulbridge", description = "SoulBridge memorial pages API")
    )
)]
pub struct ApiDoc;

/// AppState
///
/// Shared, cheaply clonable container for every service a handler can reach. Each external
/// dependency sits behind a trait object so tests swap in mocks without a network.
#[derive(Clone)]
pub struct AppState {
    pub repo: RepositoryState,
    /// Object storage for gallery media.
    pub storage: StorageState,
    /// Card payment gateway.
    pub payments: PaymentState,
    /// Transactional email.
    pub email: EmailState,
    /// Identity provider used at registration.
    pub identity: IdentityState,
    pub config: AppConfig,
}

// Extractors such as `AuthUser` only need the repository and config, pulled out via FromRef.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Guards the authenticated router. Extracting `AuthUser` is the whole check: a failed
/// extraction rejects with 401 before the handler runs.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles public, authenticated and admin routes, the Swagger UI and the observability
/// layers around them.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        // Admin role is checked inside each handler; this layer only requires a session.
        .nest(
            "/admin",
            admin::admin_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// Span for every request, carrying the request id so all log lines of one request correlate.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
