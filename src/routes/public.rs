use crate::{
    AppState,
    handlers::{
        candles, gallery, guestbook, memorials, order_of_service, payments, profile, tributes,
    },
};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Unauthenticated endpoints. Every memorial-scoped read goes through `published_memorial`, so
/// drafts and suspended memorials answer 404 here.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness check for the load balancer.
        .route("/health", get(|| async { "ok" }))
        // POST /register
        // Creates the identity-provider account and the matching profile.
        .route("/register", post(profile::register_user))
        // GET /plans
        .route("/plans", get(profile::list_plans))
        // GET /memorials?search=&limit=&offset=
        .route("/memorials", get(memorials::list_memorials))
        .route("/memorials/{id}", get(memorials::get_memorial))
        // GET /pages/{slug}
        // Data for the public memorial page. Counts a view.
        .route("/pages/{slug}", get(memorials::get_memorial_page))
        // Visitor interactions. Tributes wait for owner approval; candles and guestbook
        // entries show immediately.
        .route(
            "/memorials/{id}/tributes",
            get(tributes::list_tributes).post(tributes::create_tribute),
        )
        .route(
            "/memorials/{id}/candles",
            get(candles::list_candles).post(candles::light_candle),
        )
        .route(
            "/memorials/{id}/guestbook",
            get(guestbook::list_guestbook).post(guestbook::sign_guestbook),
        )
        .route("/memorials/{id}/gallery", get(gallery::list_gallery))
        .route(
            "/memorials/{id}/order-of-service",
            get(order_of_service::list_service_items),
        )
        // POST /payments/webhook
        // Gateway callback, authenticated by its HMAC signature instead of a session.
        .route("/payments/webhook", post(payments::payment_webhook))
}
