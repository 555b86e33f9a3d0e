use crate::{
    AppState,
    handlers::{
        analytics, gallery, guestbook, memorials, order_of_service, payments, profile, tributes,
    },
};
use axum::{
    Router,
    routing::{delete, get, post, put},
};

/// Authenticated Router Module
///
/// Endpoints for signed-in users. The router is wrapped in `auth_middleware`, and handlers
/// take `AuthUser` again to run owner checks (`owned_memorial`).
///
/// Some paths are shared with the public router under different methods
/// (`GET /memorials/{id}` is public, `PUT` is not); axum merges them per method.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // --- Profile ---
        .route("/me", get(profile::get_me).put(profile::update_me))
        .route("/me/memorials", get(memorials::get_my_memorials))
        // GET /me/plan
        // Current plan limits and usage, straight from `get_plan_limits`.
        .route("/me/plan", get(profile::get_my_plan))
        // --- Memorials ---
        // POST /memorials
        // Checks the plan's memorial quota before allocating a slug.
        .route("/memorials", post(memorials::create_memorial))
        .route(
            "/memorials/{id}",
            put(memorials::update_memorial).delete(memorials::delete_memorial),
        )
        .route("/memorials/{id}/qr", get(memorials::get_memorial_qr))
        .route(
            "/memorials/{id}/analytics",
            get(analytics::get_memorial_analytics),
        )
        // --- Moderation ---
        .route(
            "/memorials/{id}/tributes/all",
            get(tributes::list_all_tributes),
        )
        // PUT /tributes/{id}/approval
        // Body is a bare boolean.
        .route(
            "/tributes/{id}/approval",
            put(tributes::set_tribute_approval),
        )
        .route("/tributes/{id}", delete(tributes::delete_tribute))
        .route("/guestbook/{id}", delete(guestbook::delete_guestbook_entry))
        // --- Gallery ---
        // POST /memorials/{id}/gallery/upload-url
        // Presigned PUT URL; the client uploads straight to the bucket, then registers the
        // object with POST /memorials/{id}/gallery.
        .route(
            "/memorials/{id}/gallery/upload-url",
            post(gallery::create_upload_url),
        )
        .route("/memorials/{id}/gallery", post(gallery::add_media))
        .route("/gallery/{id}", delete(gallery::delete_media))
        // --- Order of service ---
        .route(
            "/memorials/{id}/order-of-service",
            post(order_of_service::create_service_item),
        )
        .route(
            "/order-of-service/{id}",
            put(order_of_service::update_service_item)
                .delete(order_of_service::delete_service_item),
        )
        // --- Payments ---
        .route("/payments/initialize", post(payments::initialize_payment))
        .route(
            "/payments/verify/{reference}",
            get(payments::verify_payment),
        )
        .route("/payments/history", get(payments::payment_history))
}
