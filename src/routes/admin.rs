use crate::{AppState, handlers::admin};
use axum::{
    Router,
    routing::{delete, get, put},
};

/// Admin Router Module
///
/// Nested under `/admin`. Every handler calls `AuthUser::require_admin` before touching data,
/// so a non-admin session gets 403.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin/stats
        // Totals for the dashboard: users, memorials, engagement, revenue.
        .route("/stats", get(admin::get_dashboard_stats))
        // GET /admin/memorials
        // All memorials including drafts and suspended ones.
        .route("/memorials", get(admin::list_all_memorials))
        .route("/memorials/{id}", delete(admin::delete_any_memorial))
        // PUT /admin/memorials/{id}/status
        // Suspension is the moderation tool; owners cannot lift it.
        .route("/memorials/{id}/status", put(admin::set_memorial_status))
        .route("/users", get(admin::list_users))
        .route("/users/{id}/role", put(admin::set_user_role))
        .route("/payments", get(admin::list_payments))
        .route("/tributes/{id}", delete(admin::remove_tribute))
}
