//! Routers split by access level. Access control is attached per module in `create_router`,
//! so an endpoint's file tells you who can reach it.

/// Open to anyone: memorial pages and visitor interactions, registration, the payment webhook.
pub mod public;

/// Requires a session (`AuthUser`). Ownership is checked in the handlers.
pub mod authenticated;

/// Requires a session; handlers additionally require the `admin` role.
pub mod admin;
