//! Admin API.
//!
//! Served on its own listener and guarded by a bearer API key. The local
//! login flow and the SAML service provider use it to register sessions.
//!
//! ```text
//! GET    /admin/status
//! POST   /admin/sessions                   {username}   → {session_id, csrf_token}
//! DELETE /admin/sessions/{id}
//! POST   /admin/federation/sessions        {attributes} → {session_id}
//! DELETE /admin/federation/sessions/{id}
//! POST   /admin/csrf/verify                {session_id, token} → {valid}
//! ```

pub mod auth;
pub mod handlers;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

use crate::http::server::AppState;

use self::auth::admin_auth_middleware;
use self::handlers::*;

pub fn setup_admin_router(state: AppState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/sessions", post(create_session))
        .route("/admin/sessions/{id}", delete(delete_session))
        .route("/admin/federation/sessions", post(create_federated_session))
        .route("/admin/federation/sessions/{id}", delete(delete_federated_session))
        .route("/admin/csrf/verify", post(verify_csrf))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
}
