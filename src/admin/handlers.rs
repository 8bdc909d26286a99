use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::auth::Attributes;
use crate::auth::session::new_session_id;
use crate::http::server::AppState;
use crate::security::csrf;

#[derive(Debug, Serialize, Deserialize)]
pub struct SystemStatus {
    pub version: String,
    pub status: String,
    pub federation_configured: bool,
    pub authorization_groups: usize,
    pub local_sessions: usize,
    pub federated_sessions: usize,
}

#[derive(Debug, Deserialize)]
pub struct CreateSession {
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateFederatedSession {
    pub attributes: Attributes,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionCreated {
    pub session_id: String,
    pub csrf_token: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyCsrf {
    pub session_id: String,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CsrfVerdict {
    pub valid: bool,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    let config = state.config.load_full();
    let federation_configured = match &config.federation.metadata_path {
        Some(path) => tokio::fs::try_exists(path).await.unwrap_or(false),
        None => false,
    };

    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "operational".to_string(),
        federation_configured,
        authorization_groups: config.authorization.groups.len(),
        local_sessions: state.sessions.len().await,
        federated_sessions: state.federated_sessions.len().await,
    })
}

/// Register a local login.
pub async fn create_session(
    State(state): State<AppState>,
    Json(body): Json<CreateSession>,
) -> Result<(StatusCode, Json<SessionCreated>), StatusCode> {
    let username = body.username.trim();
    if username.is_empty() {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }

    let config = state.config.load_full();
    let session_id = new_session_id();
    let mut attributes = Attributes::new();
    attributes.insert(config.session.username_attribute.clone(), vec![username.to_string()]);
    state.sessions.save(&session_id, attributes).await;

    tracing::info!(username = %username, "Local session created");
    Ok((
        StatusCode::CREATED,
        Json(SessionCreated {
            csrf_token: csrf::generate_token(&config.csrf.secret, &session_id),
            session_id,
        }),
    ))
}

pub async fn delete_session(State(state): State<AppState>, Path(id): Path<String>) -> StatusCode {
    if state.sessions.destroy(&id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

/// Register attributes released by the identity provider.
pub async fn create_federated_session(
    State(state): State<AppState>,
    Json(body): Json<CreateFederatedSession>,
) -> (StatusCode, Json<SessionCreated>) {
    let config = state.config.load_full();
    let session_id = new_session_id();
    state.federated_sessions.save(&session_id, body.attributes).await;

    tracing::info!("Federated session created");
    (
        StatusCode::CREATED,
        Json(SessionCreated {
            csrf_token: csrf::generate_token(&config.csrf.secret, &session_id),
            session_id,
        }),
    )
}

pub async fn delete_federated_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> StatusCode {
    if state.federated_sessions.destroy(&id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

pub async fn verify_csrf(
    State(state): State<AppState>,
    Json(body): Json<VerifyCsrf>,
) -> Json<CsrfVerdict> {
    let config = state.config.load_full();
    Json(CsrfVerdict {
        valid: csrf::validate_token(&config.csrf.secret, &body.session_id, &body.token),
    })
}
