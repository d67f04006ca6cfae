//! Axum route handlers for the Consultation API.
//!
//! Every route resolves the caller through `MaybeOwner`. Without an identity the
//! route answers `204 No Content` and touches nothing.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::consultation::engine::AdviceTopic;
use crate::consultation::session::{self, ConsultationView, SendOutcome, SkipReason};
use crate::models::consultation::{ConsultationRow, ConsultationStatus};
use crate::errors::AppError;
use crate::routes::identity::MaybeOwner;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct TurnResponse {
    #[serde(flatten)]
    pub consultation: ConsultationView,
    pub advice_topic: AdviceTopic,
}

#[derive(Debug, Serialize)]
pub struct ResyncResponse {
    #[serde(flatten)]
    pub consultation: ConsultationView,
    pub written: bool,
}

/// One entry of the history listing. The message log itself is omitted.
#[derive(Debug, Serialize)]
pub struct ConsultationSummary {
    pub id: Uuid,
    pub topic: String,
    pub status: ConsultationStatus,
    pub message_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ConsultationRow> for ConsultationSummary {
    fn from(row: ConsultationRow) -> Self {
        Self {
            id: row.id,
            topic: row.topic,
            status: row.status,
            message_count: row.messages.len(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub consultations: Vec<ConsultationSummary>,
}

fn not_opened() -> AppError {
    AppError::NotFound("No consultation opened for this user".to_string())
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/consultations/active
///
/// Loads the caller's active consultation, creating a greeted one if needed.
pub async fn handle_open(
    State(state): State<AppState>,
    MaybeOwner(owner): MaybeOwner,
) -> Result<Response, AppError> {
    let Some(owner) = owner else {
        return Ok(StatusCode::NO_CONTENT.into_response());
    };

    let manager = state.sessions.manager_for(&owner).await;
    let mut manager = manager.lock().await;
    manager.load_or_create().await?;
    Ok(Json(manager.view()).into_response())
}

/// GET /api/v1/consultations/active
///
/// Returns the in-process view, including unsynced messages. 404 until opened.
pub async fn handle_get_active(
    State(state): State<AppState>,
    MaybeOwner(owner): MaybeOwner,
) -> Result<Response, AppError> {
    let Some(owner) = owner else {
        return Ok(StatusCode::NO_CONTENT.into_response());
    };

    let manager = state.sessions.existing(&owner).await.ok_or_else(not_opened)?;
    let manager = manager.lock().await;
    if !manager.is_ready() {
        return Err(not_opened());
    }
    Ok(Json(manager.view()).into_response())
}

/// GET /api/v1/consultations
///
/// Lists the caller's consultations, oldest first, straight from the store.
pub async fn handle_history(
    State(state): State<AppState>,
    MaybeOwner(owner): MaybeOwner,
) -> Result<Response, AppError> {
    let Some(owner) = owner else {
        return Ok(StatusCode::NO_CONTENT.into_response());
    };

    let rows = session::history(state.sessions.store(), &owner).await?;
    Ok(Json(HistoryResponse {
        consultations: rows.into_iter().map(ConsultationSummary::from).collect(),
    })
    .into_response())
}

/// POST /api/v1/consultations/messages
///
/// Runs one coach turn. Opens the consultation first if this owner has not yet.
pub async fn handle_send(
    State(state): State<AppState>,
    MaybeOwner(owner): MaybeOwner,
    Json(request): Json<SendMessageRequest>,
) -> Result<Response, AppError> {
    let Some(owner) = owner else {
        return Ok(StatusCode::NO_CONTENT.into_response());
    };
    if request.text.trim().is_empty() {
        return Err(AppError::Validation("text cannot be empty".to_string()));
    }

    let manager = state.sessions.manager_for(&owner).await;
    let mut manager = manager.lock().await;
    if !manager.is_ready() {
        manager.load_or_create().await?;
    }

    match manager.send(&request.text).await? {
        SendOutcome::Sent { topic, .. } => Ok(Json(TurnResponse {
            consultation: manager.view(),
            advice_topic: topic,
        })
        .into_response()),
        SendOutcome::Skipped(SkipReason::EmptyInput) => {
            Err(AppError::Validation("text cannot be empty".to_string()))
        }
        SendOutcome::Skipped(SkipReason::NotReady) => Err(not_opened()),
    }
}

/// POST /api/v1/consultations/resync
///
/// Rewrites the full log if a previous write failed.
pub async fn handle_resync(
    State(state): State<AppState>,
    MaybeOwner(owner): MaybeOwner,
) -> Result<Response, AppError> {
    let Some(owner) = owner else {
        return Ok(StatusCode::NO_CONTENT.into_response());
    };

    let manager = state.sessions.existing(&owner).await.ok_or_else(not_opened)?;
    let mut manager = manager.lock().await;
    let written = manager.resync().await?;
    Ok(Json(ResyncResponse {
        consultation: manager.view(),
        written,
    })
    .into_response())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use axum::Router;
    use serde_json::Value;
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::config::Config;
    use crate::consultation::prompts::{GREETING, INTERVIEW_ADVICE};
    use crate::consultation::testing::RecordingStore;
    use crate::routes::build_router;
    use crate::routes::identity::USER_ID_HEADER;
    use crate::state::AppState;

    fn state(store: Arc<RecordingStore>) -> AppState {
        let config = Config::from_lookup(|_| None).unwrap();
        AppState::new(config, store)
    }

    fn app(store: Arc<RecordingStore>) -> Router {
        build_router(state(store))
    }

    fn request(method: &str, uri: &str, user: Option<Uuid>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header(USER_ID_HEADER, user.to_string());
        }
        match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = app(Arc::new(RecordingStore::new()));
        let response = app
            .oneshot(request("GET", "/health", None, None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["store"], "memory");
    }

    #[tokio::test]
    async fn test_open_without_identity_is_a_no_op() {
        let store = Arc::new(RecordingStore::new());
        let response = app(store.clone())
            .oneshot(request("POST", "/api/v1/consultations/active", None, None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(store.find_count(), 0);
        assert_eq!(store.insert_count(), 0);
    }

    #[tokio::test]
    async fn test_malformed_identity_is_rejected() {
        let response = app(Arc::new(RecordingStore::new()))
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/consultations/active")
                    .header(USER_ID_HEADER, "not-a-uuid")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_open_then_send_then_get() {
        let store = Arc::new(RecordingStore::new());
        let app = app(store.clone());
        let user = Uuid::new_v4();

        let opened = app
            .clone()
            .oneshot(request("POST", "/api/v1/consultations/active", Some(user), None))
            .await
            .unwrap();
        assert_eq!(opened.status(), StatusCode::OK);
        let opened = json_body(opened).await;
        assert_eq!(opened["messages"].as_array().unwrap().len(), 1);
        assert_eq!(opened["messages"][0]["content"], GREETING);
        assert_eq!(opened["pending_sync"], false);

        let sent = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/v1/consultations/messages",
                Some(user),
                Some(serde_json::json!({"text": "Mock interview please"})),
            ))
            .await
            .unwrap();
        assert_eq!(sent.status(), StatusCode::OK);
        let sent = json_body(sent).await;
        assert_eq!(sent["advice_topic"], "interview");
        assert_eq!(sent["session_id"], opened["session_id"]);
        let messages = sent["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1]["role"], "user");
        assert_eq!(messages[2]["content"], INTERVIEW_ADVICE);

        let current = app
            .oneshot(request("GET", "/api/v1/consultations/active", Some(user), None))
            .await
            .unwrap();
        assert_eq!(current.status(), StatusCode::OK);
        assert_eq!(json_body(current).await["messages"], sent["messages"]);
        assert_eq!(store.updates().len(), 1);
    }

    #[tokio::test]
    async fn test_send_opens_session_on_first_use() {
        let store = Arc::new(RecordingStore::new());
        let response = app(store.clone())
            .oneshot(request(
                "POST",
                "/api/v1/consultations/messages",
                Some(Uuid::new_v4()),
                Some(serde_json::json!({"text": "career change ideas"})),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["advice_topic"], "career_transition");
        assert_eq!(store.insert_count(), 1);
        assert_eq!(store.updates().len(), 1);
    }

    #[tokio::test]
    async fn test_whitespace_message_is_rejected_without_writes() {
        let store = Arc::new(RecordingStore::new());
        let response = app(store.clone())
            .oneshot(request(
                "POST",
                "/api/v1/consultations/messages",
                Some(Uuid::new_v4()),
                Some(serde_json::json!({"text": "   "})),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(store.insert_count(), 0);
        assert!(store.updates().is_empty());
    }

    #[tokio::test]
    async fn test_get_before_open_is_not_found_and_registers_nothing() {
        let store = Arc::new(RecordingStore::new());
        let state = state(store.clone());
        let response = build_router(state.clone())
            .oneshot(request(
                "GET",
                "/api/v1/consultations/active",
                Some(Uuid::new_v4()),
                None,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(state.sessions.loaded_owners().await, 0);
        assert_eq!(store.find_count(), 0);
    }

    #[tokio::test]
    async fn test_store_outage_maps_to_503_and_resync_recovers() {
        let store = Arc::new(RecordingStore::new());
        let app = app(store.clone());
        let user = Uuid::new_v4();

        app.clone()
            .oneshot(request("POST", "/api/v1/consultations/active", Some(user), None))
            .await
            .unwrap();

        store.fail_writes(true);
        let failed = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/v1/consultations/messages",
                Some(user),
                Some(serde_json::json!({"text": "salary negotiation"})),
            ))
            .await
            .unwrap();
        assert_eq!(failed.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json_body(failed).await["error"]["code"], "STORE_UNAVAILABLE");

        let current = app
            .clone()
            .oneshot(request("GET", "/api/v1/consultations/active", Some(user), None))
            .await
            .unwrap();
        let current = json_body(current).await;
        assert_eq!(current["messages"].as_array().unwrap().len(), 3);
        assert_eq!(current["pending_sync"], true);

        store.fail_writes(false);
        let resynced = app
            .oneshot(request("POST", "/api/v1/consultations/resync", Some(user), None))
            .await
            .unwrap();
        assert_eq!(resynced.status(), StatusCode::OK);
        let resynced = json_body(resynced).await;
        assert_eq!(resynced["written"], true);
        assert_eq!(resynced["pending_sync"], false);
        assert_eq!(store.updates().len(), 1);
    }

    #[tokio::test]
    async fn test_resync_before_open_is_not_found_and_registers_nothing() {
        let state = state(Arc::new(RecordingStore::new()));
        let response = build_router(state.clone())
            .oneshot(request(
                "POST",
                "/api/v1/consultations/resync",
                Some(Uuid::new_v4()),
                None,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(state.sessions.loaded_owners().await, 0);
    }

    #[tokio::test]
    async fn test_send_after_row_vanished_is_404_then_recreates() {
        let store = Arc::new(RecordingStore::new());
        let app = app(store.clone());
        let user = Uuid::new_v4();

        let opened = app
            .clone()
            .oneshot(request("POST", "/api/v1/consultations/active", Some(user), None))
            .await
            .unwrap();
        let first: Uuid = json_body(opened).await["session_id"]
            .as_str()
            .unwrap()
            .parse()
            .unwrap();
        store.inner().remove(first).await;

        let send = |text: &str| {
            request(
                "POST",
                "/api/v1/consultations/messages",
                Some(user),
                Some(serde_json::json!({ "text": text })),
            )
        };
        let lost = app.clone().oneshot(send("resume help")).await.unwrap();
        assert_eq!(lost.status(), StatusCode::NOT_FOUND);

        let retried = app.oneshot(send("resume help")).await.unwrap();
        assert_eq!(retried.status(), StatusCode::OK);
        let retried = json_body(retried).await;
        assert_ne!(retried["session_id"], first.to_string());
        assert_eq!(retried["messages"].as_array().unwrap().len(), 3);
        assert_eq!(store.insert_count(), 2);
    }

    #[tokio::test]
    async fn test_history_lists_sessions_without_registering() {
        let store = Arc::new(RecordingStore::new());
        let state = state(store.clone());
        let user = Uuid::new_v4();

        let empty = build_router(state.clone())
            .oneshot(request("GET", "/api/v1/consultations", Some(user), None))
            .await
            .unwrap();
        assert_eq!(empty.status(), StatusCode::OK);
        assert_eq!(json_body(empty).await["consultations"], serde_json::json!([]));
        assert_eq!(state.sessions.loaded_owners().await, 0);

        build_router(state.clone())
            .oneshot(request(
                "POST",
                "/api/v1/consultations/messages",
                Some(user),
                Some(serde_json::json!({"text": "networking tips"})),
            ))
            .await
            .unwrap();
        let listed = build_router(state)
            .oneshot(request("GET", "/api/v1/consultations", Some(user), None))
            .await
            .unwrap();
        let listed = json_body(listed).await;
        let consultations = listed["consultations"].as_array().unwrap();
        assert_eq!(consultations.len(), 1);
        assert_eq!(consultations[0]["status"], "active");
        assert_eq!(consultations[0]["message_count"], 3);
        assert!(consultations[0].get("messages").is_none());
    }
}
