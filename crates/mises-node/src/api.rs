//! HTTP API server for the Mises node.
//!
//! Provides REST endpoints for node status, metrics, DID registration,
//! profile and relation updates, and the identity query surface.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;

use mises_core::{
    MsgCreateDidRegistry, MsgCreateDidRegistryResponse, MsgUpdateAppInfo, MsgUpdateUserInfo,
    MsgUpdateUserRelation, PageRequest, QueryAppRequest, QueryAppResponse, QueryDidRequest,
    QueryDidResponse, QueryUserRelationRequest, QueryUserRelationResponse, QueryUserRequest,
    QueryUserResponse,
};
use mises_identity::IdentityError;

use crate::commands::{NodeCommand, Reply};
use crate::state::NodeState;

// --- Request / response types ---

#[derive(Serialize)]
pub struct StatusResponse {
    pub version: String,
    pub applied_msgs: u64,
    pub uptime_secs: u64,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Acknowledges a state transition with no payload.
#[derive(Serialize)]
pub struct AckResponse {
    pub status: String,
}

#[derive(Deserialize)]
pub struct UpdateUserInfoBody {
    pub creator: String,
    #[serde(default)]
    pub enc_data: String,
    #[serde(default)]
    pub iv: String,
    #[serde(default)]
    pub version: u64,
}

#[derive(Deserialize)]
pub struct UpdateAppInfoBody {
    pub creator: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(default)]
    pub developer: String,
    #[serde(default)]
    pub home_url: String,
    #[serde(default)]
    pub icon_url: String,
    #[serde(default)]
    pub version: u64,
}

#[derive(Deserialize)]
pub struct RelationsParams {
    #[serde(default)]
    pub filter: String,
    pub key: Option<String>,
    pub limit: Option<u64>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error_status(e: &IdentityError) -> StatusCode {
    match e {
        IdentityError::InvalidArgument(_)
        | IdentityError::InvalidDid(_)
        | IdentityError::UnsupportedDidType(_)
        | IdentityError::InvalidPublicKey(_) => StatusCode::BAD_REQUEST,
        IdentityError::Unauthorized(_) => StatusCode::FORBIDDEN,
        IdentityError::NotFound(_) => StatusCode::NOT_FOUND,
        IdentityError::AlreadyExists(_) => StatusCode::CONFLICT,
        IdentityError::AccountCreationFailed(_) | IdentityError::Store(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn api_error(status: StatusCode, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
}

/// Send a command to the event loop and await its reply.
async fn dispatch<T>(
    state: &NodeState,
    make: impl FnOnce(Reply<T>) -> NodeCommand,
) -> Result<T, ApiError> {
    let (reply_tx, reply_rx) = oneshot::channel();

    state.command_tx.send(make(reply_tx)).await.map_err(|_| {
        api_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "node event loop not running",
        )
    })?;

    match reply_rx.await {
        Ok(Ok(resp)) => Ok(resp),
        Ok(Err(e)) => Err(api_error(error_status(&e), e.to_string())),
        Err(_) => Err(api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "event loop dropped the reply channel",
        )),
    }
}

fn ack() -> Json<AckResponse> {
    Json(AckResponse { status: "ok".into() })
}

// --- Handlers ---

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
    })
}

async fn handle_status(State(state): State<Arc<NodeState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        applied_msgs: state.applied_msgs(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

async fn handle_metrics(State(state): State<Arc<NodeState>>) -> Json<BTreeMap<String, u64>> {
    Json(state.metrics.snapshot())
}

async fn handle_create_did(
    State(state): State<Arc<NodeState>>,
    Json(msg): Json<MsgCreateDidRegistry>,
) -> Result<Json<MsgCreateDidRegistryResponse>, ApiError> {
    dispatch(&state, |reply| NodeCommand::CreateDidRegistry { msg, reply })
        .await
        .map(Json)
}

async fn handle_query_did(
    State(state): State<Arc<NodeState>>,
    Path(mises_id): Path<String>,
) -> Result<Json<QueryDidResponse>, ApiError> {
    let req = QueryDidRequest { mises_id };
    dispatch(&state, |reply| NodeCommand::QueryDid { req, reply })
        .await
        .map(Json)
}

async fn handle_query_user(
    State(state): State<Arc<NodeState>>,
    Path(mises_id): Path<String>,
) -> Result<Json<QueryUserResponse>, ApiError> {
    let req = QueryUserRequest { mises_id };
    dispatch(&state, |reply| NodeCommand::QueryUser { req, reply })
        .await
        .map(Json)
}

async fn handle_update_user(
    State(state): State<Arc<NodeState>>,
    Path(mises_id): Path<String>,
    Json(body): Json<UpdateUserInfoBody>,
) -> Result<Json<AckResponse>, ApiError> {
    let msg = MsgUpdateUserInfo {
        creator: body.creator,
        uid: mises_id,
        enc_data: body.enc_data,
        iv: body.iv,
        version: body.version,
    };
    dispatch(&state, |reply| NodeCommand::UpdateUserInfo { msg, reply }).await?;
    Ok(ack())
}

async fn handle_query_app(
    State(state): State<Arc<NodeState>>,
    Path(mises_id): Path<String>,
) -> Result<Json<QueryAppResponse>, ApiError> {
    let req = QueryAppRequest { mises_id };
    dispatch(&state, |reply| NodeCommand::QueryApp { req, reply })
        .await
        .map(Json)
}

async fn handle_update_app(
    State(state): State<Arc<NodeState>>,
    Path(mises_id): Path<String>,
    Json(body): Json<UpdateAppInfoBody>,
) -> Result<Json<AckResponse>, ApiError> {
    let msg = MsgUpdateAppInfo {
        creator: body.creator,
        appid: mises_id,
        name: body.name,
        domains: body.domains,
        developer: body.developer,
        home_url: body.home_url,
        icon_url: body.icon_url,
        version: body.version,
    };
    dispatch(&state, |reply| NodeCommand::UpdateAppInfo { msg, reply }).await?;
    Ok(ack())
}

async fn handle_update_relation(
    State(state): State<Arc<NodeState>>,
    Json(msg): Json<MsgUpdateUserRelation>,
) -> Result<Json<AckResponse>, ApiError> {
    dispatch(&state, |reply| NodeCommand::UpdateUserRelation { msg, reply }).await?;
    Ok(ack())
}

async fn handle_query_relations(
    State(state): State<Arc<NodeState>>,
    Path(mises_id): Path<String>,
    Query(params): Query<RelationsParams>,
) -> Result<Json<QueryUserRelationResponse>, ApiError> {
    let pagination = match (params.key, params.limit) {
        (None, None) => None,
        (key, limit) => Some(PageRequest {
            key: key.unwrap_or_default(),
            limit: limit.unwrap_or(0),
        }),
    };
    let req = QueryUserRelationRequest {
        mises_id,
        filter: params.filter,
        pagination,
    };
    dispatch(&state, |reply| NodeCommand::QueryUserRelation { req, reply })
        .await
        .map(Json)
}

// --- Server ---

pub fn build_router(state: Arc<NodeState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(handle_health))
        .route("/api/v1/status", get(handle_status))
        .route("/api/v1/metrics", get(handle_metrics))
        .route("/api/v1/did", post(handle_create_did))
        .route("/api/v1/did/{mises_id}", get(handle_query_did))
        .route(
            "/api/v1/user/{mises_id}",
            get(handle_query_user).put(handle_update_user),
        )
        .route(
            "/api/v1/app/{mises_id}",
            get(handle_query_app).put(handle_update_app),
        )
        .route("/api/v1/user/{mises_id}/relations", get(handle_query_relations))
        .route("/api/v1/relations", post(handle_update_relation))
        .with_state(state)
}

pub async fn start_api_server(
    listen_addr: SocketAddr,
    state: Arc<NodeState>,
) -> anyhow::Result<()> {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    tracing::info!(%listen_addr, "HTTP API server started");
    axum::serve(listener, app).await?;
    Ok(())
}
