use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};

use crate::commit::{CommitType, MessageLength};
use crate::config::ProjectConfig;
use crate::error::SessionError;
use crate::session::{ProposalRequest, Session};

use super::AppState;

const GENERIC_ERROR: &str = "An error occurred while generating the commit message.";

/// Error returned from a handler, rendered as `{"error": "..."}`.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Session(SessionError),
}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        ApiError::Session(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Session(e) => {
                let status = StatusCode::from_u16(e.status_code())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                if e.is_user_facing() {
                    (status, e.to_string())
                } else {
                    error!("Request failed: {e}");
                    (status, GENERIC_ERROR.to_string())
                }
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

fn default_commit_type() -> String {
    "feat".to_string()
}

/// Body of `POST /generateCommitMessage`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(default = "default_commit_type")]
    pub commit_type: String,
    #[serde(default)]
    pub custom_message: String,
    #[serde(default)]
    pub project_dir: String,
    #[serde(default)]
    pub auto_commit: bool,
    #[serde(default)]
    pub length: Option<String>,
    #[serde(default)]
    pub init_repo: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub commit_message: String,
    pub experience: usize,
    pub enemies_slain: usize,
    pub boost: u32,
    pub boost_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_commit_response: Option<String>,
}

/// Body of `POST /setup`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupRequest {
    #[serde(default)]
    pub project_dir: String,
    #[serde(default)]
    pub create_config: String,
    pub language: Option<String>,
    pub framework: Option<String>,
    pub specialization: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupResponse {
    pub message: String,
    pub config: ProjectConfig,
    pub project_dir: String,
}

pub(super) async fn generate_commit_message(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let Json(body) = payload?;

    let commit_type: CommitType = body
        .commit_type
        .parse()
        .map_err(|e: crate::error::InvalidCommitType| ApiError::BadRequest(e.to_string()))?;
    let length = match body.length.as_deref() {
        Some(length) => length.parse::<MessageLength>().map_err(ApiError::BadRequest)?,
        None => MessageLength::default(),
    };

    let project_dir = state.project_dir(&body.project_dir);
    let mut session = Session::new(project_dir, state.generator.clone(), state.options)?;
    session.load_config()?;
    session.open_repository(body.init_repo)?;

    let request = ProposalRequest {
        commit_type,
        custom_message: body.custom_message,
        length,
        ..ProposalRequest::default()
    };
    let proposal = session.propose(&request).await?;
    let Some(message) = proposal.messages.first() else {
        return Err(SessionError::NoChanges.into());
    };

    let auto_commit_response = if body.auto_commit {
        let oid = session.accept(message, true)?;
        oid.map(|oid| format!("Committed {oid} with message: {message}"))
    } else {
        None
    };

    Ok(Json(GenerateResponse {
        commit_message: message.text(),
        experience: proposal.score.total_experience(),
        enemies_slain: proposal.score.enemies_slain,
        boost: proposal.score.boost,
        boost_message: proposal.score.boost_message,
        auto_commit_response,
    }))
}

pub(super) async fn setup(
    State(state): State<AppState>,
    payload: Result<Json<SetupRequest>, JsonRejection>,
) -> Result<Json<SetupResponse>, ApiError> {
    let Json(body) = payload?;

    let project_dir = state.project_dir(&body.project_dir);
    let mut session = Session::new(project_dir, state.generator.clone(), state.options)?;

    let (message, config) = if body.create_config.trim().eq_ignore_ascii_case("yes") {
        let config = ProjectConfig::new(
            body.language.unwrap_or_default(),
            body.framework.unwrap_or_default(),
            body.specialization.unwrap_or_default(),
        );
        let config = session.setup(config)?.clone();
        info!(dir = %session.project_dir().display(), "Saved project configuration");
        ("Configuration saved.", config)
    } else {
        ("Configuration loaded.", session.load_config()?.clone())
    };

    Ok(Json(SetupResponse {
        message: message.to_string(),
        config,
        project_dir: session.project_dir().display().to_string(),
    }))
}
