use crate::auth::session_token;
use crate::config::TrackerConfig;
use crate::errors::AppError;
use crate::intents::Intent;
use crate::models::{
    AuthStatusResponse, LoginRequest, LoginResponse, StatsResponse, StoredDocument,
    SuccessResponse,
};
use crate::state::AppState;
use crate::stats::recompute_stats_now;
use crate::storage::{load_document, persist_document, read_document};
use crate::ui::render_index;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header::SET_COOKIE, HeaderMap},
    response::{Html, IntoResponse},
    Json,
};
use serde_json::Value;
use tracing::{error, info, warn};

pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(render_index(&state.config))
}

pub async fn get_config(State(state): State<AppState>) -> Json<TrackerConfig> {
    Json(state.config.as_ref().clone())
}

pub async fn auth_check(State(state): State<AppState>, headers: HeaderMap) -> Json<AuthStatusResponse> {
    let token = session_token(&headers);
    Json(AuthStatusResponse {
        authenticated: state.guard.check(token.as_deref()),
    })
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;
    let token = state.guard.login(&payload.password).inspect_err(|_| {
        warn!("rejected login attempt");
    })?;

    info!("editor logged in");
    Ok((
        [(SET_COOKIE, state.guard.session_cookie(&token))],
        Json(LoginResponse {
            success: true,
            error: None,
        }),
    ))
}

pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(SET_COOKIE, state.guard.logout_cookie())],
        Json(SuccessResponse { success: true }),
    )
}

pub async fn get_data(State(state): State<AppState>) -> Json<StoredDocument> {
    Json(load_document(&state.data_path).await)
}

pub async fn put_data(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<SuccessResponse>, AppError> {
    require_editor(&state, &headers)?;

    let document = payload
        .ok()
        .and_then(|Json(value)| StoredDocument::from_value(value))
        .ok_or_else(|| {
            warn!("rejected tracker data that is not a JSON object");
            AppError::InvalidShape
        })?;

    let _guard = state.write_lock.lock().await;
    persist_document(&state.data_path, &document)
        .await
        .inspect_err(|err| error!(error = ?err, "failed to save tracker data"))?;

    Ok(Json(SuccessResponse { success: true }))
}

pub async fn get_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let document = load_document(&state.data_path).await;
    Json(recompute_stats_now(&state.config, &document.view()))
}

pub async fn apply_intent(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<Intent>, JsonRejection>,
) -> Result<Json<StatsResponse>, AppError> {
    require_editor(&state, &headers)?;
    let Json(intent) = payload?;

    let _guard = state.write_lock.lock().await;
    // a failed read must not be mistaken for an empty document and saved over
    let mut document = read_document(&state.data_path)
        .await
        .inspect_err(|err| error!(error = ?err, "failed to read tracker data"))?;
    intent.apply(&state.config, &mut document)?;
    persist_document(&state.data_path, &document)
        .await
        .inspect_err(|err| error!(error = ?err, "failed to save tracker data"))?;

    Ok(Json(recompute_stats_now(&state.config, &document.view())))
}

fn require_editor(state: &AppState, headers: &HeaderMap) -> Result<(), AppError> {
    let token = session_token(headers);
    if state.guard.check(token.as_deref()) {
        Ok(())
    } else {
        Err(AppError::Unauthorized)
    }
}
