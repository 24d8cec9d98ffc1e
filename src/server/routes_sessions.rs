use axum::{extract::State, Json};

use super::AppContext;
use crate::streaming::StreamSession;

/// `GET /sessions`: live stream sessions.
pub async fn list_sessions(State(ctx): State<AppContext>) -> Json<Vec<StreamSession>> {
    let mut sessions = ctx.sessions.list_active_sessions();
    sessions.sort_by(|a, b| a.started_at.cmp(&b.started_at));
    Json(sessions)
}
