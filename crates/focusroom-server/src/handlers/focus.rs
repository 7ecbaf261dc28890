use axum::{extract::State, Json};

use focusroom_core::UserFocusSample;

use crate::state::AppState;

/// Roster sorted by focus level, highest first
#[tracing::instrument(skip(state))]
pub async fn leaderboard(State(state): State<AppState>) -> Json<Vec<UserFocusSample>> {
    Json(state.leaderboard())
}

/// Current roster in roster order
#[tracing::instrument(skip(state))]
pub async fn snapshot(State(state): State<AppState>) -> Json<Vec<UserFocusSample>> {
    Json(state.snapshot())
}
