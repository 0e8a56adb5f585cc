//! `GET /ws/{id_user}`: realtime sales events for one user.

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Path, State};
use axum::response::Response;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub async fn connect(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    ws: WebSocketUpgrade,
) -> ApiResult<Response> {
    if state.db.users().get_by_id(&user_id).await?.is_none() {
        return Err(ApiError::not_found("User", &user_id));
    }

    let hub = state.hub.clone();
    Ok(ws.on_upgrade(move |socket| hub.handle_socket(socket, user_id)))
}
