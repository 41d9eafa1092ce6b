//! HTTP routes.

use crate::{
    state::AppState,
    system::{CELL_PROMPT, COLUMN_PROMPT, system_message},
};
use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use ccore::{CellRequest, ChatRequest, ColumnRequest, Message, ModelFactory, Tool};
use runtime::{Column, Frame};
use serde_json::json;
use std::convert::Infallible;
use tokio::sync::mpsc;

/// Build the axum router with the chat, grid and function endpoints.
pub fn router<F: ModelFactory>(state: AppState<F>) -> Router {
    Router::new()
        .route("/api/chat", post(chat::<F>))
        .route("/api/grid/column", post(column::<F>))
        .route("/api/grid/cell", post(cell::<F>))
        .route("/api/functions", get(functions::<F>))
        .with_state(state)
}

/// Run one turn and stream its frames.
///
/// The turn runs on its own task; dropping the response body (the caller
/// disconnected) abandons it on its next write.
async fn chat<F: ModelFactory>(
    State(state): State<AppState<F>>,
    Json(request): Json<ChatRequest>,
) -> Response {
    let system = system_message(&state.prompt, &request.data.settings.custom_instructions);
    let rx = match state.runtime.turn(system, request) {
        Ok(turn) => turn.spawn(),
        Err(e) => {
            tracing::error!("failed to start turn: {e:#}");
            let (channel, rx) = runtime::channel();
            let _ = channel.error(format!("{e:#}"));
            channel.close();
            rx
        }
    };

    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(frames(rx)),
    )
        .into_response()
}

/// Fill the primary column of a grid.
///
/// Responds `{"success": true, "grid": ..}` when a function produced the
/// rows, and `{"success": false, "message": ..}` when the model answered
/// in text instead.
async fn column<F: ModelFactory>(
    State(state): State<AppState<F>>,
    Json(request): Json<ColumnRequest>,
) -> Response {
    let outcome = match state.runtime.grid(&request.settings) {
        Ok(action) => {
            action
                .column(Message::system(COLUMN_PROMPT), &request.query)
                .await
        }
        Err(e) => Err(e),
    };

    match outcome {
        Ok(Column::Grid(grid)) => Json(json!({ "success": true, "grid": grid })).into_response(),
        Ok(Column::Answer(message)) => {
            Json(json!({ "success": false, "message": message })).into_response()
        }
        Err(e) => failure("grid column", e),
    }
}

/// Answer one grid cell.
async fn cell<F: ModelFactory>(
    State(state): State<AppState<F>>,
    Json(request): Json<CellRequest>,
) -> Response {
    let outcome = match state.runtime.grid(&request.settings) {
        Ok(action) => action.cell(Message::system(CELL_PROMPT), request).await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(cell) => Json(cell).into_response(),
        Err(e) => failure("grid cell", e),
    }
}

fn failure(action: &str, e: anyhow::Error) -> Response {
    tracing::error!("{action} failed: {e:#}");
    (
        StatusCode::BAD_GATEWAY,
        Json(json!({ "success": false, "message": format!("{e:#}") })),
    )
        .into_response()
}

/// List the registered function schemas.
async fn functions<F: ModelFactory>(State(state): State<AppState<F>>) -> Json<Vec<Tool>> {
    Json(state.runtime.registry().tools().cloned().collect())
}

/// Encode frames as data-stream lines until the turn closes its channel.
fn frames(
    mut rx: mpsc::UnboundedReceiver<Frame>,
) -> impl futures_core::Stream<Item = Result<String, Infallible>> + Send {
    async_stream::stream! {
        while let Some(frame) = rx.recv().await {
            match frame.encode() {
                Ok(line) => yield Ok(line),
                Err(e) => tracing::warn!("failed to encode frame: {e}"),
            }
        }
    }
}
