use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};

use crate::error::ApiResult;
use crate::routes::entities::{lookup_entity, present, validate_body};
use crate::state::AppState;

/// Single-record routes: fetch, patch, delete by id.
pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/api/{entity}/{id}",
        get(get_record).put(update_record).delete(delete_record),
    )
}

/// GET /api/{entity}/{id}
async fn get_record(
    State(state): State<AppState>,
    Path((entity, id)): Path<(String, i64)>,
) -> ApiResult<Json<Value>> {
    let def = lookup_entity(state.registry(), &entity)?;
    let record = state.store().get(&entity, id).await?;
    Ok(Json(present(&record, &def.fields, None, None)))
}

/// PUT /api/{entity}/{id} — merge the JSON body into the record.
async fn update_record(
    State(state): State<AppState>,
    Path((entity, id)): Path<(String, i64)>,
    Json(body): Json<Value>,
) -> ApiResult<Json<Value>> {
    let def = lookup_entity(state.registry(), &entity)?;
    validate_body(&body, &def.fields, &entity)?;

    let record = state.store().update_by_id(&entity, id, &body).await?;
    tracing::info!(entity = %entity, id, "updated record");
    Ok(Json(present(&record, &def.fields, None, None)))
}

/// DELETE /api/{entity}/{id}
async fn delete_record(
    State(state): State<AppState>,
    Path((entity, id)): Path<(String, i64)>,
) -> ApiResult<Json<Value>> {
    lookup_entity(state.registry(), &entity)?;
    state.store().delete_by_id(&entity, id).await?;
    tracing::info!(entity = %entity, id, "deleted record");
    Ok(Json(json!({ "status": "ok" })))
}
