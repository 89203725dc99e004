use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde_json::Value;

use crate::error::ApiResult;
use crate::routes::entities::lookup_entity;
use crate::state::AppState;

/// Entity schema introspection.
pub fn routes() -> Router<AppState> {
    Router::new().route("/api/{entity}/_schema", get(get_schema))
}

/// JSON-Schema style description of an entity's queryable fields.
async fn get_schema(
    State(state): State<AppState>,
    Path(entity): Path<String>,
) -> ApiResult<Json<Value>> {
    let def = lookup_entity(state.registry(), &entity)?;
    Ok(Json(def.fields.to_json_schema(&def.name)))
}
