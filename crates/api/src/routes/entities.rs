use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use zeroapp_core::criteria::{compile, Predicate};
use zeroapp_core::schema::{EntityDef, EntityRegistry, FieldSchema};
use zeroapp_core::store::{Page, Record, SortDir};
use zeroapp_fiql::parse_with_limit;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Collection routes: list/filter, create, bulk update, bulk delete.
pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/api/{entity}",
        get(list_records)
            .post(create_record)
            .put(update_records)
            .delete(delete_records),
    )
}

/// Query parameters of the listing endpoint. Everything besides `q` is
/// handled here at the gateway; only `q` reaches the query engine.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub q: Option<String>,
    pub include: Option<String>,
    pub exclude: Option<String>,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_dir: Option<SortDir>,
}

#[derive(Debug, Deserialize)]
pub struct IdsParams {
    pub ids: Option<String>,
}

/// GET /api/{entity}?q=...&include=...&offset=...&limit=...&sort_by=...
///
/// Filtered count-then-page listing; the filtered total travels in the
/// `X-Total-Count` header.
async fn list_records(
    State(state): State<AppState>,
    Path(entity): Path<String>,
    Query(params): Query<ListParams>,
) -> ApiResult<impl IntoResponse> {
    let def = lookup_entity(state.registry(), &entity)?;

    let predicate = params
        .q
        .as_deref()
        .map(|q| compile_query(q, &def.fields, state.config().max_query_length))
        .transpose()?;

    let page = build_page(&params, def, &state)?;

    let (total, records) = state
        .store()
        .list(&entity, predicate.as_ref(), &page)
        .await?;

    let include = params.include.as_deref().map(split_csv);
    let exclude = params.exclude.as_deref().map(split_csv);
    let items: Vec<Value> = records
        .iter()
        .map(|record| present(record, &def.fields, include.as_deref(), exclude.as_deref()))
        .collect();

    let mut headers = HeaderMap::new();
    let total_value = HeaderValue::from_str(&total.to_string())
        .map_err(|e| ApiError::Internal(format!("invalid X-Total-Count value: {e}")))?;
    headers.insert("x-total-count", total_value);

    tracing::debug!(entity = %entity, total, returned = items.len(), "listed records");
    Ok((headers, Json(items)))
}

/// POST /api/{entity} — create a record from the JSON body.
async fn create_record(
    State(state): State<AppState>,
    Path(entity): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<Json<Value>> {
    let def = lookup_entity(state.registry(), &entity)?;
    validate_body(&body, &def.fields, &entity)?;

    let record = state.store().insert(&entity, &body).await?;
    tracing::info!(entity = %entity, id = record.id, "created record");
    Ok(Json(present(&record, &def.fields, None, None)))
}

/// PUT /api/{entity}?ids=1,2,3 — merge the JSON body into every listed
/// record.
async fn update_records(
    State(state): State<AppState>,
    Path(entity): Path<String>,
    Query(params): Query<IdsParams>,
    Json(body): Json<Value>,
) -> ApiResult<Json<Value>> {
    let def = lookup_entity(state.registry(), &entity)?;
    let ids = parse_ids(params.ids.as_deref())?;
    validate_body(&body, &def.fields, &entity)?;

    let updated = state.store().update_many(&entity, &ids, &body).await?;
    tracing::info!(entity = %entity, updated, "bulk updated records");
    Ok(Json(json!({ "updated": updated })))
}

/// DELETE /api/{entity}?ids=1,2,3
async fn delete_records(
    State(state): State<AppState>,
    Path(entity): Path<String>,
    Query(params): Query<IdsParams>,
) -> ApiResult<Json<Value>> {
    lookup_entity(state.registry(), &entity)?;
    let ids = parse_ids(params.ids.as_deref())?;

    let deleted = state.store().delete_many(&entity, &ids).await?;
    tracing::info!(entity = %entity, deleted, "bulk deleted records");
    Ok(Json(json!({ "deleted": deleted })))
}

/// Resolve an entity name against the registry.
pub fn lookup_entity<'a>(
    registry: &'a EntityRegistry,
    name: &str,
) -> Result<&'a EntityDef, ApiError> {
    registry
        .get(name)
        .ok_or_else(|| ApiError::NotFound(format!("unknown entity '{name}'")))
}

/// Parse and compile a filter query, attaching the original string to any
/// error so the client sees what was rejected.
fn compile_query(
    q: &str,
    fields: &FieldSchema,
    max_len: usize,
) -> Result<Predicate, ApiError> {
    let expr = parse_with_limit(q, max_len).map_err(|e| ApiError::parse(e, q))?;
    compile(&expr, fields).map_err(|e| ApiError::compile(e, q))
}

/// Build the page settings from request parameters, validating the sort key
/// against the entity schema before it can reach SQL.
fn build_page(params: &ListParams, def: &EntityDef, state: &AppState) -> Result<Page, ApiError> {
    if let Some(key) = &params.sort_by {
        if def.fields.queryable(key).is_none() {
            return Err(ApiError::BadRequest(format!("unknown sort field '{key}'")));
        }
    }

    let config = state.config();
    Ok(Page {
        offset: params.offset.unwrap_or(0).max(0),
        limit: params
            .limit
            .unwrap_or(config.default_page_size)
            .clamp(1, config.max_page_size),
        sort_by: params.sort_by.clone(),
        sort_dir: params.sort_dir.unwrap_or_default(),
    })
}

/// Shape a stored record for the response: surrogate id plus the visible
/// (non-hidden) content fields, then the `include`/`exclude` projections.
/// `include` keeps `id` implicitly; `exclude` may remove anything.
pub fn present(
    record: &Record,
    fields: &FieldSchema,
    include: Option<&[String]>,
    exclude: Option<&[String]>,
) -> Value {
    let mut out = serde_json::Map::new();
    out.insert("id".to_string(), json!(record.id));
    for name in fields.visible_names() {
        if name == "id" {
            continue;
        }
        if let Some(value) = record.content.get(name) {
            out.insert(name.clone(), value.clone());
        }
    }

    if let Some(include) = include {
        out.retain(|key, _| key == "id" || include.iter().any(|name| name == key));
    }
    if let Some(exclude) = exclude {
        out.retain(|key, _| !exclude.iter().any(|name| name == key));
    }

    Value::Object(out)
}

/// Reject bodies that are not objects, reference fields the schema does not
/// declare, try to set the surrogate id, or carry values of the wrong type.
/// The type check mirrors the filter coercion rules, so everything a write
/// stores can later be filtered and sorted on without a failing cast.
pub fn validate_body(body: &Value, fields: &FieldSchema, entity: &str) -> Result<(), ApiError> {
    let obj = body
        .as_object()
        .ok_or_else(|| ApiError::BadRequest("request body must be a JSON object".to_string()))?;

    for (key, value) in obj {
        if key == "id" {
            return Err(ApiError::BadRequest(
                "field 'id' cannot be written".to_string(),
            ));
        }
        let def = fields.get(key).ok_or_else(|| {
            ApiError::BadRequest(format!("unknown field '{key}' for entity '{entity}'"))
        })?;
        if !def.field_type.accepts(value) {
            return Err(ApiError::BadRequest(format!(
                "invalid value for {} field '{key}'",
                def.field_type
            )));
        }
    }
    Ok(())
}

/// Parse the `ids=1,2,3` bulk-operation parameter.
fn parse_ids(ids: Option<&str>) -> Result<Vec<i64>, ApiError> {
    let raw = ids.ok_or_else(|| {
        ApiError::BadRequest("query parameter 'ids' is required".to_string())
    })?;

    let parsed: Result<Vec<i64>, _> = raw
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::parse::<i64>)
        .collect();

    match parsed {
        Ok(ids) if !ids.is_empty() => Ok(ids),
        Ok(_) => Err(ApiError::BadRequest(
            "query parameter 'ids' must list at least one id".to_string(),
        )),
        Err(_) => Err(ApiError::BadRequest(format!(
            "query parameter 'ids' must be a comma-separated list of integers, got '{raw}'"
        ))),
    }
}

fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use zeroapp_core::schema::FieldType;

    fn user_fields() -> FieldSchema {
        FieldSchema::new()
            .field("email", FieldType::Text)
            .field("confirmed_at", FieldType::DateTime)
            .hidden_field("password", FieldType::Text)
    }

    fn record(content: Value) -> Record {
        Record {
            id: 1,
            entity: "user".into(),
            content,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn present_strips_hidden_fields() {
        let rec = record(json!({"email": "a@b.c", "password": "hunter2"}));
        let out = present(&rec, &user_fields(), None, None);
        assert_eq!(out["id"], 1);
        assert_eq!(out["email"], "a@b.c");
        assert!(out.get("password").is_none());
    }

    #[test]
    fn present_include_keeps_id() {
        let rec = record(json!({"email": "a@b.c", "confirmed_at": "2024-01-01T00:00:00Z"}));
        let include = vec!["email".to_string()];
        let out = present(&rec, &user_fields(), Some(&include), None);
        let obj = out.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert!(obj.contains_key("id"));
        assert!(obj.contains_key("email"));
    }

    #[test]
    fn present_exclude_removes_fields() {
        let rec = record(json!({"email": "a@b.c", "confirmed_at": "2024-01-01T00:00:00Z"}));
        let exclude = vec!["email".to_string()];
        let out = present(&rec, &user_fields(), None, Some(&exclude));
        let obj = out.as_object().unwrap();
        assert!(!obj.contains_key("email"));
        assert!(obj.contains_key("confirmed_at"));
    }

    #[test]
    fn validate_body_accepts_hidden_fields_on_write() {
        let body = json!({"email": "a@b.c", "password": "secret"});
        assert!(validate_body(&body, &user_fields(), "user").is_ok());
    }

    #[test]
    fn validate_body_rejects_mistyped_values() {
        let fields = user_fields();
        // A stored garbage timestamp would make every later filter or sort
        // on the field fail its cast in the database.
        assert!(validate_body(&json!({"confirmed_at": "garbage"}), &fields, "user").is_err());
        assert!(validate_body(&json!({"email": 5}), &fields, "user").is_err());
        assert!(
            validate_body(&json!({"confirmed_at": "2024-01-01T00:00:00Z"}), &fields, "user")
                .is_ok()
        );
        assert!(validate_body(&json!({"confirmed_at": null}), &fields, "user").is_ok());
    }

    #[test]
    fn validate_body_rejects_unknown_and_id() {
        let fields = user_fields();
        assert!(validate_body(&json!({"nope": 1}), &fields, "user").is_err());
        assert!(validate_body(&json!({"id": 5}), &fields, "user").is_err());
        assert!(validate_body(&json!([1, 2]), &fields, "user").is_err());
    }

    #[test]
    fn parse_ids_happy_path_and_errors() {
        assert_eq!(parse_ids(Some("1,2,3")).unwrap(), vec![1, 2, 3]);
        assert_eq!(parse_ids(Some(" 4 , 5 ")).unwrap(), vec![4, 5]);
        assert!(parse_ids(None).is_err());
        assert!(parse_ids(Some("")).is_err());
        assert!(parse_ids(Some("1,x")).is_err());
    }

    #[test]
    fn compile_query_reports_bad_filters() {
        let fields = user_fields();
        let err = compile_query("bogus==1", &fields, 2048).unwrap_err();
        assert!(matches!(err, ApiError::QueryCompile { .. }));
        let err = compile_query("(email==a", &fields, 2048).unwrap_err();
        assert!(matches!(err, ApiError::QueryParse { .. }));
    }
}
