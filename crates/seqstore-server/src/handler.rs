use axum::extract::{Path, State};
use axum::http::{HeaderMap, Method, Uri};
use bytes::Bytes;
use tracing::error;

use seqstore_identity::{extract_metadata, CreateEntity, Entity, EntityId, ReplaceEntity};

use crate::error::{ServerError, ServerResult};
use crate::response::ApiResponse;
use crate::state::AppState;

const INVALID_ENTITY: &str = "Invalid entity passed in";

/// What a failed request is logged with.
struct RequestContext<'a> {
    method: &'a Method,
    uri: &'a Uri,
    identity_key: Option<&'a str>,
    body: &'a [u8],
}

impl RequestContext<'_> {
    fn fail(&self, err: impl Into<ServerError>) -> ServerError {
        let err = err.into();
        error!(
            method = %self.method,
            path = %self.uri.path(),
            identity_key = ?self.identity_key,
            body = %String::from_utf8_lossy(self.body),
            status = err.status().as_u16(),
            error = %err,
            "request failed"
        );
        err
    }
}

fn parse_entity(ctx: &RequestContext<'_>, body: &[u8]) -> ServerResult<Entity> {
    Entity::from_json(body).map_err(|e| {
        tracing::debug!(reason = %e, "rejecting request body");
        ctx.fail(ServerError::BadRequest(INVALID_ENTITY.into()))
    })
}

/// `POST /entities`: store the body under the next free id.
pub async fn post_entity(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> ServerResult<ApiResponse> {
    let ctx = RequestContext {
        method: &method,
        uri: &uri,
        identity_key: state.writer.identity_key(),
        body: &body,
    };
    let entity = parse_entity(&ctx, &body)?;
    let metadata = extract_metadata(state.metadata_keys(), Some(&headers));

    let created = CreateEntity::new(&*state.store, &state.writer, entity)
        .map_err(|e| ctx.fail(e))?
        .with_metadata(metadata)
        .execute()
        .await
        .map_err(|e| ctx.fail(e))?;

    Ok(ApiResponse::ok(created.id.get()))
}

/// `PUT /entities/{id}`: overwrite an existing entity.
pub async fn put_entity(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> ServerResult<ApiResponse> {
    let ctx = RequestContext {
        method: &method,
        uri: &uri,
        identity_key: state.writer.identity_key(),
        body: &body,
    };
    let entity = parse_entity(&ctx, &body)?;
    let id = raw_id.parse::<EntityId>().map_err(|e| ctx.fail(e))?;
    let metadata = extract_metadata(state.metadata_keys(), Some(&headers));

    ReplaceEntity::new(&*state.store, &state.writer, id.get(), entity)
        .map_err(|e| ctx.fail(e))?
        .with_metadata(metadata)
        .execute()
        .await
        .map_err(|e| ctx.fail(e))?;

    Ok(ApiResponse::ok("OK"))
}

/// `PUT /entities` with no id segment.
pub async fn put_missing_id(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> ServerResult<ApiResponse> {
    let ctx = RequestContext {
        method: &method,
        uri: &uri,
        identity_key: state.writer.identity_key(),
        body: &body,
    };
    Err(ctx.fail(ServerError::BadRequest(format!(
        "Missing identifier: {}",
        state.identity_label
    ))))
}

/// Liveness probe.
pub async fn health_handler() -> ApiResponse {
    ApiResponse::ok("OK")
}
