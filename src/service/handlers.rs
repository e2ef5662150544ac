//! Endpoint logic: authorization, owner-scoped filtering, and upsert
//! semantics over the DAO.
//!
//! Every handler decodes and validates first, then runs a self-contained
//! transaction against the DAO: one get for reads and deletes, a
//! get-then-push for upserts. There is deliberately no transaction across
//! the get and push of an upsert; two concurrent PUTs to the same
//! non-existent key may both observe the miss and both push, last writer
//! wins.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::error::StoreError;
use crate::model::{Item, Key, OwnableItem};
use crate::service::codec::{
    decode_bucket, decode_id, decode_item_body, decode_owner, AdminMode,
};
use crate::service::StoreHandler;

/// `GET /api/v1/store/{bucket}` -- list the items visible to the caller.
///
/// An admin with no owner claim sees the whole bucket; everyone else sees
/// the subset matching their claimed owner (the empty claim selects
/// public items). The response array is sorted ascending by id.
pub(crate) async fn get_all_items(
    State(handler): State<Arc<StoreHandler>>,
    Path(bucket): Path<String>,
    headers: HeaderMap,
    AdminMode(admin_mode): AdminMode,
) -> Result<Response, StoreError> {
    let bucket = decode_bucket(&handler.validators, &bucket)?;
    let owner = decode_owner(&handler.validators, &headers)?;

    let records = handler.dao.get_all(&bucket).await?;
    let everything = admin_mode && owner.is_empty();
    let mut items: Vec<Item> = records
        .into_values()
        .filter(|record| everything || record.owner == owner)
        .map(|record| record.item)
        .collect();
    items.sort_by(|a, b| a.id.cmp(&b.id));

    Ok((StatusCode::OK, Json(items)).into_response())
}

/// `GET /api/v1/store/{bucket}/{id}` -- fetch one item.
pub(crate) async fn get_item(
    State(handler): State<Arc<StoreHandler>>,
    Path((bucket, id)): Path<(String, String)>,
    headers: HeaderMap,
    AdminMode(admin_mode): AdminMode,
) -> Result<Response, StoreError> {
    let bucket = decode_bucket(&handler.validators, &bucket)?;
    let id = decode_id(&handler.validators, &id)?;
    let owner = decode_owner(&handler.validators, &headers)?;

    let record = handler.dao.get(&Key::new(bucket, id)).await?;
    if !(admin_mode || record.owner == owner) {
        return Err(StoreError::Forbidden);
    }
    Ok((StatusCode::OK, Json(record.item)).into_response())
}

/// `DELETE /api/v1/store/{bucket}/{id}` -- delete one item and return it.
pub(crate) async fn delete_item(
    State(handler): State<Arc<StoreHandler>>,
    Path((bucket, id)): Path<(String, String)>,
    headers: HeaderMap,
    AdminMode(admin_mode): AdminMode,
) -> Result<Response, StoreError> {
    let bucket = decode_bucket(&handler.validators, &bucket)?;
    let id = decode_id(&handler.validators, &id)?;
    let owner = decode_owner(&handler.validators, &headers)?;
    let key = Key::new(bucket, id);

    let record = handler.dao.get(&key).await?;
    if !(admin_mode || record.owner == owner) {
        return Err(StoreError::Forbidden);
    }
    handler.dao.delete(&key).await?;
    Ok((StatusCode::OK, Json(record.item)).into_response())
}

/// `PUT /api/v1/store/{bucket}/{id}` -- upsert one item.
///
/// Creating a fresh key claims it for the request's owner and responds
/// 201. Overwriting an existing key requires ownership or admin mode,
/// preserves the stored owner either way (ownership is never transferred
/// through this path), and responds 200.
pub(crate) async fn set_item(
    State(handler): State<Arc<StoreHandler>>,
    Path((bucket, id)): Path<(String, String)>,
    headers: HeaderMap,
    AdminMode(admin_mode): AdminMode,
    body: Bytes,
) -> Result<Response, StoreError> {
    let bucket = decode_bucket(&handler.validators, &bucket)?;
    let id = decode_id(&handler.validators, &id)?;
    let owner = decode_owner(&handler.validators, &headers)?;
    let item = decode_item_body(&handler.validators, &id, &body)?;
    let key = Key::new(bucket, id);

    match handler.dao.get(&key).await {
        Err(StoreError::NotFound) => {
            handler
                .dao
                .push(&key, &OwnableItem::new(item, owner))
                .await?;
            Ok(StatusCode::CREATED.into_response())
        }
        Ok(existing) => {
            if !(admin_mode || existing.owner == owner) {
                return Err(StoreError::Forbidden);
            }
            handler
                .dao
                .push(&key, &OwnableItem::new(item, existing.owner))
                .await?;
            Ok(StatusCode::OK.into_response())
        }
        Err(err) => Err(err),
    }
}
