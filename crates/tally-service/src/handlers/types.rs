//! Points-type registry handlers.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use tally_core::PointsType;

use crate::auth::ServiceAuth;
use crate::error::ApiError;
use crate::state::AppState;

/// Type list response.
#[derive(Debug, Serialize)]
pub struct ListTypesResponse {
    /// Registered types keyed by slug.
    pub types: BTreeMap<String, PointsType>,
}

/// List registered points types.
pub async fn list_types(
    State(state): State<Arc<AppState>>,
    _auth: ServiceAuth,
) -> Result<Json<ListTypesResponse>, ApiError> {
    let types = state.ledger.points_types().all()?;
    Ok(Json(ListTypesResponse { types }))
}

/// Type creation or update request.
#[derive(Debug, Deserialize)]
pub struct TypeSettingsRequest {
    /// Display name. The slug is derived from it at creation.
    pub name: String,
    /// Display prefix.
    #[serde(default)]
    pub prefix: String,
    /// Display suffix.
    #[serde(default)]
    pub suffix: String,
    /// Minimum balance override.
    pub minimum: Option<i64>,
    /// Balance storage key override.
    pub storage_key: Option<String>,
}

impl From<TypeSettingsRequest> for PointsType {
    fn from(body: TypeSettingsRequest) -> Self {
        Self {
            name: body.name,
            prefix: body.prefix,
            suffix: body.suffix,
            minimum: body.minimum,
            storage_key: body.storage_key,
        }
    }
}

/// Type creation response.
#[derive(Debug, Serialize)]
pub struct CreateTypeResponse {
    /// The slug derived from the display name.
    pub slug: String,
}

/// Register a new points type.
pub async fn create_type(
    State(state): State<Arc<AppState>>,
    _auth: ServiceAuth,
    Json(body): Json<TypeSettingsRequest>,
) -> Result<Json<CreateTypeResponse>, ApiError> {
    let settings = PointsType::from(body);

    if let Ok(slug) = tally_core::points_type_slug(&settings.name) {
        if state.ledger.points_types().is_valid(&slug)? {
            return Err(ApiError::Conflict(format!(
                "points type already exists: {slug}"
            )));
        }
    }

    let slug = state.ledger.points_types().create(settings)?;
    Ok(Json(CreateTypeResponse { slug }))
}

/// Get one points type's settings.
pub async fn get_type(
    State(state): State<Arc<AppState>>,
    _auth: ServiceAuth,
    Path(slug): Path<String>,
) -> Result<Json<PointsType>, ApiError> {
    let settings = state
        .ledger
        .points_types()
        .get(&slug)?
        .ok_or_else(|| ApiError::NotFound(format!("points type not found: {slug}")))?;

    Ok(Json(settings))
}

/// Replace a points type's settings. The slug stays fixed even if the
/// display name changes.
pub async fn update_type(
    State(state): State<Arc<AppState>>,
    _auth: ServiceAuth,
    Path(slug): Path<String>,
    Json(body): Json<TypeSettingsRequest>,
) -> Result<Json<PointsType>, ApiError> {
    if !state.ledger.points_types().is_valid(&slug)? {
        return Err(ApiError::NotFound(format!("points type not found: {slug}")));
    }

    let settings = PointsType::from(body);
    state.ledger.points_types().update(&slug, settings.clone())?;

    Ok(Json(settings))
}

/// Delete a points type, cascading to its balances and log entries.
pub async fn delete_type(
    State(state): State<Arc<AppState>>,
    _auth: ServiceAuth,
    Path(slug): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !state.ledger.points_types().is_valid(&slug)? {
        return Err(ApiError::NotFound(format!("points type not found: {slug}")));
    }

    state.ledger.delete_points_type(&slug)?;

    Ok(Json(serde_json::json!({ "deleted": slug })))
}

/// Default points type response.
#[derive(Debug, Serialize)]
pub struct DefaultTypeResponse {
    /// The default points type slug, if one is set and still registered.
    pub slug: Option<String>,
}

/// Get the default points type.
pub async fn get_default_type(
    State(state): State<Arc<AppState>>,
    _auth: ServiceAuth,
) -> Result<Json<DefaultTypeResponse>, ApiError> {
    let slug = state.ledger.points_types().default_points_type()?;
    Ok(Json(DefaultTypeResponse { slug }))
}

/// Default points type request.
#[derive(Debug, Deserialize)]
pub struct SetDefaultTypeRequest {
    /// The slug to set as default, or `null` to clear it.
    pub slug: Option<String>,
}

/// Set or clear the default points type.
pub async fn set_default_type(
    State(state): State<Arc<AppState>>,
    _auth: ServiceAuth,
    Json(body): Json<SetDefaultTypeRequest>,
) -> Result<Json<DefaultTypeResponse>, ApiError> {
    state
        .ledger
        .points_types()
        .set_default_points_type(body.slug.as_deref())?;

    Ok(Json(DefaultTypeResponse { slug: body.slug }))
}
