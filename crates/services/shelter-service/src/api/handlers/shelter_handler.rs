//! Shelter handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use common::{AppError, AppResult};
use domain::{CheckIn, NewShelter, OccupancyReport, Shelter, UpdateShelter, SUBJECT_SHELTER};

use crate::api::extractors::ValidatedJson;
use crate::api::state::AppState;

/// Shelter creation request with validation
#[derive(Debug, Deserialize, Validate)]
pub struct CreateShelterRequest {
    #[validate(length(min = 1, max = 255, message = "Shelter name must be 1-255 characters"))]
    pub name: String,
    #[validate(range(min = 1, message = "Capacity must be greater than zero"))]
    pub capacity: i32,
    pub address_id: Option<Uuid>,
}

impl From<CreateShelterRequest> for NewShelter {
    fn from(req: CreateShelterRequest) -> Self {
        NewShelter {
            name: req.name,
            capacity: req.capacity,
            address_id: req.address_id,
        }
    }
}

/// Shelter update request; absent fields stay unchanged
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateShelterRequest {
    #[validate(length(min = 1, max = 255, message = "Shelter name must be 1-255 characters"))]
    pub name: Option<String>,
    #[validate(range(min = 1, message = "Capacity must be greater than zero"))]
    pub capacity: Option<i32>,
    pub address_id: Option<Uuid>,
}

impl From<UpdateShelterRequest> for UpdateShelter {
    fn from(req: UpdateShelterRequest) -> Self {
        UpdateShelter {
            name: req.name,
            capacity: req.capacity,
            address_id: req.address_id,
        }
    }
}

/// Filter for a shelter's check-in list
#[derive(Debug, Default, Deserialize)]
pub struct CheckInFilter {
    #[serde(default)]
    pub active: bool,
}

/// Create shelter routes
pub fn shelter_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_shelters).post(create_shelter))
        .route(
            "/:id",
            get(get_shelter).put(update_shelter).delete(delete_shelter),
        )
        .route("/:id/check-ins", get(list_shelter_check_ins))
        .route("/:id/occupancy/reconcile", post(reconcile_occupancy))
}

/// List all shelters
pub async fn list_shelters(State(state): State<AppState>) -> AppResult<Json<Vec<Shelter>>> {
    let shelters = state.services.shelters().list_shelters().await?;
    Ok(Json(shelters))
}

/// Create a shelter
pub async fn create_shelter(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateShelterRequest>,
) -> AppResult<(StatusCode, Json<Shelter>)> {
    let shelter = state
        .services
        .shelters()
        .create_shelter(payload.into())
        .await?;
    Ok((StatusCode::CREATED, Json(shelter)))
}

/// Get shelter by ID
pub async fn get_shelter(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Shelter>> {
    let shelter = state.services.shelters().get_shelter(id).await?;
    Ok(Json(shelter))
}

/// Update shelter name, capacity or address
pub async fn update_shelter(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateShelterRequest>,
) -> AppResult<Json<Shelter>> {
    let shelter = state
        .services
        .shelters()
        .update_shelter(id, payload.into())
        .await?;
    Ok(Json(shelter))
}

/// Delete an empty shelter
pub async fn delete_shelter(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    if state.services.shelters().delete_shelter(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(SUBJECT_SHELTER))
    }
}

/// List a shelter's check-ins, optionally only the active ones
pub async fn list_shelter_check_ins(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(filter): Query<CheckInFilter>,
) -> AppResult<Json<Vec<CheckIn>>> {
    let check_ins = state
        .services
        .check_ins()
        .list_check_ins(id, filter.active)
        .await?;
    Ok(Json(check_ins))
}

/// Recount active check-ins and reset the shelter's counter
pub async fn reconcile_occupancy(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<OccupancyReport>> {
    let report = state.services.check_ins().reconcile_occupancy(id).await?;
    Ok(Json(report))
}
