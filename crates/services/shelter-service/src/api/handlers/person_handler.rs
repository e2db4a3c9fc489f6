//! Person handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use common::{AppError, AppResult, OptionExt};
use domain::{CheckIn, NewPerson, Person, UpdatePerson, SUBJECT_PERSON};

use crate::api::extractors::ValidatedJson;
use crate::api::state::AppState;

/// Person registration request with validation
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterPersonRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 32, message = "National ID must be 1-32 characters"))]
    pub national_id: String,
    pub birth_date: Option<NaiveDate>,
    pub medical_condition: Option<String>,
    #[serde(default)]
    pub missing: bool,
    pub emergency_contact: Option<String>,
}

impl From<RegisterPersonRequest> for NewPerson {
    fn from(req: RegisterPersonRequest) -> Self {
        NewPerson {
            name: req.name,
            national_id: req.national_id,
            birth_date: req.birth_date,
            medical_condition: req.medical_condition,
            missing: req.missing,
            emergency_contact: req.emergency_contact,
        }
    }
}

/// Person update request; absent fields stay unchanged
#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePersonRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 32, message = "National ID must be 1-32 characters"))]
    pub national_id: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub medical_condition: Option<String>,
    pub missing: Option<bool>,
    pub emergency_contact: Option<String>,
}

impl From<UpdatePersonRequest> for UpdatePerson {
    fn from(req: UpdatePersonRequest) -> Self {
        UpdatePerson {
            name: req.name,
            national_id: req.national_id,
            birth_date: req.birth_date,
            medical_condition: req.medical_condition,
            missing: req.missing,
            emergency_contact: req.emergency_contact,
        }
    }
}

/// Create person routes
pub fn person_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_people).post(register_person))
        .route("/:id", get(get_person).put(update_person).delete(delete_person))
        .route("/:id/check-in", get(get_active_check_in))
        .route("/:id/check-ins", get(list_person_check_ins))
}

/// List all people
pub async fn list_people(State(state): State<AppState>) -> AppResult<Json<Vec<Person>>> {
    let people = state.services.people().list_people().await?;
    Ok(Json(people))
}

/// Register a person
pub async fn register_person(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterPersonRequest>,
) -> AppResult<(StatusCode, Json<Person>)> {
    let person = state
        .services
        .people()
        .register_person(payload.into())
        .await?;
    Ok((StatusCode::CREATED, Json(person)))
}

/// Get person by ID
pub async fn get_person(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Person>> {
    let person = state.services.people().get_person(id).await?;
    Ok(Json(person))
}

/// Update a person's profile
pub async fn update_person(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdatePersonRequest>,
) -> AppResult<Json<Person>> {
    let person = state
        .services
        .people()
        .update_person(id, payload.into())
        .await?;
    Ok(Json(person))
}

/// Delete a person who is not checked in
pub async fn delete_person(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    if state.services.people().delete_person(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(SUBJECT_PERSON))
    }
}

/// The person's active check-in; 404 when they are not checked in
pub async fn get_active_check_in(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<CheckIn>> {
    let check_in = state
        .services
        .check_ins()
        .get_active_check_in_for_person(id)
        .await?
        .ok_or_not_found("Active check-in")?;
    Ok(Json(check_in))
}

/// The person's placement history
pub async fn list_person_check_ins(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<CheckIn>>> {
    let check_ins = state
        .services
        .check_ins()
        .list_check_ins_for_person(id)
        .await?;
    Ok(Json(check_ins))
}
