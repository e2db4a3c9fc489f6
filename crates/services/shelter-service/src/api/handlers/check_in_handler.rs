//! Check-in handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use std::borrow::Cow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use common::{AppError, AppResult};
use domain::{CheckInDetails, ExitChange, NewCheckIn, UpdateCheckIn, SUBJECT_CHECK_IN};

use crate::api::extractors::ValidatedJson;
use crate::api::state::AppState;

/// Check-in creation request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCheckInRequest {
    #[validate(custom(function = "not_nil"))]
    pub shelter_id: Uuid,
    #[validate(custom(function = "not_nil"))]
    pub person_id: Uuid,
    /// Defaults to now
    pub entry_time: Option<DateTime<Utc>>,
}

impl From<CreateCheckInRequest> for NewCheckIn {
    fn from(req: CreateCheckInRequest) -> Self {
        NewCheckIn {
            shelter_id: req.shelter_id,
            person_id: req.person_id,
            entry_time: req.entry_time,
        }
    }
}

/// Check-in update request.
///
/// `exit_time` absent leaves the exit unchanged, `null` reopens the
/// check-in and a timestamp closes it.
#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "exit_not_before_entry"))]
pub struct UpdateCheckInRequest {
    #[validate(custom(function = "not_nil"))]
    pub shelter_id: Uuid,
    pub entry_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "present")]
    pub exit_time: Option<Option<DateTime<Utc>>>,
}

impl From<UpdateCheckInRequest> for UpdateCheckIn {
    fn from(req: UpdateCheckInRequest) -> Self {
        UpdateCheckIn {
            shelter_id: req.shelter_id,
            entry_time: req.entry_time,
            exit: ExitChange::from(req.exit_time),
        }
    }
}

fn not_nil(id: &Uuid) -> Result<(), ValidationError> {
    if id.is_nil() {
        return Err(ValidationError::new("nil_id")
            .with_message(Cow::from("Identifier must not be the nil UUID")));
    }
    Ok(())
}

/// Only checks requests carrying both timestamps; the stored entry time is
/// checked again when the update is applied.
fn exit_not_before_entry(req: &UpdateCheckInRequest) -> Result<(), ValidationError> {
    if let (Some(entry), Some(Some(exit))) = (req.entry_time, req.exit_time) {
        if exit < entry {
            return Err(ValidationError::new("exit_before_entry")
                .with_message(Cow::from("Exit time cannot be earlier than entry time")));
        }
    }
    Ok(())
}

/// Mark a field as present, keeping an explicit `null` distinct from absence
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Create check-in routes
pub fn check_in_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_check_in))
        .route(
            "/:id",
            get(get_check_in).put(update_check_in).delete(delete_check_in),
        )
}

/// Check a person into a shelter
pub async fn create_check_in(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateCheckInRequest>,
) -> AppResult<(StatusCode, Json<CheckInDetails>)> {
    let details = state
        .services
        .check_ins()
        .create_check_in(payload.into())
        .await?;
    Ok((StatusCode::CREATED, Json(details)))
}

/// Get a check-in with its shelter and person
pub async fn get_check_in(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<CheckInDetails>> {
    let details = state.services.check_ins().get_check_in(id).await?;
    Ok(Json(details))
}

/// Move, close, reopen or re-time a check-in
pub async fn update_check_in(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateCheckInRequest>,
) -> AppResult<Json<CheckInDetails>> {
    let details = state
        .services
        .check_ins()
        .update_check_in(id, payload.into())
        .await?;
    Ok(Json(details))
}

/// Delete a check-in, releasing its bed if it was active
pub async fn delete_check_in(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    if state.services.check_ins().delete_check_in(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(SUBJECT_CHECK_IN))
    }
}
