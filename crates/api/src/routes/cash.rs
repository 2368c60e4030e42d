//! Cash register routes: movements, closures and the open-ledger summary.

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection, rejection::QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Value, json};
use tracing::info;
use uuid::Uuid;

use crate::{AppState, error::ApiError};
use lavo_core::cash::validation::{RangeBound, parse_range_bound};
use lavo_core::cash::{
    CashError, MovementPatchPayload, MovementPayload, MovementType, TypeTotal, validate_counted_amount,
    validate_new, validate_patch,
};
use lavo_db::entities::{cash_closures, cash_movements};
use lavo_db::repositories::{
    CashRepository, ClosureFilter, MovementWithStaff, OpenLedgerSummary, StaffSummary,
};
use lavo_shared::types::{CashClosureId, CashMovementId, UserId};

/// Creates the cash register routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/cash/movements", get(list_movements).post(create_movement))
        .route(
            "/cash/movements/{id}",
            patch(update_movement).delete(delete_movement),
        )
        .route("/cash/closures", get(list_closures).post(close_register))
        .route("/cash/closures/last", get(last_closure))
        .route("/cash/closures/{id}", get(closure_detail))
        .route("/cash/summary", get(open_ledger_summary))
}

// ============================================================================
// Requests
// ============================================================================

/// Request body for recording a movement.
///
/// `type` and `amount` are kept as raw JSON so wrong shapes surface as
/// domain errors rather than body rejections.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMovementRequest {
    /// Movement type.
    #[serde(rename = "type")]
    pub movement_type: Option<Value>,
    /// Amount, JSON number or numeric string.
    pub amount: Option<Value>,
    /// Optional note.
    pub note: Option<String>,
    /// Staff member reference.
    pub person_user_id: Option<UserId>,
    /// Free-text person name.
    pub person: Option<String>,
    /// Movement time, defaults to now.
    pub movement_at: Option<DateTime<Utc>>,
}

/// Request body for a partial movement update.
///
/// `type` and `amount` cannot be cleared, so an explicit `null` is kept
/// apart from an absent field and rejected.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMovementRequest {
    /// New movement type.
    #[serde(rename = "type", default, deserialize_with = "double_option")]
    pub movement_type: Option<Option<Value>>,
    /// New amount.
    #[serde(default, deserialize_with = "double_option")]
    pub amount: Option<Option<Value>>,
    /// New note, `null` clears it.
    #[serde(default, deserialize_with = "double_option")]
    pub note: Option<Option<String>>,
    /// New staff reference, `null` clears it.
    #[serde(default, deserialize_with = "double_option")]
    pub person_user_id: Option<Option<UserId>>,
    /// New person name, `null` clears it.
    #[serde(default, deserialize_with = "double_option")]
    pub person: Option<Option<String>>,
}

/// Request body for closing the register.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseRegisterRequest {
    /// Physically counted amount.
    pub counted_amount: Option<Value>,
    /// Optional notes.
    pub notes: Option<String>,
    /// Operator performing the close.
    pub user_id: Option<Value>,
}

/// Query parameters for listing closures.
#[derive(Debug, Default, Deserialize)]
pub struct ClosureRangeQuery {
    /// Inclusive lower bound (RFC 3339 or `YYYY-MM-DD`).
    pub from: Option<String>,
    /// Inclusive upper bound (RFC 3339 or `YYYY-MM-DD`).
    pub to: Option<String>,
}

/// Distinguishes an absent field from an explicit `null`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Textual form of a scalar JSON value, `None` for `null`.
fn value_text(value: Option<Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

impl From<CreateMovementRequest> for MovementPayload {
    fn from(req: CreateMovementRequest) -> Self {
        Self {
            movement_type: value_text(req.movement_type),
            amount: value_text(req.amount),
            note: req.note,
            person_user_id: req.person_user_id,
            person: req.person,
            movement_at: req.movement_at,
        }
    }
}

/// Text of a field that may be omitted but never set to `null`.
fn non_null_text(
    value: Option<Option<Value>>,
    on_null: impl FnOnce() -> CashError,
) -> Result<Option<String>, CashError> {
    match value {
        None => Ok(None),
        Some(value) => value_text(value).map(Some).ok_or_else(on_null),
    }
}

impl TryFrom<UpdateMovementRequest> for MovementPatchPayload {
    type Error = CashError;

    fn try_from(req: UpdateMovementRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            movement_type: non_null_text(req.movement_type, || {
                CashError::InvalidType("null".to_string())
            })?,
            amount: non_null_text(req.amount, || {
                CashError::InvalidAmount("amount cannot be null".to_string())
            })?,
            note: req.note,
            person_user_id: req.person_user_id,
            person: req.person,
        })
    }
}

// ============================================================================
// Responses
// ============================================================================

/// Staff projection.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffResponse {
    /// User ID.
    pub id: Uuid,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Email.
    pub email: String,
}

impl From<StaffSummary> for StaffResponse {
    fn from(staff: StaffSummary) -> Self {
        Self {
            id: staff.id,
            first_name: staff.first_name,
            last_name: staff.last_name,
            email: staff.email,
        }
    }
}

/// A movement as returned by the API.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementResponse {
    /// Movement ID.
    pub id: Uuid,
    /// Movement type.
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    /// Positive magnitude.
    pub amount: Decimal,
    /// Note.
    pub note: Option<String>,
    /// Staff reference.
    pub person_user_id: Option<Uuid>,
    /// Free-text person name.
    pub person: Option<String>,
    /// When the movement happened.
    pub movement_at: DateTime<Utc>,
    /// Sealing closure, `null` while open.
    pub closure_id: Option<Uuid>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
    /// Staff projection of `personUserId`.
    pub staff: Option<StaffResponse>,
}

impl From<MovementWithStaff> for MovementResponse {
    fn from(item: MovementWithStaff) -> Self {
        let m: cash_movements::Model = item.movement;
        Self {
            id: m.id,
            movement_type: m.movement_type.into(),
            amount: m.amount,
            note: m.note,
            person_user_id: m.person_user_id,
            person: m.person,
            movement_at: m.movement_at.with_timezone(&Utc),
            closure_id: m.closure_id,
            created_at: m.created_at.with_timezone(&Utc),
            updated_at: m.updated_at.with_timezone(&Utc),
            staff: item.staff.map(StaffResponse::from),
        }
    }
}

/// A closure as returned by the API.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosureResponse {
    /// Closure ID.
    pub id: Uuid,
    /// Counted amount of the previous closure.
    pub opening_amount: Decimal,
    /// Opening plus signed movements.
    pub expected_amount: Decimal,
    /// Physical count.
    pub counted_amount: Decimal,
    /// `counted - expected`, two places.
    pub diff: Decimal,
    /// Seal time.
    pub closed_at: DateTime<Utc>,
    /// Operator.
    pub user_id: Uuid,
    /// Notes.
    pub notes: Option<String>,
}

impl From<cash_closures::Model> for ClosureResponse {
    fn from(c: cash_closures::Model) -> Self {
        Self {
            id: c.id,
            opening_amount: c.opening_amount,
            expected_amount: c.expected_amount,
            counted_amount: c.counted_amount,
            diff: c.diff,
            closed_at: c.closed_at.with_timezone(&Utc),
            user_id: c.user_id,
            notes: c.notes,
        }
    }
}

/// Per-type subtotal.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeTotalResponse {
    /// Movement type.
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    /// Number of movements.
    pub count: u64,
    /// Sum of magnitudes.
    pub total: Decimal,
}

impl From<TypeTotal> for TypeTotalResponse {
    fn from(t: TypeTotal) -> Self {
        Self {
            movement_type: t.movement_type,
            count: t.count,
            total: t.total,
        }
    }
}

/// Open-ledger preview.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    /// Counted amount of the last closure, or zero.
    pub opening_amount: Decimal,
    /// Expected drawer content right now.
    pub expected_amount: Decimal,
    /// Number of open movements.
    pub movement_count: u64,
    /// Sum of inflows.
    pub cash_in: Decimal,
    /// Sum of outflows.
    pub cash_out: Decimal,
    /// Subtotals by type.
    pub by_type: Vec<TypeTotalResponse>,
    /// Most recent closure.
    pub last_closure: Option<ClosureResponse>,
}

impl From<OpenLedgerSummary> for SummaryResponse {
    fn from(open: OpenLedgerSummary) -> Self {
        let s = open.summary;
        Self {
            opening_amount: s.opening_amount,
            expected_amount: s.expected_amount,
            movement_count: s.movement_count,
            cash_in: s.cash_in,
            cash_out: s.cash_out,
            by_type: s.by_type.into_iter().map(TypeTotalResponse::from).collect(),
            last_closure: open.last_closure.map(ClosureResponse::from),
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

fn repository(state: &AppState) -> CashRepository {
    CashRepository::new((*state.db).clone())
}

fn parse_id<T: std::str::FromStr>(raw: &str) -> Result<T, CashError> {
    raw.trim()
        .parse()
        .map_err(|_| CashError::InvalidId(raw.to_string()))
}

/// GET `/cash/movements` - List the open ledger.
async fn list_movements(State(state): State<AppState>) -> Result<Response, ApiError> {
    let movements = repository(&state).unclosed_movements().await?;
    let movements: Vec<MovementResponse> =
        movements.into_iter().map(MovementResponse::from).collect();

    Ok((StatusCode::OK, Json(json!({ "movements": movements }))).into_response())
}

/// POST `/cash/movements` - Record a movement.
async fn create_movement(
    State(state): State<AppState>,
    payload: Result<Json<CreateMovementRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload?;
    let movement = validate_new(&MovementPayload::from(payload))?;

    let created = repository(&state).create_movement(movement).await?;

    Ok((StatusCode::CREATED, Json(MovementResponse::from(created))).into_response())
}

/// PATCH `/cash/movements/{id}` - Edit an open movement.
async fn update_movement(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateMovementRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let id: CashMovementId = parse_id(&id)?;
    let Json(payload) = payload?;
    let patch = validate_patch(&MovementPatchPayload::try_from(payload)?)?;

    let updated = repository(&state)
        .update_movement(id.into_inner(), patch)
        .await?;

    Ok((StatusCode::OK, Json(MovementResponse::from(updated))).into_response())
}

/// DELETE `/cash/movements/{id}` - Remove an open movement.
async fn delete_movement(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id: CashMovementId = parse_id(&id)?;

    repository(&state).delete_movement(id.into_inner()).await?;

    Ok((StatusCode::OK, Json(json!({ "deleted": true, "id": id }))).into_response())
}

/// GET `/cash/closures/last` - Most recent closure.
async fn last_closure(State(state): State<AppState>) -> Result<Response, ApiError> {
    let closure = repository(&state)
        .last_closure()
        .await?
        .map(ClosureResponse::from);

    Ok((StatusCode::OK, Json(json!({ "closure": closure }))).into_response())
}

/// POST `/cash/closures` - Close the register.
async fn close_register(
    State(state): State<AppState>,
    payload: Result<Json<CloseRegisterRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload?;

    let counted = validate_counted_amount(value_text(payload.counted_amount).as_deref())?;
    let user_id: UserId = parse_id(&value_text(payload.user_id).unwrap_or_default())?;
    let notes = payload
        .notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    let result = repository(&state)
        .close_register(counted, notes, user_id)
        .await?;

    info!(
        closure_id = %result.closure.id,
        user_id = %user_id,
        "Close register request completed"
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "closure": ClosureResponse::from(result.closure),
            "movesIncluded": result.moves_included
        })),
    )
        .into_response())
}

/// GET `/cash/closures?from=&to=` - Closures in range, newest first.
async fn list_closures(
    State(state): State<AppState>,
    query: Result<Query<ClosureRangeQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;

    let filter = ClosureFilter {
        from: query
            .from
            .as_deref()
            .map(|raw| parse_range_bound(raw, RangeBound::From))
            .transpose()?,
        to: query
            .to
            .as_deref()
            .map(|raw| parse_range_bound(raw, RangeBound::To))
            .transpose()?,
    };

    let closures: Vec<ClosureResponse> = repository(&state)
        .closures_in_range(filter)
        .await?
        .into_iter()
        .map(ClosureResponse::from)
        .collect();

    Ok((StatusCode::OK, Json(json!({ "closures": closures }))).into_response())
}

/// GET `/cash/closures/{id}` - A closure with the movements it sealed.
async fn closure_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id: CashClosureId = parse_id(&id)?;

    let detail = repository(&state).closure_detail(id.into_inner()).await?;
    let movements: Vec<MovementResponse> = detail
        .movements
        .into_iter()
        .map(MovementResponse::from)
        .collect();

    Ok((
        StatusCode::OK,
        Json(json!({
            "closure": ClosureResponse::from(detail.closure),
            "operator": detail.operator.map(StaffResponse::from),
            "movements": movements
        })),
    )
        .into_response())
}

/// GET `/cash/summary` - Preview of the next closure.
async fn open_ledger_summary(State(state): State<AppState>) -> Result<Response, ApiError> {
    let summary = repository(&state).open_ledger_summary().await?;

    Ok((StatusCode::OK, Json(SummaryResponse::from(summary))).into_response())
}
