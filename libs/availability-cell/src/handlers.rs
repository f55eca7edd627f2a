// libs/availability-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_database::SchedulingStore;
use shared_models::{AppError, DayKey, ServiceKind, SlotTime};

use crate::models::{AddSlotRequest, FreeSlotsQuery, SetDayAvailabilityRequest, UpsertDayRequest};
use crate::services::calendar::CalendarEditorService;
use crate::services::slots::SlotResolverService;

#[axum::debug_handler]
pub async fn get_day(
    State(store): State<Arc<SchedulingStore>>,
    Path((doctor_id, service, date)): Path<(Uuid, ServiceKind, NaiveDate)>,
) -> Result<Json<Value>, AppError> {
    let editor = CalendarEditorService::new(store);

    let day = editor
        .get_day(&DayKey::new(doctor_id, service, date))
        .await?;

    Ok(Json(json!(day)))
}

#[axum::debug_handler]
pub async fn upsert_day(
    State(store): State<Arc<SchedulingStore>>,
    Path((doctor_id, service, date)): Path<(Uuid, ServiceKind, NaiveDate)>,
    Json(request): Json<UpsertDayRequest>,
) -> Result<Json<Value>, AppError> {
    let editor = CalendarEditorService::new(store);

    let day = editor
        .upsert_day(DayKey::new(doctor_id, service, date), request)
        .await?;

    Ok(Json(json!(day)))
}

#[axum::debug_handler]
pub async fn add_slot(
    State(store): State<Arc<SchedulingStore>>,
    Path((doctor_id, service, date)): Path<(Uuid, ServiceKind, NaiveDate)>,
    Json(request): Json<AddSlotRequest>,
) -> Result<Json<Value>, AppError> {
    let editor = CalendarEditorService::new(store);

    let day = editor
        .add_slot(&DayKey::new(doctor_id, service, date), request.time)
        .await?;

    Ok(Json(json!(day)))
}

#[axum::debug_handler]
pub async fn remove_slot(
    State(store): State<Arc<SchedulingStore>>,
    Path((doctor_id, service, date, time)): Path<(Uuid, ServiceKind, NaiveDate, SlotTime)>,
) -> Result<Json<Value>, AppError> {
    let editor = CalendarEditorService::new(store);

    let day = editor
        .remove_slot(&DayKey::new(doctor_id, service, date), &time)
        .await?;

    Ok(Json(json!(day)))
}

#[axum::debug_handler]
pub async fn set_day_availability(
    State(store): State<Arc<SchedulingStore>>,
    Path((doctor_id, service, date)): Path<(Uuid, ServiceKind, NaiveDate)>,
    Json(request): Json<SetDayAvailabilityRequest>,
) -> Result<Json<Value>, AppError> {
    let editor = CalendarEditorService::new(store);

    let day = editor
        .set_day_availability(&DayKey::new(doctor_id, service, date), request.is_available)
        .await?;

    Ok(Json(json!(day)))
}

#[axum::debug_handler]
pub async fn list_free_slots(
    State(store): State<Arc<SchedulingStore>>,
    Path(doctor_id): Path<Uuid>,
    Query(query): Query<FreeSlotsQuery>,
) -> Result<Json<Value>, AppError> {
    let resolver = SlotResolverService::new(store);

    let response = resolver
        .list_free_slots(doctor_id, query.service, query.from, query.to)
        .await?;

    let total = response.slots.len();
    Ok(Json(json!({
        "doctor_id": response.doctor_id,
        "service": response.service,
        "from": response.from,
        "to": response.to,
        "slots": response.slots,
        "total": total
    })))
}
