// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_database::SchedulingStore;
use shared_models::AppError;

use crate::models::{
    AppointmentSearchQuery, AttachRecordRequest, BookAppointmentRequest,
    RescheduleAppointmentRequest, SetPaymentStatusRequest, SetStatusRequest,
};
use crate::services::scheduler::SchedulerService;

#[axum::debug_handler]
pub async fn book_appointment(
    State(store): State<Arc<SchedulingStore>>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let scheduler = SchedulerService::new(store);

    let appointment = scheduler.book_appointment(request).await?;

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(store): State<Arc<SchedulingStore>>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let scheduler = SchedulerService::new(store);

    let appointment = scheduler.get_appointment(appointment_id).await?;

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn search_appointments(
    State(store): State<Arc<SchedulingStore>>,
    Query(query): Query<AppointmentSearchQuery>,
) -> Result<Json<Value>, AppError> {
    let scheduler = SchedulerService::new(store);

    let appointments = scheduler.search_appointments(query).await;

    let total = appointments.len();
    Ok(Json(json!({
        "appointments": appointments,
        "total": total
    })))
}

#[axum::debug_handler]
pub async fn reschedule_appointment(
    State(store): State<Arc<SchedulingStore>>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<RescheduleAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let scheduler = SchedulerService::new(store);

    let outcome = scheduler
        .reschedule_appointment(appointment_id, request)
        .await?;

    Ok(Json(json!({
        "appointment": outcome.appointment,
        "previous": {
            "date": outcome.previous_date,
            "time": outcome.previous_time
        }
    })))
}

#[axum::debug_handler]
pub async fn set_status(
    State(store): State<Arc<SchedulingStore>>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<SetStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let scheduler = SchedulerService::new(store);

    let appointment = scheduler.set_status(appointment_id, request.status).await?;

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn set_payment_status(
    State(store): State<Arc<SchedulingStore>>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<SetPaymentStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let scheduler = SchedulerService::new(store);

    let appointment = scheduler
        .set_payment_status(appointment_id, request.payment_status)
        .await?;

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn attach_record(
    State(store): State<Arc<SchedulingStore>>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<AttachRecordRequest>,
) -> Result<Json<Value>, AppError> {
    let scheduler = SchedulerService::new(store);

    let appointment = scheduler
        .attach_record(appointment_id, request.kind, request.label)
        .await?;

    Ok(Json(json!(appointment)))
}
