// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Router,
};

use shared_database::SchedulingStore;

use crate::handlers;

pub fn appointment_routes(store: Arc<SchedulingStore>) -> Router {
    Router::new()
        .route(
            "/",
            post(handlers::book_appointment).get(handlers::search_appointments),
        )
        .route("/{appointment_id}", get(handlers::get_appointment))
        .route(
            "/{appointment_id}/reschedule",
            post(handlers::reschedule_appointment),
        )
        .route("/{appointment_id}/status", patch(handlers::set_status))
        .route(
            "/{appointment_id}/payment",
            patch(handlers::set_payment_status),
        )
        .route(
            "/{appointment_id}/attachments",
            post(handlers::attach_record),
        )
        .with_state(store)
}
