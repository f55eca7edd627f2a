use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use shared_database::SchedulingStore;

use crate::handlers;

pub fn availability_routes(store: Arc<SchedulingStore>) -> Router {
    Router::new()
        // Calendar editing (doctor/admin surface)
        .route(
            "/{doctor_id}/availability/{service}/{date}",
            put(handlers::upsert_day)
                .get(handlers::get_day)
                .patch(handlers::set_day_availability),
        )
        .route(
            "/{doctor_id}/availability/{service}/{date}/slots",
            post(handlers::add_slot),
        )
        .route(
            "/{doctor_id}/availability/{service}/{date}/slots/{time}",
            delete(handlers::remove_slot),
        )
        // Booking read path (patient surface)
        .route("/{doctor_id}/free-slots", get(handlers::list_free_slots))
        .with_state(store)
}
