use std::sync::Arc;

use axum::{routing::get, Router};

use appointment_cell::router::appointment_routes;
use availability_cell::router::availability_routes;
use shared_database::SchedulingStore;

pub fn create_router(store: Arc<SchedulingStore>) -> Router {
    Router::new()
        .route("/", get(|| async { "Scheduling API is running!" }))
        .nest("/doctors", availability_routes(store.clone()))
        .nest("/appointments", appointment_routes(store))
}
