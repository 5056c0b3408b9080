//! Facial Simulation API Module

mod handler;

use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::core::ServerState;

/// Facial simulation router (all routes require authentication)
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/facesim", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/upload", post(handler::upload))
        .route("/analyze", post(handler::analyze))
        .route("/simulate", post(handler::simulate))
        .route("/simulations", get(handler::list_simulations))
        .route("/simulations/{id}", get(handler::simulation_detail))
        .route("/images/{id}", delete(handler::delete_image))
}
