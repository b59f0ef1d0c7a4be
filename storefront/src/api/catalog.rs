use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    Json,
};

use super::{not_found, AppState};
use crate::catalog::CatalogFilter;

pub async fn list_services(State(state): State<AppState>, Query(filter): Query<CatalogFilter>) -> Response {
    let services: Vec<_> = filter.apply(state.catalog.as_ref()).into_iter().cloned().collect();
    Json(services).into_response()
}

pub async fn get_service(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.catalog.get_by_id(&id) {
        Some(service) => Json(service.clone()).into_response(),
        None => not_found("Service"),
    }
}
