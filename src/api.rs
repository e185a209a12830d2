// 🌐 REST API - axum router over the parking service
//
// GET  /api/health
// GET  /api/parking-slots
// GET  /api/vehicles/:id/transactions
// POST /api/park              { vehicleId, entryPoint, entryTime? }
// POST /api/unpark/:id        { vehicleId?, exitTime? }
//
// Timestamps are RFC 3339 with any offset and are normalised to UTC on the way in.

use crate::error::ParkingError;
use crate::service::{ParkRequest, ParkingService, UnparkRequest};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub service: Arc<ParkingService>,
}

impl AppState {
    pub fn new(conn: Connection, service: ParkingService) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
            service: Arc::new(service),
        }
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // A panic mid-request cannot leave a half-applied change: SQLite rolled it back
        self.db.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UnparkBody {
    #[serde(default)]
    vehicle_id: Option<i64>,
    #[serde(default)]
    exit_time: Option<DateTime<Utc>>,
}

pub fn status_for(err: &ParkingError) -> StatusCode {
    if err.is_not_found() {
        return StatusCode::NOT_FOUND;
    }

    match err {
        ParkingError::VehicleNotFound(_) | ParkingError::SlotNotFound(_) => StatusCode::NOT_FOUND,
        ParkingError::InvalidEntryPoint { .. }
        | ParkingError::InvalidSlotLayout { .. }
        | ParkingError::InvalidTimeRange { .. }
        | ParkingError::MissingEntryTime(_)
        | ParkingError::VehicleMismatch { .. } => StatusCode::BAD_REQUEST,
        ParkingError::NoSlotAvailable { .. }
        | ParkingError::SlotNotOccupied(_)
        | ParkingError::VehicleAlreadyParked(_)
        | ParkingError::Conflict(_) => StatusCode::CONFLICT,
        ParkingError::RateNotConfigured(_)
        | ParkingError::Database(_)
        | ParkingError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Malformed path or body, reported in the same envelope as service errors
fn reject(rejection: impl std::fmt::Display) -> Response {
    log::debug!("Request rejected: {}", rejection);
    let message = rejection.to_string();
    (StatusCode::BAD_REQUEST, Json(ApiResponse::error(message))).into_response()
}

fn respond<T: Serialize>(result: Result<T, ParkingError>) -> Response {
    match result {
        Ok(data) => (StatusCode::OK, Json(ApiResponse::ok(data))).into_response(),
        Err(err) => {
            let status = status_for(&err);
            if status == StatusCode::INTERNAL_SERVER_ERROR {
                log::error!("Request failed: {}", err);
            } else {
                log::debug!("Request rejected: {}", err);
            }
            (status, Json(ApiResponse::error(err.to_string()))).into_response()
        }
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/parking-slots - All slots with occupancy
async fn list_slots(State(state): State<AppState>) -> Response {
    let conn = state.conn();
    respond(state.service.slots(&conn))
}

/// GET /api/vehicles/:id/transactions - Stay history, most recent first
async fn vehicle_transactions(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Response {
    let Path(id) = match id {
        Ok(path) => path,
        Err(rejection) => return reject(rejection),
    };

    let conn = state.conn();
    respond(state.service.history(&conn, id))
}

/// POST /api/park - Allocate a slot and open a transaction
async fn park(
    State(state): State<AppState>,
    request: Result<Json<ParkRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match request {
        Ok(json) => json,
        Err(rejection) => return reject(rejection),
    };

    let mut conn = state.conn();
    respond(state.service.park(&mut conn, &request))
}

/// POST /api/unpark/:id - Bill and free a slot
async fn unpark(
    State(state): State<AppState>,
    slot_id: Result<Path<i64>, PathRejection>,
    body: Option<Json<UnparkBody>>,
) -> Response {
    let Path(slot_id) = match slot_id {
        Ok(path) => path,
        Err(rejection) => return reject(rejection),
    };

    let body = body.map(|Json(body)| body).unwrap_or_default();
    let request = UnparkRequest {
        slot_id,
        vehicle_id: body.vehicle_id,
        exit_time: body.exit_time,
    };

    let mut conn = state.conn();
    respond(state.service.unpark(&mut conn, &request))
}

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/parking-slots", get(list_slots))
        .route("/vehicles/:id/transactions", get(vehicle_transactions))
        .route("/park", post(park))
        .route("/unpark/:id", post(unpark))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParkingConfig;
    use crate::db;
    use crate::entities::SizeTier;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        let conn = Connection::open_in_memory().unwrap();
        db::setup_database(&conn).unwrap();
        let service = ParkingService::new(&ParkingConfig::default());

        service.register_vehicle(&conn, SizeTier::Small).unwrap();
        service.add_slot(&conn, SizeTier::Small, &[3, 1, 2, 4]).unwrap();
        service.add_slot(&conn, SizeTier::Large, &[1, 5, 5, 5]).unwrap();

        AppState::new(conn, service)
    }

    async fn send(app: Router, method: &str, uri: &str, body: Option<serde_json::Value>) -> (StatusCode, serde_json::Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let app = router(test_state());
        let (status, body) = send(app, "GET", "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], "OK");
    }

    #[tokio::test]
    async fn test_park_and_unpark_flow() {
        let state = test_state();

        let (status, body) = send(
            router(state.clone()),
            "POST",
            "/api/park",
            Some(serde_json::json!({
                "vehicleId": 1,
                "entryPoint": 0,
                "entryTime": "2024-01-01T17:00:00+08:00"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        // Large slot is nearest to entry 0
        assert_eq!(body["data"]["slot"]["id"], 2);
        assert_eq!(body["data"]["entryTime"], "2024-01-01T09:00:00Z");

        let (status, body) = send(
            router(state.clone()),
            "POST",
            "/api/unpark/2",
            Some(serde_json::json!({ "vehicleId": 1, "exitTime": "2024-01-01T16:00:00Z" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        // Large slot: 7h → 4 × 100 + 40
        assert_eq!(body["data"]["charge"]["amount"], 440.0);
        assert_eq!(body["data"]["charge"]["excessHourAmount"], 400.0);
        assert_eq!(body["data"]["charge"]["previousPayment"], 0.0);

        let (status, body) = send(router(state), "GET", "/api/vehicles/1/transactions", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"][0]["paid"], true);
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let state = test_state();

        let (status, body) = send(
            router(state.clone()),
            "POST",
            "/api/park",
            Some(serde_json::json!({ "vehicleId": 42, "entryPoint": 0 })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "vehicle 42 not found");

        let (status, _) = send(
            router(state.clone()),
            "POST",
            "/api/park",
            Some(serde_json::json!({ "vehicleId": 1, "entryPoint": 9 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(router(state), "POST", "/api/unpark/1", None).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_malformed_requests_use_envelope() {
        let state = test_state();

        let (status, body) = send(router(state.clone()), "POST", "/api/unpark/abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["error"].is_string());

        let (status, body) =
            send(router(state.clone()), "GET", "/api/vehicles/abc/transactions", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);

        let (status, body) = send(
            router(state),
            "POST",
            "/api/park",
            Some(serde_json::json!({ "vehicleId": "one" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_list_slots() {
        let app = router(test_state());
        let (status, body) = send(app, "GET", "/api/parking-slots", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 2);
        assert_eq!(body["data"][1]["size"], "large");
        assert_eq!(body["data"][1]["available"], true);
    }
}
