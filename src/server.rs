use crate::db::{self, StoreError};
use log::{error, info, warn};
use rusqlite::Connection;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::Mutex;
use warp::http::StatusCode;
use warp::Filter;

const MAX_BODY_BYTES: u64 = 16 * 1024;

pub async fn run(db_conn: Arc<Mutex<Connection>>, port: u16) {
    info!("Serving vehicle lookups on port {}", port);
    warp::serve(routes(db_conn)).run(([0, 0, 0, 0], port)).await;
}

pub fn routes(
    db_conn: Arc<Mutex<Connection>>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::post()
        .and(warp::path!("api" / "v1" / "vehicles" / "get-by-plate"))
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json())
        .and(warp::any().map(move || db_conn.clone()))
        .and_then(get_by_plate)
}

async fn get_by_plate(
    body: Value,
    db_conn: Arc<Mutex<Connection>>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let plate = body["license_plate"].as_str().unwrap_or("");
    // Zero is what an empty select option posts; treat it like null.
    let owner = body["owner"].as_i64().filter(|id| *id != 0);
    let vehicle_type = body["vehicle_type"].as_i64().filter(|id| *id != 0);

    let result = {
        let conn = db_conn.lock().await;
        db::get_or_create_vehicle(&conn, plate, owner, vehicle_type)
    };
    let (reply, status) = match result {
        Ok(vehicle) => {
            info!("Resolved plate {} to vehicle {}", plate, vehicle.id);
            (vehicle.to_json(), StatusCode::OK)
        }
        Err(e @ StoreError::MissingPlate) => {
            warn!("Rejected lookup: {}", e);
            (json!({ "error": e.to_string() }), StatusCode::BAD_REQUEST)
        }
        Err(e @ StoreError::NotFound) => {
            warn!("Lookup for plate {} failed: {}", plate, e);
            (json!({ "error": e.to_string() }), StatusCode::NOT_FOUND)
        }
        Err(e) => {
            error!("Error handling lookup for plate {}: {:?}", plate, e);
            (
                json!({ "error": "internal error while processing the request" }),
                StatusCode::INTERNAL_SERVER_ERROR,
            )
        }
    };
    Ok(warp::reply::with_status(warp::reply::json(&reply), status))
}
