//! HTTP boundary: the axum router and its handlers.
//!
//! `/geoip` is the API surface (GET for bounding-box queries, POST for CSV
//! uploads); every other path falls through to the static file tree so the
//! bundled map front-end can be served from the same process.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context as _;
use axum::body::to_bytes;
use axum::extract::{FromRequest, Multipart, Query, Request, State};
use axum::http::{header, Method, StatusCode};
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use log::info;
use tower_http::compression::CompressionLayer;
use tower_http::services::ServeDir;

use crate::config::Config;
use crate::error::ApiError;
use crate::model::{location_table_from_csv, BoundingBox, LocationTable};
use crate::storage::SqliteStore;

#[derive(Clone)]
struct AppState {
    store: SqliteStore,
}

/// Builds the application router around `store`, serving static files from
/// `root_dir` for any path other than `/geoip`.
pub fn router(store: SqliteStore, root_dir: &Path) -> Router {
    Router::new()
        .route(
            "/geoip",
            get(query_locations)
                .post(upload_locations)
                .fallback(method_not_allowed),
        )
        .fallback_service(ServeDir::new(root_dir))
        .layer(CompressionLayer::new())
        .with_state(AppState { store })
}

/// Opens the store, binds the listener, and serves until shutdown.
pub async fn run_server(config: Config) -> Result<(), anyhow::Error> {
    config.validate()?;

    let store = SqliteStore::connect(&config.database).await?;
    let app = router(store, &config.root_dir);

    let listener = tokio::net::TcpListener::bind(&config.listen)
        .await
        .with_context(|| format!("Failed to bind to {}", config.listen))?;
    info!("Listening on http://{}", listener.local_addr()?);
    info!("Serving static assets from {}", config.root_dir.display());

    axum::serve(listener, app).await.context("HTTP server error")?;
    Ok(())
}

/// `GET /geoip?north=&south=&east=&west=[&resolution=]`
///
/// All four bounds are required. When `resolution` is positive it is used
/// as the rounding step on both axes before the base-10 logarithmic
/// rescale. The body is a JSON array of [lat, lon, log10(quantity)]
/// triples in no particular order.
async fn query_locations(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<LocationTable>, ApiError> {
    let bounds = BoundingBox {
        north: float_param(&params, "north", true)?,
        south: float_param(&params, "south", true)?,
        east: float_param(&params, "east", true)?,
        west: float_param(&params, "west", true)?,
    };
    let resolution = float_param(&params, "resolution", false)?;

    let mut results = state.store.query(&bounds).await?;

    if resolution > 0.0 {
        results = results.round_locations(resolution, resolution);
    }

    Ok(Json(results.logarithmic(10.0)))
}

/// `POST /geoip`
///
/// Accepts the CSV either as a raw `text/csv` body or as a
/// `multipart/form-data` upload in a field named "file". The parsed table
/// fully replaces the persisted one; nothing is saved if parsing fails.
async fn upload_locations(
    State(state): State<AppState>,
    request: Request,
) -> Result<StatusCode, ApiError> {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_string();

    let payload = match content_type.as_str() {
        "text/csv" => to_bytes(request.into_body(), usize::MAX)
            .await
            .map_err(|e| ApiError::Body(e.to_string()))?,
        "multipart/form-data" => {
            let mut multipart = Multipart::from_request(request, &())
                .await
                .map_err(|e| ApiError::InvalidUpload(e.to_string()))?;
            let mut file = None;
            while let Some(field) = multipart
                .next_field()
                .await
                .map_err(|e| ApiError::InvalidUpload(e.to_string()))?
            {
                if field.name() == Some("file") {
                    file = Some(
                        field
                            .bytes()
                            .await
                            .map_err(|e| ApiError::InvalidUpload(e.to_string()))?,
                    );
                    break;
                }
            }
            file.ok_or(ApiError::MissingUploadField)?
        }
        other => return Err(ApiError::UnsupportedMediaType(other.to_string())),
    };

    let table = location_table_from_csv(&payload[..])?;
    info!("Ingested {} locations from CSV upload", table.len());

    state.store.save(&table).await?;
    Ok(StatusCode::OK)
}

async fn method_not_allowed(method: Method) -> ApiError {
    ApiError::MethodNotAllowed(method)
}

/// Pulls a float query parameter, treating an empty value like a missing
/// one. Missing required parameters are a 400; missing optional ones
/// default to 0.
fn float_param(
    params: &HashMap<String, String>,
    name: &'static str,
    required: bool,
) -> Result<f64, ApiError> {
    match params.get(name).map(String::as_str) {
        None | Some("") => {
            if required {
                Err(ApiError::MissingParameter(name))
            } else {
                Ok(0.0)
            }
        }
        Some(raw) => raw
            .parse::<f64>()
            .map_err(|source| ApiError::InvalidParameter { name, source }),
    }
}
