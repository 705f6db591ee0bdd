//! HTTP transport - maps requests onto the [`ProductData`] operations.
//!
//! Requires the `http` feature. Uses axum for routing.
//!
//! ## Routes
//!
//! - `GET /` - health check, returns `"Product Data Service"`.
//! - `GET /skus?$filter=..&$top=..` - retrieve. Responds with `{"results": [...]}`,
//!   `{"count": n}` or both, depending on the directives.
//! - `POST /skus` - insert `{"data": [...]}`. Schema violations come back as
//!   `400 {"errors": [...]}`.
//! - `GET /productid/:product_id` - the product with that id.
//! - `DELETE /skus/:sku` - remove a SKU entry.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use product_data::{http, Config, InMemoryEntryStore, ProductData};
//!
//! let config = Config::default();
//! let service = Arc::new(ProductData::new(InMemoryEntryStore::new()));
//!
//! // Get the router to compose with other axum routes
//! let app = http::router(service.clone(), &config);
//!
//! // Or serve directly
//! http::serve(service, &config).await?;
//! ```

use std::future::Future;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

use crate::config::Config;
use crate::error::ProductDataError;
use crate::query::QueryDirectives;
use crate::service::ProductData;
use crate::sku::schema::validate_payload;
use crate::sku::{CountResult, SkuEntry};
use crate::store::EntryStore;

/// Body of the health check.
pub const HEALTH_MESSAGE: &str = "Product Data Service";

struct AppState<S> {
    service: Arc<ProductData<S>>,
    response_limit: usize,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            response_limit: self.response_limit,
        }
    }
}

/// Response body of `GET /skus`. Absent parts are omitted.
#[derive(Debug, Serialize)]
struct RetrieveResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    results: Option<Vec<SkuEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    count: Option<u64>,
}

/// Build an axum `Router` serving the product data routes.
pub fn router<S: EntryStore + 'static>(service: Arc<ProductData<S>>, config: &Config) -> Router {
    let state = AppState {
        service,
        response_limit: config.response_limit,
    };
    Router::new()
        .route("/", get(health_handler))
        .route("/skus", get(retrieve_handler::<S>).post(insert_handler::<S>))
        .route("/skus/:sku", axum::routing::delete(delete_handler::<S>))
        .route("/productid/:product_id", get(product_handler::<S>))
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .with_state(state)
}

/// Serve the service over HTTP on the configured port.
pub async fn serve<S: EntryStore + 'static>(
    service: Arc<ProductData<S>>,
    config: &Config,
) -> Result<(), std::io::Error> {
    serve_with_shutdown(service, config, std::future::pending()).await
}

/// Like [`serve`], stopping gracefully once `shutdown` resolves.
pub async fn serve_with_shutdown<S, F>(
    service: Arc<ProductData<S>>,
    config: &Config,
    shutdown: F,
) -> Result<(), std::io::Error>
where
    S: EntryStore + 'static,
    F: Future<Output = ()> + Send + 'static,
{
    let app = router(service, config);
    let listener = tokio::net::TcpListener::bind(config.listen_addr()).await?;
    info!(
        service = %config.service_name,
        addr = %listener.local_addr()?,
        "listening"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}

/// `GET /` - liveness.
async fn health_handler() -> impl IntoResponse {
    HEALTH_MESSAGE
}

/// `GET /skus` - run a retrieve with the query-string directives.
async fn retrieve_handler<S: EntryStore + 'static>(
    State(state): State<AppState<S>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let result = QueryDirectives::from_pairs(pairs)
        .and_then(|directives| state.service.retrieve(&directives, state.response_limit));
    match result {
        Ok(retrieved) => {
            let (results, count) = retrieved.into_parts();
            let body = RetrieveResponse {
                results,
                count: count.map(|c| c.count),
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => error_response(&e),
    }
}

/// `POST /skus` - validate the payload, then insert.
async fn insert_handler<S: EntryStore + 'static>(
    State(state): State<AppState<S>>,
    body: Bytes,
) -> Response {
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            return error_response(&ProductDataError::Validation(format!(
                "request body is not valid JSON: {}",
                e
            )))
        }
    };

    let payload = match validate_payload(&payload) {
        Ok(payload) => payload,
        Err(violations) => {
            return (StatusCode::BAD_REQUEST, Json(json!({ "errors": violations })))
                .into_response()
        }
    };

    match state.service.insert(payload.data) {
        Ok(written) => (
            StatusCode::CREATED,
            Json(CountResult::new(written as u64)),
        )
            .into_response(),
        Err(e) => error_response(&e),
    }
}

/// `GET /productid/:product_id` - the matching product.
async fn product_handler<S: EntryStore + 'static>(
    State(state): State<AppState<S>>,
    Path(product_id): Path<String>,
) -> Response {
    match state.service.get_by_product_id(&product_id) {
        Ok(entry) => match entry.product_list.into_iter().next() {
            Some(product) => (StatusCode::OK, Json(product)).into_response(),
            None => error_response(&ProductDataError::NotFound(format!("product {}", product_id))),
        },
        Err(e) => error_response(&e),
    }
}

/// `DELETE /skus/:sku`.
async fn delete_handler<S: EntryStore + 'static>(
    State(state): State<AppState<S>>,
    Path(sku): Path<String>,
) -> Response {
    match state.service.delete_by_sku(&sku) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(&e),
    }
}

fn error_response(err: &ProductDataError) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(json!({ "error": err.public_message() }))).into_response()
}
