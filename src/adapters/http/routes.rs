//! Service Routes - Instrumented HTTP Surface
//!
//! Every route and the 404 fallback pass through `track_requests`; the
//! exposition route is merged in afterwards so scrapes are not counted.
//! A catch-panic layer sits outside the instrumentation so a panicking
//! handler is recorded first and then answered with a generic 500.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRef, Path, Query, State};
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::debug;

use super::middleware::track_requests;
use crate::adapters::metrics::exposition::ExpositionEndpoint;
use crate::adapters::metrics::health::{self, HealthState};
use crate::domain::flight::FlightDirection;
use crate::domain::reply::Reply;
use crate::domain::user::{NewUser, TelegramLink};
use crate::usecases::flight_lookup::FlightLookup;
use crate::usecases::request_instrumentation::RequestInstrumentation;
use crate::usecases::user_registry::{BAD_REQUEST, UserRegistry};

/// Header carrying the client's idempotency key.
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// Status returned when the flight provider fails.
const BAD_GATEWAY: u16 = 502;
const NOT_FOUND: u16 = 404;

/// Shared state of the service handlers.
#[derive(Clone)]
pub struct AppState {
  /// Request metrics recorder.
  pub instrumentation: RequestInstrumentation,
  /// User store.
  pub users: Arc<UserRegistry>,
  /// Instrumented flight collection.
  pub flights: Arc<FlightLookup>,
  /// Readiness flag.
  pub health: Arc<HealthState>,
}

impl FromRef<AppState> for Arc<HealthState> {
  fn from_ref(state: &AppState) -> Self {
    Arc::clone(&state.health)
  }
}

/// Query string of the flights route.
#[derive(Debug, Deserialize)]
pub struct FlightQuery {
  /// `arrivals` (default) or `departures`.
  #[serde(rename = "type", default)]
  pub direction: FlightDirection,
}

/// Build the full service router.
pub fn build_router(state: AppState, exposition: Arc<ExpositionEndpoint>, metrics_path: &str) -> Router {
  let instrumentation = state.instrumentation.clone();

  let api = Router::new()
    .merge(health::routes())
    .route("/users", post(create_user))
    .route("/users/telegram", post(link_telegram))
    .route("/users/:email", get(get_user))
    .route("/flights/:airport", get(get_flights))
    .fallback(not_found)
    .layer(axum::middleware::from_fn_with_state(instrumentation, track_requests))
    .with_state(state);

  api
    .merge(exposition.router(metrics_path))
    .layer(CatchPanicLayer::new())
    .layer(TraceLayer::new_for_http())
}

fn error_reply(message: &str, status: u16) -> Reply<Json<Value>> {
  Reply::with_status(Json(json!({ "error": message })), status)
}

async fn create_user(
  State(state): State<AppState>,
  headers: HeaderMap,
  payload: Result<Json<NewUser>, JsonRejection>,
) -> Reply<Json<Value>> {
  let Json(new_user) = match payload {
    Ok(p) => p,
    Err(rejection) => return error_reply(&rejection.body_text(), BAD_REQUEST),
  };
  let key = headers
    .get(IDEMPOTENCY_KEY_HEADER)
    .and_then(|v| v.to_str().ok())
    .filter(|k| !k.is_empty());
  debug!(idempotency_key = ?key, "Create user request");

  state.users.create(key, new_user).await.map(Json)
}

async fn get_user(State(state): State<AppState>, Path(email): Path<String>) -> Reply<Json<Value>> {
  match state.users.get(&email).await {
    Some(user) => Reply::new(Json(json!(user))),
    None => error_reply("user not found", NOT_FOUND),
  }
}

async fn link_telegram(
  State(state): State<AppState>,
  Json(link): Json<TelegramLink>,
) -> Reply<Json<Value>> {
  if state.users.link_telegram(link).await {
    Reply::new(Json(json!({ "message": "telegram chat linked" })))
  } else {
    error_reply("user not found", NOT_FOUND)
  }
}

async fn get_flights(
  State(state): State<AppState>,
  Path(airport): Path<String>,
  Query(query): Query<FlightQuery>,
) -> Reply<Json<Value>> {
  match state.flights.collect(&airport, query.direction).await {
    Ok(flights) => Reply::new(Json(json!({
      "airport": airport.to_ascii_uppercase(),
      "type": query.direction,
      "count": flights.len(),
      "flights": flights,
    }))),
    Err(e) => error_reply(&format!("flight provider unavailable: {e}"), BAD_GATEWAY),
  }
}

async fn not_found() -> Reply<Json<Value>> {
  error_reply("not found", NOT_FOUND)
}
