use std::sync::{Arc, Mutex};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Path, Query, Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tower_http::limit::RequestBodyLimitLayer;

use nosh_core::models::{
    ExportData, FoodLogEntry, Goals, ImportSummary, Meal, MealType, NewFoodLogEntry, NewMeal,
    NewWeightEntry, Profile, WeightEntry,
};
use nosh_core::progress::WeightTrend;
use nosh_core::service::NoshService;
use nosh_core::stats::{DayPoint, DaySummary, Metric, RangeAverages};

const BODY_LIMIT: usize = 10 * 1024 * 1024; // 10 MB

#[derive(Clone)]
struct AppState {
    service: Arc<Mutex<NoshService>>,
    api_key: Option<String>,
}

impl AppState {
    fn service(&self) -> std::sync::MutexGuard<'_, NoshService> {
        self.service
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

// --- Request / Response types ---

#[derive(Deserialize)]
struct CreateLogRequest {
    food_name: String,
    meal_type: String,
    calories: f64,
    protein: Option<f64>,
    carbs: Option<f64>,
    fat: Option<f64>,
    caffeine: Option<f64>,
    #[serde(default = "default_amount")]
    amount: f64,
    #[serde(default = "default_unit")]
    unit: String,
    date: String,
    #[serde(default = "default_time")]
    time: String,
}

fn default_amount() -> f64 {
    1.0
}

fn default_unit() -> String {
    "serving".to_string()
}

fn default_time() -> String {
    "12:00".to_string()
}

#[derive(Deserialize)]
struct SeriesQuery {
    start: String,
    end: String,
    #[serde(default = "default_metric")]
    metric: String,
}

fn default_metric() -> String {
    "calories".to_string()
}

#[derive(Deserialize)]
struct RangeQuery {
    start: String,
    end: String,
}

#[derive(Deserialize)]
struct CreateWeightRequest {
    date: String,
    weight_kg: f64,
    note: Option<String>,
}

#[derive(Deserialize)]
struct DaysQuery {
    days: Option<i64>,
}

#[derive(Deserialize)]
struct TagQuery {
    tag: Option<String>,
}

#[derive(Deserialize)]
struct CreateMealRequest {
    name: String,
    unit: String,
    calories: f64,
    protein: Option<f64>,
    carbs: Option<f64>,
    fat: Option<f64>,
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Deserialize)]
struct LogMealRequest {
    name: String,
    #[serde(default = "default_amount")]
    amount: f64,
    meal_type: String,
    date: String,
    #[serde(default = "default_time")]
    time: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// --- Error handling ---

enum ApiError {
    NotFound(String),
    BadRequest(String),
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Internal(err) => {
                eprintln!("Internal server error: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

fn bad_request(err: &anyhow::Error) -> ApiError {
    ApiError::BadRequest(format!("{err}"))
}

fn parse_date(s: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| ApiError::BadRequest(format!("Invalid date '{s}'. Use YYYY-MM-DD")))
}

// --- Middleware ---

async fn require_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if let Some(ref expected_key) = state.api_key {
        let authorized = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .is_some_and(|token| token == expected_key);

        if !authorized {
            return (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    error: "Invalid or missing API key".to_string(),
                }),
            )
                .into_response();
        }
    }
    next.run(request).await
}

async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert(
        "content-security-policy",
        HeaderValue::from_static("default-src 'none'"),
    );
    response
}

// --- Handlers ---

async fn create_log(
    State(state): State<AppState>,
    Json(req): Json<CreateLogRequest>,
) -> Result<(StatusCode, Json<FoodLogEntry>), ApiError> {
    let meal_type = MealType::parse(&req.meal_type).map_err(|e| bad_request(&e))?;
    let entry_date = parse_date(&req.date)?;

    let entry = NewFoodLogEntry {
        food_name: req.food_name,
        meal_type,
        calories: req.calories,
        protein: req.protein,
        carbs: req.carbs,
        fat: req.fat,
        caffeine: req.caffeine,
        amount: req.amount,
        unit: req.unit,
        entry_date,
        entry_time: req.time,
        meal_id: None,
    };

    let logged = state.service().log(&entry).map_err(|e| bad_request(&e))?;
    Ok((StatusCode::CREATED, Json(logged)))
}

async fn delete_log(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let deleted = state.service().delete_entry(id).context("database error")?;
    if !deleted {
        return Err(ApiError::NotFound(format!("No entry with id {id}")));
    }
    Ok(Json(serde_json::json!({ "deleted": id })))
}

async fn get_summary(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<DaySummary>, ApiError> {
    parse_date(&date)?;
    let summary = state
        .service()
        .daily_summary(&date)
        .context("database error")?;
    Ok(Json(summary))
}

async fn get_series(
    State(state): State<AppState>,
    Query(query): Query<SeriesQuery>,
) -> Result<Json<Vec<DayPoint>>, ApiError> {
    parse_date(&query.start)?;
    parse_date(&query.end)?;
    let metric = Metric::parse(&query.metric).map_err(|e| bad_request(&e))?;
    let points = state
        .service()
        .series(&query.start, &query.end, metric)
        .map_err(|e| bad_request(&e))?;
    Ok(Json(points))
}

async fn get_stats(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<Option<RangeAverages>>, ApiError> {
    parse_date(&query.start)?;
    parse_date(&query.end)?;
    let averages = state
        .service()
        .range_stats(&query.start, &query.end)
        .map_err(|e| bad_request(&e))?;
    Ok(Json(averages))
}

async fn get_energy(
    State(state): State<AppState>,
) -> Result<Json<nosh_core::energy::EnergyTargets>, ApiError> {
    let targets = state
        .service()
        .energy()
        .map_err(|e| ApiError::BadRequest(format!("{e}")))?;
    Ok(Json(targets))
}

async fn create_weight(
    State(state): State<AppState>,
    Json(req): Json<CreateWeightRequest>,
) -> Result<(StatusCode, Json<WeightEntry>), ApiError> {
    let entry_date = parse_date(&req.date)?;
    let entry = NewWeightEntry {
        entry_date,
        weight_kg: req.weight_kg,
        note: req.note,
    };
    let logged = state
        .service()
        .log_weight(&entry)
        .map_err(|e| bad_request(&e))?;
    Ok((StatusCode::CREATED, Json(logged)))
}

async fn get_weight_history(
    State(state): State<AppState>,
    Query(query): Query<DaysQuery>,
) -> Result<Json<Vec<WeightEntry>>, ApiError> {
    let entries = state
        .service()
        .weight_history(query.days)
        .context("database error")?;
    Ok(Json(entries))
}

async fn get_weight_trend(
    State(state): State<AppState>,
    Query(query): Query<DaysQuery>,
) -> Result<Json<WeightTrend>, ApiError> {
    let trend = state
        .service()
        .weight_trend(query.days)
        .context("database error")?;
    trend
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Not enough weight entries for a trend".to_string()))
}

async fn get_weight(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<WeightEntry>, ApiError> {
    let date = parse_date(&date)?;
    let entry = state.service().get_weight(date).context("database error")?;
    entry.map(Json).ok_or_else(|| {
        ApiError::NotFound(format!("No weight entry for {}", date.format("%Y-%m-%d")))
    })
}

async fn delete_weight(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let date = parse_date(&date)?;
    let deleted = state
        .service()
        .delete_weight(date)
        .context("database error")?;
    if !deleted {
        return Err(ApiError::NotFound(format!(
            "No weight entry for {}",
            date.format("%Y-%m-%d")
        )));
    }
    Ok(Json(serde_json::json!({ "deleted": date })))
}

async fn get_profile(State(state): State<AppState>) -> Result<Json<Profile>, ApiError> {
    let profile = state.service().get_profile().context("database error")?;
    profile
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("No profile set".to_string()))
}

async fn set_profile(
    State(state): State<AppState>,
    Json(profile): Json<Profile>,
) -> Result<Json<Profile>, ApiError> {
    state
        .service()
        .set_profile(&profile)
        .map_err(|e| bad_request(&e))?;
    Ok(Json(profile))
}

async fn get_goals(State(state): State<AppState>) -> Result<Json<Goals>, ApiError> {
    let goals = state.service().get_goals().context("database error")?;
    Ok(Json(goals))
}

async fn set_goals(
    State(state): State<AppState>,
    Json(goals): Json<Goals>,
) -> Result<Json<Goals>, ApiError> {
    state
        .service()
        .set_goals(&goals)
        .map_err(|e| bad_request(&e))?;
    Ok(Json(goals))
}

async fn clear_goals(State(state): State<AppState>) -> Result<Json<Goals>, ApiError> {
    state.service().clear_goals().context("database error")?;
    let goals = state.service().get_goals().context("database error")?;
    Ok(Json(goals))
}

async fn list_meals(
    State(state): State<AppState>,
    Query(query): Query<TagQuery>,
) -> Result<Json<Vec<Meal>>, ApiError> {
    let meals = state
        .service()
        .list_meals(query.tag.as_deref())
        .context("database error")?;
    Ok(Json(meals))
}

async fn create_meal(
    State(state): State<AppState>,
    Json(req): Json<CreateMealRequest>,
) -> Result<(StatusCode, Json<Meal>), ApiError> {
    let meal = state
        .service()
        .add_meal(&NewMeal {
            name: req.name,
            unit: req.unit,
            calories: req.calories,
            protein: req.protein,
            carbs: req.carbs,
            fat: req.fat,
            tags: req.tags,
        })
        .map_err(|e| bad_request(&e))?;
    Ok((StatusCode::CREATED, Json(meal)))
}

async fn log_meal(
    State(state): State<AppState>,
    Json(req): Json<LogMealRequest>,
) -> Result<(StatusCode, Json<FoodLogEntry>), ApiError> {
    let meal_type = MealType::parse(&req.meal_type).map_err(|e| bad_request(&e))?;
    parse_date(&req.date)?;
    let entry = state
        .service()
        .log_meal(&req.name, req.amount, meal_type, &req.date, &req.time)
        .map_err(|e| bad_request(&e))?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn delete_meal(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let deleted = state.service().delete_meal(&name).context("database error")?;
    if !deleted {
        return Err(ApiError::NotFound(format!("No meal named '{name}'")));
    }
    Ok(Json(serde_json::json!({ "deleted": name })))
}

async fn export_data(State(state): State<AppState>) -> Result<Json<ExportData>, ApiError> {
    let data = state.service().export_all().context("export failed")?;
    Ok(Json(data))
}

async fn import_data(
    State(state): State<AppState>,
    Json(data): Json<ExportData>,
) -> Result<Json<ImportSummary>, ApiError> {
    let summary = state
        .service()
        .import_all(&data)
        .map_err(|e| bad_request(&e))?;
    Ok(Json(summary))
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/log", post(create_log))
        .route("/api/log/{id}", delete(delete_log))
        .route("/api/summary/{date}", get(get_summary))
        .route("/api/series", get(get_series))
        .route("/api/stats", get(get_stats))
        .route("/api/energy", get(get_energy))
        .route("/api/weight", post(create_weight).get(get_weight_history))
        .route("/api/weight/trend", get(get_weight_trend))
        .route("/api/weight/{date}", get(get_weight).delete(delete_weight))
        .route("/api/profile", get(get_profile).put(set_profile))
        .route(
            "/api/goals",
            get(get_goals).put(set_goals).delete(clear_goals),
        )
        .route("/api/meals", get(list_meals).post(create_meal))
        .route("/api/meals/log", post(log_meal))
        .route("/api/meals/{name}", delete(delete_meal))
        .route("/api/export", get(export_data))
        .route("/api/import", post(import_data))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .layer(middleware::from_fn(security_headers))
        .with_state(state)
}

// --- Server startup ---

pub async fn start_server(
    service: NoshService,
    port: u16,
    bind: &str,
    api_key: Option<String>,
) -> anyhow::Result<()> {
    let state = AppState {
        service: Arc::new(Mutex::new(service)),
        api_key: api_key.clone(),
    };

    let app = build_router(state);

    if let Some(ref key) = api_key {
        if key.len() >= 8 {
            eprintln!(
                "API key: {}...{} (see api_key file in data directory)",
                &key[..4],
                &key[key.len() - 4..],
            );
        }
    } else {
        eprintln!("Warning: Authentication disabled (--no-auth). API is open to anyone.");
    }

    if bind != "127.0.0.1" && bind != "localhost" && api_key.is_none() {
        eprintln!(
            "Warning: Listening on {bind} with no authentication. Any device on your network can access this API."
        );
    }

    let listener = tokio::net::TcpListener::bind(format!("{bind}:{port}")).await?;
    eprintln!("Listening on http://{bind}:{port}");
    axum::serve(listener, app).await?;

    Ok(())
}
