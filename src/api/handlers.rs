use crate::{
    api::models::*,
    core::{
        errors::SmartSplitError,
        models::{
            analytics::AnalyticsData,
            change_log::ChangeLogEntry,
            expense::ExpenseEntry,
            settlement::{Balances, SettlementSummary},
            trip::{Participant, Trip},
            user::Identity,
        },
        services::{SmartSplitService, TripDetailsView},
    },
    infrastructure::{
        cache::in_memory::InMemoryCache, logging::in_memory::InMemoryChangeLog, storage::in_memory::InMemoryStorage,
    },
};
use axum::{
    Extension, Json, Router,
    extract::{Path, Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::IntoResponse,
    routing::{delete, get, patch, post},
};
use http::header;
use std::sync::Arc;
use tracing::debug;

pub type AppService = SmartSplitService<InMemoryChangeLog, InMemoryStorage, InMemoryCache>;

// Middleware resolving the bearer token into an `Identity`
async fn auth_middleware(
    State(service): State<Arc<AppService>>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| SmartSplitError::Unauthorized("Missing Authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| SmartSplitError::Unauthorized("Invalid Authorization header".to_string()))?;

    let identity = service.resolve_identity(token)?;
    debug!(user_id = %identity.user_id, "Authenticated request");
    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

fn actor_name(actor: &Option<ActorRef>) -> Option<&str> {
    actor.as_ref().map(|a| a.name.as_str())
}

pub fn api_routes(service: Arc<AppService>) -> Router {
    let protected_routes = Router::new()
        .route("/me", get(get_me))
        .route("/trips", get(list_trips).post(create_trip))
        .route("/trips/{trip_id}", patch(update_trip).delete(delete_trip))
        .route("/trips/{trip_id}/view", get(get_trip_view))
        .route("/trips/{trip_id}/balances", get(get_balances))
        .route("/trips/{trip_id}/settlements", get(get_settlements))
        .route("/trips/{trip_id}/analytics", get(get_analytics))
        .route("/trips/{trip_id}/participants", post(add_participant))
        .route(
            "/trips/{trip_id}/participants/{participant_id}",
            patch(update_participant).delete(remove_participant),
        )
        .route("/trips/{trip_id}/expenses", post(add_expense))
        .route(
            "/trips/{trip_id}/expenses/{expense_id}",
            patch(update_expense).delete(delete_expense),
        )
        .route("/trips/{trip_id}/logs", get(list_logs))
        .route("/trips/logs/{log_id}/revert", post(revert_log))
        .route("/trips/{trip_id}/revert-all", post(revert_all))
        .route_layer(middleware::from_fn_with_state(service.clone(), auth_middleware));

    Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .merge(protected_routes)
        .with_state(service)
}

#[utoipa::path(
    get,
    path = "/api/health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = AuthResponse),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
async fn register(
    State(service): State<Arc<AppService>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let user = service.register(&req.name, &req.email, &req.password).await?;
    let token = service.issue_token(&user.id)?;
    Ok((StatusCode::CREATED, Json(AuthResponse { user, token })))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
async fn login(
    State(service): State<Arc<AppService>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let (user, token) = service.authenticate(&req.email, &req.password).await?;
    Ok(Json(AuthResponse { user, token }))
}

#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "Current user", body = MeResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn get_me(
    State(service): State<Arc<AppService>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<MeResponse>, ApiError> {
    let user = service.get_user(&identity.user_id).await?;
    let stats = service.user_stats(&identity).await?;
    Ok(Json(MeResponse { user, stats }))
}

#[utoipa::path(
    get,
    path = "/api/trips",
    responses(
        (status = 200, description = "Caller's trips, newest first", body = Vec<Trip>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn list_trips(
    State(service): State<Arc<AppService>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<Trip>>, ApiError> {
    Ok(Json(service.list_trips(&identity).await?))
}

#[utoipa::path(
    post,
    path = "/api/trips",
    request_body = CreateTripRequest,
    responses(
        (status = 201, description = "Trip created", body = Trip),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn create_trip(
    State(service): State<Arc<AppService>>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<CreateTripRequest>,
) -> Result<(StatusCode, Json<Trip>), ApiError> {
    let trip = service.create_trip(&identity, req.into()).await?;
    Ok((StatusCode::CREATED, Json(trip)))
}

#[utoipa::path(
    patch,
    path = "/api/trips/{trip_id}",
    request_body = UpdateTripRequest,
    params(("trip_id" = String, Path, description = "Trip ID")),
    responses(
        (status = 200, description = "Trip updated", body = Trip),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 403, description = "Not trip owner", body = ErrorResponse),
        (status = 404, description = "Trip not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn update_trip(
    State(service): State<Arc<AppService>>,
    Extension(identity): Extension<Identity>,
    Path(trip_id): Path<String>,
    Json(req): Json<UpdateTripRequest>,
) -> Result<Json<Trip>, ApiError> {
    Ok(Json(service.update_trip(&identity, &trip_id, req.into()).await?))
}

#[utoipa::path(
    delete,
    path = "/api/trips/{trip_id}",
    params(("trip_id" = String, Path, description = "Trip ID")),
    responses(
        (status = 204, description = "Trip deleted"),
        (status = 403, description = "Not trip owner", body = ErrorResponse),
        (status = 404, description = "Trip not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn delete_trip(
    State(service): State<Arc<AppService>>,
    Extension(identity): Extension<Identity>,
    Path(trip_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    service.delete_trip(&identity, &trip_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/trips/{trip_id}/view",
    params(("trip_id" = String, Path, description = "Trip ID")),
    responses(
        (status = 200, description = "Full trip view", body = TripDetailsView),
        (status = 403, description = "Not trip owner", body = ErrorResponse),
        (status = 404, description = "Trip not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn get_trip_view(
    State(service): State<Arc<AppService>>,
    Extension(identity): Extension<Identity>,
    Path(trip_id): Path<String>,
) -> Result<Json<TripDetailsView>, ApiError> {
    Ok(Json(service.trip_view(&identity, &trip_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/trips/{trip_id}/balances",
    params(("trip_id" = String, Path, description = "Trip ID")),
    responses(
        (status = 200, description = "Net balance per participant", body = Balances),
        (status = 404, description = "Trip not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn get_balances(
    State(service): State<Arc<AppService>>,
    Extension(identity): Extension<Identity>,
    Path(trip_id): Path<String>,
) -> Result<Json<Balances>, ApiError> {
    Ok(Json(service.balances(&identity, &trip_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/trips/{trip_id}/settlements",
    params(("trip_id" = String, Path, description = "Trip ID")),
    responses(
        (status = 200, description = "Suggested transfers with stats and balances", body = SettlementSummary),
        (status = 404, description = "Trip not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn get_settlements(
    State(service): State<Arc<AppService>>,
    Extension(identity): Extension<Identity>,
    Path(trip_id): Path<String>,
) -> Result<Json<SettlementSummary>, ApiError> {
    Ok(Json(service.settlements(&identity, &trip_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/trips/{trip_id}/analytics",
    params(("trip_id" = String, Path, description = "Trip ID")),
    responses(
        (status = 200, description = "Chart-ready analytics", body = AnalyticsData),
        (status = 404, description = "Trip not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn get_analytics(
    State(service): State<Arc<AppService>>,
    Extension(identity): Extension<Identity>,
    Path(trip_id): Path<String>,
) -> Result<Json<AnalyticsData>, ApiError> {
    Ok(Json(service.analytics(&identity, &trip_id).await?))
}

#[utoipa::path(
    post,
    path = "/api/trips/{trip_id}/participants",
    request_body = CreateParticipantRequest,
    params(("trip_id" = String, Path, description = "Trip ID")),
    responses(
        (status = 201, description = "Participant added", body = Participant),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 403, description = "Not trip owner", body = ErrorResponse),
        (status = 404, description = "Trip not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn add_participant(
    State(service): State<Arc<AppService>>,
    Extension(identity): Extension<Identity>,
    Path(trip_id): Path<String>,
    Json(req): Json<CreateParticipantRequest>,
) -> Result<(StatusCode, Json<Participant>), ApiError> {
    let participant = service
        .add_participant(&identity, &trip_id, &req.name, actor_name(&req.actor))
        .await?;
    Ok((StatusCode::CREATED, Json(participant)))
}

#[utoipa::path(
    patch,
    path = "/api/trips/{trip_id}/participants/{participant_id}",
    request_body = UpdateParticipantRequest,
    params(
        ("trip_id" = String, Path, description = "Trip ID"),
        ("participant_id" = String, Path, description = "Participant ID")
    ),
    responses(
        (status = 200, description = "Participant renamed", body = Participant),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 403, description = "Not trip owner", body = ErrorResponse),
        (status = 404, description = "Trip or participant not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn update_participant(
    State(service): State<Arc<AppService>>,
    Extension(identity): Extension<Identity>,
    Path((trip_id, participant_id)): Path<(String, String)>,
    Json(req): Json<UpdateParticipantRequest>,
) -> Result<Json<Participant>, ApiError> {
    let participant = service
        .update_participant(&identity, &trip_id, &participant_id, &req.name, actor_name(&req.actor))
        .await?;
    Ok(Json(participant))
}

#[utoipa::path(
    delete,
    path = "/api/trips/{trip_id}/participants/{participant_id}",
    params(
        ("trip_id" = String, Path, description = "Trip ID"),
        ("participant_id" = String, Path, description = "Participant ID"),
        ("actorName" = Option<String>, Query, description = "Name recorded in the change log")
    ),
    responses(
        (status = 204, description = "Participant removed"),
        (status = 404, description = "Trip or participant not found", body = ErrorResponse),
        (status = 409, description = "Participant is involved in expenses", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn remove_participant(
    State(service): State<Arc<AppService>>,
    Extension(identity): Extension<Identity>,
    Path((trip_id, participant_id)): Path<(String, String)>,
    Query(query): Query<ActorQuery>,
) -> Result<StatusCode, ApiError> {
    service
        .remove_participant(&identity, &trip_id, &participant_id, query.actor_name.as_deref())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/trips/{trip_id}/expenses",
    request_body = CreateExpenseRequest,
    params(("trip_id" = String, Path, description = "Trip ID")),
    responses(
        (status = 201, description = "Expense or payment recorded", body = ExpenseEntry),
        (status = 400, description = "Invalid entry", body = ErrorResponse),
        (status = 403, description = "Not trip owner", body = ErrorResponse),
        (status = 404, description = "Trip not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn add_expense(
    State(service): State<Arc<AppService>>,
    Extension(identity): Extension<Identity>,
    Path(trip_id): Path<String>,
    Json(req): Json<CreateExpenseRequest>,
) -> Result<(StatusCode, Json<ExpenseEntry>), ApiError> {
    let actor = actor_name(&req.actor).map(str::to_string);
    let entry = service
        .add_expense(&identity, &trip_id, req.expense.into(), actor.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

#[utoipa::path(
    patch,
    path = "/api/trips/{trip_id}/expenses/{expense_id}",
    request_body = UpdateExpenseRequest,
    params(
        ("trip_id" = String, Path, description = "Trip ID"),
        ("expense_id" = String, Path, description = "Expense ID")
    ),
    responses(
        (status = 200, description = "Expense updated", body = ExpenseEntry),
        (status = 400, description = "Invalid entry", body = ErrorResponse),
        (status = 404, description = "Trip or expense not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn update_expense(
    State(service): State<Arc<AppService>>,
    Extension(identity): Extension<Identity>,
    Path((trip_id, expense_id)): Path<(String, String)>,
    Json(req): Json<UpdateExpenseRequest>,
) -> Result<Json<ExpenseEntry>, ApiError> {
    let actor = actor_name(&req.actor).map(str::to_string);
    let entry = service
        .update_expense(&identity, &trip_id, &expense_id, req.data.into(), actor.as_deref())
        .await?;
    Ok(Json(entry))
}

#[utoipa::path(
    delete,
    path = "/api/trips/{trip_id}/expenses/{expense_id}",
    params(
        ("trip_id" = String, Path, description = "Trip ID"),
        ("expense_id" = String, Path, description = "Expense ID"),
        ("actorName" = Option<String>, Query, description = "Name recorded in the change log")
    ),
    responses(
        (status = 204, description = "Expense deleted"),
        (status = 404, description = "Trip or expense not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn delete_expense(
    State(service): State<Arc<AppService>>,
    Extension(identity): Extension<Identity>,
    Path((trip_id, expense_id)): Path<(String, String)>,
    Query(query): Query<ActorQuery>,
) -> Result<StatusCode, ApiError> {
    service
        .delete_expense(&identity, &trip_id, &expense_id, query.actor_name.as_deref())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/trips/{trip_id}/logs",
    params(("trip_id" = String, Path, description = "Trip ID")),
    responses(
        (status = 200, description = "Change log, newest first", body = Vec<ChangeLogEntry>),
        (status = 404, description = "Trip not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn list_logs(
    State(service): State<Arc<AppService>>,
    Extension(identity): Extension<Identity>,
    Path(trip_id): Path<String>,
) -> Result<Json<Vec<ChangeLogEntry>>, ApiError> {
    Ok(Json(service.list_logs(&identity, &trip_id).await?))
}

#[utoipa::path(
    post,
    path = "/api/trips/logs/{log_id}/revert",
    params(("log_id" = String, Path, description = "Change log entry ID")),
    responses(
        (status = 200, description = "Change reverted", body = ChangeLogEntry),
        (status = 400, description = "Entry cannot be reverted", body = ErrorResponse),
        (status = 404, description = "Change log entry not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn revert_log(
    State(service): State<Arc<AppService>>,
    Extension(identity): Extension<Identity>,
    Path(log_id): Path<String>,
) -> Result<Json<ChangeLogEntry>, ApiError> {
    Ok(Json(service.revert_log(&identity, &log_id).await?))
}

#[utoipa::path(
    post,
    path = "/api/trips/{trip_id}/revert-all",
    params(("trip_id" = String, Path, description = "Trip ID")),
    responses(
        (status = 200, description = "All changes reverted", body = RevertAllResponse),
        (status = 404, description = "Trip not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn revert_all(
    State(service): State<Arc<AppService>>,
    Extension(identity): Extension<Identity>,
    Path(trip_id): Path<String>,
) -> Result<Json<RevertAllResponse>, ApiError> {
    let reverted = service.revert_all(&identity, &trip_id).await?;
    Ok(Json(RevertAllResponse { reverted }))
}
