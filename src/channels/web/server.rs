//! Axum HTTP server for the web gateway.
//!
//! Handles all API routes: session and UI state, clients, projects, team,
//! invoices, contracts, testimonials, activity, submissions and health.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{HeaderValue, Method, StatusCode, header},
    middleware,
    routing::{delete, get, post, put},
};
use chrono::Utc;
use tokio::sync::{RwLock, oneshot};
use tower::ServiceBuilder;
use tower_http::cors::{AllowHeaders, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::business::activity::log_activity;
use crate::business::billing::{self, InvoiceDraft};
use crate::business::filter::ListQuery;
use crate::business::format::{format_currency, format_relative};
use crate::business::status::{self, options_for};
use crate::business::{
    DeleteOutcome, StatusOptions, delete_project as cascade_delete_project,
    delete_team_member as cascade_delete_team_member,
};
use crate::channels::web::auth::{AuthState, auth_middleware};
use crate::channels::web::types::*;
use crate::context::{AppContext, AuthSession, Theme};
use crate::db::{
    ClientRecord, ContractRecord, CreateClientParams, CreateContactSubmissionParams,
    CreateContractParams, CreateFeedbackParams, CreateProjectFileParams, CreateProjectParams,
    CreateTeamMemberParams, CreateTestimonialParams, Database, EntityType, InvoiceRecord,
    InvoiceStatus, ProjectFileRecord, ProjectListEntry, ProjectMemberRecord, ProjectRecord,
    ProjectStatus, TeamMemberRecord, TeamMemberStatus, TestimonialRecord, UpdateClientParams,
    UpdateProjectParams, UpdateTeamMemberParams,
};
use crate::error::{ChannelError, DatabaseError};

type ApiError = (StatusCode, String);

const DEFAULT_ACTIVITY_LIMIT: i64 = 20;
const MAX_LIST_LIMIT: i64 = 100;

/// Simple sliding-window rate limiter.
///
/// Guards the public contact form. Not per-IP; it only prevents flooding.
pub struct RateLimiter {
    /// Requests remaining in the current window.
    remaining: AtomicU64,
    /// Epoch second when the current window started.
    window_start: AtomicU64,
    max_requests: u64,
    window_secs: u64,
}

fn epoch_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

impl RateLimiter {
    pub fn new(max_requests: u64, window_secs: u64) -> Self {
        Self {
            remaining: AtomicU64::new(max_requests),
            window_start: AtomicU64::new(epoch_secs()),
            max_requests,
            window_secs,
        }
    }

    /// Try to consume one request. Returns `false` when rate limited.
    pub fn check(&self) -> bool {
        let now = epoch_secs();
        let window = self.window_start.load(Ordering::Relaxed);
        if now.saturating_sub(window) >= self.window_secs {
            self.window_start.store(now, Ordering::Relaxed);
            self.remaining
                .store(self.max_requests.saturating_sub(1), Ordering::Relaxed);
            return self.max_requests > 0;
        }

        loop {
            let current = self.remaining.load(Ordering::Relaxed);
            if current == 0 {
                return false;
            }
            if self
                .remaining
                .compare_exchange_weak(current, current - 1, Ordering::Relaxed, Ordering::Relaxed)
                .is_ok()
            {
                return true;
            }
        }
    }
}

/// Shared state for all gateway handlers.
pub struct GatewayState {
    pub store: Arc<dyn Database>,
    /// Theme, sidebar and session providers.
    pub context: Arc<AppContext>,
    /// Identity restored by `POST /api/session`.
    pub identity: AuthSession,
    /// Rate limiter for the public contact form (5 per 60 seconds).
    pub contact_rate_limiter: RateLimiter,
    /// Shutdown signal sender.
    pub shutdown_tx: RwLock<Option<oneshot::Sender<()>>>,
    /// Server startup time for uptime calculation.
    pub startup_time: Instant,
}

impl GatewayState {
    pub fn new(store: Arc<dyn Database>, context: Arc<AppContext>, identity: AuthSession) -> Self {
        Self {
            store,
            context,
            identity,
            contact_rate_limiter: RateLimiter::new(5, 60),
            shutdown_tx: RwLock::new(None),
            startup_time: Instant::now(),
        }
    }

    /// Signal the server task to stop accepting connections.
    pub async fn shutdown(&self) {
        if let Some(tx) = self.shutdown_tx.write().await.take() {
            let _ = tx.send(());
        }
    }
}

const CONTENT_SECURITY_POLICY: &str = "default-src 'none'; frame-ancestors 'none'; base-uri 'none'; form-action 'self'";

/// Start the gateway HTTP server.
///
/// Returns the actual bound `SocketAddr` (useful when binding to port 0).
pub async fn start_server(
    addr: SocketAddr,
    state: Arc<GatewayState>,
    auth_token: String,
) -> Result<SocketAddr, ChannelError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ChannelError::StartupFailed {
            name: "gateway".to_string(),
            reason: format!("Failed to bind to {}: {}", addr, e),
        })?;
    let bound_addr = listener
        .local_addr()
        .map_err(|e| ChannelError::StartupFailed {
            name: "gateway".to_string(),
            reason: format!("Failed to get local addr: {}", e),
        })?;

    // Public routes (no auth)
    let public = Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/contact", post(contact_submit_handler));

    // Protected routes (require auth)
    let auth_state = AuthState { token: auth_token };
    let protected = Router::new()
        .route("/api/gateway/status", get(gateway_status_handler))
        // Session and UI providers
        .route(
            "/api/session",
            get(session_get_handler)
                .post(session_sign_in_handler)
                .delete(session_sign_out_handler),
        )
        .route("/api/ui", get(ui_get_handler))
        .route("/api/ui/theme", put(ui_theme_handler))
        .route("/api/ui/sidebar", put(ui_sidebar_handler))
        .route("/api/status-options/{kind}", get(status_options_handler))
        // Clients
        .route(
            "/api/clients",
            get(clients_list_handler).post(clients_create_handler),
        )
        .route(
            "/api/clients/{id}",
            get(clients_get_handler)
                .put(clients_update_handler)
                .delete(clients_delete_handler),
        )
        // Projects
        .route(
            "/api/projects",
            get(projects_list_handler).post(projects_create_handler),
        )
        .route(
            "/api/projects/{id}",
            get(projects_detail_handler)
                .put(projects_update_handler)
                .delete(projects_delete_handler),
        )
        .route("/api/projects/{id}/status", put(projects_status_handler))
        .route(
            "/api/projects/{id}/members",
            get(project_members_list_handler).post(project_members_add_handler),
        )
        .route(
            "/api/projects/{id}/files",
            get(project_files_list_handler).post(project_files_create_handler),
        )
        // Team
        .route("/api/team", get(team_list_handler).post(team_create_handler))
        .route(
            "/api/team/{id}",
            get(team_get_handler)
                .put(team_update_handler)
                .delete(team_delete_handler),
        )
        .route("/api/team/{id}/status", put(team_status_handler))
        // Invoices
        .route(
            "/api/invoices",
            get(invoices_list_handler).post(invoices_create_handler),
        )
        .route(
            "/api/invoices/{id}",
            get(invoices_detail_handler).delete(invoices_delete_handler),
        )
        .route("/api/invoices/{id}/status", put(invoices_status_handler))
        // Contracts and testimonials
        .route(
            "/api/contracts",
            get(contracts_list_handler).post(contracts_create_handler),
        )
        .route(
            "/api/contracts/{id}",
            get(contracts_get_handler).delete(contracts_delete_handler),
        )
        .route(
            "/api/testimonials",
            get(testimonials_list_handler).post(testimonials_create_handler),
        )
        .route(
            "/api/testimonials/{id}",
            delete(testimonials_delete_handler),
        )
        // Timeline and submissions
        .route("/api/activity", get(activity_list_handler))
        .route("/api/feedback", post(feedback_submit_handler))
        .route("/api/admin/contact", get(admin_contact_list_handler))
        .route("/api/admin/feedback", get(admin_feedback_list_handler))
        .route_layer(middleware::from_fn_with_state(
            auth_state.clone(),
            auth_middleware,
        ));

    // CORS: only localhost/127.0.0.1 origins on the bound port are allowed,
    // since the gateway is a local-first service.
    let origins: Vec<HeaderValue> = [
        format!("http://{}:{}", bound_addr.ip(), bound_addr.port()),
        format!("http://localhost:{}", bound_addr.port()),
    ]
    .iter()
    .filter_map(|origin| HeaderValue::from_str(origin).ok())
    .collect();
    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
        ]))
        .allow_credentials(true);

    let security_headers = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static(CONTENT_SECURITY_POLICY),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ));

    let app = Router::new()
        .merge(public)
        .merge(protected)
        .layer(DefaultBodyLimit::max(1024 * 1024)) // 1 MB max request body
        .layer(cors)
        .layer(security_headers)
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    *state.shutdown_tx.write().await = Some(shutdown_tx);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                tracing::info!("Web gateway shutting down");
            })
            .await
        {
            tracing::error!("Web gateway server error: {}", e);
        }
    });

    tracing::info!(addr = %bound_addr, "Web gateway listening");
    Ok(bound_addr)
}

// --- Error mapping ---

fn db_error(err: DatabaseError) -> ApiError {
    match err {
        DatabaseError::NotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        DatabaseError::Constraint(_) => (StatusCode::CONFLICT, err.to_string()),
        DatabaseError::Validation(message) => (StatusCode::BAD_REQUEST, message),
        other => {
            tracing::error!(error = %other, "database error in gateway handler");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error".to_string(),
            )
        }
    }
}

fn parse_id(raw: &str, what: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| (StatusCode::BAD_REQUEST, format!("Invalid {} ID", what)))
}

fn not_found(what: &str) -> ApiError {
    (StatusCode::NOT_FOUND, format!("{} not found", what))
}

fn parse_status<S: StatusOptions>(raw: &str) -> Result<S, ApiError> {
    S::parse(raw.trim()).ok_or_else(|| {
        let allowed: Vec<&str> = S::ALL.iter().map(|s| s.value()).collect();
        (
            StatusCode::BAD_REQUEST,
            format!(
                "Unknown status '{}'; expected one of: {}",
                raw,
                allowed.join(", ")
            ),
        )
    })
}

fn unknown_status_filter() -> ApiError {
    (StatusCode::BAD_REQUEST, "Unknown status filter".to_string())
}

fn require_text(value: &str, field: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("'{}' must not be empty", field),
        ));
    }
    Ok(())
}

fn require_confirmation(query: &ConfirmQuery) -> Result<(), ApiError> {
    if !query.confirm {
        return Err((
            StatusCode::BAD_REQUEST,
            "Deletion must be confirmed with confirm=true".to_string(),
        ));
    }
    Ok(())
}

/// The signed-in session, or 401 after sign-out.
fn signed_in(state: &GatewayState) -> Result<AuthSession, ApiError> {
    state
        .context
        .session
        .current()
        .ok_or((StatusCode::UNAUTHORIZED, "Not signed in".to_string()))
}

fn require_admin(state: &GatewayState) -> Result<AuthSession, ApiError> {
    let session = signed_in(state)?;
    if !session.is_admin() {
        return Err((StatusCode::FORBIDDEN, "Admin role required".to_string()));
    }
    Ok(session)
}

fn list_limit(query: &LimitQuery, default: i64) -> i64 {
    query.limit.unwrap_or(default).clamp(1, MAX_LIST_LIMIT)
}

// --- Health ---

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        channel: "gateway",
    })
}

async fn gateway_status_handler(
    State(state): State<Arc<GatewayState>>,
) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "uptime_secs": state.startup_time.elapsed().as_secs(),
        "signed_in": state.context.session.current().is_some(),
    }))
}

// --- Session / UI ---

async fn session_get_handler(
    State(state): State<Arc<GatewayState>>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = signed_in(&state)?;
    let profile = state
        .store
        .get_user_profile(&session.user_id)
        .await
        .map_err(db_error)?;
    Ok(Json(SessionResponse {
        is_admin: session.is_admin(),
        email: session
            .email
            .clone()
            .or_else(|| profile.as_ref().and_then(|p| p.email.clone())),
        full_name: profile.and_then(|p| p.full_name),
        role: session.role,
        user_id: session.user_id,
    }))
}

async fn session_sign_in_handler(
    State(state): State<Arc<GatewayState>>,
) -> Result<Json<SessionResponse>, ApiError> {
    state.context.session.sign_in(state.identity.clone());
    session_get_handler(State(state)).await
}

async fn session_sign_out_handler(State(state): State<Arc<GatewayState>>) -> StatusCode {
    state.context.session.sign_out();
    StatusCode::NO_CONTENT
}

fn ui_state(context: &AppContext) -> UiStateResponse {
    UiStateResponse {
        theme: context.theme.current().as_str(),
        sidebar: context.sidebar.current(),
        currency: context.currency.code(),
        currency_symbol: context.currency.symbol(),
    }
}

async fn ui_get_handler(State(state): State<Arc<GatewayState>>) -> Json<UiStateResponse> {
    Json(ui_state(&state.context))
}

async fn ui_theme_handler(
    State(state): State<Arc<GatewayState>>,
    Json(req): Json<ThemeRequest>,
) -> Result<Json<UiStateResponse>, ApiError> {
    match req.theme.as_deref() {
        Some(raw) => {
            let theme = Theme::parse(raw).ok_or((
                StatusCode::BAD_REQUEST,
                format!("Unknown theme '{}'", raw),
            ))?;
            state.context.theme.set(theme);
        }
        None => {
            state.context.theme.toggle();
        }
    }
    Ok(Json(ui_state(&state.context)))
}

async fn ui_sidebar_handler(
    State(state): State<Arc<GatewayState>>,
    Json(req): Json<SidebarRequest>,
) -> Json<UiStateResponse> {
    let sidebar = &state.context.sidebar;
    if let Some(open) = req.open {
        sidebar.set_open(open);
    }
    if let Some(collapsed) = req.collapsed {
        sidebar.set_collapsed(collapsed);
    }
    if req.toggle_collapsed {
        sidebar.toggle_collapsed();
    }
    Json(ui_state(&state.context))
}

async fn status_options_handler(
    Path(kind): Path<String>,
) -> Result<Json<StatusOptionsResponse>, ApiError> {
    let options = options_for(&kind).ok_or_else(|| not_found("Status kind"))?;
    Ok(Json(StatusOptionsResponse { kind, options }))
}

// --- Clients ---

async fn clients_list_handler(
    State(state): State<Arc<GatewayState>>,
) -> Result<Json<ClientListResponse>, ApiError> {
    let session = signed_in(&state)?;
    let clients = state
        .store
        .list_clients(&session.user_id)
        .await
        .map_err(db_error)?;
    Ok(Json(ClientListResponse { clients }))
}

async fn clients_create_handler(
    State(state): State<Arc<GatewayState>>,
    Json(req): Json<CreateClientRequest>,
) -> Result<(StatusCode, Json<ClientRecord>), ApiError> {
    let session = signed_in(&state)?;
    let params = CreateClientParams {
        name: req.name,
        email: req.email,
        phone: req.phone,
        company: req.company,
        address: req.address,
        notes: req.notes,
    };
    let client = state
        .store
        .create_client(&session.user_id, &params)
        .await
        .map_err(db_error)?;
    log_activity(
        state.store.as_ref(),
        &session.user_id,
        EntityType::Client,
        Some(client.id.to_string()),
        "created",
        format!("Client \"{}\" added", client.name),
    )
    .await;
    Ok((StatusCode::CREATED, Json(client)))
}

async fn clients_get_handler(
    State(state): State<Arc<GatewayState>>,
    Path(id): Path<String>,
) -> Result<Json<ClientRecord>, ApiError> {
    let session = signed_in(&state)?;
    let client_id = parse_id(&id, "client")?;
    state
        .store
        .get_client(&session.user_id, client_id)
        .await
        .map_err(db_error)?
        .map(Json)
        .ok_or_else(|| not_found("Client"))
}

async fn clients_update_handler(
    State(state): State<Arc<GatewayState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateClientRequest>,
) -> Result<Json<ClientRecord>, ApiError> {
    let session = signed_in(&state)?;
    let client_id = parse_id(&id, "client")?;
    let params = UpdateClientParams {
        name: req.name,
        email: req.email,
        phone: req.phone,
        company: req.company,
        address: req.address,
        notes: req.notes,
    };
    let client = state
        .store
        .update_client(&session.user_id, client_id, &params)
        .await
        .map_err(db_error)?
        .ok_or_else(|| not_found("Client"))?;
    log_activity(
        state.store.as_ref(),
        &session.user_id,
        EntityType::Client,
        Some(client.id.to_string()),
        "updated",
        format!("Client \"{}\" updated", client.name),
    )
    .await;
    Ok(Json(client))
}

async fn clients_delete_handler(
    State(state): State<Arc<GatewayState>>,
    Path(id): Path<String>,
) -> Result<Json<DeletedResponse>, ApiError> {
    let session = signed_in(&state)?;
    let client_id = parse_id(&id, "client")?;
    let deleted = state
        .store
        .delete_client(&session.user_id, client_id)
        .await
        .map_err(db_error)?;
    if !deleted {
        return Err(not_found("Client"));
    }
    log_activity(
        state.store.as_ref(),
        &session.user_id,
        EntityType::Client,
        Some(client_id.to_string()),
        "deleted",
        "Client deleted".to_string(),
    )
    .await;
    Ok(Json(DeletedResponse { deleted }))
}

// --- Projects ---

async fn projects_list_handler(
    State(state): State<Arc<GatewayState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ProjectListResponse>, ApiError> {
    let session = signed_in(&state)?;
    let filter = query
        .to_filter::<ProjectStatus>()
        .ok_or_else(unknown_status_filter)?;
    let rows = state
        .store
        .list_projects(&session.user_id)
        .await
        .map_err(db_error)?;
    let total = rows.len();
    Ok(Json(ProjectListResponse {
        projects: filter.apply(rows),
        total,
    }))
}

async fn projects_create_handler(
    State(state): State<Arc<GatewayState>>,
    Json(req): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<ProjectRecord>), ApiError> {
    let session = signed_in(&state)?;
    require_text(&req.name, "name")?;
    let status = match req.status.as_deref() {
        Some(raw) => parse_status::<ProjectStatus>(raw)?,
        None => ProjectStatus::Todo,
    };
    let params = CreateProjectParams {
        name: req.name,
        client_id: req.client_id,
        description: req.description,
        status,
        progress: req.progress.unwrap_or(0),
        budget: req.budget,
        start_date: req.start_date,
        due_date: req.due_date,
    };
    let project = state
        .store
        .create_project(&session.user_id, &params)
        .await
        .map_err(db_error)?;
    log_activity(
        state.store.as_ref(),
        &session.user_id,
        EntityType::Project,
        Some(project.id.to_string()),
        "created",
        format!("Project \"{}\" created", project.name),
    )
    .await;
    Ok((StatusCode::CREATED, Json(project)))
}

async fn projects_detail_handler(
    State(state): State<Arc<GatewayState>>,
    Path(id): Path<String>,
) -> Result<Json<ProjectDetailResponse>, ApiError> {
    let session = signed_in(&state)?;
    let project_id = parse_id(&id, "project")?;
    let project = state
        .store
        .get_project(&session.user_id, project_id)
        .await
        .map_err(db_error)?
        .ok_or_else(|| not_found("Project"))?;
    let members = state
        .store
        .list_project_members(&session.user_id, project_id)
        .await
        .map_err(db_error)?;
    let files = state
        .store
        .list_project_files(&session.user_id, project_id)
        .await
        .map_err(db_error)?;
    let currency = state.context.currency;
    Ok(Json(ProjectDetailResponse {
        budget_display: project.budget.map(|b| format_currency(b, currency)),
        project,
        members,
        files,
    }))
}

async fn projects_update_handler(
    State(state): State<Arc<GatewayState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateProjectRequest>,
) -> Result<Json<ProjectRecord>, ApiError> {
    let session = signed_in(&state)?;
    let project_id = parse_id(&id, "project")?;
    if let Some(name) = req.name.as_deref() {
        require_text(name, "name")?;
    }
    let params = UpdateProjectParams {
        name: req.name,
        client_id: req.client_id,
        description: req.description,
        status: None,
        progress: req.progress,
        budget: req.budget,
        start_date: req.start_date,
        due_date: req.due_date,
    };
    let project = state
        .store
        .update_project(&session.user_id, project_id, &params)
        .await
        .map_err(db_error)?
        .ok_or_else(|| not_found("Project"))?;
    log_activity(
        state.store.as_ref(),
        &session.user_id,
        EntityType::Project,
        Some(project.id.to_string()),
        "updated",
        format!("Project \"{}\" updated", project.name),
    )
    .await;
    Ok(Json(project))
}

async fn projects_status_handler(
    State(state): State<Arc<GatewayState>>,
    Path(id): Path<String>,
    Json(req): Json<StatusChangeRequest>,
) -> Result<Json<ProjectRecord>, ApiError> {
    let session = signed_in(&state)?;
    let project_id = parse_id(&id, "project")?;
    let next = parse_status::<ProjectStatus>(&req.status)?;
    status::set_project_status(state.store.as_ref(), &session.user_id, project_id, next)
        .await
        .map_err(db_error)?
        .map(Json)
        .ok_or_else(|| not_found("Project"))
}

async fn projects_delete_handler(
    State(state): State<Arc<GatewayState>>,
    Path(id): Path<String>,
    Query(confirm): Query<ConfirmQuery>,
) -> Result<Json<DeleteOutcome<ProjectListEntry>>, ApiError> {
    let session = signed_in(&state)?;
    let project_id = parse_id(&id, "project")?;
    require_confirmation(&confirm)?;
    let outcome = cascade_delete_project(
        state.store.as_ref(),
        &session.user_id,
        project_id,
        confirm.display_name(),
    )
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.alert_message("project")))?;
    Ok(Json(outcome))
}

async fn project_members_list_handler(
    State(state): State<Arc<GatewayState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ProjectMemberRecord>>, ApiError> {
    let session = signed_in(&state)?;
    let project_id = parse_id(&id, "project")?;
    let members = state
        .store
        .list_project_members(&session.user_id, project_id)
        .await
        .map_err(db_error)?;
    Ok(Json(members))
}

async fn project_members_add_handler(
    State(state): State<Arc<GatewayState>>,
    Path(id): Path<String>,
    Json(req): Json<AddProjectMemberRequest>,
) -> Result<(StatusCode, Json<ProjectMemberRecord>), ApiError> {
    let session = signed_in(&state)?;
    let project_id = parse_id(&id, "project")?;
    let member = state
        .store
        .add_project_member(
            &session.user_id,
            project_id,
            req.team_member_id,
            req.role.as_deref(),
        )
        .await
        .map_err(db_error)?;
    Ok((StatusCode::CREATED, Json(member)))
}

async fn project_files_list_handler(
    State(state): State<Arc<GatewayState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ProjectFileRecord>>, ApiError> {
    let session = signed_in(&state)?;
    let project_id = parse_id(&id, "project")?;
    let files = state
        .store
        .list_project_files(&session.user_id, project_id)
        .await
        .map_err(db_error)?;
    Ok(Json(files))
}

async fn project_files_create_handler(
    State(state): State<Arc<GatewayState>>,
    Path(id): Path<String>,
    Json(req): Json<ProjectFileRequest>,
) -> Result<(StatusCode, Json<ProjectFileRecord>), ApiError> {
    let session = signed_in(&state)?;
    let project_id = parse_id(&id, "project")?;
    let params = CreateProjectFileParams {
        uploaded_by: req.uploaded_by,
        file_name: req.file_name,
        storage_path: req.storage_path,
        content_type: req.content_type,
        size_bytes: req.size_bytes,
    };
    let file = state
        .store
        .create_project_file(&session.user_id, project_id, &params)
        .await
        .map_err(db_error)?;
    Ok((StatusCode::CREATED, Json(file)))
}

// --- Team ---

async fn team_list_handler(
    State(state): State<Arc<GatewayState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<TeamListResponse>, ApiError> {
    let session = signed_in(&state)?;
    let filter = query
        .to_filter::<TeamMemberStatus>()
        .ok_or_else(unknown_status_filter)?;
    let rows = state
        .store
        .list_team_members(&session.user_id)
        .await
        .map_err(db_error)?;
    let total = rows.len();
    Ok(Json(TeamListResponse {
        members: filter.apply(rows),
        total,
    }))
}

async fn team_create_handler(
    State(state): State<Arc<GatewayState>>,
    Json(req): Json<CreateTeamMemberRequest>,
) -> Result<(StatusCode, Json<TeamMemberRecord>), ApiError> {
    let session = signed_in(&state)?;
    require_text(&req.name, "name")?;
    let status = match req.status.as_deref() {
        Some(raw) => parse_status::<TeamMemberStatus>(raw)?,
        None => TeamMemberStatus::Active,
    };
    let params = CreateTeamMemberParams {
        name: req.name,
        email: req.email,
        phone: req.phone,
        position: req.position,
        hourly_rate: req.hourly_rate,
        status,
    };
    let member = state
        .store
        .create_team_member(&session.user_id, &params)
        .await
        .map_err(db_error)?;
    log_activity(
        state.store.as_ref(),
        &session.user_id,
        EntityType::TeamMember,
        Some(member.id.to_string()),
        "created",
        format!("{} joined the team", member.name),
    )
    .await;
    Ok((StatusCode::CREATED, Json(member)))
}

async fn team_get_handler(
    State(state): State<Arc<GatewayState>>,
    Path(id): Path<String>,
) -> Result<Json<TeamMemberRecord>, ApiError> {
    let session = signed_in(&state)?;
    let member_id = parse_id(&id, "team member")?;
    state
        .store
        .get_team_member(&session.user_id, member_id)
        .await
        .map_err(db_error)?
        .map(Json)
        .ok_or_else(|| not_found("Team member"))
}

async fn team_update_handler(
    State(state): State<Arc<GatewayState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateTeamMemberRequest>,
) -> Result<Json<TeamMemberRecord>, ApiError> {
    let session = signed_in(&state)?;
    let member_id = parse_id(&id, "team member")?;
    if let Some(name) = req.name.as_deref() {
        require_text(name, "name")?;
    }
    let params = UpdateTeamMemberParams {
        name: req.name,
        email: req.email,
        phone: req.phone,
        position: req.position,
        hourly_rate: req.hourly_rate,
        status: None,
    };
    let member = state
        .store
        .update_team_member(&session.user_id, member_id, &params)
        .await
        .map_err(db_error)?
        .ok_or_else(|| not_found("Team member"))?;
    log_activity(
        state.store.as_ref(),
        &session.user_id,
        EntityType::TeamMember,
        Some(member.id.to_string()),
        "updated",
        format!("{}'s details updated", member.name),
    )
    .await;
    Ok(Json(member))
}

async fn team_status_handler(
    State(state): State<Arc<GatewayState>>,
    Path(id): Path<String>,
    Json(req): Json<StatusChangeRequest>,
) -> Result<Json<TeamMemberRecord>, ApiError> {
    let session = signed_in(&state)?;
    let member_id = parse_id(&id, "team member")?;
    let next = parse_status::<TeamMemberStatus>(&req.status)?;
    status::set_team_member_status(state.store.as_ref(), &session.user_id, member_id, next)
        .await
        .map_err(db_error)?
        .map(Json)
        .ok_or_else(|| not_found("Team member"))
}

async fn team_delete_handler(
    State(state): State<Arc<GatewayState>>,
    Path(id): Path<String>,
    Query(confirm): Query<ConfirmQuery>,
) -> Result<Json<DeleteOutcome<TeamMemberRecord>>, ApiError> {
    let session = signed_in(&state)?;
    let member_id = parse_id(&id, "team member")?;
    require_confirmation(&confirm)?;
    let outcome = cascade_delete_team_member(
        state.store.as_ref(),
        &session.user_id,
        member_id,
        confirm.display_name(),
    )
    .await
    .map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            e.alert_message("team member"),
        )
    })?;
    Ok(Json(outcome))
}

// --- Invoices ---

async fn invoices_list_handler(
    State(state): State<Arc<GatewayState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<InvoiceListResponse>, ApiError> {
    let session = signed_in(&state)?;
    let filter = query
        .to_filter::<InvoiceStatus>()
        .ok_or_else(unknown_status_filter)?;
    let rows = state
        .store
        .list_invoices(&session.user_id)
        .await
        .map_err(db_error)?;
    let total = rows.len();
    let currency = state.context.currency;
    let invoices = filter
        .apply(rows)
        .into_iter()
        .map(|entry| InvoiceSummary {
            total_display: format_currency(entry.invoice.total, currency),
            entry,
        })
        .collect();
    Ok(Json(InvoiceListResponse { invoices, total }))
}

async fn invoices_create_handler(
    State(state): State<Arc<GatewayState>>,
    Json(draft): Json<InvoiceDraft>,
) -> Result<(StatusCode, Json<InvoiceDetailResponse>), ApiError> {
    let session = signed_in(&state)?;
    let (params, items) =
        billing::build_invoice(&draft).map_err(|msg| (StatusCode::BAD_REQUEST, msg))?;
    let (invoice, items) =
        billing::create_invoice(state.store.as_ref(), &session.user_id, &params, &items)
            .await
            .map_err(db_error)?;
    Ok((
        StatusCode::CREATED,
        Json(InvoiceDetailResponse {
            total_display: format_currency(invoice.total, state.context.currency),
            invoice,
            items,
        }),
    ))
}

async fn invoices_detail_handler(
    State(state): State<Arc<GatewayState>>,
    Path(id): Path<String>,
) -> Result<Json<InvoiceDetailResponse>, ApiError> {
    let session = signed_in(&state)?;
    let invoice_id = parse_id(&id, "invoice")?;
    let invoice = state
        .store
        .get_invoice(&session.user_id, invoice_id)
        .await
        .map_err(db_error)?
        .ok_or_else(|| not_found("Invoice"))?;
    let items = state
        .store
        .list_invoice_items(&session.user_id, invoice_id)
        .await
        .map_err(db_error)?;
    Ok(Json(InvoiceDetailResponse {
        total_display: format_currency(invoice.total, state.context.currency),
        invoice,
        items,
    }))
}

async fn invoices_status_handler(
    State(state): State<Arc<GatewayState>>,
    Path(id): Path<String>,
    Json(req): Json<StatusChangeRequest>,
) -> Result<Json<InvoiceRecord>, ApiError> {
    let session = signed_in(&state)?;
    let invoice_id = parse_id(&id, "invoice")?;
    let next = parse_status::<InvoiceStatus>(&req.status)?;
    status::set_invoice_status(state.store.as_ref(), &session.user_id, invoice_id, next)
        .await
        .map_err(db_error)?
        .map(Json)
        .ok_or_else(|| not_found("Invoice"))
}

async fn invoices_delete_handler(
    State(state): State<Arc<GatewayState>>,
    Path(id): Path<String>,
) -> Result<Json<DeletedResponse>, ApiError> {
    let session = signed_in(&state)?;
    let invoice_id = parse_id(&id, "invoice")?;
    let deleted = state
        .store
        .delete_invoice(&session.user_id, invoice_id)
        .await
        .map_err(db_error)?;
    if !deleted {
        return Err(not_found("Invoice"));
    }
    log_activity(
        state.store.as_ref(),
        &session.user_id,
        EntityType::Invoice,
        Some(invoice_id.to_string()),
        "deleted",
        "Invoice deleted".to_string(),
    )
    .await;
    Ok(Json(DeletedResponse { deleted }))
}

// --- Contracts ---

async fn contracts_list_handler(
    State(state): State<Arc<GatewayState>>,
) -> Result<Json<ContractListResponse>, ApiError> {
    let session = signed_in(&state)?;
    let contracts = state
        .store
        .list_contracts(&session.user_id)
        .await
        .map_err(db_error)?;
    Ok(Json(ContractListResponse { contracts }))
}

async fn contracts_create_handler(
    State(state): State<Arc<GatewayState>>,
    Json(req): Json<CreateContractRequest>,
) -> Result<(StatusCode, Json<ContractRecord>), ApiError> {
    let session = signed_in(&state)?;
    require_text(&req.title, "title")?;
    if let (Some(start), Some(end)) = (req.start_date, req.end_date)
        && end < start
    {
        return Err((
            StatusCode::BAD_REQUEST,
            "End date cannot be before the start date".to_string(),
        ));
    }
    let params = CreateContractParams {
        client_id: req.client_id,
        project_id: req.project_id,
        title: req.title.trim().to_string(),
        content: req.content,
        value: req.value,
        start_date: req.start_date,
        end_date: req.end_date,
    };
    let contract = state
        .store
        .create_contract(&session.user_id, &params)
        .await
        .map_err(db_error)?;
    log_activity(
        state.store.as_ref(),
        &session.user_id,
        EntityType::Contract,
        Some(contract.id.to_string()),
        "created",
        format!("Contract \"{}\" drafted", contract.title),
    )
    .await;
    Ok((StatusCode::CREATED, Json(contract)))
}

async fn contracts_get_handler(
    State(state): State<Arc<GatewayState>>,
    Path(id): Path<String>,
) -> Result<Json<ContractRecord>, ApiError> {
    let session = signed_in(&state)?;
    let contract_id = parse_id(&id, "contract")?;
    state
        .store
        .get_contract(&session.user_id, contract_id)
        .await
        .map_err(db_error)?
        .map(Json)
        .ok_or_else(|| not_found("Contract"))
}

async fn contracts_delete_handler(
    State(state): State<Arc<GatewayState>>,
    Path(id): Path<String>,
) -> Result<Json<DeletedResponse>, ApiError> {
    let session = signed_in(&state)?;
    let contract_id = parse_id(&id, "contract")?;
    let deleted = state
        .store
        .delete_contract(&session.user_id, contract_id)
        .await
        .map_err(db_error)?;
    if !deleted {
        return Err(not_found("Contract"));
    }
    Ok(Json(DeletedResponse { deleted }))
}

// --- Testimonials ---

async fn testimonials_list_handler(
    State(state): State<Arc<GatewayState>>,
) -> Result<Json<TestimonialListResponse>, ApiError> {
    let session = signed_in(&state)?;
    let testimonials = state
        .store
        .list_testimonials(&session.user_id)
        .await
        .map_err(db_error)?;
    Ok(Json(TestimonialListResponse { testimonials }))
}

async fn testimonials_create_handler(
    State(state): State<Arc<GatewayState>>,
    Json(req): Json<CreateTestimonialRequest>,
) -> Result<(StatusCode, Json<TestimonialRecord>), ApiError> {
    let session = signed_in(&state)?;
    require_text(&req.author_name, "author_name")?;
    require_text(&req.content, "content")?;
    if let Some(rating) = req.rating
        && !(1..=5).contains(&rating)
    {
        return Err((
            StatusCode::BAD_REQUEST,
            "Rating must be between 1 and 5".to_string(),
        ));
    }
    let params = CreateTestimonialParams {
        client_id: req.client_id,
        project_id: req.project_id,
        author_name: req.author_name.trim().to_string(),
        author_title: req.author_title,
        content: req.content,
        rating: req.rating,
    };
    let testimonial = state
        .store
        .create_testimonial(&session.user_id, &params)
        .await
        .map_err(db_error)?;
    log_activity(
        state.store.as_ref(),
        &session.user_id,
        EntityType::Testimonial,
        Some(testimonial.id.to_string()),
        "created",
        format!("Testimonial from {} added", testimonial.author_name),
    )
    .await;
    Ok((StatusCode::CREATED, Json(testimonial)))
}

async fn testimonials_delete_handler(
    State(state): State<Arc<GatewayState>>,
    Path(id): Path<String>,
) -> Result<Json<DeletedResponse>, ApiError> {
    let session = signed_in(&state)?;
    let testimonial_id = parse_id(&id, "testimonial")?;
    let deleted = state
        .store
        .delete_testimonial(&session.user_id, testimonial_id)
        .await
        .map_err(db_error)?;
    if !deleted {
        return Err(not_found("Testimonial"));
    }
    Ok(Json(DeletedResponse { deleted }))
}

// --- Activity ---

async fn activity_list_handler(
    State(state): State<Arc<GatewayState>>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<ActivityListResponse>, ApiError> {
    let session = signed_in(&state)?;
    let records = state
        .store
        .list_activities(&session.user_id, list_limit(&query, DEFAULT_ACTIVITY_LIMIT))
        .await
        .map_err(db_error)?;
    let now = Utc::now();
    let entries = records
        .into_iter()
        .map(|record| ActivityEntry {
            when: format_relative(record.created_at, now),
            record,
        })
        .collect();
    Ok(Json(ActivityListResponse { entries }))
}

// --- Submissions ---

async fn contact_submit_handler(
    State(state): State<Arc<GatewayState>>,
    Json(req): Json<ContactRequest>,
) -> Result<(StatusCode, Json<SubmissionAck>), ApiError> {
    if !state.contact_rate_limiter.check() {
        return Err((
            StatusCode::TOO_MANY_REQUESTS,
            "Too many messages. Try again in a minute.".to_string(),
        ));
    }
    let params = CreateContactSubmissionParams {
        name: req.name,
        email: req.email,
        subject: req.subject,
        message: req.message,
    };
    let record = state
        .store
        .create_contact_submission(&params)
        .await
        .map_err(db_error)?;
    tracing::info!(submission_id = %record.id, "contact submission received");
    Ok((
        StatusCode::CREATED,
        Json(SubmissionAck {
            id: record.id,
            status: "received",
        }),
    ))
}

async fn feedback_submit_handler(
    State(state): State<Arc<GatewayState>>,
    Json(req): Json<FeedbackRequest>,
) -> Result<(StatusCode, Json<SubmissionAck>), ApiError> {
    let session = signed_in(&state)?;
    let params = CreateFeedbackParams {
        rating: req.rating,
        message: req.message,
    };
    let record = state
        .store
        .create_feedback_submission(&session.user_id, &params)
        .await
        .map_err(db_error)?;
    Ok((
        StatusCode::CREATED,
        Json(SubmissionAck {
            id: record.id,
            status: "received",
        }),
    ))
}

async fn admin_contact_list_handler(
    State(state): State<Arc<GatewayState>>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<ContactListResponse>, ApiError> {
    require_admin(&state)?;
    let submissions = state
        .store
        .list_contact_submissions(list_limit(&query, MAX_LIST_LIMIT))
        .await
        .map_err(db_error)?;
    Ok(Json(ContactListResponse { submissions }))
}

async fn admin_feedback_list_handler(
    State(state): State<Arc<GatewayState>>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<FeedbackListResponse>, ApiError> {
    require_admin(&state)?;
    let submissions = state
        .store
        .list_feedback_submissions(list_limit(&query, MAX_LIST_LIMIT))
        .await
        .map_err(db_error)?;
    Ok(Json(FeedbackListResponse { submissions }))
}
