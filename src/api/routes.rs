//! HTTP route handlers.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use tokio::sync::watch;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::assistant::{
    AdviceCandidate, AssistantGateway, GeminiClient, ParsedTask, RankCandidate, FALLBACK_ADVICE,
};
use crate::config::Config;
use crate::reminder::{LogNotifier, Permission, ReminderScheduler};
use crate::store::{create_task_store, TaskStore};
use crate::task::{Subtask, Task};
use crate::view::{compute_view, SortMode, StatusFilter};

use super::types::*;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    /// Source of truth for task records
    pub store: Arc<dyn TaskStore>,
    /// The external assistant gateway
    pub assistant: Arc<dyn AssistantGateway>,
    /// Notification authorization; the reminder scheduler re-arms on grant
    pub permission: watch::Sender<Permission>,
}

/// Start the HTTP server and the reminder scheduler.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let store: Arc<dyn TaskStore> =
        create_task_store(config.store_type, config.data_dir.clone())
            .await?
            .into();
    let assistant: Arc<dyn AssistantGateway> = Arc::new(GeminiClient::new(
        config.api_key.clone(),
        config.model.clone(),
    ));

    // Authorization starts undetermined; the scheduler stays parked until
    // the permission endpoint grants it.
    let (permission_tx, permission_rx) = watch::channel(Permission::Undetermined);
    let scheduler = ReminderScheduler::new(
        Arc::clone(&store),
        Arc::new(LogNotifier),
        permission_rx,
        config.reminder_interval,
    );
    tokio::spawn(scheduler.run());

    let state = Arc::new(AppState {
        config: config.clone(),
        store,
        assistant,
        permission: permission_tx,
    });

    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route("/api/tasks/prioritize", post(prioritize))
        .route("/api/tasks/:id", put(update_task).delete(delete_task))
        .route("/api/tasks/:id/decompose", post(decompose))
        .route("/api/advice", get(advice))
        .route("/api/stats", get(stats))
        .route(
            "/api/notifications/permission",
            get(get_permission).put(set_permission),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Wait for ctrl-c or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

/// Health check endpoint.
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        persistent: state.store.is_persistent(),
    })
}

/// Computed task list view.
async fn list_tasks(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ViewQuery>,
) -> Json<Vec<Task>> {
    let snapshot = state.store.snapshot().await;
    Json(compute_view(&snapshot, query.filter, &query.search, query.sort))
}

/// Create a task from free text, parsed through the assistant.
///
/// Gateway failure is absorbed: the raw input becomes the title and every
/// other field takes its default.
async fn create_task(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<Task>), (StatusCode, String)> {
    let input = req.input.trim();
    if input.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "input is empty".to_string()));
    }

    let parsed = match state.assistant.parse(input).await {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!("Assistant parse failed, using fallback fields: {}", e);
            ParsedTask::fallback(input)
        }
    };

    let task = parsed.into_task();
    state
        .store
        .add(task.clone())
        .await
        .map_err(internal_error)?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// Replace a task by id with the full record from the request body.
///
/// The path id wins over any id in the body; an unknown id is a silent
/// no-op, not an error.
async fn update_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(mut task): Json<Task>,
) -> Result<StatusCode, (StatusCode, String)> {
    task.id = id;
    state.store.update(task).await.map_err(internal_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete a task. Deleting an unknown id is a silent no-op.
async fn delete_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    state.store.delete(id).await.map_err(internal_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Generate subtasks for a task and replace its subtask list.
///
/// The merge is keyed on identifier existence: if the task was deleted
/// while the assistant call was in flight, nothing is written.
async fn decompose(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<DecomposeResponse>, (StatusCode, String)> {
    let task = match state.store.get(id).await {
        Some(task) => task,
        None => return Err((StatusCode::NOT_FOUND, format!("Task {} not found", id))),
    };

    let suggestions = match state
        .assistant
        .decompose(&task.title, task.description.as_deref())
        .await
    {
        Ok(titles) => titles,
        Err(e) => {
            tracing::warn!("Assistant decompose failed for task {}: {}", id, e);
            Vec::new()
        }
    };

    if suggestions.is_empty() {
        return Ok(Json(DecomposeResponse {
            suggestions,
            task: Some(task),
        }));
    }

    // Re-fetch: the task may have been edited or deleted during the call.
    let merged = match state.store.get(id).await {
        Some(mut current) => {
            current.subtasks = suggestions.iter().map(Subtask::new).collect();
            let replaced = state
                .store
                .update(current.clone())
                .await
                .map_err(internal_error)?;
            replaced.then_some(current)
        }
        None => {
            tracing::debug!("Task {} deleted during decompose, dropping result", id);
            None
        }
    };

    Ok(Json(DecomposeResponse {
        suggestions,
        task: merged,
    }))
}

/// Ask the assistant for a recommended execution order over the active
/// tasks and apply it as ranks.
///
/// Gateway failure leaves every task unranked, which degrades smart
/// ordering to the priority/date comparator.
async fn prioritize(
    State(state): State<Arc<AppState>>,
) -> Result<Json<PrioritizeResponse>, (StatusCode, String)> {
    // Single consistent snapshot for the whole request; tasks added after
    // this point simply receive no rank update.
    let snapshot = state.store.snapshot().await;
    let candidates: Vec<RankCandidate> = snapshot
        .iter()
        .filter(|t| !t.status.is_done())
        .map(RankCandidate::from)
        .collect();

    let ordered_ids = if candidates.len() < 2 {
        Vec::new()
    } else {
        match state.assistant.rank(&candidates).await {
            Ok(ids) => ids,
            Err(e) => {
                tracing::warn!("Assistant rank failed: {}", e);
                Vec::new()
            }
        }
    };

    let ranked = !ordered_ids.is_empty();
    if ranked {
        // Position in the returned sequence becomes the rank.
        let ranks: HashMap<Uuid, u32> = ordered_ids
            .iter()
            .enumerate()
            .map(|(position, id)| (*id, position as u32))
            .collect();
        state
            .store
            .bulk_assign_rank(&ranks)
            .await
            .map_err(internal_error)?;
    }

    let snapshot = state.store.snapshot().await;
    let tasks = compute_view(&snapshot, StatusFilter::Active, "", SortMode::Smart);
    Ok(Json(PrioritizeResponse { ranked, tasks }))
}

/// Short coaching string for the active tasks.
async fn advice(State(state): State<Arc<AppState>>) -> Json<AdviceResponse> {
    let snapshot = state.store.snapshot().await;
    let candidates: Vec<AdviceCandidate> = snapshot
        .iter()
        .filter(|t| !t.status.is_done())
        .map(AdviceCandidate::from)
        .collect();

    let advice = match state.assistant.advise(&candidates).await {
        Ok(text) if !text.is_empty() => text,
        Ok(_) => FALLBACK_ADVICE.to_string(),
        Err(e) => {
            tracing::warn!("Assistant advise failed: {}", e);
            FALLBACK_ADVICE.to_string()
        }
    };

    Json(AdviceResponse { advice })
}

/// Store-wide counters.
async fn stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    let snapshot = state.store.snapshot().await;
    let total = snapshot.len();
    let completed = snapshot.iter().filter(|t| t.status.is_done()).count();
    let progress = if total == 0 {
        0
    } else {
        ((completed as f64 / total as f64) * 100.0).round() as u32
    };

    Json(StatsResponse {
        total,
        active: total - completed,
        completed,
        progress,
    })
}

/// Current notification authorization state.
async fn get_permission(State(state): State<Arc<AppState>>) -> Json<PermissionState> {
    Json(PermissionState {
        permission: *state.permission.borrow(),
    })
}

/// Set the notification authorization state. Setting `granted` re-arms the
/// reminder scheduler with an immediate evaluation.
async fn set_permission(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PermissionState>,
) -> Json<PermissionState> {
    if let Err(e) = state.permission.send(req.permission) {
        tracing::warn!("Reminder scheduler is gone: {}", e);
    }
    Json(PermissionState {
        permission: req.permission,
    })
}

fn internal_error<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
