use std::{future::Future, sync::Arc, time::Duration};

use axum::{
    extract::FromRef,
    http::{header::CONTENT_TYPE, HeaderName, HeaderValue, Method},
    routing::{delete, get, post, put},
    Router,
};
use chrono::Utc;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tokio_cron_scheduler::{Job, JobScheduler};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};

use crate::{
    api::{achievements, attributes, events, health, notifications, progress, training_pools, training_templates},
    config::AppConfig,
    error::ApiError,
    services::{
        database::Database, event_controller::EventController, notifier::PushNotifier,
        rating_controller::RatingController, scheduler_controller::SchedulerController,
    },
};

pub async fn get_db(config: &AppConfig) -> Result<Arc<Database>, ApiError> {
    let pool = get_pg_pool(&config.database_url)
        .await
        .map_err(|e| ApiError::StartupError(format!("Could not create the database connection pool: {}", e)))?;

    let db = Database::new(pool);
    info!("Running migrations...");
    db.migrate().await?;

    Ok(Arc::new(db))
}

async fn get_pg_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url)
        .await?;
    info!("Database connected!");

    Ok(pool)
}

pub fn get_scheduler_controller(db: Arc<Database>, config: &AppConfig) -> Arc<SchedulerController> {
    let notifier = PushNotifier::new(Arc::clone(&db));
    Arc::new(SchedulerController::new(db, notifier, config.timezone))
}

async fn add_job<F, Fut>(scheduler: &JobScheduler, cron: &str, name: &'static str, run: F) -> Result<(), ApiError>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), ApiError>> + Send + 'static,
{
    let run = Arc::new(run);
    let job = Job::new_async(cron, move |_uuid, _lock| {
        let run = Arc::clone(&run);
        Box::pin(async move {
            info!("Running job {}. Current time is {}", name, Utc::now());
            if let Err(e) = run().await {
                error!("Job {} failed: {}", name, e);
            }
        })
    })
    .map_err(|e| ApiError::StartupError(format!("Failed to create job {}: {}", name, e)))?;

    scheduler
        .add(job)
        .await
        .map_err(|e| ApiError::StartupError(format!("Failed to add job {}: {}", name, e)))?;
    Ok(())
}

pub async fn schedule_tasks(controller: Arc<SchedulerController>, config: &AppConfig) -> Result<JobScheduler, ApiError> {
    info!("Creating scheduler and adding tasks...");

    let scheduler = JobScheduler::new()
        .await
        .map_err(|e| ApiError::StartupError(format!("Failed to create scheduler: {}", e)))?;

    let queue = Arc::clone(&controller);
    add_job(&scheduler, &config.notification_cron, "notification-queue", move || {
        let controller = Arc::clone(&queue);
        async move { controller.process_notification_queue().await.map(|_| ()) }
    })
    .await?;

    let deadlines = Arc::clone(&controller);
    add_job(&scheduler, &config.deadline_cron, "voting-deadlines", move || {
        let controller = Arc::clone(&deadlines);
        async move { controller.process_voting_deadlines().await }
    })
    .await?;

    let attendance = Arc::clone(&controller);
    add_job(&scheduler, &config.attendance_cron, "attendance", move || {
        let controller = Arc::clone(&attendance);
        async move { controller.process_attendance().await }
    })
    .await?;

    scheduler
        .start()
        .await
        .map_err(|e| ApiError::StartupError(format!("Failed to start scheduler: {}", e)))?;

    info!("Scheduler started successfully.");
    Ok(scheduler)
}

// AppState holds the database and the controllers for routing
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: Arc<Database>,
    pub rating_controller: Arc<RatingController>,
    pub event_controller: Arc<EventController>,
    pub scheduler_controller: Arc<SchedulerController>,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, db: Arc<Database>, scheduler_controller: Arc<SchedulerController>) -> Self {
        AppState {
            rating_controller: Arc::new(RatingController::new(Arc::clone(&db))),
            event_controller: Arc::new(EventController::new(Arc::clone(&db), config.timezone)),
            scheduler_controller,
            config,
            db,
        }
    }
}

impl FromRef<AppState> for Arc<Database> {
    fn from_ref(state: &AppState) -> Arc<Database> {
        state.db.clone()
    }
}

impl FromRef<AppState> for Arc<RatingController> {
    fn from_ref(state: &AppState) -> Arc<RatingController> {
        state.rating_controller.clone()
    }
}

impl FromRef<AppState> for Arc<EventController> {
    fn from_ref(state: &AppState) -> Arc<EventController> {
        state.event_controller.clone()
    }
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origin = match config.cors_origin.as_deref().map(HeaderValue::from_str) {
        Some(Ok(origin)) => AllowOrigin::exact(origin),
        Some(Err(e)) => {
            error!("Invalid CORS_ORIGIN, allowing any origin: {}", e);
            AllowOrigin::from(Any)
        }
        None => AllowOrigin::from(Any),
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static("x-cron-token")])
        .max_age(Duration::from_secs(60 * 60))
}

pub fn create_app(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    let api = Router::new()
        .route("/attributes/levels", get(attributes::get_levels))
        .route("/attributes/{player_id}", get(attributes::get_attributes))
        .route("/attributes/{player_id}/overall", get(attributes::get_overall))
        .route("/attributes/{player_id}/{attribute}", put(attributes::update_attribute))
        .route("/events", post(events::create_event).get(events::list_events))
        .route("/events/{id}", get(events::get_event).delete(events::delete_event))
        .route("/events/{id}/respond", post(events::respond))
        .route("/events/{id}/guests", post(events::add_guest))
        .route("/training-pools", post(training_pools::create_pool))
        .route("/training-pools/{id}", get(training_pools::get_pool))
        .route("/training-pools/{id}/join", post(training_pools::join_pool))
        .route("/training-pools/{id}/approve/{player_id}", post(training_pools::approve_player))
        .route("/training-pools/{id}/players/{player_id}", delete(training_pools::remove_player))
        .route(
            "/training-templates",
            post(training_templates::create_template).get(training_templates::list_templates),
        )
        .route("/training-templates/{id}/events", post(training_templates::instantiate_template))
        .route("/achievements/{player_id}", get(achievements::get_achievements))
        .route("/progress/{player_id}", get(progress::get_progress))
        .route("/notifications/subscribe", post(notifications::subscribe))
        .route("/notifications/process", post(notifications::process_queue))
        .route("/notifications/{user_id}", get(notifications::get_notifications));

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown");
}

pub async fn create_server(state: AppState) -> Result<(), ApiError> {
    let address = format!("0.0.0.0:{}", state.config.port);
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .map_err(|e| ApiError::StartupError(format!("Failed to bind {}: {}", address, e)))?;

    info!("Server running on {}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::StartupError(format!("Server error: {}", e)))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;

    fn test_config(cron_secret: Option<&str>) -> AppConfig {
        AppConfig {
            database_url: "postgres://localhost/volleyteam_test".to_string(),
            port: 0,
            cron_secret: cron_secret.map(str::to_string),
            cors_origin: None,
            notification_cron: "0 */2 * * * *".to_string(),
            deadline_cron: "0 */15 * * * *".to_string(),
            attendance_cron: "0 0 3 * * *".to_string(),
            timezone: chrono_tz::Europe::Berlin,
        }
    }

    fn test_app(cron_secret: Option<&str>) -> Router {
        let config = Arc::new(test_config(cron_secret));
        let pool = PgPool::connect_lazy(&config.database_url).unwrap();
        let db = Arc::new(Database::new(pool));
        let scheduler = get_scheduler_controller(Arc::clone(&db), &config);
        create_app(AppState::new(config, db, scheduler))
    }

    #[tokio::test]
    async fn level_table_is_served_without_database() {
        let response = test_app(None)
            .oneshot(Request::get("/api/attributes/levels").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let levels: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(levels.as_array().map(Vec::len), Some(8));
        assert_eq!(levels[6]["name"], "Dritte Liga");
    }

    #[tokio::test]
    async fn queue_run_requires_cron_token() {
        let response = test_app(Some("geheim"))
            .oneshot(
                Request::post("/api/notifications/process")
                    .header(notifications::CRON_TOKEN_HEADER, "falsch")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn malformed_ids_are_rejected() {
        let response = test_app(None)
            .oneshot(Request::get("/api/events/not-a-uuid").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
