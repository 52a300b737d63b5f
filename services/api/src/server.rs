use crate::cli::ServeArgs;
use crate::infra::{in_memory_board, seed_admin, AppState};
use crate::routes::with_board_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use getjobandgo::config::AppConfig;
use getjobandgo::error::AppError;
use getjobandgo::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let (board, sessions) = in_memory_board();
    let admin = seed_admin(&board, &sessions, &config.admin)?;
    if admin.generated {
        warn!(
            admin = %admin.profile.id,
            token = %admin.token,
            "APP_ADMIN_TOKEN not set; generated an administrator token for this run"
        );
    } else {
        info!(admin = %admin.profile.id, "administrator seeded with configured token");
    }

    let app = with_board_routes(board)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "job board ready");

    axum::serve(listener, app).await?;
    Ok(())
}
