use crate::{models::{DiagnosticsResponse, ErrorResponse}, AppState};
use axum::{extract::State, http::StatusCode, Json};
use std::sync::{Arc, Mutex, OnceLock};
use sysinfo::System;
use tracing::{error, info};

static SYSTEM_MONITOR: OnceLock<Mutex<System>> = OnceLock::new();

/// Hub counters plus host resource usage
pub async fn diagnostics(
    State(app_state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<DiagnosticsResponse>), (StatusCode, Json<ErrorResponse>)> {

    let stats = app_state.hub.stats().await.map_err(|e| {
        error!("Diagnostics unavailable: {}", e);
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                code: StatusCode::SERVICE_UNAVAILABLE.as_u16(),
                status: "error".to_string(),
                error: e.to_string(),
            }),
        )
    })?;

    // System stats
    let (cpu_usage, memory_used, memory_free, memory_total) = {
        let sys_lock = SYSTEM_MONITOR.get_or_init(|| {
            Mutex::new(System::new_all())
        });
        match sys_lock.lock() {
            Ok(mut sys) => {
                sys.refresh_cpu();
                sys.refresh_memory();
                (
                    sys.global_cpu_info().cpu_usage(),
                    sys.used_memory(),
                    sys.free_memory(),
                    sys.total_memory(),
                )
            }
            Err(_) => (0.0, 0, 0, 0)
        }
    };

    info!(
        "Diagnostics: CPU: {:.2}%, Mem: {}/{} MB, Conn: {}, Sessions: {}, Doc: {} bytes",
        cpu_usage,
        memory_used / 1024 / 1024,
        memory_total / 1024 / 1024,
        stats.connections,
        stats.sessions,
        stats.document_bytes
    );

    Ok((
        StatusCode::OK,
        Json(DiagnosticsResponse {
            n_conn: stats.connections as u32,
            n_sessions: stats.sessions as u32,
            n_joins_total: stats.joins_total,
            document_bytes: stats.document_bytes as u64,
            cpu_usage,
            memory_used,
            memory_total,
            memory_free,
        }),
    ))
}
