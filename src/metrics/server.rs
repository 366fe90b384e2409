use actix::Addr;
use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use prometheus::{Encoder, TextEncoder};
use std::sync::Arc;

use crate::actors::{GetSystemHealth, HealthMonitorActor};

use super::Metrics;

/// Start the metrics HTTP server
pub async fn start_metrics_server(
    metrics: Arc<Metrics>,
    health_monitor: Option<Addr<HealthMonitorActor>>,
    port: u16,
) -> std::io::Result<()> {
    tracing::info!("📊 Starting metrics server on http://0.0.0.0:{}/metrics", port);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(metrics.clone()))
            .app_data(web::Data::new(health_monitor.clone()))
            .configure(metrics_routes)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}

/// `/metrics` and `/health`. Expects `Data<Arc<Metrics>>` and
/// `Data<Option<Addr<HealthMonitorActor>>>` in app data.
pub fn metrics_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/metrics", web::get().to(metrics_handler))
        .route("/health", web::get().to(health_handler));
}

async fn metrics_handler(metrics: web::Data<Arc<Metrics>>) -> impl Responder {
    let encoder = TextEncoder::new();
    let metric_families = metrics.registry().gather();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return HttpResponse::InternalServerError().finish();
    }

    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(buffer)
}

async fn health_handler(monitor: web::Data<Option<Addr<HealthMonitorActor>>>) -> impl Responder {
    let Some(monitor) = monitor.get_ref() else {
        return HttpResponse::Ok().json(serde_json::json!({
            "status": "healthy",
            "service": "bank_ms"
        }));
    };

    match monitor.send(GetSystemHealth).await {
        Ok(health) => {
            let body = serde_json::json!({
                "status": health.overall_status,
                "service": "bank_ms",
                "components": health.components,
                "check_time": health.check_time,
            });
            if health.overall_status.is_unhealthy() {
                HttpResponse::ServiceUnavailable().json(body)
            } else {
                HttpResponse::Ok().json(body)
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "Health monitor unreachable");
            HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "status": "unknown",
                "service": "bank_ms"
            }))
        }
    }
}
