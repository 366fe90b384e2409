use actix::prelude::*;
use actix_web::{web, App, HttpServer};
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use bank_ms::actors::{CoordinatorActor, GetHealthMonitor, Shutdown};
use bank_ms::messaging::{EventConsumer, EventPublisher, InProcessBus, KafkaEventSource, RedpandaClient};
use bank_ms::metrics::{start_metrics_server, Metrics};
use bank_ms::web::{account_routes, customer_routes, json_config};
use bank_ms::{AppConfig, BankSystem};

#[actix::main]
async fn main() -> anyhow::Result<()> {
    // Default to INFO level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,bank_ms=debug")))
        .init();

    tracing::info!("🚀 Starting bank account and customer services");

    let config = AppConfig::from_env()?;

    // === 1. Metrics ===
    let metrics = Arc::new(Metrics::new()?);
    tracing::info!("📊 Metrics registry created with {} metrics", metrics.registry().gather().len());

    // === 2. Services ===
    let system = BankSystem::new(&config, metrics.clone());

    // === 3. Event transport and consumers ===
    let projection: Arc<dyn EventConsumer> = system.projection.clone();
    let customer_logger: Arc<dyn EventConsumer> = system.customer_logger.clone();
    let consumers = [("customer", projection), ("account", customer_logger)];
    let publisher: Arc<dyn EventPublisher> = match &config.kafka_brokers {
        Some(brokers) => {
            tracing::info!(brokers = %brokers, "📡 Publishing to Redpanda");
            for (service, consumer) in &consumers {
                let group_id = format!("{}-{}", config.kafka_group_prefix, service);
                KafkaEventSource::new(brokers, &group_id)?.spawn(consumer.clone(), metrics.clone())?;
            }
            Arc::new(RedpandaClient::new(brokers, config.circuit_breaker.clone(), metrics.clone())?)
        }
        None => {
            tracing::warn!("KAFKA_BROKERS not set, events stay in process");
            let bus = InProcessBus::new(1024);
            for (_, consumer) in &consumers {
                bus.spawn_consumer(consumer.clone(), metrics.clone());
            }
            Arc::new(bus)
        }
    };

    // === 4. Coordinator: outbox relays, DLQ, health monitor ===
    let coordinator = CoordinatorActor::new(
        system.outbox_sources(),
        publisher,
        system.health_probes(),
        metrics.clone(),
        config.relay.clone(),
    )
    .start();
    let health_monitor = coordinator.send(GetHealthMonitor).await?;

    // === 5. HTTP servers ===
    let settings = web::Data::new(system.settings);
    let account_service = web::Data::from(system.accounts.clone());
    let customer_service = web::Data::from(system.customers.clone());
    let projection = web::Data::from(system.projection.clone());

    tracing::info!(port = config.account_api_port, "🌐 Account API listening");
    let account_api = {
        let settings = settings.clone();
        HttpServer::new(move || {
            App::new()
                .app_data(json_config())
                .app_data(settings.clone())
                .app_data(account_service.clone())
                .configure(account_routes)
        })
        .bind(("0.0.0.0", config.account_api_port))?
        .run()
    };

    tracing::info!(port = config.customer_api_port, "🌐 Customer API listening");
    let customer_api = HttpServer::new(move || {
        App::new()
            .app_data(json_config())
            .app_data(settings.clone())
            .app_data(customer_service.clone())
            .app_data(projection.clone())
            .configure(customer_routes)
    })
    .bind(("0.0.0.0", config.customer_api_port))?
    .run();

    let metrics_server = start_metrics_server(metrics.clone(), health_monitor, config.metrics_port);

    tracing::info!("✅ System running. Press Ctrl+C to stop.");
    let served = futures_util::future::try_join3(account_api, customer_api, metrics_server).await;

    tracing::info!("🛑 Shutting down");
    coordinator.send(Shutdown).await?;
    served?;

    tracing::info!("👋 Shutdown complete");
    Ok(())
}
