mod common;

use std::sync::Arc;
use std::time::Duration;

use actix::prelude::*;

use bank_ms::actors::{CoordinatorActor, GetDlq, GetDlqStats, OutboxRelay, RelayConfig, RelayNow, RelayReport, Shutdown};
use bank_ms::domain::account::Balance;
use bank_ms::domain::shared::{AccountStatus, AccountType};
use bank_ms::messaging::{dispatch, EventConsumer, EventPublisher, InProcessBus, PublishedEvent};

use common::{active_customer, ctx, system};

fn manual_relay_config() -> RelayConfig {
    RelayConfig { poll_interval: Duration::from_secs(3600), ..RelayConfig::default() }
}

fn drain(receiver: &mut tokio::sync::broadcast::Receiver<PublishedEvent>) -> Vec<PublishedEvent> {
    let mut events = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        events.push(event);
    }
    events
}

#[actix::test]
async fn test_account_events_reach_the_customer_projection_once() {
    let system = system();
    let bus = InProcessBus::new(64);
    let mut receiver = bus.subscribe();

    let customer_number = active_customer(&system, "289012345678").await;
    let ctx = ctx(&system);
    let account = system.accounts.create_account(&ctx, &customer_number, AccountType::Saving).await.unwrap();
    let number = account.account_number().clone();
    system.accounts.activate(&ctx, &number).await.unwrap();
    system.accounts.credit(&ctx, &number, Balance::parse("100.500").unwrap(), None).await.unwrap();

    let relay = OutboxRelay::new(system.account_store.clone(), Arc::new(bus), system.metrics.clone(), manual_relay_config())
        .start();
    let report = relay.send(RelayNow).await.unwrap().unwrap();
    assert_eq!(report, RelayReport { published: 3, failed: 0, dead_lettered: 0 });

    let events = drain(&mut receiver);
    let topics: Vec<&str> = events.iter().map(|e| e.topic.as_str()).collect();
    assert_eq!(
        topics,
        vec!["account.events.created", "account.events.status-changed", "account.events.transaction"]
    );
    assert!(events.iter().all(|e| e.key == "1234567001"));

    let projection: &dyn EventConsumer = system.projection.as_ref();
    for event in &events {
        dispatch(projection, event).await;
    }
    // redelivery changes nothing
    for event in &events {
        dispatch(projection, event).await;
    }

    let activity = system.projection.activity(&customer_number).unwrap();
    assert_eq!(activity.transactions, 1);
    assert_eq!(activity.open_accounts(), 1);
    let seen = &activity.accounts[&number];
    assert_eq!(seen.status, AccountStatus::Active);
    assert_eq!(seen.account_type, Some(AccountType::Saving));
    assert_eq!(seen.balance.map(|b| b.to_string()), Some("100.500".to_string()));
    assert_eq!(seen.version, 3);

    let again = relay.send(RelayNow).await.unwrap().unwrap();
    assert_eq!(again.published, 0);
}

#[actix::test]
async fn test_customer_events_reach_the_account_side_audit() {
    let system = system();
    let bus = InProcessBus::new(64);
    let mut receiver = bus.subscribe();

    active_customer(&system, "289012345678").await;

    let relay =
        OutboxRelay::new(system.customer_store.clone(), Arc::new(bus), system.metrics.clone(), manual_relay_config())
            .start();
    let report = relay.send(RelayNow).await.unwrap().unwrap();
    assert_eq!(report.published, 2);

    let logger: &dyn EventConsumer = system.customer_logger.as_ref();
    for event in drain(&mut receiver) {
        dispatch(logger, &event).await;
        // account topics are not for this consumer
        dispatch(logger, &PublishedEvent { topic: "account.events.created".into(), ..event }).await;
    }
    assert_eq!(system.customer_logger.logged_count(), 2);
    assert_eq!(system.customer_store.pending_outbox_count().await, 0);
}

#[actix::test]
async fn test_coordinator_relays_both_outboxes_in_the_background() {
    let system = system();
    let bus = InProcessBus::new(256);
    bus.spawn_consumer(system.projection.clone(), system.metrics.clone());
    bus.spawn_consumer(system.customer_logger.clone(), system.metrics.clone());

    let publisher: Arc<dyn EventPublisher> = Arc::new(bus);
    let coordinator = CoordinatorActor::new(
        system.outbox_sources(),
        publisher,
        system.health_probes(),
        system.metrics.clone(),
        RelayConfig { poll_interval: Duration::from_millis(20), ..RelayConfig::default() },
    )
    .start();

    let customer_number = active_customer(&system, "289012345678").await;
    let ctx = ctx(&system);
    system.accounts.create_account(&ctx, &customer_number, AccountType::Investment).await.unwrap();

    let mut projected = false;
    for _ in 0..100 {
        let done = system.projection.activity(&customer_number).is_some_and(|a| a.accounts.len() == 1)
            && system.customer_logger.logged_count() == 2;
        if done {
            projected = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(projected, "events were not relayed in time");

    let dlq = coordinator.send(GetDlq).await.unwrap().unwrap();
    let stats = dlq.send(GetDlqStats).await.unwrap();
    assert_eq!(stats.total_messages, 0);

    coordinator.send(Shutdown).await.unwrap();
}
