#![allow(clippy::unwrap_used)]
// Integration tests for `Controller` against a wiremock door.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use futures_util::StreamExt;
use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use petwalk_core::{
    CommandResult, Controller, ControllerConfig, ControllerState, CoreError, CycleState, Direction,
    DoorState, ModeSet, PetEvent, PetStatus, RefreshEvent, Snapshot, StateSet, SystemState,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn config_for(server: &MockServer) -> ControllerConfig {
    let addr = server.address();
    let mut config = ControllerConfig::new(
        addr.ip().to_string(),
        "admin",
        SecretString::from("hunter2".to_string()),
    );
    config.port = addr.port();
    config.refresh_interval = Duration::ZERO;
    config.refresh_timeout = Duration::from_secs(2);
    config
}

async fn mount_modes(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/modes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_states(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/states"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn setup() -> (MockServer, Controller) {
    let server = MockServer::start().await;
    mount_modes(&server, json!({ "motion_in": true })).await;
    mount_states(&server, json!({ "door": "closed", "system": "on" })).await;
    let controller = Controller::new(config_for(&server)).unwrap();
    (server, controller)
}

async fn count_gets(server: &MockServer, endpoint: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.method.as_str() == "GET" && r.url.path() == endpoint)
        .count()
}

fn expected(motion_in: bool, door: DoorState) -> Snapshot {
    let mut modes = ModeSet::new();
    modes.insert("motion_in".into(), motion_in);
    Snapshot {
        modes,
        states: StateSet {
            door,
            system: SystemState::On,
        },
        pets: PetStatus::new(),
    }
}

// ── Initialization ──────────────────────────────────────────────────

#[tokio::test]
async fn test_initialize_commits_first_snapshot() {
    let (_server, controller) = setup().await;
    assert!(controller.read().is_none());

    let snapshot = controller.initialize().await.unwrap();

    assert_eq!(*snapshot, expected(true, DoorState::Closed));
    assert_eq!(*controller.read().unwrap(), expected(true, DoorState::Closed));
    assert_eq!(*controller.state().borrow(), ControllerState::Ready);
    assert!(controller.store().last_refresh().is_some());

    controller.shutdown().await;
}

#[tokio::test]
async fn test_initialize_unreachable_is_not_ready() {
    let mut config = ControllerConfig::new(
        "127.0.0.1",
        "admin",
        SecretString::from("hunter2".to_string()),
    );
    config.port = 1;
    let controller = Controller::new(config).unwrap();

    let err = controller.initialize().await.unwrap_err();

    assert!(matches!(err, CoreError::NotReady { .. }), "got: {err:?}");
    assert!(matches!(err.root_cause(), CoreError::ConnectionFailed { .. }));
    assert!(controller.read().is_none());
    assert_eq!(*controller.state().borrow(), ControllerState::Uninitialized);
}

#[tokio::test]
async fn test_initialize_rejects_malformed_state() {
    let server = MockServer::start().await;
    mount_modes(&server, json!({ "motion_in": true })).await;
    mount_states(&server, json!({ "door": "ajar", "system": "on" })).await;
    let controller = Controller::new(config_for(&server)).unwrap();

    let err = controller.initialize().await.unwrap_err();

    assert!(matches!(
        err.root_cause(),
        CoreError::MalformedPayload { .. }
    ));
    assert!(controller.read().is_none());
}

#[tokio::test]
async fn test_initialize_can_be_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/modes"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_modes(&server, json!({ "motion_in": true })).await;
    mount_states(&server, json!({ "door": "closed", "system": "on" })).await;
    let controller = Controller::new(config_for(&server)).unwrap();

    assert!(controller.initialize().await.is_err());
    let snapshot = controller.initialize().await.unwrap();

    assert_eq!(*snapshot, expected(true, DoorState::Closed));
    controller.shutdown().await;
}

// ── Refresh ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_failed_refresh_keeps_previous_snapshot() {
    let server = MockServer::start().await;
    mount_states(&server, json!({ "door": "closed", "system": "on" })).await;
    Mock::given(method("GET"))
        .and(path("/modes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "motion_in": true })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/modes"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let controller = Controller::new(config_for(&server)).unwrap();
    let before = controller.initialize().await.unwrap();
    let mut events = controller.events();

    let err = controller.request_refresh().await.unwrap_err();

    assert!(matches!(err, CoreError::RefreshFailed { .. }));
    assert!(matches!(
        err.root_cause(),
        CoreError::Rejected { status: 500, .. }
    ));
    assert!(Arc::ptr_eq(&before, &controller.read().unwrap()));
    assert!(matches!(
        events.recv().await.unwrap(),
        RefreshEvent::Failed { .. }
    ));

    controller.shutdown().await;
}

#[tokio::test]
async fn test_slow_door_times_out_cycle() {
    let server = MockServer::start().await;
    mount_modes(&server, json!({ "motion_in": true })).await;
    Mock::given(method("GET"))
        .and(path("/states"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "door": "closed", "system": "on" }))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;
    let mut config = config_for(&server);
    config.refresh_timeout = Duration::from_millis(200);
    let controller = Controller::new(config).unwrap();

    let err = controller.initialize().await.unwrap_err();

    assert!(matches!(
        err.root_cause(),
        CoreError::CycleTimeout { timeout_ms: 200 }
    ));
    assert!(controller.read().is_none());
}

#[tokio::test]
async fn test_refresh_storm_coalesces_into_one_cycle() {
    let server = MockServer::start().await;
    mount_states(&server, json!({ "door": "closed", "system": "on" })).await;
    Mock::given(method("GET"))
        .and(path("/modes"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "motion_in": true }))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;
    let controller = Controller::new(config_for(&server)).unwrap();
    controller.initialize().await.unwrap();

    // One request puts a cycle in flight...
    let first = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.request_refresh().await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;

    // ...and the storm arrives while it is still fetching.
    let storm: Vec<_> = (0..10)
        .map(|_| {
            let controller = controller.clone();
            tokio::spawn(async move { controller.request_refresh().await })
        })
        .collect();

    first.await.unwrap().unwrap();
    for handle in storm {
        handle.await.unwrap().unwrap();
    }

    // initialize + in-flight cycle + exactly one follow-up
    assert_eq!(count_gets(&server, "/modes").await, 3);
    assert_eq!(count_gets(&server, "/states").await, 3);

    controller.shutdown().await;
}

#[tokio::test]
async fn test_storm_larger_than_queue_still_coalesces() {
    let server = MockServer::start().await;
    mount_states(&server, json!({ "door": "closed", "system": "on" })).await;
    Mock::given(method("GET"))
        .and(path("/modes"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "motion_in": true }))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;
    let controller = Controller::new(config_for(&server)).unwrap();
    controller.initialize().await.unwrap();

    let first = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.request_refresh().await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;

    let storm: Vec<_> = (0..200)
        .map(|_| {
            let controller = controller.clone();
            tokio::spawn(async move { controller.request_refresh().await })
        })
        .collect();

    first.await.unwrap().unwrap();
    for handle in storm {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(count_gets(&server, "/modes").await, 3);
    assert_eq!(count_gets(&server, "/states").await, 3);

    controller.shutdown().await;
}

#[tokio::test]
async fn test_failed_periodic_cycle_does_not_stop_polling() {
    let server = MockServer::start().await;
    mount_states(&server, json!({ "door": "closed", "system": "on" })).await;
    Mock::given(method("GET"))
        .and(path("/modes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "motion_in": true })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/modes"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_modes(&server, json!({ "motion_in": false })).await;

    let mut config = config_for(&server);
    config.refresh_interval = Duration::from_millis(100);
    let controller = Controller::new(config).unwrap();
    controller.initialize().await.unwrap();
    let mut events = controller.events();
    let mut stream = controller.subscribe();

    let event = tokio::time::timeout(Duration::from_secs(2), events.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(event, RefreshEvent::Failed { .. }));
    assert_eq!(controller.read().unwrap().mode("motion_in"), Some(true));

    let next = tokio::time::timeout(Duration::from_secs(2), stream.changed())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(next.mode("motion_in"), Some(false));
    assert_eq!(*controller.state().borrow(), ControllerState::Ready);

    controller.shutdown().await;
}

#[tokio::test]
async fn test_periodic_refresh_picks_up_changes() {
    let server = MockServer::start().await;
    mount_states(&server, json!({ "door": "closed", "system": "on" })).await;
    Mock::given(method("GET"))
        .and(path("/modes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "motion_in": true })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_modes(&server, json!({ "motion_in": false })).await;
    let mut config = config_for(&server);
    config.refresh_interval = Duration::from_millis(100);
    let controller = Controller::new(config).unwrap();
    controller.initialize().await.unwrap();

    let mut stream = controller.subscribe();
    let next = tokio::time::timeout(Duration::from_secs(2), stream.changed())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(next.mode("motion_in"), Some(false));
    controller.shutdown().await;
}

#[tokio::test]
async fn test_snapshot_stream_yields_commits() {
    let (_server, controller) = setup().await;
    controller.initialize().await.unwrap();
    let mut stream = controller.subscribe().into_stream();

    let first = stream.next().await.unwrap();
    controller.request_refresh().await.unwrap();
    let second = stream.next().await.unwrap();

    assert_eq!(*first, *second);
    assert!(!Arc::ptr_eq(&first, &second));
    controller.shutdown().await;
}

// ── Commands ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_set_mode_sends_single_key_and_reconciles() {
    let server = MockServer::start().await;
    mount_states(&server, json!({ "door": "closed", "system": "on" })).await;
    Mock::given(method("GET"))
        .and(path("/modes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "motion_in": true })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_modes(&server, json!({ "motion_in": false })).await;
    Mock::given(method("PUT"))
        .and(path("/modes"))
        .and(body_json(json!({ "motion_in": false })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    let controller = Controller::new(config_for(&server)).unwrap();
    let initial = controller.initialize().await.unwrap();
    assert_eq!(*initial, expected(true, DoorState::Closed));

    let result = controller.set_mode("motion_in", false).await.unwrap();

    let snapshot = result.snapshot().unwrap();
    assert_eq!(**snapshot, expected(false, DoorState::Closed));
    controller.shutdown().await;
}

#[tokio::test]
async fn test_open_door_then_refresh_shows_open() {
    let server = MockServer::start().await;
    mount_modes(&server, json!({ "motion_in": true })).await;
    Mock::given(method("GET"))
        .and(path("/states"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "door": "closed", "system": "on" })),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_states(&server, json!({ "door": "open", "system": "on" })).await;
    Mock::given(method("PUT"))
        .and(path("/states"))
        .and(body_json(json!({ "door": "open" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    let controller = Controller::new(config_for(&server)).unwrap();
    controller.initialize().await.unwrap();

    controller.set_door_state(true).await.unwrap();

    assert_eq!(controller.read().unwrap().states.door, DoorState::Open);
    controller.shutdown().await;
}

#[tokio::test]
async fn test_failed_write_skips_refresh() {
    let (server, controller) = setup().await;
    Mock::given(method("PUT"))
        .and(path("/states"))
        .respond_with(ResponseTemplate::new(500).set_body_string("jammed"))
        .mount(&server)
        .await;
    let before = controller.initialize().await.unwrap();

    let err = controller.set_door_state(true).await.unwrap_err();

    assert!(matches!(err, CoreError::Rejected { status: 500, .. }));
    assert!(Arc::ptr_eq(&before, &controller.read().unwrap()));
    assert_eq!(count_gets(&server, "/states").await, 1);
    controller.shutdown().await;
}

#[tokio::test]
async fn test_write_succeeds_even_if_refresh_fails() {
    let server = MockServer::start().await;
    mount_states(&server, json!({ "door": "closed", "system": "on" })).await;
    Mock::given(method("GET"))
        .and(path("/modes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "motion_in": true })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/modes"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/states"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    let controller = Controller::new(config_for(&server)).unwrap();
    controller.initialize().await.unwrap();

    let result = controller.set_system_state(false).await.unwrap();

    assert!(matches!(result, CommandResult::Pending));
    assert_eq!(controller.read().unwrap().states.system, SystemState::On);
    controller.shutdown().await;
}

#[tokio::test]
async fn test_unknown_state_key_is_rejected_without_request() {
    let (server, controller) = setup().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    controller.initialize().await.unwrap();

    let err = controller.set_state("light", true).await.unwrap_err();

    assert!(matches!(err, CoreError::InvalidCommand { ref key } if key == "light"));
    controller.shutdown().await;
}

#[tokio::test]
async fn test_commands_after_shutdown_fail() {
    let (_server, controller) = setup().await;
    controller.initialize().await.unwrap();
    controller.shutdown().await;

    assert!(matches!(
        controller.set_mode("motion_in", false).await,
        Err(CoreError::ShutDown)
    ));
    assert!(matches!(
        controller.request_refresh().await,
        Err(CoreError::ShutDown)
    ));
}

#[tokio::test]
async fn test_shutdown_during_initialize_wins() {
    let server = MockServer::start().await;
    mount_states(&server, json!({ "door": "closed", "system": "on" })).await;
    Mock::given(method("GET"))
        .and(path("/modes"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "motion_in": true }))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;
    let controller = Controller::new(config_for(&server)).unwrap();

    let init = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.initialize().await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    controller.shutdown().await;

    assert!(matches!(init.await.unwrap(), Err(CoreError::ShutDown)));
    assert_eq!(*controller.state().borrow(), ControllerState::ShutDown);
    assert!(controller.read().is_none());
    assert!(matches!(
        controller.request_refresh().await,
        Err(CoreError::ShutDown)
    ));
}

#[tokio::test]
async fn test_shutdown_joins_running_worker() {
    let (_server, controller) = setup().await;
    controller.initialize().await.unwrap();
    let mut state = controller.state();

    tokio::time::timeout(Duration::from_secs(2), controller.shutdown())
        .await
        .unwrap();

    assert_eq!(*state.borrow_and_update(), ControllerState::ShutDown);
    assert_eq!(*controller.cycle_state().borrow(), CycleState::Idle);
}

// ── Pet status ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_pet_status_survives_refresh() {
    let (_server, controller) = setup().await;
    controller.initialize().await.unwrap();
    let mut pets = PetStatus::new();
    pets.insert(
        "42".into(),
        Some(PetEvent {
            direction: Direction::In,
            timestamp: Utc.with_ymd_and_hms(2024, 6, 15, 10, 30, 0).unwrap(),
        }),
    );

    controller.apply_pet_status(pets.clone()).unwrap();
    let refreshed = controller.request_refresh().await.unwrap();

    assert_eq!(refreshed.pets, pets);
    assert_eq!(refreshed.modes, expected(true, DoorState::Closed).modes);
    controller.shutdown().await;
}

// ── Probe / oneshot ─────────────────────────────────────────────────

#[tokio::test]
async fn test_probe_reports_auth_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = Controller::probe(&config_for(&server)).await.unwrap_err();

    assert!(matches!(err, CoreError::AuthenticationFailed { .. }));
}

#[tokio::test]
async fn test_probe_returns_snapshot() {
    let (server, _controller) = setup().await;

    let snapshot = Controller::probe(&config_for(&server)).await.unwrap();

    assert_eq!(snapshot, expected(true, DoorState::Closed));
}

#[tokio::test]
async fn test_oneshot_runs_closure_and_shuts_down() {
    let (server, _controller) = setup().await;

    let door = Controller::oneshot(config_for(&server), |ctrl| async move {
        Ok(ctrl.read().unwrap().states.door)
    })
    .await
    .unwrap();

    assert_eq!(door, DoorState::Closed);
}
