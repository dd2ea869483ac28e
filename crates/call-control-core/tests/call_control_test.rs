//! Collection manager behaviour: bootstrap, notification routing, eviction,
//! call creation and restore

mod common;

use std::sync::Arc;

use serde_json::json;
use tokio::sync::broadcast::error::TryRecvError;
use tracing_test::traced_test;

use call_control_core::{
    ApiResponse, CallControl, CallControlBuilder, CallControlConfig, CallControlEvent, CallTarget,
    ExtensionInfo, HttpMethod, NotificationMessage, PartyField, PartyStatusCode,
};
use common::*;

fn build(platform: Arc<MockPlatform>, config: CallControlConfig) -> Arc<CallControl> {
    CallControlBuilder::new().platform(platform).config(config).build().unwrap()
}

async fn initialized(platform: Arc<MockPlatform>) -> Arc<CallControl> {
    let control = build(platform, CallControlConfig::default());
    control.initialize().await;
    control
}

fn next_new_session(rx: &mut tokio::sync::broadcast::Receiver<CallControlEvent>) -> Option<String> {
    loop {
        match rx.try_recv() {
            Ok(CallControlEvent::NewSession(session)) => return Some(session.id().to_string()),
            Ok(CallControlEvent::Initialized) => continue,
            Err(_) => return None,
        }
    }
}

// ===== BOOTSTRAP =====

#[tokio::test]
async fn test_initialize_loads_everything() {
    let platform = bootstrapped_platform(&[(SESSION_ID, vec![outbound_party("Answered")])]);
    let control = build(platform.clone(), CallControlConfig::default());
    let mut events = control.subscribe_events();
    assert!(!control.ready());

    control.initialize().await;

    assert!(control.ready());
    assert_eq!(control.extension_id().as_deref(), Some(EXTENSION_ID));
    assert_eq!(control.account_id().as_deref(), Some(ACCOUNT_ID));
    assert_eq!(control.devices().len(), 1);
    assert_eq!(control.sessions().len(), 1);
    assert_eq!(control.session_ids(), vec![SESSION_ID.to_string()]);

    let session = control.session(SESSION_ID).unwrap();
    assert_eq!(session.party().unwrap().id, "p-out");
    assert_eq!(session.extension_id().as_deref(), Some(EXTENSION_ID));

    assert!(matches!(events.try_recv(), Ok(CallControlEvent::Initialized)));
    // preloaded sessions are not announced
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn test_initialize_runs_once() {
    let platform = bootstrapped_platform(&[]);
    let control = build(platform.clone(), CallControlConfig::default());
    let mut events = control.subscribe_events();

    tokio::join!(control.initialize(), control.initialize());
    control.initialize().await;

    let endpoints = endpoints();
    assert_eq!(platform.count(HttpMethod::Get, &endpoints.extension_info()), 1);
    assert_eq!(platform.count(HttpMethod::Get, &endpoints.extension_presence()), 1);
    assert_eq!(platform.count(HttpMethod::Get, &endpoints.devices()), 1);
    assert!(matches!(events.try_recv(), Ok(CallControlEvent::Initialized)));
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn test_initialize_without_preload() {
    let platform = MockPlatform::new();
    let config = CallControlConfig::new()
        .with_preload_sessions(false)
        .with_preload_devices(false)
        .with_extension_info(ExtensionInfo::new(EXTENSION_ID, ACCOUNT_ID));
    let control = build(platform.clone(), config);
    control.initialize().await;

    assert!(control.ready());
    assert!(control.devices().is_empty());
    assert!(control.sessions().is_empty());
    assert_eq!(control.extension_id().as_deref(), Some(EXTENSION_ID));
    assert_eq!(control.account_id().as_deref(), Some(ACCOUNT_ID));
    assert!(platform.requests().is_empty());
}

#[tokio::test]
#[traced_test]
async fn test_initialize_survives_api_failures() {
    let platform = MockPlatform::new();
    let control = initialized(platform).await;

    assert!(control.ready());
    assert!(control.extension_id().is_none());
    assert!(control.sessions().is_empty());
    assert!(control.devices().is_empty());
    assert!(logs_contain("Failed to load extension info"));
    assert!(logs_contain("Failed to load presence"));
}

#[tokio::test]
async fn test_preload_skips_dead_and_failed_sessions() {
    let platform = bootstrapped_platform(&[
        ("s-live", vec![outbound_party("Answered")]),
        ("s-dead", vec![outbound_party("Disconnected")]),
    ]);
    let endpoints = endpoints();
    platform.set(
        HttpMethod::Get,
        endpoints.extension_presence(),
        presence(&["s-live", "s-dead", "s-missing", "s-live"]),
    );
    let control = initialized(platform.clone()).await;

    assert_eq!(control.session_ids(), vec!["s-live".to_string()]);
    assert_eq!(platform.count(HttpMethod::Get, &endpoints.session("s-live")), 1);
}

#[tokio::test]
async fn test_account_level_preload() {
    let platform = bootstrapped_platform(&[(SESSION_ID, vec![outbound_party("Answered")])]);
    let control = build(platform.clone(), CallControlConfig::new().with_account_level(true));
    control.initialize().await;

    assert!(control.account_level());
    assert_eq!(control.sessions().len(), 1);
    assert_eq!(platform.count(HttpMethod::Get, &endpoints().account_presence()), 1);
    assert_eq!(platform.count(HttpMethod::Get, &endpoints().extension_presence()), 0);
    assert!(control.sessions()[0].account_level());
}

#[tokio::test]
async fn test_refresh_devices() {
    let platform = bootstrapped_platform(&[]);
    let control = initialized(platform.clone()).await;
    assert_eq!(control.devices().len(), 1);

    platform.push(HttpMethod::Get, endpoints().devices(), ApiResponse::ok(json!({ "records": [] })));
    assert!(control.refresh_devices().await.unwrap().is_empty());
    assert!(control.devices().is_empty());

    let devices = control.refresh_devices().await.unwrap();
    assert_eq!(devices.len(), 1);
    assert_eq!(control.devices().len(), 1);
}

#[tokio::test]
async fn test_refresh_devices_propagates_failure() {
    let platform = bootstrapped_platform(&[]);
    let control = initialized(platform.clone()).await;
    platform.push(
        HttpMethod::Get,
        endpoints().devices(),
        ApiResponse::new(500, json!({ "message": "boom" })),
    );
    let err = control.refresh_devices().await.unwrap_err();
    assert!(err.is_recoverable());
    assert_eq!(control.devices().len(), 1);
}

// ===== NOTIFICATION ROUTING =====

#[tokio::test]
async fn test_ignores_unusable_messages() {
    let control = initialized(bootstrapped_platform(&[])).await;

    control.on_notification_event(&NotificationMessage::new(TOPIC, json!({})));
    control.on_notification_event(&NotificationMessage::new(
        "/restapi/v1.0/account/170848004/extension/170848004",
        json!({ "telephonySessionId": SESSION_ID, "parties": [outbound_party("Setup")] }),
    ));
    assert!(control.sessions().is_empty());
}

#[tokio::test]
async fn test_born_dead_session_is_not_created() {
    let control = initialized(bootstrapped_platform(&[])).await;
    let mut events = control.subscribe_events();

    control.on_notification_event(&outbound_disconnected(1));

    assert!(control.sessions().is_empty());
    assert!(next_new_session(&mut events).is_none());
}

#[tokio::test]
async fn test_notification_lifecycle() {
    let control = initialized(bootstrapped_platform(&[])).await;
    let mut events = control.subscribe_events();

    control.on_notification_event(&outbound_setup(1));
    assert_eq!(control.sessions().len(), 1);
    assert_eq!(control.sessions()[0].parties().len(), 1);
    assert_eq!(next_new_session(&mut events).as_deref(), Some(SESSION_ID));

    let session = control.session(SESSION_ID).unwrap();
    let mut changes = session.subscribe();

    control.on_notification_event(&inbound_proceeding(2));
    assert_eq!(control.sessions().len(), 1);
    assert_eq!(session.parties().len(), 2);
    assert!(next_new_session(&mut events).is_none());
    let change = changes.try_recv().unwrap();
    assert_eq!(change.field, PartyField::Status);
    assert_eq!(change.party.id, "p-in");

    // same event again changes nothing
    let status_before = session.party().unwrap().status_code();
    control.on_notification_event(&inbound_proceeding(2));
    assert_eq!(session.party().unwrap().status_code(), status_before);
    assert!(changes.try_recv().is_err());

    control.on_notification_event(&outbound_disconnected(3));
    assert!(control.sessions().is_empty());
    assert!(control.session(SESSION_ID).is_none());
}

#[tokio::test]
async fn test_session_without_my_party_announced_later() {
    let control = initialized(bootstrapped_platform(&[])).await;
    let mut events = control.subscribe_events();

    control.on_notification_event(&message(SESSION_ID, 1, vec![inbound_party("Proceeding")]));
    assert_eq!(control.sessions().len(), 1);
    let session = control.session(SESSION_ID).unwrap();
    assert!(session.party().is_none());
    assert_eq!(session.other_parties().len(), 1);
    assert_eq!(session.parties().len(), 1);
    assert!(next_new_session(&mut events).is_none());

    control.on_notification_event(&outbound_setup(2));
    assert_eq!(next_new_session(&mut events).as_deref(), Some(SESSION_ID));
    assert_eq!(session.party().unwrap().id, "p-out");
}

#[tokio::test]
async fn test_pickup_keeps_session() {
    let control = initialized(bootstrapped_platform(&[])).await;
    control.on_notification_event(&message(
        SESSION_ID,
        1,
        vec![outbound_party("Answered"), inbound_party("Answered")],
    ));

    control.on_notification_event(&message(
        SESSION_ID,
        2,
        vec![with_reason(outbound_party("Disconnected"), "Pickup")],
    ));

    let session = control.session(SESSION_ID).unwrap();
    assert!(session.party().is_none());
    assert_eq!(session.parties().len(), 1);
    assert_eq!(control.sessions().len(), 1);
}

#[tokio::test]
async fn test_call_switch_keeps_session() {
    let control = initialized(bootstrapped_platform(&[])).await;
    control.on_notification_event(&outbound_setup(1));
    control.on_notification_event(&message(
        SESSION_ID,
        2,
        vec![with_reason(outbound_party("Disconnected"), "CallSwitch")],
    ));

    let session = control.session(SESSION_ID).unwrap();
    assert_eq!(session.party().unwrap().status_code(), Some(PartyStatusCode::Disconnected));
    assert_eq!(control.sessions().len(), 1);
}

#[tokio::test]
async fn test_plain_disconnect_evicts_only_that_session() {
    let control = initialized(bootstrapped_platform(&[])).await;
    control.on_notification_event(&outbound_setup(1));
    control.on_notification_event(&message("s-other", 1, vec![outbound_party("Answered")]));
    assert_eq!(control.sessions().len(), 2);

    control.on_notification_event(&outbound_disconnected(2));
    assert_eq!(control.session_ids(), vec!["s-other".to_string()]);
}

#[tokio::test]
async fn test_stale_disconnect_does_not_evict() {
    let control = initialized(bootstrapped_platform(&[])).await;
    control.on_notification_event(&message(SESSION_ID, 5, vec![outbound_party("Answered")]));

    control.on_notification_event(&outbound_disconnected(4));

    assert_eq!(control.sessions().len(), 1);
    let party = control.session(SESSION_ID).unwrap().party().unwrap();
    assert_eq!(party.status_code(), Some(PartyStatusCode::Answered));
}

#[tokio::test]
async fn test_session_metadata_from_notification() {
    let control = initialized(bootstrapped_platform(&[])).await;
    control.on_notification_event(&outbound_setup(1));
    let session = control.session(SESSION_ID).unwrap();

    assert_eq!(session.session_id().as_deref(), Some("1000001"));
    assert_eq!(session.server_id().as_deref(), Some("10.13.22.241.TAM"));
    assert_eq!(session.origin().and_then(|o| o.kind).as_deref(), Some("Call"));
    assert!(session.creation_time().is_some());
    assert_eq!(session.account_id().as_deref(), Some(ACCOUNT_ID));
}

// ===== CALL CREATION =====

#[tokio::test]
async fn test_create_call() {
    let platform = bootstrapped_platform(&[]);
    let control = initialized(platform.clone()).await;
    platform.set(
        HttpMethod::Post,
        endpoints().call_out(),
        json!({ "session": session_detail(SESSION_ID, vec![outbound_party("Setup")]) }),
    );
    let mut events = control.subscribe_events();

    let device_id = control.devices().into_iter().find(|d| d.is_online()).unwrap().id;
    let session = control
        .create_call(&device_id, CallTarget::PhoneNumber("+12345678900".into()))
        .await
        .unwrap();

    assert_eq!(control.sessions().len(), 1);
    assert_eq!(control.sessions()[0].id(), session.id());
    assert_eq!(next_new_session(&mut events).as_deref(), Some(SESSION_ID));

    let request = platform.last_request().unwrap();
    assert_eq!(
        request.body,
        Some(json!({ "from": { "deviceId": "800" }, "to": { "phoneNumber": "+12345678900" } }))
    );

    // the notification for the new call updates the same object
    control.on_notification_event(&message(SESSION_ID, 1, vec![outbound_party("Proceeding")]));
    assert!(Arc::ptr_eq(&control.session(SESSION_ID).unwrap(), &session));
    assert!(next_new_session(&mut events).is_none());

    control.on_notification_event(&outbound_disconnected(2));
    assert!(control.sessions().is_empty());
}

#[tokio::test]
async fn test_create_conference() {
    let platform = bootstrapped_platform(&[]);
    let control = initialized(platform.clone()).await;
    platform.set(
        HttpMethod::Post,
        endpoints().conference(),
        json!({ "session": { "id": "conf-1", "voiceCallToken": "token-1", "parties": [] } }),
    );

    let session = control.create_conference().await.unwrap();

    assert_eq!(control.sessions().len(), 1);
    assert_eq!(session.parties().len(), 0);
    assert_eq!(session.voice_call_token().as_deref(), Some("token-1"));
}

#[tokio::test]
async fn test_create_call_errors_propagate() {
    let platform = bootstrapped_platform(&[]);
    let control = initialized(platform.clone()).await;
    platform.set(HttpMethod::Post, endpoints().call_out(), json!({ "unexpected": true }));
    assert!(control
        .create_call("800", CallTarget::ExtensionNumber("102".into()))
        .await
        .is_err());

    platform.push(
        HttpMethod::Post,
        endpoints().conference(),
        ApiResponse::new(403, json!({ "errorCode": "CMN-408" })),
    );
    let err = control.create_conference().await.unwrap_err();
    assert_eq!(err.category(), "api");
    assert!(control.sessions().is_empty());
}

// ===== RESTORE =====

#[tokio::test]
async fn test_restore_sessions_rebinds_existing() {
    let control = initialized(bootstrapped_platform(&[])).await;
    control.on_notification_event(&outbound_setup(1));
    control.on_notification_event(&message("s-gone", 1, vec![outbound_party("Answered")]));
    let held = control.session(SESSION_ID).unwrap();
    let mut changes = held.subscribe();

    let mut snapshot = held.data();
    snapshot.parties[0].muted = Some(true);
    let fresh = control.session("s-gone").unwrap().data();
    let mut other = fresh.clone();
    other.id = "s-new".into();

    control.restore_sessions(vec![snapshot, other]);

    let mut ids = control.session_ids();
    ids.sort();
    assert_eq!(ids, vec![SESSION_ID.to_string(), "s-new".to_string()]);
    let restored = control.session(SESSION_ID).unwrap();
    assert!(Arc::ptr_eq(&restored, &held));
    assert_eq!(restored.party().unwrap().muted, Some(true));

    // listeners survive the restore
    control.on_notification_event(&message(SESSION_ID, 2, vec![outbound_party("Answered")]));
    assert!(changes.try_recv().is_ok());

    // restored sessions are evicted like any other
    control.on_notification_event(&message("s-new", 1, vec![outbound_party("Disconnected")]));
    assert!(control.session("s-new").is_none());
}

#[test]
fn test_builder_requires_platform() {
    let err = CallControlBuilder::new().build().unwrap_err();
    assert_eq!(err.category(), "configuration");
    let err = CallControlBuilder::new()
        .platform(MockPlatform::new())
        .api_prefix("")
        .build()
        .unwrap_err();
    assert_eq!(err.category(), "configuration");
}
