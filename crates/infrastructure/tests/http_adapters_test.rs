use std::collections::HashMap;
use std::time::Duration;

use axum::extract::Form;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};

use alert_core::config::{PushConfig, SmsConfig, StoreBackend, StoreConfig};
use alert_core::errors::{StoreError, TransportError};
use alert_core::traits::{PushTransport, SmsTransport, UserDataStore};
use alert_infrastructure::{FcmPushTransport, FirestoreUserDataStore, TwilioSmsTransport};

const TIMEOUT: Duration = Duration::from_secs(5);

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn sms_config(base_url: &str) -> SmsConfig {
    SmsConfig {
        account_sid: "AC123".to_string(),
        auth_token: "token".to_string(),
        sender_number: "+15550000000".to_string(),
        api_base_url: base_url.to_string(),
    }
}

fn push_config(base_url: &str) -> PushConfig {
    PushConfig {
        project_id: "proj".to_string(),
        access_token: "push-token".to_string(),
        api_base_url: base_url.to_string(),
    }
}

async fn twilio_stub(headers: HeaderMap, Form(form): Form<HashMap<String, String>>) -> Response {
    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("Basic "));
    if !authorized {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    match form.get("To").map(String::as_str) {
        Some("+15550000001") => (
            StatusCode::CREATED,
            Json(json!({ "sid": format!("SM-{}", form["From"]), "status": "queued" })),
        )
            .into_response(),
        Some("+15550000002") => (
            StatusCode::TOO_MANY_REQUESTS,
            [("retry-after", "30")],
            Json(json!({ "code": 20429, "message": "Too Many Requests" })),
        )
            .into_response(),
        Some("+15550000003") => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "code": 21211, "message": "Invalid 'To' Phone Number" })),
        )
            .into_response(),
        Some("+15550000004") => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "code": 21602, "message": "Message body is required" })),
        )
            .into_response(),
        Some("+15550000005") => {
            tokio::time::sleep(Duration::from_secs(2)).await;
            StatusCode::CREATED.into_response()
        }
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response(),
    }
}

async fn twilio_transport(timeout: Duration) -> TwilioSmsTransport {
    let router = Router::new().route(
        "/2010-04-01/Accounts/AC123/Messages.json",
        post(twilio_stub),
    );
    let base_url = serve(router).await;
    TwilioSmsTransport::new(&sms_config(&base_url), timeout).unwrap()
}

#[tokio::test]
async fn test_twilio_success() {
    let transport = twilio_transport(TIMEOUT).await;
    let sid = transport
        .send("+15550000000", "+15550000001", "EMERGENCY ALERT")
        .await
        .unwrap();
    assert_eq!(sid, "SM-+15550000000");
}

#[tokio::test]
async fn test_twilio_error_mapping() {
    let transport = twilio_transport(TIMEOUT).await;

    let err = transport.send("+1", "+15550000002", "x").await.unwrap_err();
    assert_eq!(
        err,
        TransportError::RateLimited {
            retry_after_secs: Some(30)
        }
    );

    let err = transport.send("+1", "+15550000003", "x").await.unwrap_err();
    assert!(matches!(err, TransportError::InvalidTarget { .. }));

    let err = transport.send("+1", "+15550000004", "x").await.unwrap_err();
    assert!(matches!(err, TransportError::Unknown { .. }));

    let err = transport.send("+1", "+15559999999", "x").await.unwrap_err();
    match err {
        TransportError::Unknown { detail } => assert!(detail.contains("500")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_twilio_timeout() {
    let transport = twilio_transport(Duration::from_millis(100)).await;
    let err = transport.send("+1", "+15550000005", "x").await.unwrap_err();
    assert_eq!(err, TransportError::Timeout);
}

#[tokio::test]
async fn test_twilio_unreachable_is_unknown() {
    let transport =
        TwilioSmsTransport::new(&sms_config("http://127.0.0.1:1"), TIMEOUT).unwrap();
    let err = transport.send("+1", "+15550000001", "x").await.unwrap_err();
    assert!(matches!(err, TransportError::Unknown { .. }));
}

async fn fcm_stub(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some("Bearer push-token") {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if body["message"]["notification"]["title"].as_str().is_none() {
        return StatusCode::BAD_REQUEST.into_response();
    }

    match body["message"]["token"].as_str() {
        Some("good") => Json(json!({ "name": "projects/proj/messages/0:1" })).into_response(),
        Some("gone") => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": { "code": 404, "status": "NOT_FOUND" } })),
        )
            .into_response(),
        Some("unregistered") => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": {
                    "code": 400,
                    "status": "FAILED_PRECONDITION",
                    "details": [{ "errorCode": "UNREGISTERED" }]
                }
            })),
        )
            .into_response(),
        Some("busy") => (
            StatusCode::TOO_MANY_REQUESTS,
            [("retry-after", "5")],
            Json(json!({ "error": { "code": 429, "status": "RESOURCE_EXHAUSTED" } })),
        )
            .into_response(),
        _ => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": { "code": 503, "status": "UNAVAILABLE" } })),
        )
            .into_response(),
    }
}

async fn fcm_transport() -> FcmPushTransport {
    let router = Router::new().route("/v1/projects/proj/messages:send", post(fcm_stub));
    let base_url = serve(router).await;
    FcmPushTransport::new(&push_config(&base_url), TIMEOUT).unwrap()
}

#[tokio::test]
async fn test_fcm_success() {
    let transport = fcm_transport().await;
    let receipt = transport
        .send("good", "Emergency Alert Activated", "Help is on the way.")
        .await
        .unwrap();
    assert_eq!(receipt, "projects/proj/messages/0:1");
}

#[tokio::test]
async fn test_fcm_error_mapping() {
    let transport = fcm_transport().await;

    let err = transport.send("gone", "t", "b").await.unwrap_err();
    assert!(matches!(err, TransportError::InvalidTarget { .. }));

    let err = transport.send("unregistered", "t", "b").await.unwrap_err();
    assert!(matches!(err, TransportError::InvalidTarget { .. }));

    let err = transport.send("busy", "t", "b").await.unwrap_err();
    assert_eq!(
        err,
        TransportError::RateLimited {
            retry_after_secs: Some(5)
        }
    );

    let err = transport.send("other", "t", "b").await.unwrap_err();
    assert!(matches!(err, TransportError::Unknown { .. }));
}

fn document(path: &str, fields: Value) -> Value {
    json!({
        "name": format!("projects/proj/databases/(default)/documents/{path}"),
        "fields": fields,
    })
}

async fn firestore_stub(uri: Uri) -> Response {
    let path = uri.path();
    let query = uri.query().unwrap_or_default();
    let Some(relative) = path.strip_prefix("/v1/projects/proj/databases/(default)/documents/") else {
        return StatusCode::BAD_REQUEST.into_response();
    };

    match relative {
        "users/U1" => Json(document("users/U1", json!({ "displayName": { "stringValue": "Ann" } })))
            .into_response(),
        "users/U2" => Json(document("users/U2", json!({}))).into_response(),
        "users/U1/emergency_contacts" if query.contains("pageToken=p2") => Json(json!({
            "documents": [
                document("users/U1/emergency_contacts/c2", json!({
                    "email": { "stringValue": "a@b.com" },
                    "phone": { "stringValue": "" }
                }))
            ]
        }))
        .into_response(),
        "users/U1/emergency_contacts" => Json(json!({
            "documents": [
                document("users/U1/emergency_contacts/c1", json!({
                    "name": { "stringValue": "Bob" },
                    "phone": { "stringValue": "+15551112222" },
                    "relationship": { "stringValue": "brother" }
                }))
            ],
            "nextPageToken": "p2"
        }))
        .into_response(),
        "users/U1/devices" => Json(json!({
            "documents": [
                document("users/U1/devices/d1", json!({ "fcmToken": { "stringValue": "tok1" } })),
                document("users/U1/devices/d2", json!({}))
            ]
        }))
        .into_response(),
        "users/U2/devices" => Json(json!({})).into_response(),
        "users/U2/emergency_contacts" => {
            (StatusCode::SERVICE_UNAVAILABLE, "backend unavailable").into_response()
        }
        _ => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": { "code": 404, "status": "NOT_FOUND" } })),
        )
            .into_response(),
    }
}

async fn firestore_store() -> FirestoreUserDataStore {
    let base_url = serve(Router::new().fallback(firestore_stub)).await;
    let config = StoreConfig {
        backend: StoreBackend::Firestore,
        project_id: "proj".to_string(),
        access_token: "store-token".to_string(),
        api_base_url: base_url,
        seed_path: None,
    };
    FirestoreUserDataStore::new(&config, TIMEOUT).unwrap()
}

#[tokio::test]
async fn test_firestore_profile() {
    let store = firestore_store().await;

    let profile = store.get_profile("U1").await.unwrap().unwrap();
    assert_eq!(profile.user_id, "U1");
    assert_eq!(profile.display_name(), Some("Ann"));

    let profile = store.get_profile("U2").await.unwrap().unwrap();
    assert_eq!(profile.display_name(), None);

    assert!(store.get_profile("ghost").await.unwrap().is_none());
}

#[tokio::test]
async fn test_firestore_contacts_drain_all_pages() {
    let store = firestore_store().await;
    let contacts = store.list_contacts("U1").await.unwrap();

    assert_eq!(contacts.len(), 2);
    assert_eq!(contacts[0].contact_id, "c1");
    assert_eq!(contacts[0].phone(), Some("+15551112222"));
    assert_eq!(contacts[0].relationship.as_deref(), Some("brother"));
    assert_eq!(contacts[1].contact_id, "c2");
    assert_eq!(contacts[1].phone(), None);
    assert_eq!(contacts[1].email(), Some("a@b.com"));
}

#[tokio::test]
async fn test_firestore_devices() {
    let store = firestore_store().await;

    let devices = store.list_devices("U1").await.unwrap();
    assert_eq!(devices.len(), 2);
    assert_eq!(devices[0].push_token(), Some("tok1"));
    assert_eq!(devices[1].push_token(), None);

    assert!(store.list_devices("U2").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_firestore_unavailable() {
    let store = firestore_store().await;
    let err = store.list_contacts("U2").await.unwrap_err();
    assert!(matches!(err, StoreError::Unavailable(_)));
}
