//! End-to-end poller behavior against a mock Resource Manager endpoint

use std::time::{Duration, Instant};

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use nimbus_core::{poll_until_done, CoreError, Operation, PollOptions, RestClient};

const RESOURCE_PATH: &str =
    "/subscriptions/sub1/resourceGroups/group1/providers/Nimbus.Network/virtualNetworks/vnet1/peerings/peer1";

fn fast_options() -> PollOptions {
    PollOptions::new(Duration::from_secs(10), Duration::from_millis(20))
}

async fn client_for(server: &MockServer) -> RestClient {
    RestClient::new(&server.uri(), "test-token").unwrap()
}

async fn submit(client: &RestClient) -> Operation {
    let response = client.put(RESOURCE_PATH, &json!({"properties": {}})).await.unwrap();
    Operation::from_response(client.resolve(RESOURCE_PATH).unwrap(), &response).unwrap()
}

/// Count how many status polls the server saw
async fn status_requests(server: &MockServer, status_path: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == status_path)
        .count()
}

#[tokio::test]
async fn accepted_operation_polls_to_success_and_returns_embedded_result() {
    let server = MockServer::start().await;
    let status_url = format!("{}/operations/op1", server.uri());

    Mock::given(method("PUT"))
        .and(path(RESOURCE_PATH))
        .respond_with(
            ResponseTemplate::new(202).insert_header("operation-location", status_url.as_str()),
        )
        .mount(&server)
        .await;

    // First two polls: still in progress. Third: succeeded with a result.
    Mock::given(method("GET"))
        .and(path("/operations/op1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "InProgress"})))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/operations/op1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"status": "Succeeded", "result": {"name": "peer1", "peeringState": "Connected"}}),
        ))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let operation = submit(&client).await;
    assert!(!operation.is_terminal());

    let payload = poll_until_done(&client, operation, &fast_options(), None)
        .await
        .unwrap();

    assert_eq!(
        payload,
        Some(json!({"name": "peer1", "peeringState": "Connected"}))
    );
    // Exactly three status requests: two in-progress, one terminal.
    assert_eq!(status_requests(&server, "/operations/op1").await, 3);
}

#[tokio::test]
async fn synchronous_response_short_circuits_without_polling() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path(RESOURCE_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"name": "peer1", "id": "abc"})),
        )
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let operation = submit(&client).await;
    assert!(operation.is_terminal());

    let payload = poll_until_done(&client, operation, &fast_options(), None)
        .await
        .unwrap();

    assert_eq!(payload, Some(json!({"name": "peer1", "id": "abc"})));
    // Only the PUT itself; no status requests at all.
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn created_response_with_plain_location_header_is_synchronous() {
    let server = MockServer::start().await;

    // A 201 whose Location names the created resource is not an
    // asynchronous acceptance; only Operation-Location means that.
    Mock::given(method("PUT"))
        .and(path(RESOURCE_PATH))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header("location", format!("{}{}", server.uri(), RESOURCE_PATH).as_str())
                .set_body_json(json!({"name": "peer1"})),
        )
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let operation = submit(&client).await;
    assert!(operation.is_terminal());

    let payload = poll_until_done(&client, operation, &fast_options(), None)
        .await
        .unwrap();
    assert_eq!(payload, Some(json!({"name": "peer1"})));
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn fatal_request_error_aborts_immediately() {
    let server = MockServer::start().await;
    let status_url = format!("{}/operations/op2", server.uri());

    Mock::given(method("PUT"))
        .and(path(RESOURCE_PATH))
        .respond_with(
            ResponseTemplate::new(202).insert_header("operation-location", status_url.as_str()),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/operations/op2"))
        .respond_with(ResponseTemplate::new(403).set_body_json(
            json!({"error": {"code": "AuthorizationFailed", "message": "not allowed"}}),
        ))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let operation = submit(&client).await;

    let err = poll_until_done(&client, operation, &fast_options(), None)
        .await
        .unwrap_err();

    assert!(err.is_fatal_request(), "{err}");
    assert!(err.to_string().contains("not allowed"));
    // No retries after a 4xx, regardless of remaining deadline.
    assert_eq!(status_requests(&server, "/operations/op2").await, 1);
}

#[tokio::test]
async fn transient_errors_are_retried_until_success() {
    let server = MockServer::start().await;
    let status_url = format!("{}/operations/op3", server.uri());

    Mock::given(method("PUT"))
        .and(path(RESOURCE_PATH))
        .respond_with(
            ResponseTemplate::new(202).insert_header("operation-location", status_url.as_str()),
        )
        .mount(&server)
        .await;
    // Three 5xx responses, then terminal success: the transient-error count
    // must not affect the outcome.
    Mock::given(method("GET"))
        .and(path("/operations/op3"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(3)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/operations/op3"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"status": "Succeeded"})),
        )
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let operation = submit(&client).await;

    let payload = poll_until_done(&client, operation, &fast_options(), None)
        .await
        .unwrap();

    // Succeeded without an embedded result document.
    assert_eq!(payload, None);
    assert_eq!(status_requests(&server, "/operations/op3").await, 4);
}

#[tokio::test]
async fn never_terminal_operation_times_out() {
    let server = MockServer::start().await;
    let status_url = format!("{}/operations/op4", server.uri());

    Mock::given(method("PUT"))
        .and(path(RESOURCE_PATH))
        .respond_with(
            ResponseTemplate::new(202).insert_header("operation-location", status_url.as_str()),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/operations/op4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "InProgress"})))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let operation = submit(&client).await;

    let options = PollOptions::new(Duration::from_millis(150), Duration::from_millis(20));
    let started = Instant::now();
    let err = poll_until_done(&client, operation, &options, None)
        .await
        .unwrap_err();

    assert!(err.is_timeout(), "{err}");
    assert!(started.elapsed() >= Duration::from_millis(150));
    match err {
        CoreError::Timeout(timeout) => assert_eq!(timeout, Duration::from_millis(150)),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn remote_failure_surfaces_remote_message() {
    let server = MockServer::start().await;
    let status_url = format!("{}/operations/op5", server.uri());

    Mock::given(method("PUT"))
        .and(path(RESOURCE_PATH))
        .respond_with(
            ResponseTemplate::new(202).insert_header("operation-location", status_url.as_str()),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/operations/op5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"status": "Failed", "error": {"code": "QuotaExceeded", "message": "peering quota exhausted"}}),
        ))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let operation = submit(&client).await;

    let err = poll_until_done(&client, operation, &fast_options(), None)
        .await
        .unwrap_err();

    match &err {
        CoreError::OperationFailed { message } => {
            assert_eq!(message, "peering quota exhausted");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!err.is_timeout());
}

#[tokio::test]
async fn cancelled_operation_is_reported_as_failure() {
    let server = MockServer::start().await;
    let status_url = format!("{}/operations/op6", server.uri());

    Mock::given(method("PUT"))
        .and(path(RESOURCE_PATH))
        .respond_with(
            ResponseTemplate::new(202).insert_header("operation-location", status_url.as_str()),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/operations/op6"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "Cancelled"})))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let operation = submit(&client).await;

    let err = poll_until_done(&client, operation, &fast_options(), None)
        .await
        .unwrap_err();

    match err {
        CoreError::OperationFailed { message } => assert!(message.contains("cancelled")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn retry_after_hint_stretches_the_poll_interval() {
    let server = MockServer::start().await;
    let status_url = format!("{}/operations/op7", server.uri());

    Mock::given(method("PUT"))
        .and(path(RESOURCE_PATH))
        .respond_with(
            ResponseTemplate::new(202).insert_header("operation-location", status_url.as_str()),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/operations/op7"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "InProgress"}))
                .insert_header("retry-after", "1"),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/operations/op7"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"status": "Succeeded"})),
        )
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let operation = submit(&client).await;

    let started = Instant::now();
    poll_until_done(&client, operation, &fast_options(), None)
        .await
        .unwrap();

    // First poll is quick, second one waits out the 1s Retry-After hint.
    assert!(started.elapsed() >= Duration::from_secs(1));
}

#[tokio::test]
async fn accepted_response_without_operation_url_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path(RESOURCE_PATH))
        .respond_with(ResponseTemplate::new(202))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let response = client
        .put(RESOURCE_PATH, &json!({"properties": {}}))
        .await
        .unwrap();
    let err = Operation::from_response(client.resolve(RESOURCE_PATH).unwrap(), &response)
        .unwrap_err();

    assert!(matches!(err, CoreError::MissingOperationUrl));
}

#[tokio::test]
async fn non_terminal_body_marker_polls_the_resource_itself() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path(RESOURCE_PATH))
        .respond_with(ResponseTemplate::new(201).set_body_json(
            json!({"name": "peer1", "properties": {"provisioningState": "Updating"}}),
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(RESOURCE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"name": "peer1", "properties": {"provisioningState": "Updating"}}),
        ))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(RESOURCE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"name": "peer1", "properties": {"provisioningState": "Succeeded"}}),
        ))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let operation = submit(&client).await;
    assert!(!operation.is_terminal());

    let payload = poll_until_done(&client, operation, &fast_options(), None)
        .await
        .unwrap();

    // When the resource itself is the poll target, the settled resource
    // document comes back whole.
    assert_eq!(
        payload.unwrap().pointer("/properties/provisioningState"),
        Some(&json!("Succeeded"))
    );
}

#[tokio::test]
async fn deletion_polling_treats_missing_resource_as_done() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path(RESOURCE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"properties": {"provisioningState": "Deleting"}}),
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(RESOURCE_PATH))
        .respond_with(ResponseTemplate::new(404).set_body_json(
            json!({"error": {"code": "ResourceNotFound", "message": "gone"}}),
        ))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let response = client.delete(RESOURCE_PATH).await.unwrap();
    let operation =
        Operation::from_response(client.resolve(RESOURCE_PATH).unwrap(), &response).unwrap();

    let payload = poll_until_done(&client, operation, &fast_options(), None)
        .await
        .unwrap();
    assert_eq!(payload, None);
}
