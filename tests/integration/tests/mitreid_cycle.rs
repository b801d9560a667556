//! MITREid Connect pairing, end to end.

use ra_integration_tests::TestEnv;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend(issuer: &str) -> String {
    format!(
        r#"kind = "mitreid"
issuer = "{issuer}"
token = "mitre-token""#
    )
}

#[tokio::test]
async fn test_create_edit_and_rejected_delete() -> anyhow::Result<()> {
    let mitreid = MockServer::start().await;
    let env = TestEnv::new(&backend(&mitreid.uri())).await?;

    Mock::given(method("POST"))
        .and(path("/api/clients"))
        .and(body_partial_json(json!({
            "clientId": "testId1",
            "clientName": "testName",
            "contacts": ["email1"]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 42,
            "clientId": "testId1"
        })))
        .expect(1)
        .mount(&mitreid)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/clients/12"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 12})))
        .expect(1)
        .mount(&mitreid)
        .await;

    let contacts = json!([{"email": "email1", "type": "technical"}]);
    env.queue(&[
        json!({
            "id": 1, "deployment_type": "create", "client_id": "testId1",
            "service_name": "testName", "contacts": contacts
        }),
        json!({
            "id": 2, "deployment_type": "edit", "external_id": 12,
            "client_id": "testId1", "service_name": "testName", "contacts": contacts
        }),
        json!({"id": 3, "deployment_type": "delete"}),
    ])
    .await;
    env.accept_publish().await;
    env.expect_ack(1).await;

    let results = env.scheduler()?.run_once().await;
    assert!(results.iter().all(Result::is_ok));

    let published = env.published().await?;
    assert_eq!(published.len(), 3);
    assert_eq!(published[0]["external_id"], "42");
    assert_eq!(published[0]["status_code"], 201);
    assert_eq!(published[1]["external_id"], "12");
    assert_eq!(published[1]["status_code"], 200);
    assert_eq!(published[1]["client_id"], "testId1");
    assert_eq!(
        published[2],
        json!({
            "id": 3,
            "agent_id": 1,
            "status_code": 0,
            "state": "error",
            "error_description": "external_id is required for delete requests"
        })
    );
    Ok(())
}
