//! Keycloak OIDC pairing, end to end.

use ra_integration_tests::TestEnv;
use ra_reconcile::CycleStage;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const REALM: &str = "/admin/realms/egi";

fn backend(server_url: &str) -> String {
    format!(
        r#"kind = "keycloak-oidc"
server_url = "{server_url}"
realm = "egi"
token = "kc-token"
timeout_secs = 5"#
    )
}

fn create_request(id: i64) -> serde_json::Value {
    json!({
        "id": id,
        "deployment_type": "create",
        "protocol": "oidc",
        "client_id": "testOidcId",
        "service_name": "testName",
        "contacts": [
            {"name": "name1", "email": "email1", "type": "technical"},
            {"name": "name2", "email": "email2", "type": "security"}
        ],
        "scope": ["openid", "email", "eduperson_entitlement"]
    })
}

async fn mount_realm(keycloak: &MockServer) {
    Mock::given(method("GET"))
        .and(path(format!("{REALM}/default-default-client-scopes")))
        .and(header("Authorization", "Bearer kc-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "p-id", "name": "profile", "protocol": "openid-connect"},
            {"id": "e-id", "name": "email", "protocol": "openid-connect"},
            {"id": "s-id", "name": "role_list", "protocol": "saml"}
        ])))
        .expect(1)
        .mount(keycloak)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{REALM}/client-scopes")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "p-id", "name": "profile", "protocol": "openid-connect"},
            {"id": "e-id", "name": "email", "protocol": "openid-connect"},
            {"id": "ent-id", "name": "eduperson_entitlement", "protocol": "openid-connect"}
        ])))
        .mount(keycloak)
        .await;
}

#[tokio::test]
async fn test_create_is_deployed_published_and_acked() -> anyhow::Result<()> {
    let keycloak = MockServer::start().await;
    let env = TestEnv::new(&backend(&keycloak.uri())).await?;
    mount_realm(&keycloak).await;

    Mock::given(method("POST"))
        .and(path(format!("{REALM}/clients")))
        .respond_with(ResponseTemplate::new(201).insert_header(
            "Location",
            format!("{}{REALM}/clients/kc-1", keycloak.uri()).as_str(),
        ))
        .expect(1)
        .mount(&keycloak)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("{REALM}/clients/kc-1/optional-client-scopes/ent-id")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&keycloak)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{REALM}/clients/kc-1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "kc-1",
            "clientId": "testOidcId",
            "optionalClientScopes": ["eduperson_entitlement"]
        })))
        .mount(&keycloak)
        .await;

    env.queue(&[create_request(12)]).await;
    env.accept_publish().await;
    env.expect_ack(1).await;

    let results = env.scheduler()?.run_once().await;
    let report = results.into_iter().next().expect("one pairing")?;
    assert_eq!(report.deployed, 1);

    assert_eq!(
        env.published().await?,
        [json!({
            "id": 12,
            "external_id": "kc-1",
            "agent_id": 1,
            "status_code": 201,
            "state": "deployed",
            "client_id": "testOidcId"
        })]
    );
    assert_eq!(env.acknowledged().await?, ["ack-0"]);
    Ok(())
}

#[tokio::test]
async fn test_unreachable_keycloak_is_reported_and_batch_completes() -> anyhow::Result<()> {
    let env = TestEnv::new(&backend("http://127.0.0.1:1")).await?;

    env.queue(&[
        create_request(13),
        json!({"deployment_type": "create", "client_id": "no-id"}),
    ])
    .await;
    env.accept_publish().await;
    env.expect_ack(1).await;

    let results = env.scheduler()?.run_once().await;
    let report = results.into_iter().next().expect("one pairing")?;
    assert_eq!(report.failed, 1);
    assert_eq!(report.dropped, 1);

    assert_eq!(
        env.published().await?,
        [json!({
            "id": 13,
            "agent_id": 1,
            "status_code": 0,
            "state": "error",
            "error_description": "An error occurred while calling Keycloak"
        })]
    );
    assert_eq!(env.acknowledged().await?, ["ack-0", "ack-1"]);
    Ok(())
}

#[tokio::test]
async fn test_publish_failure_leaves_batch_unacked() -> anyhow::Result<()> {
    let keycloak = MockServer::start().await;
    let env = TestEnv::new(&backend(&keycloak.uri())).await?;

    Mock::given(method("DELETE"))
        .and(path(format!("{REALM}/clients/kc-1")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&keycloak)
        .await;
    Mock::given(method("POST"))
        .and(path(format!(
            "/v1/projects/{}/topics/{}:publish",
            ra_integration_tests::PROJECT,
            ra_integration_tests::TOPIC
        )))
        .respond_with(ResponseTemplate::new(503))
        .mount(&env.bus)
        .await;

    env.queue(&[json!({
        "id": 14,
        "deployment_type": "delete",
        "external_id": "kc-1",
        "client_id": "testOidcId"
    })])
    .await;
    env.expect_ack(0).await;

    let results = env.scheduler()?.run_once().await;
    let error = results.into_iter().next().expect("one pairing").unwrap_err();
    assert_eq!(error.stage, CycleStage::Publish);
    assert!(env.acknowledged().await?.is_empty());
    Ok(())
}
