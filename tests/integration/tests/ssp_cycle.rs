//! SimpleSAMLphp aggregator pairing, end to end.

use ra_integration_tests::TestEnv;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_sources_are_written_and_syncer_triggered() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let cron = MockServer::start().await;
    let state_file = dir.path().join("sources.json");
    let config_file = dir.path().join("config-metarefresh.php");

    let env = TestEnv::new(&format!(
        r#"kind = "ssp"
state_file = "{}"
config_file = "{}"
syncer_url = "{}/cron.php"
syncer_key = "cron-key""#,
        state_file.display(),
        config_file.display(),
        cron.uri()
    ))
    .await?;

    Mock::given(method("GET"))
        .and(path("/cron.php"))
        .and(query_param("key", "cron-key"))
        .and(query_param("tag", "hourly"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&cron)
        .await;

    env.queue(&[
        json!({
            "id": "sp-1", "deployment_type": "create", "protocol": "saml",
            "entity_id": "https://sp1.example.org", "metadata_url": "https://sp1.example.org/md"
        }),
        json!({
            "id": "sp-2", "deployment_type": "create", "protocol": "saml",
            "entity_id": "https://sp2.example.org", "metadata_url": "https://sp2.example.org/md"
        }),
    ])
    .await;
    env.accept_publish().await;
    env.expect_ack(1).await;

    let results = env.scheduler()?.run_once().await;
    assert!(results.iter().all(Result::is_ok));

    let published = env.published().await?;
    assert_eq!(
        published[0],
        json!({
            "id": "sp-1",
            "agent_id": 1,
            "status_code": 200,
            "state": "deployed",
            "client_id": "https://sp1.example.org"
        })
    );

    let rendered = std::fs::read_to_string(&config_file)?;
    assert!(rendered.contains("https://sp1.example.org/md"));
    assert!(rendered.contains("https://sp2.example.org/md"));
    Ok(())
}
