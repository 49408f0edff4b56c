use super::*;
use crate::auth::{AuthConfig, Location};
use crate::error::Error;
use crate::loader::{AugmentationDefinition, AuthDefinition};
use crate::tabular::{TabularConfig, Tabularizer};
use crate::template::TemplateContext;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn context(server: &MockServer) -> TemplateContext {
    TemplateContext::with_config(json!({
        "token_url": format!("{}/api/Common/GetToken", server.uri()),
        "storage_url": format!("{}/api/Storage/GetData", server.uri()),
        "client_id": "70022705",
    }))
}

fn definition(records_path: Option<&str>) -> AugmentationDefinition {
    let records = records_path
        .map(|p| format!("records_path: {p}\n"))
        .unwrap_or_default();
    let yaml = format!(
        r#"
sheet: ResponseExtract
correlation:
  query: Forms
  column: internalDocumentId
auth:
  type: session
  login_url: "{{{{ config.token_url }}}}"
  body:
    bpc: "{{{{ config.client_id }}}}"
  token_path: token
request:
  url: "{{{{ config.storage_url }}}}"
  body:
    ClientId: "{{{{ config.client_id }}}}"
    Variables:
      Mode: extract
  ids_path: Variables.internalDocumentIds
{records}http:
  max_retries: 0
"#
    );
    serde_yaml::from_str(&yaml).unwrap()
}

fn keys(values: &[&str]) -> CorrelationKeys {
    let mut keys = CorrelationKeys::new();
    keys.extend(values.iter().map(|v| json!(v)));
    keys
}

async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/Common/GetToken"))
        .and(body_json(json!({"bpc": "70022705"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "tok-1"})))
        .expect(1)
        .mount(server)
        .await;
}

// ============================================================================
// Correlation keys
// ============================================================================

#[test]
fn test_keys_collect_dedup_in_order() {
    let table = Tabularizer::new(TabularConfig::default())
        .tabularize(&[
            json!({"internalDocumentId": "b"}),
            json!({"internalDocumentId": "a"}),
            json!({"internalDocumentId": "b"}),
            json!({"internalDocumentId": null}),
            json!({"other": 1}),
        ])
        .unwrap();

    let keys = CorrelationKeys::collect(&table, "internalDocumentId");
    assert_eq!(keys.len(), 2);
    assert_eq!(keys.to_json(), json!(["b", "a"]));
}

#[test]
fn test_keys_unknown_column_is_empty() {
    let table = Tabularizer::default().tabularize(&[json!({"a": 1})]).unwrap();
    assert!(CorrelationKeys::collect(&table, "missing").is_empty());
}

#[test]
fn test_keys_distinguish_types() {
    let mut keys = CorrelationKeys::new();
    assert!(keys.insert(json!(1)));
    assert!(keys.insert(json!("1")));
    assert!(!keys.insert(json!(1)));
    assert!(!keys.insert(json!(null)));
    assert_eq!(keys.values(), &[json!(1), json!("1")]);
}

// ============================================================================
// Request building
// ============================================================================

#[test]
fn test_insert_at_path_creates_objects() {
    let mut body = json!({"a": 1});
    insert_at_path(&mut body, "x.y.z", json!([1, 2])).unwrap();
    assert_eq!(body, json!({"a": 1, "x": {"y": {"z": [1, 2]}}}));
}

#[test]
fn test_insert_at_path_through_scalar_fails() {
    let mut body = json!({"a": 1});
    assert!(insert_at_path(&mut body, "a.b", json!([])).is_err());
    assert!(insert_at_path(&mut body, "", json!([])).is_err());
}

#[test]
fn test_auth_config_rendering() {
    let ctx = TemplateContext::with_config(json!({"key": "k-1"}));

    let def = AuthDefinition::ApiKey {
        key: "X-Api-Key".to_string(),
        value: "{{ config.key }}".to_string(),
        location: Location::Header,
    };
    match auth_config(&def, &ctx).unwrap() {
        AuthConfig::ApiKey {
            location,
            name,
            value,
        } => {
            assert_eq!(location, Location::Header);
            assert_eq!(name, "X-Api-Key");
            assert_eq!(value, "k-1");
        }
        other => panic!("unexpected auth config: {other:?}"),
    }

    let bad = AuthDefinition::ApiKey {
        key: "k".to_string(),
        value: "{{ config.missing }}".to_string(),
        location: Location::Query,
    };
    assert!(auth_config(&bad, &ctx).is_err());
    assert!(auth_config(&AuthDefinition::None, &ctx).unwrap().is_none());
}

#[tokio::test]
async fn test_undefined_template_is_augmentation_error() {
    let err = AugmentationClient::from_definition(&definition(None), &TemplateContext::new())
        .unwrap_err();
    assert!(matches!(err, Error::Augmentation { .. }));
}

// ============================================================================
// Fetch
// ============================================================================

#[tokio::test]
async fn test_fetch_sends_ids_with_token() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/Storage/GetData"))
        .and(header("Authorization", "Bearer tok-1"))
        .and(body_json(json!({
            "ClientId": "70022705",
            "Variables": {"Mode": "extract", "internalDocumentIds": ["d1", "d2"]}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ouputData": [{"docId": "d1", "answer": 1}, {"docId": "d2", "answer": 2}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client =
        AugmentationClient::from_definition(&definition(Some("ouputData")), &context(&server))
            .unwrap();
    assert!(client.url().ends_with("/api/Storage/GetData"));

    let records = client.fetch(&keys(&["d1", "d2", "d1"])).await.unwrap();
    assert_eq!(
        records,
        vec![json!({"docId": "d1", "answer": 1}), json!({"docId": "d2", "answer": 2})]
    );
}

#[tokio::test]
async fn test_fetch_missing_records_path_is_empty() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/Storage/GetData"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .mount(&server)
        .await;

    let client =
        AugmentationClient::from_definition(&definition(Some("ouputData")), &context(&server))
            .unwrap();
    assert!(client.fetch(&keys(&["d1"])).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_fetch_server_error() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/Storage/GetData"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let client =
        AugmentationClient::from_definition(&definition(Some("ouputData")), &context(&server))
            .unwrap();
    let err = client.fetch(&keys(&["d1"])).await.unwrap_err();
    assert!(matches!(err, Error::Augmentation { .. }));
    assert!(err.to_string().contains("500"));
}

#[tokio::test]
async fn test_fetch_login_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/Common/GetToken"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client =
        AugmentationClient::from_definition(&definition(None), &context(&server)).unwrap();
    let err = client.fetch(&keys(&["d1"])).await.unwrap_err();
    assert!(matches!(err, Error::Augmentation { .. }));
}

#[tokio::test]
async fn test_fetch_malformed_response() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/Storage/GetData"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let client =
        AugmentationClient::from_definition(&definition(None), &context(&server)).unwrap();
    assert!(matches!(
        client.fetch(&keys(&["d1"])).await.unwrap_err(),
        Error::Augmentation { .. }
    ));
}
