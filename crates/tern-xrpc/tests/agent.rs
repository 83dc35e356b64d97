//! Record operations through an authenticated agent.

mod common;

use chrono::{Duration, Utc};
use common::{DID, jwt};
use serde_json::json;
use tern_core::{AccessToken, AtUri, Did, Nsid, PdsUrl, RecordValue, RefreshToken, TokenSet};
use tern_xrpc::{Agent, DEFAULT_USER_AGENT, INVALID_SWAP, XrpcClient, XrpcSession, http_client};
use wiremock::matchers::{
    body_partial_json, header_exists, method, path, query_param, query_param_is_missing,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

const COLLECTION: &str = "app.bsky.feed.post";

fn agent(server: &MockServer) -> Agent {
    let expires_at = Utc::now() + Duration::hours(1);
    let access = jwt(expires_at);
    let tokens = TokenSet {
        access_token: AccessToken::new(access),
        refresh_token: Some(RefreshToken::new("refresh-1")),
        expires_at: Some(expires_at),
    };
    let client = XrpcClient::new(
        http_client(DEFAULT_USER_AGENT).unwrap(),
        PdsUrl::new(server.uri()).unwrap(),
    );
    Agent::from(XrpcSession::new(client, Did::new(DID).unwrap(), tokens, None))
}

fn record(rkey: &str, text: &str) -> serde_json::Value {
    json!({
        "uri": format!("at://{}/{}/{}", DID, COLLECTION, rkey),
        "cid": format!("bafy{}", rkey),
        "value": {"$type": COLLECTION, "text": text}
    })
}

fn post(text: &str) -> RecordValue {
    RecordValue::new(json!({"$type": COLLECTION, "text": text})).unwrap()
}

#[tokio::test]
async fn get_record_returns_the_record() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/xrpc/com.atproto.repo.getRecord"))
        .and(query_param("repo", DID))
        .and(query_param("rkey", "one"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(record("one", "hello")))
        .expect(1)
        .mount(&server)
        .await;

    let uri = AtUri::new(format!("at://{}/{}/one", DID, COLLECTION)).unwrap();
    let found = agent(&server).get_record(&uri).await.unwrap().unwrap();
    assert_eq!(found.cid, "bafyone");
    assert_eq!(found.value.as_value()["text"], "hello");
}

#[tokio::test]
async fn missing_record_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/xrpc/com.atproto.repo.getRecord"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "RecordNotFound",
            "message": "Could not locate record"
        })))
        .mount(&server)
        .await;

    let uri = AtUri::new(format!("at://{}/{}/gone", DID, COLLECTION)).unwrap();
    assert!(agent(&server).get_record(&uri).await.unwrap().is_none());
}

#[tokio::test]
async fn other_errors_are_not_swallowed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/xrpc/com.atproto.repo.getRecord"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "InvalidRequest",
            "message": "bad rkey"
        })))
        .mount(&server)
        .await;

    let uri = AtUri::new(format!("at://{}/{}/x", DID, COLLECTION)).unwrap();
    let err = agent(&server).get_record(&uri).await.unwrap_err();
    assert!(err.as_protocol().is_some_and(|p| p.is_kind("InvalidRequest")));
}

#[tokio::test]
async fn list_all_records_follows_cursors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/xrpc/com.atproto.repo.listRecords"))
        .and(query_param_is_missing("cursor"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": [record("a", "1"), record("b", "2")],
            "cursor": "page-2"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/xrpc/com.atproto.repo.listRecords"))
        .and(query_param("cursor", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": [record("c", "3")]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let records = agent(&server)
        .list_all_records(&Did::new(DID).unwrap(), &Nsid::new(COLLECTION).unwrap())
        .await
        .unwrap();
    let rkeys: Vec<&str> = records.iter().map(|r| r.uri.rkey()).collect();
    assert_eq!(rkeys, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn repeated_cursor_stops_listing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/xrpc/com.atproto.repo.listRecords"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": [record("a", "1")],
            "cursor": "same"
        })))
        .expect(2)
        .mount(&server)
        .await;

    let records = agent(&server)
        .list_all_records(&Did::new(DID).unwrap(), &Nsid::new(COLLECTION).unwrap())
        .await
        .unwrap();
    assert_eq!(records.len(), 2);
}

#[tokio::test]
async fn create_record_posts_to_own_repo() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/xrpc/com.atproto.repo.createRecord"))
        .and(body_partial_json(json!({
            "repo": DID,
            "collection": COLLECTION,
            "record": {"$type": COLLECTION, "text": "new"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uri": format!("at://{}/{}/fresh", DID, COLLECTION),
            "cid": "bafyfresh"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let output = agent(&server)
        .create_record(&Nsid::new(COLLECTION).unwrap(), &post("new"), None)
        .await
        .unwrap();
    assert_eq!(output.uri.rkey(), "fresh");
}

#[tokio::test]
async fn stale_swap_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/xrpc/com.atproto.repo.putRecord"))
        .and(body_partial_json(json!({"rkey": "self", "swapRecord": "bafyold"})))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "InvalidSwap",
            "message": "Record was at bafynew"
        })))
        .mount(&server)
        .await;

    let err = agent(&server)
        .put_record(
            &Nsid::new(COLLECTION).unwrap(),
            "self",
            &post("edit"),
            Some("bafyold"),
        )
        .await
        .unwrap_err();
    assert!(err.as_protocol().is_some_and(|p| p.is_kind(INVALID_SWAP)));
}

#[tokio::test]
async fn delete_record_sends_the_uri_parts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/xrpc/com.atproto.repo.deleteRecord"))
        .and(body_partial_json(json!({
            "repo": DID,
            "collection": COLLECTION,
            "rkey": "old"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let uri = AtUri::new(format!("at://{}/{}/old", DID, COLLECTION)).unwrap();
    agent(&server).delete_record(&uri).await.unwrap();
}
