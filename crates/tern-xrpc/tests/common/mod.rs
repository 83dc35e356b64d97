#![allow(dead_code)]

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use tern_core::{DidDocumentFetcher, HandleResolver, IdentityResolver};
use tern_xrpc::{
    DEFAULT_USER_AGENT, DidDocumentClient, DohResolver, WELL_KNOWN_PATH, WellKnownResolver,
    http_client,
};
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const HANDLE: &str = "alice.test";
pub const DID: &str = "did:plc:alice";

/// An identity resolver whose DNS, well-known, directory and did:web lookups
/// all go to `server`.
pub fn resolver(server: &MockServer) -> IdentityResolver {
    let origin = Url::parse(&server.uri()).unwrap();
    let http = http_client(DEFAULT_USER_AGENT).unwrap();

    let doh = DohResolver::new(http.clone(), origin.join("/dns-query").unwrap());
    let well_known = WellKnownResolver::new(DEFAULT_USER_AGENT)
        .unwrap()
        .with_origin(origin.clone());
    let documents = DidDocumentClient::new(http, origin.clone()).with_web_origin(origin);

    let strategies: Vec<Arc<dyn HandleResolver>> = vec![Arc::new(doh), Arc::new(well_known)];
    let fetcher: Arc<dyn DidDocumentFetcher> = Arc::new(documents);
    IdentityResolver::new(strategies, fetcher)
}

/// A DID document naming `pds` as the hosting endpoint.
pub fn document(did: &str, handle: &str, pds: &str) -> Value {
    json!({
        "id": did,
        "alsoKnownAs": [format!("at://{}", handle)],
        "service": [{
            "id": "#atproto_pds",
            "type": "AtprotoPersonalDataServer",
            "serviceEndpoint": pds
        }]
    })
}

/// Mounts a TXT answer for `handle` and a directory entry for `did` hosted
/// on `server` itself.
pub async fn mount_identity(server: &MockServer, handle: &str, did: &str) {
    Mock::given(method("GET"))
        .and(path("/dns-query"))
        .and(query_param("name", format!("_atproto.{}", handle)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Status": 0,
            "Answer": [{"name": format!("_atproto.{}", handle), "type": 16, "data": format!("\"did={}\"", did)}]
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(WELL_KNOWN_PATH))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/{}", did)))
        .respond_with(ResponseTemplate::new(200).set_body_json(document(did, handle, &server.uri())))
        .mount(server)
        .await;
}

/// An unsigned JWT expiring at `exp`.
pub fn jwt(exp: DateTime<Utc>) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none"}"#);
    let claims = URL_SAFE_NO_PAD.encode(json!({"exp": exp.timestamp()}).to_string());
    format!("{header}.{claims}.sig")
}
