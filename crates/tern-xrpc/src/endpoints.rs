//! XRPC endpoint names and request/response bodies.

use serde::{Deserialize, Serialize};

pub const CREATE_SESSION: &str = "com.atproto.server.createSession";
pub const REFRESH_SESSION: &str = "com.atproto.server.refreshSession";
pub const LIST_RECORDS: &str = "com.atproto.repo.listRecords";
pub const GET_RECORD: &str = "com.atproto.repo.getRecord";
pub const CREATE_RECORD: &str = "com.atproto.repo.createRecord";
pub const PUT_RECORD: &str = "com.atproto.repo.putRecord";
pub const DELETE_RECORD: &str = "com.atproto.repo.deleteRecord";

/// Response from createSession and refreshSession.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub did: String,
    pub handle: String,
    pub access_jwt: String,
    pub refresh_jwt: String,
}

/// Query parameters for listRecords.
#[derive(Debug, Serialize)]
pub struct ListRecordsQuery<'a> {
    pub repo: &'a str,
    pub collection: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<&'a str>,
}

/// Query parameters for getRecord.
#[derive(Debug, Serialize)]
pub struct GetRecordQuery<'a> {
    pub repo: &'a str,
    pub collection: &'a str,
    pub rkey: &'a str,
}

/// Request body for createRecord.
#[derive(Debug, Serialize)]
pub struct CreateRecordRequest<'a> {
    pub repo: &'a str,
    pub collection: &'a str,
    pub record: &'a serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rkey: Option<&'a str>,
}

/// Request body for putRecord.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PutRecordRequest<'a> {
    pub repo: &'a str,
    pub collection: &'a str,
    pub rkey: &'a str,
    pub record: &'a serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swap_record: Option<&'a str>,
}

/// Request body for deleteRecord.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRecordRequest<'a> {
    pub repo: &'a str,
    pub collection: &'a str,
    pub rkey: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swap_record: Option<&'a str>,
}

/// XRPC error response format.
#[derive(Debug, Deserialize)]
pub struct XrpcErrorResponse {
    pub error: Option<String>,
    pub message: Option<String>,
}

/// `/.well-known/oauth-protected-resource` document of a PDS.
#[derive(Debug, Deserialize)]
pub struct ProtectedResourceMetadata {
    #[serde(default)]
    pub authorization_servers: Vec<String>,
}

/// `/.well-known/oauth-authorization-server` document of an issuer.
#[derive(Debug, Deserialize)]
pub struct AuthorizationServerMetadata {
    pub issuer: String,
    pub authorization_endpoint: String,
}
