//! XRPC HTTP client.

use reqwest::RequestBuilder;
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, instrument, trace};

use tern_core::Result;
use tern_core::error::{Error, ProtocolError};
use tern_core::types::PdsUrl;

use crate::endpoints::XrpcErrorResponse;
use crate::error::transport;

/// User agent sent with every request unless configured otherwise.
pub const DEFAULT_USER_AGENT: &str = concat!("tern/", env!("CARGO_PKG_VERSION"));

/// Builds the shared HTTP client.
pub fn http_client(user_agent: &str) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(user_agent)
        .build()
        .map_err(transport)
}

/// Issues XRPC queries (GET) and procedures (POST) against one PDS.
///
/// Non-2xx responses become [`ProtocolError`]s carrying the XRPC error name,
/// so callers can match on kinds such as `RecordNotFound` or `InvalidSwap`.
#[derive(Debug, Clone)]
pub struct XrpcClient {
    http: reqwest::Client,
    pds: PdsUrl,
}

impl XrpcClient {
    pub fn new(http: reqwest::Client, pds: PdsUrl) -> Self {
        Self { http, pds }
    }

    pub fn pds(&self) -> &PdsUrl {
        &self.pds
    }

    /// Runs a query, authenticated when `token` is given.
    #[instrument(skip(self, params, token), fields(pds = %self.pds))]
    pub async fn query<Q, R>(&self, method: &str, params: &Q, token: Option<&str>) -> Result<R>
    where
        Q: Serialize + std::fmt::Debug,
        R: DeserializeOwned,
    {
        debug!(method, authed = token.is_some(), "XRPC query");
        trace!(?params, "query parameters");

        let request = self.http.get(self.pds.xrpc_url(method)).query(params);
        let response = with_token(request, token).send().await.map_err(transport)?;
        parse_response(response).await
    }

    /// Runs a procedure with a JSON body, authenticated when `token` is given.
    #[instrument(skip(self, body, token), fields(pds = %self.pds))]
    pub async fn procedure<B, R>(&self, method: &str, body: &B, token: Option<&str>) -> Result<R>
    where
        B: Serialize + std::fmt::Debug,
        R: DeserializeOwned,
    {
        debug!(method, authed = token.is_some(), "XRPC procedure");

        let request = self.http.post(self.pds.xrpc_url(method)).json(body);
        let response = with_token(request, token).send().await.map_err(transport)?;
        parse_response(response).await
    }

    /// Runs a procedure whose response body is ignored.
    #[instrument(skip(self, body, token), fields(pds = %self.pds))]
    pub async fn procedure_unit<B>(&self, method: &str, body: &B, token: &str) -> Result<()>
    where
        B: Serialize + std::fmt::Debug,
    {
        debug!(method, "XRPC procedure (no response)");

        let response = self
            .http
            .post(self.pds.xrpc_url(method))
            .json(body)
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport)?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Error::Protocol(parse_error(response).await))
        }
    }

    /// Runs a procedure without a request body. Used by `refreshSession`,
    /// which authenticates with the refresh token.
    #[instrument(skip(self, token), fields(pds = %self.pds))]
    pub async fn procedure_empty<R>(&self, method: &str, token: &str) -> Result<R>
    where
        R: DeserializeOwned,
    {
        debug!(method, "XRPC procedure (no body)");

        let response = self
            .http
            .post(self.pds.xrpc_url(method))
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport)?;
        parse_response(response).await
    }
}

fn with_token(request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
    match token {
        Some(token) => request.bearer_auth(token),
        None => request,
    }
}

async fn parse_response<R: DeserializeOwned>(response: reqwest::Response) -> Result<R> {
    let status = response.status();
    trace!(%status, "XRPC response");

    if status.is_success() {
        response.json::<R>().await.map_err(transport)
    } else {
        Err(Error::Protocol(parse_error(response).await))
    }
}

async fn parse_error(response: reqwest::Response) -> ProtocolError {
    let status = response.status().as_u16();
    match response.json::<XrpcErrorResponse>().await {
        Ok(body) => ProtocolError::new(status, body.error, body.message),
        Err(_) => ProtocolError::new(status, None, None),
    }
}
