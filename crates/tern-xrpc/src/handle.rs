//! Handle resolution strategies.
//!
//! Two independent lookups are raced by `IdentityResolver`: the HTTPS
//! well-known document served by the handle's host, and the `_atproto` TXT
//! record queried over DNS-over-HTTPS.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::redirect::Policy;
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use tern_core::Result;
use tern_core::error::{IdentityError, InvalidInputError};
use tern_core::traits::HandleResolver;
use tern_core::types::{Did, Handle};

use crate::error::{status, transport};

/// Path of the well-known handle document.
pub const WELL_KNOWN_PATH: &str = "/.well-known/atproto-did";

/// DNS record type number of TXT records.
const TXT_RECORD: u16 = 16;

/// Resolves a handle from `https://<handle>/.well-known/atproto-did`.
///
/// Redirects are not followed. The first line of the body must be a DID.
#[derive(Debug, Clone)]
pub struct WellKnownResolver {
    http: reqwest::Client,
    origin: Option<Url>,
}

impl WellKnownResolver {
    pub fn new(user_agent: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .redirect(Policy::none())
            .build()
            .map_err(transport)?;
        Ok(Self { http, origin: None })
    }

    /// Sends every lookup to `origin` instead of the handle's own host.
    pub fn with_origin(mut self, origin: Url) -> Self {
        self.origin = Some(origin);
        self
    }

    fn url(&self, handle: &Handle) -> Result<Url> {
        let url = match &self.origin {
            Some(origin) => origin.join(WELL_KNOWN_PATH),
            None => Url::parse(&format!("https://{}{}", handle, WELL_KNOWN_PATH)),
        };
        url.map_err(|err| {
            InvalidInputError::Other {
                message: format!("well-known URL for {}: {}", handle, err),
            }
            .into()
        })
    }
}

#[async_trait]
impl HandleResolver for WellKnownResolver {
    fn name(&self) -> &'static str {
        "well-known"
    }

    #[instrument(skip(self), fields(%handle))]
    async fn resolve_handle(&self, handle: &Handle) -> Result<Did> {
        let url = self.url(handle)?;
        let response = self.http.get(url).send().await.map_err(transport)?;
        if !response.status().is_success() {
            return Err(status(response.status()));
        }

        let body = response.text().await.map_err(transport)?;
        let line = body.lines().next().unwrap_or_default().trim();
        let did = Did::new(line).map_err(|_| IdentityError::InvalidWellKnown)?;
        debug!(%did, "well-known document resolved");
        Ok(did)
    }
}

/// Resolves a handle from the `_atproto.<handle>` TXT record using a
/// DNS-over-HTTPS JSON endpoint.
#[derive(Debug, Clone)]
pub struct DohResolver {
    http: reqwest::Client,
    endpoint: Url,
}

#[derive(Debug, Deserialize)]
struct DohResponse {
    #[serde(rename = "Answer", default)]
    answer: Vec<DohAnswer>,
}

#[derive(Debug, Deserialize)]
struct DohAnswer {
    #[serde(rename = "type")]
    record_type: u16,
    data: String,
}

impl DohResolver {
    pub fn new(http: reqwest::Client, endpoint: Url) -> Self {
        Self { http, endpoint }
    }
}

#[async_trait]
impl HandleResolver for DohResolver {
    fn name(&self) -> &'static str {
        "dns"
    }

    #[instrument(skip(self), fields(%handle))]
    async fn resolve_handle(&self, handle: &Handle) -> Result<Did> {
        let name = format!("_atproto.{}", handle);
        let response = self
            .http
            .get(self.endpoint.clone())
            .query(&[("name", name.as_str()), ("type", "TXT")])
            .header(ACCEPT, "application/dns-json")
            .send()
            .await
            .map_err(transport)?;
        if !response.status().is_success() {
            return Err(status(response.status()));
        }

        let body: DohResponse = response.json().await.map_err(transport)?;
        let answers: Vec<String> = body
            .answer
            .into_iter()
            .filter(|answer| answer.record_type == TXT_RECORD)
            .map(|answer| txt_value(&answer.data))
            .collect();
        debug!(count = answers.len(), "TXT answers received");

        parse_txt_answers(handle, &answers)
    }
}

/// Joins the quoted character-strings of a DoH TXT `data` field into the
/// record value, so `"did=did:plc:" "abc"` reads as `did=did:plc:abc`.
fn txt_value(data: &str) -> String {
    data.trim()
        .trim_matches('"')
        .split("\" \"")
        .collect()
}

/// Picks the DID out of `_atproto` TXT record values.
///
/// Exactly one value may start with `did=`. A second one makes the answer
/// ambiguous and nothing is returned.
pub fn parse_txt_answers(handle: &Handle, answers: &[String]) -> Result<Did> {
    let mut candidates = answers.iter().filter_map(|a| a.strip_prefix("did="));
    let Some(first) = candidates.next() else {
        return Err(IdentityError::MissingDnsRecord {
            handle: handle.to_string(),
        }
        .into());
    };
    if candidates.next().is_some() {
        return Err(IdentityError::AmbiguousDnsRecord {
            handle: handle.to_string(),
        }
        .into());
    }
    Did::new(first)
}
