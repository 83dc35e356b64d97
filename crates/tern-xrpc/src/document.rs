//! DID document fetching for `did:plc` and `did:web`.

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, instrument};
use url::Url;

use tern_core::Result;
use tern_core::did_doc::DidDocument;
use tern_core::error::{IdentityError, InvalidInputError};
use tern_core::traits::DidDocumentFetcher;
use tern_core::types::{Did, is_domain_name};

use crate::error::transport;

/// Default PLC directory.
pub const DEFAULT_PLC_DIRECTORY: &str = "https://plc.directory";

const DID_WEB_PATH: &str = "/.well-known/did.json";

/// Fetches DID documents from the PLC directory or, for `did:web`, from the
/// domain itself.
#[derive(Debug, Clone)]
pub struct DidDocumentClient {
    http: reqwest::Client,
    plc_directory: Url,
    web_origin: Option<Url>,
}

impl DidDocumentClient {
    pub fn new(http: reqwest::Client, plc_directory: Url) -> Self {
        Self {
            http,
            plc_directory,
            web_origin: None,
        }
    }

    /// Fetches every `did:web` document from `origin` instead of the DID's
    /// own domain.
    pub fn with_web_origin(mut self, origin: Url) -> Self {
        self.web_origin = Some(origin);
        self
    }

    #[instrument(skip(self), fields(%did))]
    async fn fetch_plc(&self, did: &Did) -> Result<DidDocument> {
        let url = format!(
            "{}/{}",
            self.plc_directory.as_str().trim_end_matches('/'),
            did
        );
        let response = self.http.get(url).send().await.map_err(transport)?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(IdentityError::NotFound {
                did: did.to_string(),
            }
            .into()),
            status if !status.is_success() => Err(IdentityError::DirectoryUnreachable {
                status: status.as_u16(),
            }
            .into()),
            _ => parse_document(response).await,
        }
    }

    #[instrument(skip(self), fields(%did))]
    async fn fetch_web(&self, did: &Did) -> Result<DidDocument> {
        let domain = did.identifier();
        if !is_domain_name(domain) {
            return Err(IdentityError::InvalidIdentifier {
                did: did.to_string(),
            }
            .into());
        }

        let url = match &self.web_origin {
            Some(origin) => origin.join(DID_WEB_PATH),
            None => Url::parse(&format!("https://{}{}", domain, DID_WEB_PATH)),
        }
        .map_err(|err| InvalidInputError::Other {
            message: format!("did:web URL for {}: {}", did, err),
        })?;

        let response = self.http.get(url).send().await.map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(IdentityError::DocumentUnreachable {
                status: status.as_u16(),
            }
            .into());
        }
        parse_document(response).await
    }
}

#[async_trait]
impl DidDocumentFetcher for DidDocumentClient {
    async fn fetch(&self, did: &Did) -> Result<DidDocument> {
        let document = match did.method() {
            "plc" => self.fetch_plc(did).await?,
            "web" => self.fetch_web(did).await?,
            method => {
                return Err(IdentityError::UnsupportedMethod {
                    method: method.to_string(),
                }
                .into());
            }
        };
        debug!(%did, services = document.service.len(), "DID document fetched");
        Ok(document)
    }
}

async fn parse_document(response: reqwest::Response) -> Result<DidDocument> {
    let body = response.bytes().await.map_err(transport)?;
    serde_json::from_slice(&body).map_err(|err| {
        IdentityError::MalformedDocument {
            reason: err.to_string(),
        }
        .into()
    })
}
