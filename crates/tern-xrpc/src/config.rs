//! Resolver configuration.

use std::sync::Arc;

use url::Url;

use tern_core::error::InvalidInputError;
use tern_core::traits::HandleResolver;
use tern_core::{IdentityResolver, Result};

use crate::client::{DEFAULT_USER_AGENT, http_client};
use crate::document::{DEFAULT_PLC_DIRECTORY, DidDocumentClient};
use crate::handle::{DohResolver, WellKnownResolver};

/// Default DNS-over-HTTPS JSON endpoint.
pub const DEFAULT_DOH_ENDPOINT: &str = "https://mozilla.cloudflare-dns.com/dns-query";

/// Where identity lookups are sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Base URL of the PLC directory.
    pub plc_directory: String,
    /// DNS-over-HTTPS endpoint answering `application/dns-json` queries.
    pub doh_endpoint: String,
    pub user_agent: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            plc_directory: DEFAULT_PLC_DIRECTORY.to_string(),
            doh_endpoint: DEFAULT_DOH_ENDPOINT.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ResolverConfig {
    /// Builds an [`IdentityResolver`] racing the DNS and well-known
    /// strategies and fetching documents from the configured directory.
    pub fn build(&self) -> Result<IdentityResolver> {
        let http = http_client(&self.user_agent)?;
        let doh = DohResolver::new(http.clone(), parse_url("DoH endpoint", &self.doh_endpoint)?);
        let well_known = WellKnownResolver::new(&self.user_agent)?;
        let documents =
            DidDocumentClient::new(http, parse_url("PLC directory", &self.plc_directory)?);

        let strategies: Vec<Arc<dyn HandleResolver>> = vec![Arc::new(doh), Arc::new(well_known)];
        Ok(IdentityResolver::new(strategies, Arc::new(documents)))
    }
}

fn parse_url(what: &str, value: &str) -> Result<Url> {
    Url::parse(value).map_err(|err| {
        InvalidInputError::Other {
            message: format!("invalid {} '{}': {}", what, value, err),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_builds() {
        let resolver = ResolverConfig::default().build().unwrap();
        let debug = format!("{:?}", resolver);
        assert!(debug.contains("dns"));
        assert!(debug.contains("well-known"));
    }

    #[test]
    fn invalid_endpoint_is_rejected() {
        let config = ResolverConfig {
            doh_endpoint: "not a url".into(),
            ..ResolverConfig::default()
        };
        assert!(config.build().is_err());
    }
}
