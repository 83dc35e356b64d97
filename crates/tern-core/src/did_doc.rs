//! DID documents and service endpoint lookup.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::types::PdsUrl;

/// Service id of the personal data server entry.
pub const PDS_SERVICE_ID: &str = "#atproto_pds";

/// Service type of the personal data server entry.
pub const PDS_SERVICE_TYPE: &str = "AtprotoPersonalDataServer";

/// A resolved DID document.
///
/// Only the parts tern reads are modelled; verification methods are kept
/// as raw JSON. List fields that are `null`, and list entries of the wrong
/// shape, are dropped rather than failing the whole document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidDocument {
    pub id: String,
    #[serde(
        default,
        deserialize_with = "lenient_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub also_known_as: Vec<String>,
    #[serde(
        default,
        deserialize_with = "lenient_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub verification_method: Vec<Value>,
    #[serde(
        default,
        deserialize_with = "lenient_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub service: Vec<Service>,
}

/// A service entry of a DID document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    #[serde(default)]
    pub id: Value,
    #[serde(rename = "type", default)]
    pub service_type: Value,
    #[serde(default)]
    pub service_endpoint: Value,
}

impl DidDocument {
    /// Finds the endpoint of the service with the given id and type.
    ///
    /// `service_id` is a fragment such as `#atproto_pds`; entries may use the
    /// bare fragment or the form qualified with the document id. The entry must
    /// carry the expected type and a string endpoint that parses as an absolute
    /// http(s) URL with a host. Anything else yields `None`.
    pub fn service_endpoint(&self, service_id: &str, service_type: &str) -> Option<&str> {
        let qualified = format!("{}{}", self.id, service_id);
        let service = self
            .service
            .iter()
            .find(|s| matches!(s.id.as_str(), Some(id) if id == service_id || id == qualified))?;

        if service.service_type.as_str() != Some(service_type) {
            return None;
        }

        let endpoint = service.service_endpoint.as_str()?;
        PdsUrl::is_valid(endpoint).then_some(endpoint)
    }

    /// Returns the personal data server endpoint, if the document declares a
    /// usable one.
    pub fn pds_endpoint(&self) -> Option<&str> {
        self.service_endpoint(PDS_SERVICE_ID, PDS_SERVICE_TYPE)
    }

    /// Returns the handles claimed through `at://` aliases, in document order.
    pub fn handles(&self) -> impl Iterator<Item = &str> {
        self.also_known_as
            .iter()
            .filter_map(|aka| aka.strip_prefix("at://"))
    }
}

/// Reads an optional list, treating `null` as empty and skipping entries
/// that do not fit `T`.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let entries = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value(entry).ok())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc_with_endpoint(id: &str, service_type: &str, endpoint: Value) -> DidDocument {
        serde_json::from_value(json!({
            "id": "did:plc:abc",
            "alsoKnownAs": ["at://alice.test", "https://alice.example"],
            "service": [{
                "id": id,
                "type": service_type,
                "serviceEndpoint": endpoint
            }]
        }))
        .unwrap()
    }

    #[test]
    fn finds_bare_fragment_endpoint() {
        let doc = doc_with_endpoint(
            "#atproto_pds",
            "AtprotoPersonalDataServer",
            json!("https://pds.example.com"),
        );
        assert_eq!(doc.pds_endpoint(), Some("https://pds.example.com"));
    }

    #[test]
    fn finds_qualified_endpoint() {
        let doc = doc_with_endpoint(
            "did:plc:abc#atproto_pds",
            "AtprotoPersonalDataServer",
            json!("https://pds.example.com"),
        );
        assert_eq!(doc.pds_endpoint(), Some("https://pds.example.com"));
    }

    #[test]
    fn non_http_endpoint_is_absent() {
        let doc = doc_with_endpoint(
            "#atproto_pds",
            "AtprotoPersonalDataServer",
            json!("ftp://x.com"),
        );
        assert_eq!(doc.pds_endpoint(), None);
    }

    #[test]
    fn structured_endpoint_is_absent() {
        let doc = doc_with_endpoint("#atproto_pds", "AtprotoPersonalDataServer", json!({}));
        assert_eq!(doc.pds_endpoint(), None);
    }

    #[test]
    fn untyped_sibling_service_is_skipped() {
        let doc: DidDocument = serde_json::from_value(json!({
            "id": "did:plc:abc",
            "service": [
                {"id": "#other", "serviceEndpoint": "https://x.example"},
                {"type": "Unnamed", "serviceEndpoint": "https://y.example"},
                "not-a-service",
                {
                    "id": "#atproto_pds",
                    "type": "AtprotoPersonalDataServer",
                    "serviceEndpoint": "https://pds.example.com"
                }
            ]
        }))
        .unwrap();
        assert_eq!(doc.pds_endpoint(), Some("https://pds.example.com"));
        assert_eq!(doc.service_endpoint("#other", "Anything"), None);
    }

    #[test]
    fn null_lists_read_as_empty() {
        let doc: DidDocument = serde_json::from_value(json!({
            "id": "did:plc:abc",
            "alsoKnownAs": null,
            "verificationMethod": null,
            "service": null
        }))
        .unwrap();
        assert!(doc.also_known_as.is_empty());
        assert!(doc.service.is_empty());
        assert_eq!(doc.pds_endpoint(), None);

        let doc: DidDocument = serde_json::from_value(json!({
            "id": "did:plc:abc",
            "alsoKnownAs": [7, "at://alice.test"]
        }))
        .unwrap();
        assert_eq!(doc.handles().collect::<Vec<_>>(), vec!["alice.test"]);
    }

    #[test]
    fn wrong_type_is_absent() {
        let doc = doc_with_endpoint(
            "#atproto_pds",
            "AtprotoLabeler",
            json!("https://pds.example.com"),
        );
        assert_eq!(doc.pds_endpoint(), None);
        assert_eq!(
            doc.service_endpoint("#atproto_pds", "AtprotoLabeler"),
            Some("https://pds.example.com")
        );
    }

    #[test]
    fn handles_come_from_at_aliases() {
        let doc = doc_with_endpoint("#x", "y", Value::Null);
        assert_eq!(doc.handles().collect::<Vec<_>>(), vec!["alice.test"]);
    }

    #[test]
    fn document_without_services_parses() {
        let doc: DidDocument = serde_json::from_value(json!({"id": "did:web:example.com"})).unwrap();
        assert!(doc.service.is_empty());
        assert_eq!(doc.pds_endpoint(), None);
    }
}
