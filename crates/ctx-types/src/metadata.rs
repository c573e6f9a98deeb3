use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};

use crate::payload::Payload;

/// The persisted record of one context.
///
/// Serialized as `{"Name": .., "Metadata": .., "Endpoints": {..}}`, which is
/// both the `meta.json` file format and the `meta.json` archive entry.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextMetadata {
    /// User-chosen, unconstrained name. Unique within a store.
    #[serde(rename = "Name")]
    pub name: String,

    /// Context-level metadata; its shape is fixed per store.
    #[serde(rename = "Metadata", default)]
    pub metadata: Payload,

    /// Endpoint kind → kind-specific record.
    #[serde(
        rename = "Endpoints",
        default,
        deserialize_with = "null_as_empty"
    )]
    pub endpoints: BTreeMap<String, Payload>,
}

impl ContextMetadata {
    /// A context with no metadata and no endpoints.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            metadata: Payload::null(),
            endpoints: BTreeMap::new(),
        }
    }

    /// Builder: set the context-level metadata.
    pub fn with_metadata(mut self, metadata: impl Into<Payload>) -> Self {
        self.metadata = metadata.into();
        self
    }

    /// Builder: add or replace one endpoint record.
    pub fn with_endpoint(mut self, kind: impl Into<String>, record: impl Into<Payload>) -> Self {
        self.endpoints.insert(kind.into(), record.into());
        self
    }

    /// Look up one endpoint record by kind.
    pub fn endpoint(&self, kind: &str) -> Option<&Payload> {
        self.endpoints.get(kind)
    }
}

/// Records written by other tools may carry `"Endpoints": null`.
fn null_as_empty<'de, D>(deserializer: D) -> Result<BTreeMap<String, Payload>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<BTreeMap<String, Payload>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Physical locations backing one context, for diagnostics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageInfo {
    /// Directory holding `meta.json`.
    pub metadata_path: PathBuf,
    /// Directory holding the per-endpoint TLS directories.
    pub tls_path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_uses_capitalized_field_names() {
        let meta = ContextMetadata::new("prod")
            .with_metadata(json!({"Description": "production"}))
            .with_endpoint("docker", json!({"Host": "tcp://prod:2376"}));
        let value = serde_json::to_value(&meta).unwrap();
        assert_eq!(
            value,
            json!({
                "Name": "prod",
                "Metadata": {"Description": "production"},
                "Endpoints": {"docker": {"Host": "tcp://prod:2376"}},
            })
        );
    }

    #[test]
    fn parses_null_endpoints_and_missing_metadata() {
        let meta: ContextMetadata =
            serde_json::from_str(r#"{"Name": "legacy", "Endpoints": null}"#).unwrap();
        assert_eq!(meta.name, "legacy");
        assert!(meta.metadata.is_null());
        assert!(meta.endpoints.is_empty());
    }

    #[test]
    fn endpoint_lookup() {
        let meta = ContextMetadata::new("a").with_endpoint("k8s", json!({"ns": "dev"}));
        assert!(meta.endpoint("k8s").is_some());
        assert!(meta.endpoint("docker").is_none());
    }
}
