//! Kind → parser registry used to decode stored records.
//!
//! `meta.json` is always written as plain JSON. On read, the store hands the
//! context-level `Metadata` and every `Endpoints[kind]` value to the parser
//! registered for it; values without a parser stay [`Payload::Json`]. One
//! registry applies to a whole store, so every context in a store shares the
//! same metadata shape.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use ctx_types::{ContextMetadata, Payload, TypedPayload};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Kind label attached to typed context-level metadata.
pub const METADATA_KIND: &str = "metadata";

type Parser = Arc<dyn Fn(&str, Value) -> serde_json::Result<TypedPayload> + Send + Sync>;

fn parser_for<T>() -> Parser
where
    T: DeserializeOwned + Serialize + fmt::Debug + Send + Sync + 'static,
{
    Arc::new(|kind: &str, value: Value| {
        let typed: T = serde_json::from_value(value)?;
        Ok(TypedPayload::new(kind, typed))
    })
}

/// Parsers for the metadata shape and for each endpoint kind.
#[derive(Clone, Default)]
pub struct TypeRegistry {
    metadata: Option<Parser>,
    endpoints: BTreeMap<String, Parser>,
}

impl TypeRegistry {
    /// An empty registry: everything decodes as generic JSON.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: decode context-level metadata as `T`.
    pub fn with_metadata<T>(mut self) -> Self
    where
        T: DeserializeOwned + Serialize + fmt::Debug + Send + Sync + 'static,
    {
        self.metadata = Some(parser_for::<T>());
        self
    }

    /// Builder: decode `Endpoints[kind]` as `T`.
    pub fn with_endpoint<T>(mut self, kind: impl Into<String>) -> Self
    where
        T: DeserializeOwned + Serialize + fmt::Debug + Send + Sync + 'static,
    {
        self.set_endpoint::<T>(kind);
        self
    }

    /// Register (or replace) the type for one endpoint kind.
    pub fn set_endpoint<T>(&mut self, kind: impl Into<String>)
    where
        T: DeserializeOwned + Serialize + fmt::Debug + Send + Sync + 'static,
    {
        self.endpoints.insert(kind.into(), parser_for::<T>());
    }

    /// Registered endpoint kinds, sorted.
    pub fn endpoint_kinds(&self) -> impl Iterator<Item = &str> {
        self.endpoints.keys().map(String::as_str)
    }

    /// Returns `true` if a metadata type is registered.
    pub fn has_metadata_type(&self) -> bool {
        self.metadata.is_some()
    }

    /// Decode context-level metadata.
    pub fn resolve_metadata(&self, value: Value) -> serde_json::Result<Payload> {
        resolve(self.metadata.as_ref(), METADATA_KIND, value)
    }

    /// Decode one endpoint record.
    pub fn resolve_endpoint(&self, kind: &str, value: Value) -> serde_json::Result<Payload> {
        resolve(self.endpoints.get(kind), kind, value)
    }

    /// Decode a whole record whose payloads are still generic JSON.
    ///
    /// Already-typed payloads are re-rendered and decoded again, so the
    /// result always reflects this registry.
    pub fn resolve_record(&self, record: ContextMetadata) -> serde_json::Result<ContextMetadata> {
        let metadata = self.resolve_metadata(record.metadata.to_json()?)?;
        let mut endpoints = BTreeMap::new();
        for (kind, payload) in record.endpoints {
            let resolved = self.resolve_endpoint(&kind, payload.to_json()?)?;
            endpoints.insert(kind, resolved);
        }
        Ok(ContextMetadata {
            name: record.name,
            metadata,
            endpoints,
        })
    }
}

/// `null` stays generic even when a parser exists: it means "absent".
fn resolve(parser: Option<&Parser>, kind: &str, value: Value) -> serde_json::Result<Payload> {
    match parser {
        Some(parse) if !value.is_null() => parse(kind, value).map(Payload::Typed),
        _ => Ok(Payload::Json(value)),
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("metadata_typed", &self.metadata.is_some())
            .field("endpoint_kinds", &self.endpoints.keys().collect::<Vec<_>>())
            .finish()
    }
}
